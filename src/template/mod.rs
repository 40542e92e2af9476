//! Proposal HTML assembly.
//!
//! Pure step of the render pipeline: a typed context record is built from
//! the proposal, client and owner records and pushed through an embedded
//! Tera template. The output is one self-contained HTML document (inline
//! styles, no network references) so the renderer can load it offline.
//! All money values are recomputed here from the service lines; stored
//! totals are never trusted.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use tera::{Context, Tera};

use crate::proposal::models::{Client, OwnerProfile, Proposal};

const TEMPLATE_NAME: &str = "proposal.html";
const TEMPLATE_SOURCE: &str = include_str!("../../templates/proposal.html");

/// 1x1 transparent GIF shown when the owner has not uploaded a logo.
const PLACEHOLDER_LOGO: &str =
    "data:image/gif;base64,R0lGODlhAQABAIAAAAAAAP///yH5BAEAAAAALAAAAAABAAEAAAIBRAA7";

/// Set to `1` to also write every generated HTML document to the system
/// temp directory for inspection. Off unless explicitly enabled.
pub const DUMP_HTML_ENV: &str = "PDF_DEBUG_HTML";

/// One formatted service row ready for the template.
#[derive(Debug, Serialize)]
pub struct LineView {
    pub name: String,
    pub description: String,
    pub qty: String,
    pub unit: String,
    pub unit_price: String,
    pub line_total: String,
}

#[derive(Debug, Serialize)]
pub struct OwnerView {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub field: String,
    pub logo: String,
}

#[derive(Debug, Serialize)]
pub struct ClientView {
    pub name: String,
    pub company: String,
    pub email: String,
}

/// Fully formatted template context for one proposal document.
#[derive(Debug, Serialize)]
pub struct ProposalDocument {
    pub title: String,
    pub proposal_date: String,
    pub valid_until: String,
    pub client: ClientView,
    pub owner: OwnerView,
    pub lines: Vec<LineView>,
    /// Computed from the lines; authoritative over the stored subtotal.
    #[serde(skip)]
    pub computed_subtotal: f64,
    pub subtotal: String,
    pub tax: String,
    pub discount: String,
    pub total: String,
    /// Escaped terms text with newlines already converted to `<br>`.
    pub terms_html: String,
}

impl ProposalDocument {
    pub fn assemble(proposal: &Proposal, client: &Client, owner: &OwnerProfile) -> Self {
        let mut computed_subtotal = 0.0;
        let lines = proposal
            .services
            .iter()
            .map(|service| {
                let line_total = service.qty * service.price;
                computed_subtotal += line_total;
                LineView {
                    name: service.name.clone(),
                    description: service.description.clone(),
                    qty: format_qty(service.qty),
                    unit: service.unit.clone(),
                    unit_price: format_money(service.price),
                    line_total: format_money(line_total),
                }
            })
            .collect();

        let total = computed_subtotal + proposal.tax - proposal.discount;
        let logo = if owner.photo_url.is_empty() {
            PLACEHOLDER_LOGO.to_string()
        } else {
            owner.photo_url.clone()
        };

        ProposalDocument {
            title: proposal.title.clone(),
            proposal_date: format_timestamp(proposal.created_at),
            valid_until: format_date(proposal.valid_until),
            client: ClientView {
                name: client.name.clone(),
                company: client.company.clone(),
                email: client.email.clone(),
            },
            owner: OwnerView {
                name: owner.display_name.clone(),
                email: owner.email.clone(),
                phone: owner.phone_number.clone(),
                field: owner.business_field.clone(),
                logo,
            },
            lines,
            computed_subtotal,
            subtotal: format_money(computed_subtotal),
            tax: format_money(proposal.tax),
            discount: format_money(proposal.discount),
            total: format_money(total),
            terms_html: escape_multiline(&proposal.terms),
        }
    }
}

/// Compiled proposal template, built once and shared.
pub struct ProposalTemplate {
    tera: Tera,
}

impl ProposalTemplate {
    pub fn new() -> Result<Self, tera::Error> {
        let mut tera = Tera::default();
        tera.add_raw_template(TEMPLATE_NAME, TEMPLATE_SOURCE)?;
        Ok(Self { tera })
    }

    /// Render the complete HTML document for one proposal.
    pub fn render(
        &self,
        proposal: &Proposal,
        client: &Client,
        owner: &OwnerProfile,
    ) -> Result<String, tera::Error> {
        let document = ProposalDocument::assemble(proposal, client, owner);
        let context = Context::from_serialize(&document)?;
        self.tera.render(TEMPLATE_NAME, &context)
    }
}

/// Write the generated HTML to a temp inspection file when
/// [`DUMP_HTML_ENV`] is set. Failures only warn.
pub fn maybe_dump_html(proposal_id: &str, html: &str) {
    if std::env::var(DUMP_HTML_ENV).map(|v| v == "1").unwrap_or(false) {
        let path = std::env::temp_dir().join(format!("proposal-{proposal_id}.html"));
        match std::fs::write(&path, html) {
            Ok(()) => log::debug!("Wrote generated HTML to {}", path.display()),
            Err(e) => log::warn!("Could not dump generated HTML to {}: {}", path.display(), e),
        }
    }
}

/// Format a money amount the way the proposal documents show it.
pub fn format_money(amount: f64) -> String {
    format!("\u{20b9}{:.2}", amount)
}

/// Quantities render without a trailing `.0` for whole numbers.
pub fn format_qty(qty: f64) -> String {
    if qty.fract() == 0.0 {
        format!("{:.0}", qty)
    } else {
        format!("{}", qty)
    }
}

fn format_timestamp(ts: Option<DateTime<Utc>>) -> String {
    match ts {
        Some(ts) => ts.format("%-m/%-d/%Y").to_string(),
        None => "N/A".to_string(),
    }
}

fn format_date(date: Option<NaiveDate>) -> String {
    match date {
        Some(date) => date.format("%-m/%-d/%Y").to_string(),
        None => "N/A".to_string(),
    }
}

/// HTML-escape free text, converting newlines to `<br>` tags.
pub fn escape_multiline(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            '\n' => escaped.push_str("<br>"),
            '\r' => {}
            _ => escaped.push(ch),
        }
    }
    escaped
}
