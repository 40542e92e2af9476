//! End-to-end render orchestration for one proposal.

use std::sync::Arc;

use chrono::Utc;
use log::{debug, error, warn};

use super::{artifact_name, PdfEngine, RenderError, RenderedPdf};
use crate::access::ArtifactTokens;
use crate::proposal::models::OwnerProfile;
use crate::storage::ObjectStorage;
use crate::store::DocumentStore;
use crate::template::{self, ProposalTemplate};

/// Orchestrates fetch -> template -> rasterize -> persist for one proposal.
///
/// One attempt per call: renderer failures are surfaced to the caller and
/// recovery happens on the next request through the pool's health-gated
/// page acquisition, not through an in-job retry loop.
pub struct ProposalPdfService {
    store: Arc<dyn DocumentStore>,
    storage: Arc<dyn ObjectStorage>,
    engine: Arc<dyn PdfEngine>,
    tokens: Arc<ArtifactTokens>,
    template: ProposalTemplate,
}

impl ProposalPdfService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        storage: Arc<dyn ObjectStorage>,
        engine: Arc<dyn PdfEngine>,
        tokens: Arc<ArtifactTokens>,
    ) -> Result<Self, tera::Error> {
        Ok(Self {
            store,
            storage,
            engine,
            tokens,
            template: ProposalTemplate::new()?,
        })
    }

    /// Produce the PDF artifact for one proposal.
    ///
    /// Missing proposal or client records fail before any renderer page is
    /// acquired. A missing owner profile is cosmetic and renders as empty
    /// branding. A failed upload still returns the rendered bytes so the
    /// caller is not left with nothing.
    pub async fn generate(&self, proposal_id: &str) -> Result<RenderedPdf, RenderError> {
        let proposal = self
            .store
            .get_proposal(proposal_id)
            .await?
            .ok_or_else(|| RenderError::ProposalNotFound(proposal_id.to_string()))?;

        let client = self
            .store
            .get_client(&proposal.client_id)
            .await?
            .ok_or_else(|| RenderError::ClientNotFound(proposal.client_id.clone()))?;

        let owner = match self.store.get_owner(&proposal.user_id).await {
            Ok(Some(owner)) => owner,
            Ok(None) => {
                debug!(
                    "No owner profile for proposal {}, rendering without branding",
                    proposal_id
                );
                OwnerProfile::default()
            }
            Err(e) => {
                warn!(
                    "Owner fetch failed for proposal {} ({}), rendering without branding",
                    proposal_id, e
                );
                OwnerProfile::default()
            }
        };

        let html = self.template.render(&proposal, &client, &owner)?;
        template::maybe_dump_html(proposal_id, &html);

        let bytes = self.engine.html_to_pdf(&html, proposal_id).await?;

        let filename = artifact_name(proposal_id);
        let generated_at = Utc::now();
        let mut url = None;
        let mut access_token = None;
        let mut expires_at = None;

        match self.storage.upload_file(&filename, &bytes).await {
            Ok(()) => {
                if let Some(public) = self.storage.public_url(&filename) {
                    url = Some(public);
                } else if let Some(path) = self.storage.artifact_path(&filename) {
                    match self.tokens.issue(proposal_id, path).await {
                        Ok(record) => {
                            url = Some(format!("/secure-pdf/{}", record.token));
                            access_token = Some(record.token);
                            expires_at = Some(record.expires_at);
                        }
                        Err(e) => {
                            error!(
                                "Token issuance failed for proposal {}: {}",
                                proposal_id, e
                            );
                        }
                    }
                }
            }
            Err(e) => {
                error!(
                    "Artifact upload failed for proposal {}: {}",
                    proposal_id, e
                );
            }
        }

        Ok(RenderedPdf {
            proposal_id: proposal_id.to_string(),
            filename,
            generated_at,
            url,
            access_token,
            expires_at,
            bytes,
        })
    }
}
