//! PDF render pipeline - from proposal records to a persisted artifact.
//!
//! `engine` turns an HTML document into PDF bytes through the shared
//! renderer; `service` orchestrates one render end to end: fetch records,
//! assemble HTML, rasterize, persist, and produce a retrievable URL.

pub mod engine;
pub mod service;

pub use engine::{ChromiumPdfEngine, PdfEngine};
pub use service::ProposalPdfService;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::renderer::RendererError;
use crate::store::StoreError;

/// Errors that can occur while producing a proposal PDF.
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("proposal {0} not found")]
    ProposalNotFound(String),
    #[error("client {0} not found")]
    ClientNotFound(String),
    #[error("document store error: {0}")]
    Store(#[from] StoreError),
    #[error("template rendering failed: {0}")]
    Template(#[from] tera::Error),
    #[error("renderer unavailable: {0}")]
    Renderer(#[from] RendererError),
    #[error("renderer timed out during {0}")]
    Timeout(&'static str),
    #[error("renderer failed during {stage}: {message}")]
    Page {
        stage: &'static str,
        message: String,
    },
    #[error("failed to stage HTML for rendering: {0}")]
    TempFile(#[source] std::io::Error),
}

impl RenderError {
    /// Data errors the caller can only fix by supplying a different id.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ProposalNotFound(_) | Self::ClientNotFound(_))
    }
}

/// Result of one successful render: the artifact bytes plus the metadata
/// needed to retrieve it again.
#[derive(Debug)]
pub struct RenderedPdf {
    pub proposal_id: String,
    pub filename: String,
    pub generated_at: DateTime<Utc>,
    /// Retrievable URL; absent when persistence failed and only the
    /// in-memory bytes could be returned.
    pub url: Option<String>,
    pub access_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
    pub bytes: Vec<u8>,
}

/// Stable storage key for a proposal's artifact.
pub fn artifact_name(proposal_id: &str) -> String {
    format!("proposal_{}.pdf", proposal_id)
}
