//! HTML-to-PDF engine backed by the shared renderer.
//!
//! The HTML is written to a temporary file and loaded over `file://`
//! navigation rather than injected as page content - the file-based route
//! is not racy against the renderer's asynchronous resource waits. Every
//! renderer operation is bounded by the configured timeout, the page is
//! closed whatever happens, and the temp file is removed on drop.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::PrintToPdfParams;
use chromiumoxide::page::Page;
use tokio::time::timeout;

use super::RenderError;
use crate::renderer::BrowserPool;

/// A4 paper, in inches.
const A4_WIDTH_IN: f64 = 8.27;
const A4_HEIGHT_IN: f64 = 11.69;

/// Default bound for each renderer operation.
pub const DEFAULT_OP_TIMEOUT: Duration = Duration::from_secs(30);

/// Rasterizes one HTML document into PDF bytes.
#[async_trait]
pub trait PdfEngine: Send + Sync {
    async fn html_to_pdf(&self, html: &str, document_id: &str) -> Result<Vec<u8>, RenderError>;
}

pub struct ChromiumPdfEngine {
    pool: Arc<BrowserPool>,
    op_timeout: Duration,
}

impl ChromiumPdfEngine {
    pub fn new(pool: Arc<BrowserPool>, op_timeout: Duration) -> Self {
        Self { pool, op_timeout }
    }

    async fn capture(&self, page: &Page, html_path: &Path) -> Result<Vec<u8>, RenderError> {
        let url = format!("file://{}", html_path.display());

        timeout(self.op_timeout, page.goto(url))
            .await
            .map_err(|_| RenderError::Timeout("navigation"))?
            .map_err(|e| RenderError::Page {
                stage: "navigation",
                message: e.to_string(),
            })?;
        timeout(self.op_timeout, page.wait_for_navigation())
            .await
            .map_err(|_| RenderError::Timeout("navigation"))?
            .map_err(|e| RenderError::Page {
                stage: "navigation",
                message: e.to_string(),
            })?;

        let params = PrintToPdfParams {
            print_background: Some(true),
            paper_width: Some(A4_WIDTH_IN),
            paper_height: Some(A4_HEIGHT_IN),
            ..Default::default()
        };
        let bytes = timeout(self.op_timeout, page.pdf(params))
            .await
            .map_err(|_| RenderError::Timeout("pdf capture"))?
            .map_err(|e| RenderError::Page {
                stage: "pdf capture",
                message: e.to_string(),
            })?;
        Ok(bytes)
    }
}

#[async_trait]
impl PdfEngine for ChromiumPdfEngine {
    async fn html_to_pdf(&self, html: &str, document_id: &str) -> Result<Vec<u8>, RenderError> {
        let temp_html = tempfile::Builder::new()
            .prefix(&format!("proposal-{}-", document_id))
            .suffix(".html")
            .tempfile()
            .map_err(RenderError::TempFile)?;
        std::fs::write(temp_html.path(), html).map_err(RenderError::TempFile)?;

        let page = self.pool.acquire_page().await?;
        let result = self.capture(&page, temp_html.path()).await;

        if let Err(e) = page.close().await {
            log::warn!(
                "Could not close renderer page for {}: {}",
                document_id,
                e
            );
        }
        // temp_html drops here, deleting the staged file

        result
    }
}
