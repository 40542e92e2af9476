//! Headless-browser lifecycle management.
//!
//! One Chromium process is shared by every render job to amortize its
//! startup cost. The pool moves through
//! `Uninitialized -> Starting -> Ready -> (Unhealthy -> Restarting -> Ready) -> Closed`;
//! callers only ever see [`BrowserPool::acquire_page`], which health-checks
//! the process and transparently restarts it before handing out a page.
//! Each job owns exactly one page and is responsible for closing it; a
//! restart invalidates every in-flight page, which surfaces to those jobs
//! as retriable renderer errors.

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::page::Page;
use futures_util::StreamExt;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Flags the renderer is launched with. Sandboxing is disabled and the
/// process trimmed down for constrained container environments.
const LAUNCH_FLAGS: &[&str] = &[
    "--no-sandbox",
    "--disable-setuid-sandbox",
    "--disable-dev-shm-usage",
    "--disable-gpu",
    "--no-zygote",
];

#[derive(Debug, Error)]
pub enum RendererError {
    #[error("failed to launch renderer: {0}")]
    Launch(String),
    #[error("renderer is not running")]
    NotRunning,
    #[error("browser protocol error: {0}")]
    Cdp(String),
}

#[derive(Debug, Clone, Default)]
pub struct RendererConfig {
    /// Explicit Chromium binary; the system default is used when unset.
    pub executable: Option<String>,
}

impl RendererConfig {
    pub fn from_env() -> Self {
        Self {
            executable: std::env::var("CHROME_EXECUTABLE").ok(),
        }
    }
}

struct BrowserHandle {
    browser: Browser,
    event_loop: JoinHandle<()>,
}

/// Owner of the single shared renderer process.
pub struct BrowserPool {
    config: RendererConfig,
    inner: Mutex<Option<BrowserHandle>>,
}

impl BrowserPool {
    pub fn new(config: RendererConfig) -> Self {
        Self {
            config,
            inner: Mutex::new(None),
        }
    }

    /// Launch the renderer process. Any existing instance is closed first.
    ///
    /// A launch failure propagates: at startup the owning process treats it
    /// as fatal rather than running with a silently broken PDF feature.
    pub async fn initialize(&self) -> Result<(), RendererError> {
        let mut guard = self.inner.lock().await;
        if let Some(handle) = guard.take() {
            close_handle(handle).await;
        }

        log::info!("Initializing renderer process");
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .args(LAUNCH_FLAGS.to_vec());
        if let Some(path) = &self.config.executable {
            builder = builder.chrome_executable(path);
        }
        let config = builder.build().map_err(RendererError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| RendererError::Launch(e.to_string()))?;

        let event_loop = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        *guard = Some(BrowserHandle {
            browser,
            event_loop,
        });
        log::info!("Renderer process initialized");
        Ok(())
    }

    /// Open and immediately close a throwaway page.
    ///
    /// Returns false for every failure mode; a health check never
    /// propagates an error.
    pub async fn health_check(&self) -> bool {
        let guard = self.inner.lock().await;
        let Some(handle) = guard.as_ref() else {
            return false;
        };
        match handle.browser.new_page("about:blank").await {
            Ok(page) => {
                let _ = page.close().await;
                true
            }
            Err(e) => {
                log::error!("Renderer health check failed: {}", e);
                false
            }
        }
    }

    /// Hand out a fresh page, restarting the renderer first if it is
    /// unhealthy. Callers must close the page themselves and must not
    /// assume it survives a pool restart.
    pub async fn acquire_page(&self) -> Result<Page, RendererError> {
        if !self.health_check().await {
            log::warn!("Renderer is unhealthy, restarting before page acquisition");
            self.restart().await?;
        }

        let guard = self.inner.lock().await;
        let handle = guard.as_ref().ok_or(RendererError::NotRunning)?;
        handle
            .browser
            .new_page("about:blank")
            .await
            .map_err(|e| RendererError::Cdp(e.to_string()))
    }

    /// Close the current process (no-op when absent) and launch a new one.
    pub async fn restart(&self) -> Result<(), RendererError> {
        log::warn!("Restarting renderer process");
        self.initialize().await
    }

    /// Close the renderer process. Idempotent; invoked once the HTTP
    /// server has stopped so the external process is never leaked.
    pub async fn shutdown(&self) {
        let mut guard = self.inner.lock().await;
        if let Some(handle) = guard.take() {
            log::info!("Shutting down renderer process");
            close_handle(handle).await;
        }
    }
}

async fn close_handle(mut handle: BrowserHandle) {
    if let Err(e) = handle.browser.close().await {
        log::warn!("Error while closing renderer process: {}", e);
    }
    let _ = handle.browser.wait().await;
    handle.event_loop.abort();
}
