//! Renderer pool lifecycle tests.
//!
//! These drive a real Chromium process and are ignored by default; run
//! them with `cargo test -- --ignored` on a machine with Chromium
//! installed (set CHROME_EXECUTABLE to point at a specific binary).

use worknest_server::renderer::{BrowserPool, RendererConfig};

#[tokio::test]
#[ignore = "requires a local Chromium installation"]
async fn test_initialize_and_health_check() {
    let pool = BrowserPool::new(RendererConfig::from_env());
    pool.initialize().await.unwrap();
    assert!(pool.health_check().await);
    pool.shutdown().await;
    assert!(!pool.health_check().await);
}

#[tokio::test]
#[ignore = "requires a local Chromium installation"]
async fn test_acquire_page_transparently_restarts_unhealthy_pool() {
    let pool = BrowserPool::new(RendererConfig::from_env());
    pool.initialize().await.unwrap();

    // kill the process out from under the pool; the next acquisition must
    // recover without the caller observing the failure
    pool.shutdown().await;
    assert!(!pool.health_check().await);

    let page = pool.acquire_page().await.unwrap();
    assert!(pool.health_check().await);
    page.close().await.unwrap();
    pool.shutdown().await;
}

#[tokio::test]
#[ignore = "requires a local Chromium installation"]
async fn test_restart_is_idempotent_over_missing_process() {
    let pool = BrowserPool::new(RendererConfig::from_env());
    // restart with no existing process is a plain initialize
    pool.restart().await.unwrap();
    assert!(pool.health_check().await);
    pool.shutdown().await;
    pool.shutdown().await;
}
