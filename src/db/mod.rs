//! Shared application state.
//!
//! Every collaborator sits behind a trait object so the render pipeline is
//! wired by injection: the document store, the object storage backend and
//! the PDF engine are all substitutable in tests.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use crate::access::ArtifactTokens;
use crate::pdf::{ChromiumPdfEngine, PdfEngine, ProposalPdfService};
use crate::renderer::BrowserPool;
use crate::storage::{LocalDiskStorage, ObjectStorage, SupabaseConfig, SupabaseStorage};
use crate::store::{DocumentStore, PgDocumentStore};

const DEFAULT_ASSETS_DIR: &str = "./assets";

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub storage: Arc<dyn ObjectStorage>,
    pub tokens: Arc<ArtifactTokens>,
    pub pdf: Arc<ProposalPdfService>,
    pub http_client: reqwest::Client,
}

impl AppState {
    /// Build the production state: Postgres document store, the storage
    /// backend selected from the environment, and a PDF engine bound to
    /// the already-launched renderer pool.
    pub async fn new_with_config(
        renderer: Arc<BrowserPool>,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();
        let database_url = env::var("DATABASE_URL").expect("DATABASE_URL must be set");

        let pool = sqlx::postgres::PgPoolOptions::new()
            .max_connections(50)
            .min_connections(5)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(900))
            .connect(&database_url)
            .await?;

        let http_client = reqwest::Client::builder()
            .pool_idle_timeout(Duration::from_secs(900))
            .user_agent("worknest-server/0.3")
            .build()
            .expect("Failed to create reqwest client");

        let assets_dir = env::var("ASSETS_DIR").unwrap_or_else(|_| DEFAULT_ASSETS_DIR.to_string());
        let storage: Arc<dyn ObjectStorage> = match SupabaseConfig::from_env() {
            Some(config) => {
                log::info!("Using Supabase object storage (bucket {})", config.bucket);
                Arc::new(SupabaseStorage::new(config, http_client.clone()))
            }
            None => {
                log::info!("Using local disk storage at {}", assets_dir);
                Arc::new(LocalDiskStorage::new(&assets_dir)?)
            }
        };

        let op_timeout = env::var("RENDER_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(crate::pdf::engine::DEFAULT_OP_TIMEOUT);
        let engine: Arc<dyn PdfEngine> = Arc::new(ChromiumPdfEngine::new(renderer, op_timeout));

        let store: Arc<dyn DocumentStore> = Arc::new(PgDocumentStore::new(pool));
        Self::new_with_parts(store, storage, engine, &assets_dir, http_client)
    }

    /// Assemble state from explicit parts; tests use this with mock
    /// implementations of the traits.
    pub fn new_with_parts(
        store: Arc<dyn DocumentStore>,
        storage: Arc<dyn ObjectStorage>,
        engine: Arc<dyn PdfEngine>,
        tokens_dir: &str,
        http_client: reqwest::Client,
    ) -> Result<Self, Box<dyn std::error::Error>> {
        let tokens = Arc::new(ArtifactTokens::new(tokens_dir));
        let pdf = Arc::new(ProposalPdfService::new(
            store.clone(),
            storage.clone(),
            engine,
            tokens.clone(),
        )?);

        Ok(AppState {
            store,
            storage,
            tokens,
            pdf,
            http_client,
        })
    }
}
