//! Document store adapter.
//!
//! The proposal, client and owner records live in an external document
//! store owned by the CRUD side of the product. This module only reads:
//! the render pipeline consumes records through the [`DocumentStore`]
//! trait and never writes them back.

mod postgres;

pub use postgres::PgDocumentStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::proposal::models::{Client, OwnerProfile, Proposal};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Read-only access to the record collections a render needs.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Fetch a proposal by id; `None` when no record exists.
    async fn get_proposal(&self, id: &str) -> Result<Option<Proposal>, StoreError>;

    /// Fetch a client by id; `None` when no record exists.
    async fn get_client(&self, id: &str) -> Result<Option<Client>, StoreError>;

    /// Fetch the owning user's profile; `None` when no record exists.
    async fn get_owner(&self, user_id: &str) -> Result<Option<OwnerProfile>, StoreError>;

    /// All proposals belonging to one owner (owner-id equality filter).
    async fn list_proposals_for_owner(&self, user_id: &str)
        -> Result<Vec<Proposal>, StoreError>;
}
