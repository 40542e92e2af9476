//! Postgres-backed document store.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::PgPool;

use super::{DocumentStore, StoreError};
use crate::proposal::models::{
    services_from_value, Client, ClientStatus, OwnerProfile, Proposal, ProposalStatus,
};

const PROPOSAL_COLUMNS: &str = "id, title, client_id, user_id, services, subtotal, tax, \
     discount, total, terms, valid_until, created_at, status";

pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct ProposalRow {
    id: String,
    title: Option<String>,
    client_id: Option<String>,
    user_id: Option<String>,
    services: Option<serde_json::Value>,
    subtotal: Option<f64>,
    tax: Option<f64>,
    discount: Option<f64>,
    total: Option<f64>,
    terms: Option<String>,
    valid_until: Option<NaiveDate>,
    created_at: Option<DateTime<Utc>>,
    status: Option<String>,
}

impl From<ProposalRow> for Proposal {
    fn from(row: ProposalRow) -> Self {
        Proposal {
            id: row.id,
            title: row.title.unwrap_or_default(),
            client_id: row.client_id.unwrap_or_default(),
            user_id: row.user_id.unwrap_or_default(),
            services: row.services.map(services_from_value).unwrap_or_default(),
            subtotal: row.subtotal.unwrap_or(0.0),
            tax: row.tax.unwrap_or(0.0),
            discount: row.discount.unwrap_or(0.0),
            total: row.total.unwrap_or(0.0),
            terms: row.terms.unwrap_or_default(),
            valid_until: row.valid_until,
            created_at: row.created_at,
            status: ProposalStatus::parse(row.status.as_deref().unwrap_or("draft")),
        }
    }
}

#[derive(sqlx::FromRow)]
struct ClientRow {
    id: String,
    name: Option<String>,
    company: Option<String>,
    email: Option<String>,
    address: Option<String>,
    phone: Option<String>,
    preferred_contact_channel: Option<String>,
    notes: Option<String>,
    tags: Option<Vec<String>>,
    status: Option<String>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Client {
            id: row.id,
            name: row.name.unwrap_or_default(),
            company: row.company.unwrap_or_default(),
            email: row.email.unwrap_or_default(),
            address: row.address.unwrap_or_default(),
            phone: row.phone.unwrap_or_default(),
            preferred_contact_channel: row.preferred_contact_channel.unwrap_or_default(),
            notes: row.notes.unwrap_or_default(),
            tags: row.tags.unwrap_or_default(),
            status: ClientStatus::parse(row.status.as_deref().unwrap_or("active")),
        }
    }
}

#[derive(sqlx::FromRow)]
struct OwnerRow {
    id: String,
    display_name: Option<String>,
    email: Option<String>,
    phone_number: Option<String>,
    photo_url: Option<String>,
    business_field: Option<String>,
}

impl From<OwnerRow> for OwnerProfile {
    fn from(row: OwnerRow) -> Self {
        OwnerProfile {
            id: row.id,
            display_name: row.display_name.unwrap_or_default(),
            email: row.email.unwrap_or_default(),
            phone_number: row.phone_number.unwrap_or_default(),
            photo_url: row.photo_url.unwrap_or_default(),
            business_field: row.business_field.unwrap_or_default(),
        }
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn get_proposal(&self, id: &str) -> Result<Option<Proposal>, StoreError> {
        let query = format!("SELECT {PROPOSAL_COLUMNS} FROM proposals WHERE id = $1");
        let row: Option<ProposalRow> = sqlx::query_as(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Proposal::from))
    }

    async fn get_client(&self, id: &str) -> Result<Option<Client>, StoreError> {
        let row: Option<ClientRow> = sqlx::query_as(
            "SELECT id, name, company, email, address, phone, preferred_contact_channel, \
             notes, tags, status FROM clients WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Client::from))
    }

    async fn get_owner(&self, user_id: &str) -> Result<Option<OwnerProfile>, StoreError> {
        let row: Option<OwnerRow> = sqlx::query_as(
            "SELECT id, display_name, email, phone_number, photo_url, business_field \
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(OwnerProfile::from))
    }

    async fn list_proposals_for_owner(
        &self,
        user_id: &str,
    ) -> Result<Vec<Proposal>, StoreError> {
        let query = format!(
            "SELECT {PROPOSAL_COLUMNS} FROM proposals WHERE user_id = $1 ORDER BY created_at DESC"
        );
        let rows: Vec<ProposalRow> = sqlx::query_as(&query)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Proposal::from).collect())
    }
}
