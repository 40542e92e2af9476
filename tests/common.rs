#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::TimeZone;

use worknest_server::pdf::{PdfEngine, RenderError};
use worknest_server::proposal::models::{Client, OwnerProfile, Proposal, ServiceItem};
use worknest_server::storage::ObjectStorage;
use worknest_server::store::{DocumentStore, StoreError};

/// In-memory document store seeded with fixture records.
#[derive(Default)]
pub struct MockDocumentStore {
    pub proposals: HashMap<String, Proposal>,
    pub clients: HashMap<String, Client>,
    pub owners: HashMap<String, OwnerProfile>,
}

impl MockDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_proposal(mut self, proposal: Proposal) -> Self {
        self.proposals.insert(proposal.id.clone(), proposal);
        self
    }

    pub fn with_client(mut self, client: Client) -> Self {
        self.clients.insert(client.id.clone(), client);
        self
    }

    pub fn with_owner(mut self, owner: OwnerProfile) -> Self {
        self.owners.insert(owner.id.clone(), owner);
        self
    }
}

#[async_trait]
impl DocumentStore for MockDocumentStore {
    async fn get_proposal(&self, id: &str) -> Result<Option<Proposal>, StoreError> {
        Ok(self.proposals.get(id).cloned())
    }

    async fn get_client(&self, id: &str) -> Result<Option<Client>, StoreError> {
        Ok(self.clients.get(id).cloned())
    }

    async fn get_owner(&self, user_id: &str) -> Result<Option<OwnerProfile>, StoreError> {
        Ok(self.owners.get(user_id).cloned())
    }

    async fn list_proposals_for_owner(
        &self,
        user_id: &str,
    ) -> Result<Vec<Proposal>, StoreError> {
        Ok(self
            .proposals
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect())
    }
}

/// In-memory object storage. With a `root` directory set it behaves like
/// the local-disk backend (private artifacts, real files on disk); without
/// one it plays a public object store.
pub struct MockObjectStorage {
    files: Arc<tokio::sync::Mutex<HashMap<String, Vec<u8>>>>,
    root: Option<PathBuf>,
    fail_uploads: bool,
}

impl MockObjectStorage {
    pub fn public() -> Self {
        Self {
            files: Arc::new(tokio::sync::Mutex::new(HashMap::new())),
            root: None,
            fail_uploads: false,
        }
    }

    pub fn private(root: impl Into<PathBuf>) -> Self {
        Self {
            files: Arc::new(tokio::sync::Mutex::new(HashMap::new())),
            root: Some(root.into()),
            fail_uploads: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            files: Arc::new(tokio::sync::Mutex::new(HashMap::new())),
            root: None,
            fail_uploads: true,
        }
    }

    pub async fn has_file(&self, filename: &str) -> bool {
        self.files.lock().await.contains_key(filename)
    }
}

#[async_trait]
impl ObjectStorage for MockObjectStorage {
    async fn upload_file(&self, filename: &str, file_data: &[u8]) -> Result<(), String> {
        if self.fail_uploads {
            return Err("storage backend is down".to_string());
        }
        if let Some(root) = &self.root {
            let path = root.join(filename);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
            }
            std::fs::write(&path, file_data).map_err(|e| e.to_string())?;
        }
        self.files
            .lock()
            .await
            .insert(filename.to_string(), file_data.to_vec());
        Ok(())
    }

    async fn delete_file(&self, filename: &str) -> Result<(), String> {
        self.files.lock().await.remove(filename);
        Ok(())
    }

    fn get_asset_url(&self, filename: &str) -> String {
        match &self.root {
            Some(_) => format!("/{}", filename),
            None => format!("https://cdn.test/{}", filename),
        }
    }

    fn public_url(&self, filename: &str) -> Option<String> {
        match &self.root {
            Some(_) => None,
            None => Some(format!("https://cdn.test/{}", filename)),
        }
    }

    fn artifact_path(&self, filename: &str) -> Option<PathBuf> {
        self.root.as_ref().map(|root| root.join(filename))
    }
}

/// PDF engine double that counts invocations.
pub struct CountingPdfEngine {
    calls: AtomicUsize,
    hang: bool,
}

impl CountingPdfEngine {
    pub fn succeeding() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            hang: false,
        }
    }

    /// Simulates a renderer hang: every call times out.
    pub fn hanging() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            hang: true,
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PdfEngine for CountingPdfEngine {
    async fn html_to_pdf(&self, _html: &str, _document_id: &str) -> Result<Vec<u8>, RenderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.hang {
            return Err(RenderError::Timeout("navigation"));
        }
        Ok(b"%PDF-1.4 mock artifact".to_vec())
    }
}

/// Proposal P1: two services, expected computed subtotal 2000.00.
pub fn sample_proposal() -> Proposal {
    serde_json::from_value(serde_json::json!({
        "id": "p1",
        "title": "Website Redesign",
        "clientId": "c1",
        "userId": "u1",
        "services": [
            {"name": "Design", "description": "Landing page design", "qty": 2, "unit": "pages", "price": 500},
            {"name": "Dev", "description": "Implementation", "qty": 1, "price": 1000}
        ],
        "tax": 0,
        "discount": 0,
        "terms": "50% upfront\nBalance on delivery",
        "validUntil": "2026-09-30",
        "createdAt": chrono::Utc.with_ymd_and_hms(2026, 8, 1, 10, 0, 0).unwrap().to_rfc3339(),
        "status": "draft"
    }))
    .unwrap()
}

pub fn sample_client() -> Client {
    serde_json::from_value(serde_json::json!({
        "id": "c1",
        "name": "Asha Rao",
        "company": "Rao & Sons",
        "email": "asha@raoandsons.example",
        "status": "active"
    }))
    .unwrap()
}

pub fn sample_owner() -> OwnerProfile {
    serde_json::from_value(serde_json::json!({
        "id": "u1",
        "displayName": "Dev Mehta",
        "email": "dev@worknest.example",
        "phoneNumber": "+91 98765 43210",
        "freelancerField": "Web Development"
    }))
    .unwrap()
}

/// A service line deserialized from junk numeric fields.
pub fn malformed_service() -> ServiceItem {
    serde_json::from_value(serde_json::json!({
        "name": "Consulting",
        "qty": "many",
        "price": null
    }))
    .unwrap()
}
