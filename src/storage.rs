//! Object storage backends for rendered artifacts and uploaded assets.
//!
//! Two implementations sit behind the same trait: Supabase object storage
//! (durable public URLs, used in deployed environments) and a local assets
//! directory for single-instance setups. Local artifacts have no public
//! URL; retrieval goes through the token gateway instead.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

/// Subdirectory/prefix for ancillary uploads (profile images), kept apart
/// from proposal artifacts so serving them directly never exposes a PDF
/// that should be token-gated.
pub const UPLOADS_PREFIX: &str = "uploads";

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Upload a file under the given key, overwriting any previous object.
    async fn upload_file(&self, filename: &str, file_data: &[u8]) -> Result<(), String>;

    /// Delete the object stored under the key; missing objects are not an error.
    async fn delete_file(&self, filename: &str) -> Result<(), String>;

    /// Durable retrieval URL for the key, public or app-served.
    fn get_asset_url(&self, filename: &str) -> String;

    /// Public URL for the key, when this backend exposes one directly.
    fn public_url(&self, filename: &str) -> Option<String>;

    /// On-disk location of the key, when this backend keeps local files.
    fn artifact_path(&self, filename: &str) -> Option<PathBuf>;
}

#[derive(Debug, Clone)]
pub struct SupabaseConfig {
    pub url: String,
    pub api_key: String,
    pub bucket: String,
}

impl SupabaseConfig {
    /// Present only when all Supabase variables are set; otherwise the
    /// server falls back to local disk storage.
    pub fn from_env() -> Option<Self> {
        Some(Self {
            url: std::env::var("SUPABASE_URL").ok()?,
            api_key: std::env::var("SUPABASE_API_KEY").ok()?,
            bucket: std::env::var("SUPABASE_BUCKET").unwrap_or_else(|_| "worknest".to_string()),
        })
    }
}

/// Supabase storage REST client.
pub struct SupabaseStorage {
    config: SupabaseConfig,
    client: reqwest::Client,
}

impl SupabaseStorage {
    pub fn new(config: SupabaseConfig, client: reqwest::Client) -> Self {
        Self { config, client }
    }

    fn object_url(&self, filename: &str) -> String {
        format!(
            "{}/storage/v1/object/{}/{}",
            self.config.url, self.config.bucket, filename
        )
    }
}

#[async_trait]
impl ObjectStorage for SupabaseStorage {
    async fn upload_file(&self, filename: &str, file_data: &[u8]) -> Result<(), String> {
        let content_type = mime_guess::from_path(filename)
            .first_or_octet_stream()
            .to_string();

        let response = self
            .client
            .post(self.object_url(filename))
            .bearer_auth(&self.config.api_key)
            .header("x-upsert", "true")
            .header(reqwest::header::CONTENT_TYPE, content_type)
            .body(file_data.to_vec())
            .send()
            .await
            .map_err(|e| format!("Supabase upload request failed: {}", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(format!("Supabase upload rejected ({}): {}", status, body));
        }
        Ok(())
    }

    async fn delete_file(&self, filename: &str) -> Result<(), String> {
        let response = self
            .client
            .delete(self.object_url(filename))
            .bearer_auth(&self.config.api_key)
            .send()
            .await
            .map_err(|e| format!("Supabase delete request failed: {}", e))?;

        if !response.status().is_success() && response.status() != reqwest::StatusCode::NOT_FOUND {
            return Err(format!("Supabase delete rejected: {}", response.status()));
        }
        Ok(())
    }

    fn get_asset_url(&self, filename: &str) -> String {
        format!(
            "{}/storage/v1/object/public/{}/{}",
            self.config.url, self.config.bucket, filename
        )
    }

    fn public_url(&self, filename: &str) -> Option<String> {
        Some(self.get_asset_url(filename))
    }

    fn artifact_path(&self, _filename: &str) -> Option<PathBuf> {
        None
    }
}

/// Filesystem-backed storage for single-instance deployments.
pub struct LocalDiskStorage {
    root: PathBuf,
}

impl LocalDiskStorage {
    pub fn new(root: impl Into<PathBuf>) -> std::io::Result<Self> {
        let root = root.into();
        std::fs::create_dir_all(root.join(UPLOADS_PREFIX))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl ObjectStorage for LocalDiskStorage {
    async fn upload_file(&self, filename: &str, file_data: &[u8]) -> Result<(), String> {
        let path = self.root.join(filename);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| format!("Failed to create storage directory: {}", e))?;
        }
        tokio::fs::write(&path, file_data)
            .await
            .map_err(|e| format!("Failed to write {}: {}", path.display(), e))
    }

    async fn delete_file(&self, filename: &str) -> Result<(), String> {
        match tokio::fs::remove_file(self.root.join(filename)).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(format!("Failed to delete {}: {}", filename, e)),
        }
    }

    fn get_asset_url(&self, filename: &str) -> String {
        format!("/{}", filename)
    }

    fn public_url(&self, _filename: &str) -> Option<String> {
        None
    }

    fn artifact_path(&self, filename: &str) -> Option<PathBuf> {
        Some(self.root.join(filename))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_local_storage_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path()).unwrap();

        storage.upload_file("proposal_p1.pdf", b"%PDF-").await.unwrap();
        let path = storage.artifact_path("proposal_p1.pdf").unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"%PDF-");

        storage.delete_file("proposal_p1.pdf").await.unwrap();
        assert!(!path.exists());
        // deleting again is not an error
        storage.delete_file("proposal_p1.pdf").await.unwrap();
    }

    #[tokio::test]
    async fn test_local_storage_has_no_public_url() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalDiskStorage::new(dir.path()).unwrap();
        assert!(storage.public_url("proposal_p1.pdf").is_none());
        assert_eq!(storage.get_asset_url("uploads/a.png"), "/uploads/a.png");
    }

    #[test]
    fn test_supabase_public_url_shape() {
        let storage = SupabaseStorage::new(
            SupabaseConfig {
                url: "https://example.supabase.co".to_string(),
                api_key: "key".to_string(),
                bucket: "worknest".to_string(),
            },
            reqwest::Client::new(),
        );
        assert_eq!(
            storage.public_url("proposal_p1.pdf").unwrap(),
            "https://example.supabase.co/storage/v1/object/public/worknest/proposal_p1.pdf"
        );
    }
}
