//! Token-gated access to locally persisted artifacts.
//!
//! When artifacts live on private/local storage they are retrieved through
//! short-lived capability tokens instead of public URLs. Issuing a token
//! writes a sidecar record (`proposal_{id}.token.json`) next to the
//! artifact and caches the mapping in memory; resolution prefers the cache
//! and falls back to the sidecar files, so tokens survive a process
//! restart. Tokens are single-purpose: a new render issues a new token and
//! nothing here renews or garbage-collects old ones.

pub mod handlers;

use std::path::PathBuf;
use std::time::Duration;

use base64::Engine as _;
use chrono::{DateTime, Utc};
use moka::future::Cache;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Access window for one token.
pub const TOKEN_TTL_SECS: i64 = 10 * 60;

const TOKEN_BYTES: usize = 32;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("unknown access token")]
    NotFound,
    #[error("access token has expired")]
    Expired,
    #[error("token record I/O failed: {0}")]
    Io(#[from] std::io::Error),
    #[error("token record is malformed: {0}")]
    Record(#[from] serde_json::Error),
}

/// Sidecar record mapping a token to the artifact it unlocks.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenRecord {
    pub token: String,
    pub pdf_path: PathBuf,
    pub expires_at: DateTime<Utc>,
}

/// Issues and resolves artifact access tokens.
pub struct ArtifactTokens {
    dir: PathBuf,
    cache: Cache<String, TokenRecord>,
}

impl ArtifactTokens {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let cache = Cache::builder()
            .time_to_live(Duration::from_secs(TOKEN_TTL_SECS as u64))
            .max_capacity(10_000)
            .build();
        Self {
            dir: dir.into(),
            cache,
        }
    }

    /// Mint a fresh token for the artifact and persist its sidecar record.
    ///
    /// Issuing twice for the same artifact yields two distinct tokens,
    /// each valid until its own expiry.
    pub async fn issue(
        &self,
        proposal_id: &str,
        pdf_path: PathBuf,
    ) -> Result<TokenRecord, TokenError> {
        let record = TokenRecord {
            token: generate_token(),
            pdf_path,
            expires_at: Utc::now() + chrono::Duration::seconds(TOKEN_TTL_SECS),
        };

        tokio::fs::create_dir_all(&self.dir).await?;
        let sidecar = self.dir.join(sidecar_name(proposal_id));
        tokio::fs::write(&sidecar, serde_json::to_vec_pretty(&record)?).await?;

        self.cache
            .insert(record.token.clone(), record.clone())
            .await;
        log::debug!(
            "Issued access token for proposal {} (expires {})",
            proposal_id,
            record.expires_at
        );
        Ok(record)
    }

    /// Resolve a token against the current instant.
    pub async fn resolve(&self, token: &str) -> Result<TokenRecord, TokenError> {
        self.resolve_at(token, Utc::now()).await
    }

    /// Resolve a token, checking expiry against the supplied instant.
    ///
    /// A token is rejected only when strictly `now > expires_at`; at the
    /// exact expiry instant it still resolves.
    pub async fn resolve_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<TokenRecord, TokenError> {
        let record = match self.cache.get(token).await {
            Some(record) => record,
            None => self
                .find_in_sidecars(token)
                .await?
                .ok_or(TokenError::NotFound)?,
        };

        if now > record.expires_at {
            return Err(TokenError::Expired);
        }
        Ok(record)
    }

    async fn find_in_sidecars(&self, token: &str) -> Result<Option<TokenRecord>, TokenError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.ends_with(".token.json") {
                continue;
            }
            let bytes = tokio::fs::read(entry.path()).await?;
            match serde_json::from_slice::<TokenRecord>(&bytes) {
                Ok(record) if record.token == token => return Ok(Some(record)),
                Ok(_) => {}
                Err(e) => {
                    log::warn!("Skipping malformed token record {}: {}", name, e);
                }
            }
        }
        Ok(None)
    }
}

fn sidecar_name(proposal_id: &str) -> String {
    format!("proposal_{}.token.json", proposal_id)
}

fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_issue_writes_sidecar_record() {
        let dir = tempfile::tempdir().unwrap();
        let tokens = ArtifactTokens::new(dir.path());
        let pdf = dir.path().join("proposal_p1.pdf");

        let record = tokens.issue("p1", pdf.clone()).await.unwrap();

        let sidecar = dir.path().join("proposal_p1.token.json");
        assert!(sidecar.exists());
        let stored: TokenRecord =
            serde_json::from_slice(&std::fs::read(&sidecar).unwrap()).unwrap();
        assert_eq!(stored.token, record.token);
        assert_eq!(stored.pdf_path, pdf);
    }

    #[tokio::test]
    async fn test_tokens_are_distinct_per_issue() {
        let dir = tempfile::tempdir().unwrap();
        let tokens = ArtifactTokens::new(dir.path());
        let pdf = dir.path().join("proposal_p1.pdf");

        let first = tokens.issue("p1", pdf.clone()).await.unwrap();
        let second = tokens.issue("p1", pdf).await.unwrap();

        assert_ne!(first.token, second.token);
        // both resolve independently
        tokens.resolve(&first.token).await.unwrap();
        tokens.resolve(&second.token).await.unwrap();
    }

    #[tokio::test]
    async fn test_unknown_token_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let tokens = ArtifactTokens::new(dir.path());
        let err = tokens.resolve("nope").await.unwrap_err();
        assert!(matches!(err, TokenError::NotFound));
    }

    #[tokio::test]
    async fn test_expiry_boundary_is_strictly_after() {
        let dir = tempfile::tempdir().unwrap();
        let tokens = ArtifactTokens::new(dir.path());
        let record = tokens
            .issue("p1", dir.path().join("proposal_p1.pdf"))
            .await
            .unwrap();

        // at the exact expiry instant the token still resolves
        tokens
            .resolve_at(&record.token, record.expires_at)
            .await
            .unwrap();

        // one second past it, it is expired even though the record exists
        let err = tokens
            .resolve_at(
                &record.token,
                record.expires_at + chrono::Duration::seconds(1),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, TokenError::Expired));
    }

    #[tokio::test]
    async fn test_resolve_falls_back_to_sidecar_files() {
        let dir = tempfile::tempdir().unwrap();
        let issued = ArtifactTokens::new(dir.path());
        let record = issued
            .issue("p1", dir.path().join("proposal_p1.pdf"))
            .await
            .unwrap();

        // a fresh gateway (empty cache) simulates a process restart
        let fresh = ArtifactTokens::new(dir.path());
        let resolved = fresh.resolve(&record.token).await.unwrap();
        assert_eq!(resolved.pdf_path, record.pdf_path);
    }
}
