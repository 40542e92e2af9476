//! Ancillary uploads (profile/logo images) and their serving route.

pub mod handlers;

use actix_multipart::Multipart;
use futures::TryStreamExt;
use thiserror::Error;

/// Hard cap for one uploaded file.
pub const MAX_UPLOAD_BYTES: usize = 1024 * 1024;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("File is too large. Maximum size is 1MB.")]
    TooLarge,
    #[error("No file was uploaded.")]
    MissingFile,
    #[error("Multipart field error: {0}")]
    Field(String),
}

/// Pull the `file` field out of a multipart payload, enforcing the size
/// cap while streaming so an oversized body is rejected before it is
/// buffered whole.
pub async fn read_file_field(
    mut payload: Multipart,
) -> Result<(String, Vec<u8>), UploadError> {
    let mut file: Option<(String, Vec<u8>)> = None;

    while let Some(mut field) = payload
        .try_next()
        .await
        .map_err(|e| UploadError::Field(e.to_string()))?
    {
        let content_disposition = field
            .content_disposition()
            .ok_or_else(|| UploadError::Field("Content-Disposition not set".to_string()))?;
        let field_name = content_disposition
            .get_name()
            .ok_or_else(|| UploadError::Field("Field name not found".to_string()))?;
        if field_name != "file" {
            continue;
        }

        let filename = content_disposition
            .get_filename()
            .ok_or_else(|| UploadError::Field("No filename in file field".to_string()))?
            .to_string();

        let mut buffer = Vec::new();
        while let Some(chunk) = field
            .try_next()
            .await
            .map_err(|e| UploadError::Field(e.to_string()))?
        {
            if buffer.len() + chunk.len() > MAX_UPLOAD_BYTES {
                return Err(UploadError::TooLarge);
            }
            buffer.extend_from_slice(&chunk);
        }

        file = Some((filename, buffer));
    }

    file.ok_or(UploadError::MissingFile)
}
