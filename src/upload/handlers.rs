use actix_multipart::Multipart;
use actix_web::{web, HttpRequest, HttpResponse, Responder};
use log::{error, info};
use sanitize_filename::sanitize;
use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use super::{read_file_field, UploadError};
use crate::auth::middleware::validate_request_token;
use crate::db::AppState;
use crate::storage::UPLOADS_PREFIX;
use crate::ErrorResponse;

#[derive(Serialize, ToSchema)]
pub struct UploadResponse {
    #[schema(example = "File uploaded successfully!")]
    pub message: String,
    #[schema(example = "/uploads/logo.png")]
    pub url: String,
}

#[derive(Debug, serde::Deserialize, ToSchema)]
pub struct UploadFileRequest {
    #[allow(unused)]
    pub file: Vec<u8>,
}

#[utoipa::path(
    tag = "Upload Service",
    post,
    path = "/upload",
    request_body(content = inline(UploadFileRequest), content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "File uploaded successfully", body = UploadResponse),
        (status = 400, description = "Missing or oversized file", body = ErrorResponse),
        (status = 401, description = "Missing or invalid bearer token", body = ErrorResponse),
        (status = 500, description = "Storage failure", body = ErrorResponse)
    ),
    security(("bearer_token" = []))
)]
pub async fn upload_file(
    req: HttpRequest,
    payload: Multipart,
    data: web::Data<AppState>,
) -> impl Responder {
    info!("Executing upload_file handler");

    let claims = match validate_request_token(&req) {
        Ok(claims) => claims,
        Err(e) => {
            return HttpResponse::Unauthorized()
                .json(ErrorResponse::new("Unauthorized", &e.to_string()));
        }
    };

    let (original_filename, file_data) = match read_file_field(payload).await {
        Ok(parts) => parts,
        Err(e @ (UploadError::TooLarge | UploadError::MissingFile)) => {
            // The size cap is reported distinctly from generic failures.
            return HttpResponse::BadRequest().json(ErrorResponse::bad_request(&e.to_string()));
        }
        Err(e) => {
            error!("Failed to parse upload payload: {}", e);
            return HttpResponse::BadRequest().json(ErrorResponse::bad_request(&e.to_string()));
        }
    };

    let filename = format!(
        "{}/{}_{}",
        UPLOADS_PREFIX,
        Uuid::new_v4(),
        sanitize(&original_filename)
    );

    if let Err(e) = data.storage.upload_file(&filename, &file_data).await {
        error!("Upload to storage failed for user {}: {}", claims.sub, e);
        return HttpResponse::InternalServerError()
            .json(ErrorResponse::internal_error("Upload failed"));
    }

    let url = data.storage.get_asset_url(&filename);
    info!("User {} uploaded {} ({} bytes)", claims.sub, filename, file_data.len());
    HttpResponse::Ok().json(UploadResponse {
        message: "File uploaded successfully!".to_string(),
        url,
    })
}

/// Serve an uploaded asset. Local files stream from disk; an object-store
/// backend answers with a redirect to the public URL.
pub async fn serve_upload(req: HttpRequest, data: web::Data<AppState>) -> impl Responder {
    let filename: String = req.match_info().query("filename").into();
    let key = format!("{}/{}", UPLOADS_PREFIX, sanitize(&filename));

    if let Some(path) = data.storage.artifact_path(&key) {
        return match tokio::fs::read(&path).await {
            Ok(bytes) => {
                let content_type = mime_guess::from_path(&path)
                    .first_or_octet_stream()
                    .to_string();
                HttpResponse::Ok().content_type(content_type).body(bytes)
            }
            Err(_) => HttpResponse::NotFound()
                .json(ErrorResponse::not_found(&format!("'{}' not found", filename))),
        };
    }

    match data.storage.public_url(&key) {
        Some(url) => HttpResponse::TemporaryRedirect()
            .append_header(("Location", url))
            .finish(),
        None => HttpResponse::NotFound()
            .json(ErrorResponse::not_found(&format!("'{}' not found", filename))),
    }
}
