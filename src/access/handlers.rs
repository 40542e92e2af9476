use actix_web::{web, HttpResponse, Responder};
use log::{error, info};

use super::TokenError;
use crate::db::AppState;
use crate::ErrorResponse;

#[utoipa::path(
    tag = "PDF Service",
    get,
    path = "/secure-pdf/{token}",
    responses(
        (status = 200, description = "PDF streamed inline"),
        (status = 403, description = "Access token expired", body = ErrorResponse),
        (status = 404, description = "Unknown access token", body = ErrorResponse),
        (status = 500, description = "Internal Server Error", body = ErrorResponse)
    ),
    params(
        ("token" = String, Path, description = "Capability token issued by a render")
    )
)]
pub async fn secure_pdf(token: web::Path<String>, data: web::Data<AppState>) -> impl Responder {
    let token = token.into_inner();
    info!("Executing secure_pdf handler");

    let record = match data.tokens.resolve(&token).await {
        Ok(record) => record,
        Err(TokenError::Expired) => {
            return HttpResponse::Forbidden().json(ErrorResponse::new(
                "Forbidden",
                "Access token has expired",
            ));
        }
        Err(TokenError::NotFound) => {
            return HttpResponse::NotFound()
                .json(ErrorResponse::not_found("Unknown access token"));
        }
        Err(e) => {
            error!("Token resolution failed: {}", e);
            return HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("Failed to resolve token"));
        }
    };

    let filename = record
        .pdf_path
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("proposal.pdf")
        .to_string();

    match tokio::fs::read(&record.pdf_path).await {
        Ok(bytes) => HttpResponse::Ok()
            .content_type("application/pdf")
            .insert_header((
                "Content-Disposition",
                format!("inline; filename=\"{}\"", filename),
            ))
            .body(bytes),
        Err(e) => {
            error!(
                "Token resolved but artifact {} is unreadable: {}",
                record.pdf_path.display(),
                e
            );
            HttpResponse::NotFound().json(ErrorResponse::not_found("Artifact no longer exists"))
        }
    }
}
