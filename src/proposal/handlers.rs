use actix_web::{web, HttpResponse, Responder};
use log::{error, info};
use serde::Serialize;
use utoipa::ToSchema;

use crate::db::AppState;
use crate::ErrorResponse;

#[derive(Serialize, ToSchema)]
pub struct GeneratePdfResponse {
    #[schema(example = "/secure-pdf/3Zl0…")]
    pub url: String,
}

#[utoipa::path(
    tag = "PDF Service",
    post,
    path = "/generate-pdf/{proposal_id}",
    responses(
        (status = 200, description = "Artifact generated; JSON URL or raw PDF bytes", body = GeneratePdfResponse),
        (status = 404, description = "Proposal or client not found", body = ErrorResponse),
        (status = 500, description = "Renderer or store failure", body = ErrorResponse)
    ),
    params(
        ("proposal_id" = String, Path, description = "ID of the proposal to render")
    )
)]
pub async fn generate_pdf(path: web::Path<String>, data: web::Data<AppState>) -> impl Responder {
    let proposal_id = path.into_inner();
    info!("Executing generate_pdf handler for proposal: {}", proposal_id);

    match data.pdf.generate(&proposal_id).await {
        Ok(artifact) => match &artifact.url {
            Some(url) => {
                info!(
                    "Generated artifact {} for proposal {}",
                    artifact.filename, proposal_id
                );
                HttpResponse::Ok()
                    .insert_header(("X-Artifact-Url", url.as_str()))
                    .json(GeneratePdfResponse { url: url.clone() })
            }
            // Persistence failed; hand the caller the bytes directly.
            None => HttpResponse::Ok()
                .content_type("application/pdf")
                .insert_header((
                    "Content-Disposition",
                    format!("attachment; filename=\"{}\"", artifact.filename),
                ))
                .body(artifact.bytes),
        },
        Err(e) if e.is_not_found() => {
            error!("Record missing for proposal {}: {}", proposal_id, e);
            HttpResponse::NotFound().json(ErrorResponse::not_found(&e.to_string()))
        }
        Err(e) => {
            // Full context stays in the log; the response carries no
            // internal paths or renderer details.
            error!("PDF generation failed for proposal {}: {}", proposal_id, e);
            HttpResponse::InternalServerError()
                .json(ErrorResponse::internal_error("PDF generation failed"))
        }
    }
}
