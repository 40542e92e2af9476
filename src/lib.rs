use actix_cors::Cors;
use actix_web::middleware::Compress;
use actix_web::{web, App, HttpServer};
use actix_web_prometheus::PrometheusMetricsBuilder;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

pub mod access;
pub mod auth;
pub mod db;
pub mod pdf;
pub mod proposal;
pub mod renderer;
pub mod storage;
pub mod store;
pub mod template;
pub mod upload;

pub use crate::db::AppState;

use crate::renderer::{BrowserPool, RendererConfig};

#[derive(Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub timestamp: String,
}

impl ErrorResponse {
    pub fn new(error_type: &str, message: &str) -> Self {
        Self {
            error: error_type.to_string(),
            message: message.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn not_found(message: &str) -> Self {
        Self::new("NotFound", message)
    }

    pub fn bad_request(message: &str) -> Self {
        Self::new("BadRequest", message)
    }

    pub fn internal_error(message: &str) -> Self {
        Self::new("InternalServerError", message)
    }
}

/// Mount the HTTP surface. Shared between `run()` and the endpoint tests
/// so both exercise identical routing.
pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/generate-pdf/{proposal_id}")
            .route(web::post().to(proposal::handlers::generate_pdf)),
    )
    .service(web::resource("/secure-pdf/{token}").route(web::get().to(access::handlers::secure_pdf)))
    .service(web::resource("/upload").route(web::post().to(upload::handlers::upload_file)))
    .service(
        web::resource("/uploads/{filename:.*}")
            .route(web::get().to(upload::handlers::serve_upload)),
    );
}

pub async fn run() -> std::io::Result<()> {
    env_logger::init_from_env(env_logger::Env::default().default_filter_or("info"));
    dotenvy::dotenv().ok();

    #[derive(OpenApi)]
    #[openapi(
        paths(
            crate::proposal::handlers::generate_pdf,
            crate::access::handlers::secure_pdf,
            crate::upload::handlers::upload_file,
        ),
        components(
            schemas(
                proposal::models::Proposal,
                proposal::models::ServiceItem,
                proposal::models::Client,
                proposal::models::OwnerProfile,
                proposal::handlers::GeneratePdfResponse,
                upload::handlers::UploadResponse,
                upload::handlers::UploadFileRequest,
                ErrorResponse,
            )
        ),
        tags(
            (name = "PDF Service", description = "Proposal PDF generation and retrieval."),
            (name = "Upload Service", description = "Profile asset uploads.")
        )
    )]
    struct ApiDoc;

    // The renderer is launched before the server binds: a failed launch is
    // startup-fatal rather than a silently disabled PDF feature.
    let renderer = Arc::new(BrowserPool::new(RendererConfig::from_env()));
    if let Err(e) = renderer.initialize().await {
        log::error!("FATAL: failed to launch the PDF renderer: {}", e);
        std::process::exit(1);
    }

    let app_state = match AppState::new_with_config(renderer.clone()).await {
        Ok(state) => web::Data::new(state),
        Err(e) => {
            log::error!(
                "Failed to connect to the document store. Check DATABASE_URL in .env and ensure the database is running. Error: {}",
                e
            );
            renderer.shutdown().await;
            std::process::exit(1);
        }
    };

    let prometheus = PrometheusMetricsBuilder::new("worknest_server")
        .endpoint("/metrics")
        .build()
        .expect("Failed to create Prometheus metrics middleware");

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(8080);

    log::info!("Starting server at http://0.0.0.0:{}", port);

    let server = HttpServer::new(move || {
        let app_state = app_state.clone();
        let prometheus = prometheus.clone();
        let cors = Cors::permissive();

        App::new()
            .wrap(Compress::default())
            .wrap(prometheus)
            .wrap(cors)
            .app_data(app_state)
            .configure(configure_routes)
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}")
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
    })
    .bind(("0.0.0.0", port))?
    .run();

    let result = server.await;

    // Runs on normal termination signals as well, so the external renderer
    // process is never leaked.
    renderer.shutdown().await;
    result
}
