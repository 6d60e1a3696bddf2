pub mod api;
pub mod config;
pub mod entities;
pub mod infrastructure;
pub mod services;
pub mod utils;

use crate::config::AppConfig;
use crate::services::database::DatabaseService;
use crate::services::producer_service::ProducerService;
use crate::services::storage::StorageService;
use crate::services::upload_service::InvoiceUploadService;
use crate::services::webhook::WebhookClient;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::HeaderValue,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

/// Room for multipart boundaries and text fields on top of the file itself
const MULTIPART_OVERHEAD: usize = 1024 * 1024;

#[derive(OpenApi)]
#[openapi(
    paths(
        api::handlers::health::health_check,
        api::handlers::invoices::upload_invoice,
        api::handlers::invoices::process_invoice,
        api::handlers::invoices::get_invoice,
        api::handlers::producers::upload_logo,
        api::handlers::producers::get_producer,
        api::handlers::reference::list_currencies,
        api::handlers::reference::list_countries,
    ),
    components(
        schemas(
            api::handlers::health::HealthResponse,
            api::handlers::invoices::ProcessInvoiceRequest,
            api::handlers::invoices::ProcessInvoiceResponse,
            api::handlers::producers::LogoResponse,
            services::upload_service::UploadResult,
            services::producer_service::LogoType,
            entities::producers::Model,
            entities::invoices::Model,
            entities::currencies::Model,
            entities::countries::Model,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "invoices", description = "AI invoice intake"),
        (name = "producers", description = "Producer branding"),
        (name = "reference", description = "Currencies and countries"),
        (name = "system", description = "Service health")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "jwt",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub uploads: Arc<InvoiceUploadService>,
    pub producers: Arc<ProducerService>,
    pub webhook: Arc<WebhookClient>,
    pub config: AppConfig,
}

impl AppState {
    /// Wires the services on top of the given collaborators
    pub fn new(
        db: Arc<dyn DatabaseService>,
        storage: Arc<dyn StorageService>,
        webhook: Arc<WebhookClient>,
        config: AppConfig,
    ) -> Self {
        let uploads = Arc::new(InvoiceUploadService::new(
            storage.clone(),
            config.storage.clone(),
            config.max_file_size,
        ));
        let producers = Arc::new(ProducerService::new(
            db.clone(),
            storage,
            config.storage.clone(),
            config.max_file_size,
        ));

        Self {
            db,
            uploads,
            producers,
            webhook,
            config,
        }
    }
}

fn cors_layer(config: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|o| HeaderValue::from_str(o).ok())
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

pub fn create_app(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/api/invoices/:id",
            get(api::handlers::invoices::get_invoice),
        )
        .route(
            "/api/producers/:id",
            get(api::handlers::producers::get_producer),
        )
        .route(
            "/api/producers/:id/logo",
            post(api::handlers::producers::upload_logo),
        )
        .route(
            "/api/currencies",
            get(api::handlers::reference::list_currencies),
        )
        .route(
            "/api/countries",
            get(api::handlers::reference::list_countries),
        )
        .route_layer(from_fn_with_state(
            state.clone(),
            api::middleware::auth::auth_middleware,
        ));

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .route("/health", get(api::handlers::health::health_check))
        .route(
            "/api/invoices/ai-upload",
            post(api::handlers::invoices::upload_invoice),
        )
        .route(
            "/api/invoices/ai-process",
            post(api::handlers::invoices::process_invoice),
        )
        .merge(protected)
        .layer(from_fn(api::middleware::request_id::request_id_middleware))
        .layer(cors_layer(&state.config))
        .layer(DefaultBodyLimit::max(
            state.config.max_file_size + MULTIPART_OVERHEAD,
        ))
        .with_state(state)
}
