pub mod auth;
pub mod clients;
pub mod config;
pub mod docs;
pub mod error;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;
pub mod session;
pub mod state;
pub mod store;
pub mod ws;

use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::get;
use axum::Router;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::config::Config;
use crate::docs::ApiDoc;
use crate::handlers::{health_check, ready_check};
use crate::routes::create_api_routes;
use crate::state::AppState;

/// Build the complete application router.
pub fn build_app(state: AppState) -> Router {
    let cors = build_cors_layer(&state.config);
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        // Mount API routes
        .nest("/api", create_api_routes(state.clone()))
        // Mount Swagger UI
        .merge(SwaggerUi::new("/swagger").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Any origin when none are configured, otherwise the configured list with credentials.
pub fn build_cors_layer(config: &Config) -> CorsLayer {
    let configured = config.cors_origin_list();
    let methods = [Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS];
    if configured.is_empty() {
        return CorsLayer::new().allow_origin(Any).allow_methods(methods).allow_headers(Any);
    }
    let origins: Vec<HeaderValue> = configured
        .iter()
        .filter_map(|o| match o.parse() {
            Ok(origin) => Some(origin),
            Err(e) => {
                warn!("Ignoring invalid CORS origin '{}': {}", o, e);
                None
            }
        })
        .collect();
    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(methods)
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .allow_credentials(true)
        .max_age(Duration::from_secs(3600))
}
