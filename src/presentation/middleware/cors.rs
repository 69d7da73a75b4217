//! CORS Middleware Configuration

use axum::http::Method;
use tower_http::cors::{Any, CorsLayer};

use crate::config::settings::CorsSettings;

/// Create CORS layer from settings.
///
/// The admin surface only speaks GET/POST/PATCH; the gateway upgrade is a
/// GET. An empty origin list opens the surface up for local development.
pub fn create_cors_layer(settings: &CorsSettings) -> CorsLayer {
    let methods = [Method::GET, Method::POST, Method::PATCH];

    let origins: Vec<_> = settings
        .allowed_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(methods)
            .allow_headers(Any)
    } else {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(methods)
            .allow_headers(Any)
            .max_age(std::time::Duration::from_secs(3600))
    }
}
