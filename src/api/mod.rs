use axum::{Router, http::HeaderValue, middleware, routing::get};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::catalog::Catalog;
use crate::config::Config;
use crate::constants::paths::{API_PREFIX, THUMBS_PREFIX};

mod anime;
mod error;
mod health;
mod home;
mod observability;
mod validation;

pub use error::ApiError;
pub use observability::ListStats;

/// State shared by every handler.
///
/// The catalog is never written after startup, so handlers only ever take
/// shared references into it and no lock is needed.
pub struct AppState {
    pub config: Arc<Config>,

    pub catalog: Arc<Catalog>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

#[must_use]
pub fn create_app_state(
    config: Config,
    catalog: Catalog,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        config: Arc::new(config),
        catalog: Arc::new(catalog),
        start_time: std::time::Instant::now(),
        prometheus_handle,
    })
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors_origins = &state.config.server.cors_allowed_origins;
    let cors_layer = if cors_origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    let thumbs = ServeDir::new(&state.config.catalog.thumbs_path);

    let api_router = Router::new()
        .route("/animes", get(anime::list_animes))
        .route("/animes/{id}", get(anime::get_anime))
        .route("/health", get(health::get_health))
        .route("/metrics", get(observability::get_metrics));

    Router::new()
        .route("/", get(home::home))
        .nest(API_PREFIX, api_router)
        .nest_service(THUMBS_PREFIX, thumbs)
        .with_state(state)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}
