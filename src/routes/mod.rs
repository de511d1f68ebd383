pub mod cache;
pub mod connectivity;
pub mod dashboard;
pub mod health;

use axum::{
    Router,
    routing::{get, post},
};
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::common::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthz,
        dashboard::get_dashboard,
        dashboard::get_sensor,
        connectivity::get_connectivity,
        connectivity::reconnect,
        cache::cache_stats,
        cache::clear_cache,
    ),
    components(
        schemas(
            dashboard::DashboardResponse,
            crate::common::DashboardSnapshot,
            crate::common::PanelTimes,
            crate::common::PressurePanel,
            crate::common::PressureStatus,
            crate::services::stabilizer::StabilizedReading,
            crate::services::stabilizer::ReadingSource,
            crate::services::monitor::ConnectivityStatus,
            crate::services::monitor::Connectivity,
            crate::services::cache::CacheStats,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "dashboard", description = "Consolidated plant telemetry snapshot"),
        (name = "connectivity", description = "Backend link state and manual reconnect"),
        (name = "cache", description = "Request cache inspection"),
    ),
    info(
        title = "SIBIA Gateway API",
        description = "Resilient polling gateway for SIBIA biogas plant telemetry",
        version = "0.1.0"
    )
)]
struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/dashboard", get(dashboard::get_dashboard))
        .route("/sensors/{sensor_id}", get(dashboard::get_sensor))
        .route("/connectivity", get(connectivity::get_connectivity))
        .route("/connectivity/reconnect", post(connectivity::reconnect))
        .route("/cache/stats", get(cache::cache_stats))
        .route("/cache/clear", post(cache::clear_cache))
        .layer(RequestBodyLimitLayer::new(64 * 1024)); // no request bodies expected

    // Health check route kept outside /api for probes
    let health_routes = Router::new().route("/healthz", get(health::healthz));

    // OpenAPI documentation
    let docs_routes = Router::new().merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(docs_routes)
        .layer(CompressionLayer::new())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
