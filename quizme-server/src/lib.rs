//! QuizMe HTTP Server - embed API and viewer
//!
//! This crate serves quiz data to third-party embedders behind the access
//! gate, accepts domain registrations, and hosts the iframe viewer page.

pub mod api;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod state;
pub mod telemetry;
pub mod viewer;

pub use api::{HealthResponse, RegisterDomainRequest, SuccessResponse};
pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    http::{header, HeaderValue},
    routing::{get, post},
    Router,
};
use tower_http::{compression::CompressionLayer, set_header::SetResponseHeaderLayer, trace::TraceLayer};

/// Framing policy for every publicly embeddable response
pub const FRAME_ANCESTORS: &str = "frame-ancestors *;";

/// Build the application router
pub fn router(state: AppState) -> Router {
    let public = Router::new()
        .route(
            "/api/public/embed/:id",
            get(handlers::get_embed_quiz).post(handlers::register_domain),
        )
        .route("/api/public/embed/:id/domains", post(handlers::register_domain))
        .route("/embed/:id", get(handlers::embed_page))
        .layer(SetResponseHeaderLayer::overriding(
            header::CONTENT_SECURITY_POLICY,
            HeaderValue::from_static(FRAME_ANCESTORS),
        ));

    Router::new()
        .merge(public)
        // Health checks
        .route("/health/live", get(handlers::health_live))
        .route("/health/ready", get(handlers::health_ready))
        // Metrics
        .route("/metrics", get(handlers::metrics))
        .with_state(state)
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
}
