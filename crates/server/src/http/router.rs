use super::handlers::{comments, health};
use crate::state::AppState;
use axum::{
    http::{HeaderValue, Method},
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

pub fn build_router(state: AppState, allowed_origins: &str) -> Router {
    Router::new()
        .route("/api/comment/new", post(comments::post_comment))
        .route("/api/health", get(health::health))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(allowed_origins))
        .with_state(state)
}

// Embedding pages live on other origins, so "*" is the default.
fn cors_layer(allowed_origins: &str) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty() && *s != "*")
        .filter_map(|s| s.parse().ok())
        .collect();

    let allow = if origins.is_empty() {
        if allowed_origins.trim() != "*" {
            tracing::warn!("No usable CORS origin in {:?}, allowing any", allowed_origins);
        }
        AllowOrigin::from(Any)
    } else {
        tracing::info!("CORS restricted to {:?}", origins);
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_origin(allow)
        .allow_headers(Any)
}
