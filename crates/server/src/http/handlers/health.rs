use axum::{extract::State, http::StatusCode, Json};
use storage::Db;

pub async fn health(State(db): State<Db>) -> (StatusCode, Json<serde_json::Value>) {
    match db.ping().await {
        Ok(()) => (StatusCode::OK, Json(serde_json::json!({ "status": "ok" }))),
        Err(e) => {
            tracing::error!("Health check failed: {:?}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "status": "unavailable" })),
            )
        }
    }
}
