use axum::Json;
use serde_json::{json, Value};

/// GET /health and /api/health. Liveness only, the store is not touched.
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
