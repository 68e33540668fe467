use axum::Json;
use serde_json::{json, Value};

/// Body returned by every `GET /api/v1/health`.
pub fn status(service: &'static str) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "service": service
    }))
}
