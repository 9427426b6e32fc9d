use crate::AppState;
use axum::{extract::Extension, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;

pub fn status_routes() -> Router {
    Router::new().route("/api/status", get(api_status))
}

// API Status endpoint
async fn api_status(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    let gemini_status = if state.gemini_client.is_some() { "configured" } else { "not_configured" };
    let poll = &state.config.poll;

    Json(json!({
        "status": "operational",
        "version": env!("CARGO_PKG_VERSION"),
        "services": {
            "gemini_ai": gemini_status,
        },
        "models": {
            "text": state.config.gemini.text_model,
            "image": state.config.gemini.image_model,
            "video": state.config.gemini.video_model,
        },
        "video_polling": {
            "interval_seconds": poll.interval.as_secs(),
            "timeout_seconds": poll.timeout.map(|t| t.as_secs()),
        },
        "media_items": state.media.len().await,
        "endpoints": {
            "form": "/",
            "status": "/api/status",
            "generate": "/api/generate",
            "concept": "/api/concept",
            "uploads": "/api/uploads",
            "scenes": "/api/scenes/*",
            "jobs": "/api/jobs/*"
        }
    }))
}
