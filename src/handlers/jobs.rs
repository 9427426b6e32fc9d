// src/handlers/jobs.rs
//! Job endpoints - status and cancel

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use crate::error::ApiError;
use crate::AppState;
use crate::jobs::JobId;

/// GET /api/jobs/:job_id - Get job status
pub async fn get_job_status(
    Path(job_id): Path<JobId>,
    Extension(state): Extension<Arc<AppState>>,
) -> impl IntoResponse {
    match state.job_manager.get_job(&job_id).await {
        Some(job) => (StatusCode::OK, Json(job)).into_response(),
        None => ApiError::not_found("Job not found").into_response(),
    }
}

/// POST /api/jobs/:job_id/cancel - Stop a running video job
pub async fn cancel_job(
    Path(job_id): Path<JobId>,
    Extension(state): Extension<Arc<AppState>>,
) -> impl IntoResponse {
    if state.job_manager.get_job(&job_id).await.is_none() {
        return ApiError::not_found("Job not found").into_response();
    }

    match state.job_manager.cancel(&job_id).await {
        Ok(_) => {
            tracing::info!("Job {} cancellation requested", job_id);
            match state.job_manager.get_job(&job_id).await {
                Some(job) => (StatusCode::OK, Json(job)).into_response(),
                None => StatusCode::NO_CONTENT.into_response(),
            }
        }
        Err(e) => {
            tracing::warn!("Failed to cancel job {}: {}", job_id, e);
            ApiError::bad_request(e).into_response()
        }
    }
}

/// Routes for job management
pub fn job_routes() -> Router {
    Router::new()
        .route("/api/jobs/:job_id", get(get_job_status))
        .route("/api/jobs/:job_id/cancel", post(cancel_job))
}
