use crate::error::{ApiError, ApiResult};
use crate::jobs::video_job::VideoGenerationJob;
use crate::models::SceneMediaRequest;
use crate::services::{AdGenerationService, GenerationError};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::Json,
    routing::post,
    Router,
};
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
pub struct SceneImageResponse {
    pub image_url: String,
}

#[derive(Serialize)]
pub struct SceneVideoResponse {
    pub job_id: String,
    pub status_url: String,
}

pub fn scene_routes() -> Router {
    Router::new()
        .route("/api/scenes/image", post(generate_scene_image))
        .route("/api/scenes/video", post(generate_scene_video))
}

fn validate(scene: &SceneMediaRequest) -> ApiResult<()> {
    if scene.shot_type.trim().is_empty() || scene.action.trim().is_empty() {
        return Err(ApiError::bad_request("Scene needs a shot_type and an action"));
    }
    Ok(())
}

/// POST /api/scenes/image - generate a still for one storyboard scene
pub async fn generate_scene_image(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<SceneMediaRequest>, JsonRejection>,
) -> ApiResult<Json<SceneImageResponse>> {
    let Json(scene) = payload?;
    validate(&scene)?;

    let service = AdGenerationService::new(state.gemini_client.as_ref(), &state.media);
    let image_url = service.generate_scene_image(&scene).await?;
    Ok(Json(SceneImageResponse { image_url }))
}

/// POST /api/scenes/video - start a background video job for one scene
pub async fn generate_scene_video(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<SceneMediaRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SceneVideoResponse>)> {
    let Json(scene) = payload?;
    validate(&scene)?;

    if state.gemini_client.is_none() {
        return Err(GenerationError::MissingApiKey.into());
    }

    let job_id = VideoGenerationJob::spawn(state.clone(), scene).await;
    Ok((
        StatusCode::ACCEPTED,
        Json(SceneVideoResponse {
            status_url: format!("/api/jobs/{}", job_id),
            job_id,
        }),
    ))
}
