use crate::error::{ApiError, ApiResult};
use crate::models::{AdGenRequest, AdPackage, CreativeOutput};
use crate::services::AdGenerationService;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Extension},
    response::Json,
    routing::post,
    Router,
};
use std::sync::Arc;

pub fn generate_routes() -> Router {
    Router::new()
        .route("/api/generate", post(generate_ad_package))
        .route("/api/concept", post(generate_concept))
}

fn validate(request: &AdGenRequest) -> ApiResult<()> {
    let missing = request.missing_required_fields();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ApiError::bad_request(format!(
            "Missing required fields: {}",
            missing.join(", ")
        )))
    }
}

/// POST /api/generate - full multi-channel ad package
pub async fn generate_ad_package(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<AdGenRequest>, JsonRejection>,
) -> ApiResult<Json<AdPackage>> {
    let Json(request) = payload?;
    validate(&request)?;

    let service = AdGenerationService::new(state.gemini_client.as_ref(), &state.media);
    let package = service.generate_ad_package(&request).await.map_err(|e| {
        tracing::error!("Error generating ad package: {}", e);
        ApiError::from(e)
    })?;

    tracing::info!(
        variants = package.variants.len(),
        "✅ Ad package generated: {}",
        package.campaign_brief.title
    );
    Ok(Json(package))
}

/// POST /api/concept - single ad concept with a three-scene storyboard
pub async fn generate_concept(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<AdGenRequest>, JsonRejection>,
) -> ApiResult<Json<CreativeOutput>> {
    let Json(request) = payload?;
    validate(&request)?;

    let service = AdGenerationService::new(state.gemini_client.as_ref(), &state.media);
    let concept = service.generate_creative_concept(&request).await.map_err(|e| {
        tracing::error!("Error generating creative concept: {}", e);
        ApiError::from(e)
    })?;

    Ok(Json(concept))
}
