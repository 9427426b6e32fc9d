use crate::error::{ApiError, ApiResult};
use crate::media::{self, MediaKind, UploadedImage};
use crate::AppState;
use axum::{
    body::Body,
    extract::{multipart::Multipart, DefaultBodyLimit, Extension, Path},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{delete, get, post},
    Router,
};
use std::sync::Arc;

pub fn upload_routes() -> Router {
    Router::new()
        .route("/api/uploads", post(upload_images))
        .route("/api/uploads/:id", delete(remove_upload))
        .route("/media/:id", get(serve_media).delete(remove_video))
        .layer(DefaultBodyLimit::max(100 * 1024 * 1024)) // 100MB per request; per-file limit checked below
}

/// POST /api/uploads - store dropped images and return their previews
///
/// The batch is all-or-nothing: a non-image or oversized file rejects the
/// whole request before anything is stored.
pub async fn upload_images(
    Extension(state): Extension<Arc<AppState>>,
    mut multipart: Multipart,
) -> ApiResult<Json<Vec<UploadedImage>>> {
    let max_bytes = state.config.max_upload_bytes;
    let mut accepted = Vec::new();
    let mut rejected = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(format!("Invalid multipart body: {}", e)))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            continue;
        };
        let declared = field.content_type().map(str::to_string);

        let Some(mime_type) = media::image_mime_type(&file_name, declared.as_deref()) else {
            tracing::warn!("Rejected file '{}' with unsupported type: {:?}", file_name, declared);
            rejected.push(file_name);
            continue;
        };

        let data = field
            .bytes()
            .await
            .map_err(|e| ApiError::bad_request(format!("Failed to read '{}': {}", file_name, e)))?;

        if data.len() > max_bytes {
            return Err(ApiError::PayloadTooLarge(format!(
                "'{}' is larger than the {} limit",
                file_name,
                size_label(max_bytes)
            )));
        }

        accepted.push((file_name, mime_type, data));
    }

    if !rejected.is_empty() {
        return Err(ApiError::bad_request(format!(
            "Only image files can be uploaded; rejected: {}",
            rejected.join(", ")
        )));
    }
    if accepted.is_empty() {
        return Err(ApiError::bad_request("No image files were uploaded"));
    }

    let mut uploaded = Vec::with_capacity(accepted.len());
    for (file_name, mime_type, data) in accepted {
        let entry = state
            .media
            .insert(MediaKind::Upload, file_name, mime_type, data.to_vec())
            .await;
        uploaded.push(UploadedImage::from(&entry));
    }

    tracing::info!("📁 Uploaded {} image(s)", uploaded.len());
    Ok(Json(uploaded))
}

fn size_label(bytes: usize) -> String {
    const MB: usize = 1024 * 1024;
    if bytes >= MB && bytes % MB == 0 {
        format!("{} MB", bytes / MB)
    } else {
        format!("{} bytes", bytes)
    }
}

/// DELETE /api/uploads/:id - remove an image and revoke its preview
pub async fn remove_upload(
    Path(id): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    match state.media.get(&id).await {
        Some(entry) if entry.kind == MediaKind::Upload => {
            state.media.revoke(&id).await;
            Ok(StatusCode::NO_CONTENT)
        }
        _ => Err(ApiError::not_found(format!("Upload {} not found", id))),
    }
}

/// DELETE /media/:id - release a generated video the page no longer shows
pub async fn remove_video(
    Path(id): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<StatusCode> {
    match state.media.get(&id).await {
        Some(entry) if entry.kind == MediaKind::Video => {
            state.media.revoke(&id).await;
            Ok(StatusCode::NO_CONTENT)
        }
        _ => Err(ApiError::not_found(format!("Video {} not found", id))),
    }
}

/// GET /media/:id - serve an upload preview or a generated video
pub async fn serve_media(
    Path(id): Path<String>,
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Response> {
    let entry = state
        .media
        .get(&id)
        .await
        .ok_or_else(|| ApiError::not_found(format!("Media {} not found", id)))?;

    let etag = format!("\"{}\"", entry.etag);
    let not_modified = headers
        .get(header::IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == etag)
        .unwrap_or(false);

    if not_modified {
        return Ok((StatusCode::NOT_MODIFIED, [(header::ETAG, etag)]).into_response());
    }

    Ok((
        [
            (header::CONTENT_TYPE, entry.mime_type.clone()),
            (header::ETAG, etag),
            (header::CACHE_CONTROL, "private, max-age=3600".to_string()),
        ],
        Body::from(entry.bytes.as_ref().clone()),
    )
        .into_response())
}
