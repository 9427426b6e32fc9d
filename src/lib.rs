// lib.rs - AdGen service: campaign generation over Gemini, Imagen and Veo
pub mod config;
pub mod error;
pub mod gemini_client;
pub mod handlers;
pub mod jobs;
pub mod media;
pub mod middleware;
pub mod models;
pub mod prompt;
pub mod services;
pub mod video_poll;

use axum::{Extension, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use config::AppConfig;
use gemini_client::GeminiClient;
use jobs::{JobManager, SharedJobManager};
use media::MediaStore;

// AppState holds the Gemini client (absent when no key is configured), uploaded
// and generated media, and the scene video job manager
pub struct AppState {
    pub config: AppConfig,
    pub gemini_client: Option<GeminiClient>,
    pub media: MediaStore,
    pub job_manager: SharedJobManager,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let gemini_client = config
            .gemini
            .api_key
            .clone()
            .map(|api_key| GeminiClient::new(api_key, &config.gemini));

        Self {
            config,
            gemini_client,
            media: MediaStore::new(),
            job_manager: Arc::new(JobManager::new()),
        }
    }

    /// Drop finished jobs older than `max_age_hours` along with their videos,
    /// and uploads nobody removed within the same window.
    pub async fn cleanup_expired(&self, max_age_hours: i64) {
        let removed = self.job_manager.cleanup_old_jobs(max_age_hours).await;
        let mut videos = 0;
        for job in &removed {
            if let Some(media_id) = job.status.media_id() {
                if self.media.revoke(media_id).await {
                    videos += 1;
                }
            }
        }

        let cutoff = chrono::Utc::now() - chrono::Duration::hours(max_age_hours);
        let uploads = self.media.prune_before(media::MediaKind::Upload, cutoff).await;

        if !removed.is_empty() || uploads > 0 {
            tracing::info!(
                jobs = removed.len(),
                videos,
                uploads,
                "🗑️ Cleaned up expired jobs and media"
            );
        }
    }
}

/// Build the application with all routes and shared state
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .merge(handlers::ui::ui_routes())
        .merge(handlers::upload::upload_routes())
        .merge(handlers::generate::generate_routes())
        .merge(handlers::scenes::scene_routes())
        .merge(handlers::jobs::job_routes())
        .merge(handlers::status::status_routes())
        .layer(axum::middleware::from_fn(middleware::logging::request_logging_middleware))
        .layer(CorsLayer::permissive())
        .layer(Extension(state))
}
