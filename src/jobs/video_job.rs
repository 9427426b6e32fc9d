// src/jobs/video_job.rs
//! Scene video job executor - submits, polls and downloads in the background

use super::{Job, JobId, JobStatus};
use crate::models::SceneMediaRequest;
use crate::services::{AdGenerationService, GenerationError};
use crate::AppState;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub const JOB_TYPE: &str = "scene_video";

/// Video generation job that runs in background
pub struct VideoGenerationJob {
    job_id: JobId,
    scene: SceneMediaRequest,
    cancel: CancellationToken,
    app_state: Arc<AppState>,
}

impl VideoGenerationJob {
    /// Register the job and spawn its worker. Returns immediately.
    pub async fn spawn(app_state: Arc<AppState>, scene: SceneMediaRequest) -> JobId {
        let job = Job::new(scene.scene_id.clone(), JOB_TYPE.to_string());
        let (job_id, cancel) = app_state.job_manager.create_job(job).await;

        let worker = Self {
            job_id: job_id.clone(),
            scene,
            cancel,
            app_state,
        };
        tokio::spawn(worker.execute());

        job_id
    }

    async fn execute(self) {
        let job_id = self.job_id.clone();
        let manager = self.app_state.job_manager.clone();
        let started = Instant::now();

        tracing::info!("🎬 Starting video job {} for scene {}", job_id, self.scene.scene_id);

        // Status messages arrive synchronously from the service; forward them as job updates.
        let (step_tx, mut step_rx) = mpsc::unbounded_channel::<String>();
        let service = AdGenerationService::new(
            self.app_state.gemini_client.as_ref(),
            &self.app_state.media,
        );
        let generation = service.generate_scene_video(
            &self.scene,
            &self.app_state.config.poll,
            &self.cancel,
            |step| {
                let _ = step_tx.send(step.to_string());
            },
        );
        tokio::pin!(generation);

        let result = loop {
            tokio::select! {
                result = &mut generation => break result,
                Some(step) = step_rx.recv() => {
                    manager
                        .update_job_status(&job_id, JobStatus::Running { current_step: step })
                        .await;
                }
            }
        };

        let status = match result {
            Ok(entry) => {
                tracing::info!("✅ Video job {} completed: {}", job_id, entry.preview_url());
                JobStatus::Completed {
                    media_url: entry.preview_url(),
                    media_id: entry.id,
                    mime_type: entry.mime_type,
                    duration_seconds: started.elapsed().as_secs_f64(),
                }
            }
            Err(GenerationError::Cancelled) => JobStatus::Cancelled,
            Err(e) => {
                tracing::error!("Video generation failed: {}", e);
                JobStatus::Failed {
                    error: e.to_string(),
                }
            }
        };

        let media_id = status.media_id().map(str::to_string);
        let applied = manager.update_job_status(&job_id, status).await;

        // Cancelled while downloading: nobody will ever see this video
        if let (false, Some(media_id)) = (applied, media_id) {
            tracing::info!("Discarding video for cancelled job {}", job_id);
            self.app_state.media.revoke(&media_id).await;
        }
    }
}
