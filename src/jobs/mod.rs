// src/jobs/mod.rs
//! Background jobs for scene video generation.
//! The browser polls job status while the video operation runs.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;
use serde::{Serialize, Deserialize};
use chrono::{DateTime, Utc};

use crate::media::MediaId;

pub mod video_job;

/// Unique identifier for a background job
pub type JobId = String;

/// Job status representing the current state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobStatus {
    /// Job is queued and waiting to start
    Queued,
    /// Job is currently running
    Running {
        current_step: String,
    },
    /// Job completed successfully
    Completed {
        media_id: MediaId,
        media_url: String,
        mime_type: String,
        duration_seconds: f64,
    },
    /// Job failed with error
    Failed {
        error: String,
    },
    /// Job was cancelled by user
    Cancelled,
}

impl JobStatus {
    pub fn is_finished(&self) -> bool {
        matches!(
            self,
            JobStatus::Completed { .. } | JobStatus::Failed { .. } | JobStatus::Cancelled
        )
    }

    /// Media produced by a completed job
    pub fn media_id(&self) -> Option<&str> {
        match self {
            JobStatus::Completed { media_id, .. } => Some(media_id.as_str()),
            _ => None,
        }
    }
}

/// Job metadata
#[derive(Debug, Clone, Serialize)]
pub struct Job {
    pub id: JobId,
    pub scene_id: String,
    pub job_type: String,
    pub created_at: DateTime<Utc>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub status: JobStatus,
}

impl Job {
    pub fn new(scene_id: String, job_type: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            scene_id,
            job_type,
            created_at: Utc::now(),
            started_at: None,
            completed_at: None,
            status: JobStatus::Queued,
        }
    }
}

/// Job manager handles background job state and cancellation
pub struct JobManager {
    /// Active jobs indexed by job_id
    jobs: Arc<RwLock<HashMap<JobId, Job>>>,
    /// Cancellation tokens for jobs that have not finished
    cancel_tokens: Arc<RwLock<HashMap<JobId, CancellationToken>>>,
}

impl JobManager {
    pub fn new() -> Self {
        Self {
            jobs: Arc::new(RwLock::new(HashMap::new())),
            cancel_tokens: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Store a new job and hand back the token its worker should observe
    pub async fn create_job(&self, job: Job) -> (JobId, CancellationToken) {
        let job_id = job.id.clone();
        let token = CancellationToken::new();
        self.jobs.write().await.insert(job_id.clone(), job);
        self.cancel_tokens
            .write()
            .await
            .insert(job_id.clone(), token.clone());
        tracing::info!("🎬 Created job: {}", job_id);
        (job_id, token)
    }

    /// Get job details
    pub async fn get_job(&self, job_id: &str) -> Option<Job> {
        let jobs = self.jobs.read().await;
        jobs.get(job_id).cloned()
    }

    /// Update job status. Finished jobs keep their final status; returns
    /// false when the update was ignored.
    pub async fn update_job_status(&self, job_id: &str, status: JobStatus) -> bool {
        let mut jobs = self.jobs.write().await;
        let Some(job) = jobs.get_mut(job_id) else {
            return false;
        };
        if job.status.is_finished() {
            tracing::debug!("Ignoring status update for finished job {}", job_id);
            return false;
        }

        // Update timestamps
        match &status {
            JobStatus::Running { .. } if job.started_at.is_none() => {
                job.started_at = Some(Utc::now());
            }
            s if s.is_finished() => {
                job.completed_at = Some(Utc::now());
            }
            _ => {}
        }

        let finished = status.is_finished();
        tracing::debug!("📊 Updated job {} status: {:?}", job_id, status);
        job.status = status;
        drop(jobs);

        if finished {
            self.cancel_tokens.write().await.remove(job_id);
        }
        true
    }

    /// Request cancellation of a running job
    pub async fn cancel(&self, job_id: &str) -> Result<(), String> {
        let token = self.cancel_tokens.read().await.get(job_id).cloned();
        match token {
            Some(token) => {
                token.cancel();
                self.update_job_status(job_id, JobStatus::Cancelled).await;
                tracing::info!("🛑 Cancelled job: {}", job_id);
                Ok(())
            }
            None if self.jobs.read().await.contains_key(job_id) => {
                Err(format!("Job {} has already finished", job_id))
            }
            None => Err(format!("No job {}", job_id)),
        }
    }

    /// Cleanup finished jobs older than specified duration. Returns the removed
    /// jobs so their media can be released.
    pub async fn cleanup_old_jobs(&self, max_age_hours: i64) -> Vec<Job> {
        let mut jobs = self.jobs.write().await;
        let cutoff = Utc::now() - chrono::Duration::hours(max_age_hours);

        let to_remove: Vec<JobId> = jobs
            .iter()
            .filter(|(_, job)| {
                if let Some(completed_at) = job.completed_at {
                    completed_at < cutoff
                } else {
                    false
                }
            })
            .map(|(id, _)| id.clone())
            .collect();

        to_remove
            .into_iter()
            .filter_map(|job_id| {
                tracing::debug!("🗑️ Cleaned up old job: {}", job_id);
                jobs.remove(&job_id)
            })
            .collect()
    }
}

impl Default for JobManager {
    fn default() -> Self {
        Self::new()
    }
}

/// Global job manager instance (to be stored in AppState)
pub type SharedJobManager = Arc<JobManager>;

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_status_timestamps() {
        let manager = JobManager::new();
        let (job_id, _token) = manager
            .create_job(Job::new("s1".to_string(), "scene_video".to_string()))
            .await;

        manager
            .update_job_status(&job_id, JobStatus::Running { current_step: "submit".to_string() })
            .await;
        let job = manager.get_job(&job_id).await.unwrap();
        assert!(job.started_at.is_some());
        assert!(job.completed_at.is_none());

        manager
            .update_job_status(&job_id, JobStatus::Failed { error: "boom".to_string() })
            .await;
        let job = manager.get_job(&job_id).await.unwrap();
        assert!(job.completed_at.is_some());
        assert_eq!(job.status, JobStatus::Failed { error: "boom".to_string() });
    }

    #[tokio::test]
    async fn test_cancel_triggers_token_and_is_final() {
        let manager = JobManager::new();
        let (job_id, token) = manager
            .create_job(Job::new("s1".to_string(), "scene_video".to_string()))
            .await;

        manager.cancel(&job_id).await.unwrap();
        assert!(token.is_cancelled());

        // a late failure from the worker does not overwrite the cancellation
        let applied = manager
            .update_job_status(&job_id, JobStatus::Failed { error: "late".to_string() })
            .await;
        assert!(!applied);
        assert_eq!(manager.get_job(&job_id).await.unwrap().status, JobStatus::Cancelled);

        assert!(manager.cancel(&job_id).await.is_err());
        assert!(manager.cancel("nope").await.is_err());
    }

    #[tokio::test]
    async fn test_cleanup_removes_only_old_finished_jobs() {
        let manager = JobManager::new();
        let (running, _) = manager
            .create_job(Job::new("s1".to_string(), "scene_video".to_string()))
            .await;
        let (done, _) = manager
            .create_job(Job::new("s2".to_string(), "scene_video".to_string()))
            .await;
        manager.update_job_status(&done, JobStatus::Cancelled).await;

        let removed = manager.cleanup_old_jobs(-1).await;
        assert_eq!(removed.len(), 1);
        assert_eq!(removed[0].id, done);
        assert!(manager.get_job(&running).await.is_some());
        assert!(manager.get_job(&done).await.is_none());
    }

    #[test]
    fn test_completed_status_exposes_media_id() {
        let status = JobStatus::Completed {
            media_id: "m1".to_string(),
            media_url: "/media/m1".to_string(),
            mime_type: "video/mp4".to_string(),
            duration_seconds: 1.0,
        };
        assert_eq!(status.media_id(), Some("m1"));
        assert_eq!(JobStatus::Cancelled.media_id(), None);
    }

    #[test]
    fn test_job_serializes_flat_status() {
        let mut job = Job::new("s1".to_string(), "scene_video".to_string());
        job.status = JobStatus::Running { current_step: "Polling".to_string() };
        let value = serde_json::to_value(&job).unwrap();
        assert_eq!(value["status"], "running");
        assert_eq!(value["current_step"], "Polling");
        assert_eq!(value["scene_id"], "s1");
    }
}
