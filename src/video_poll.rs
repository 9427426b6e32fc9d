//! Fixed-interval polling of long-running video operations.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::config::PollConfig;
use crate::gemini_client::{GeminiClient, GeminiError, VideoOperation};

/// Source of operation status updates.
#[async_trait]
pub trait OperationSource: Send + Sync {
    async fn fetch_operation(&self, name: &str) -> Result<VideoOperation, GeminiError>;
}

#[async_trait]
impl OperationSource for GeminiClient {
    async fn fetch_operation(&self, name: &str) -> Result<VideoOperation, GeminiError> {
        self.get_operation(name).await
    }
}

#[derive(Error, Debug)]
pub enum PollError {
    #[error(transparent)]
    Gemini(#[from] GeminiError),
    #[error("Video generation did not finish within {} seconds", .0.as_secs())]
    TimedOut(Duration),
    #[error("Video generation was cancelled")]
    Cancelled,
}

/// Wait `interval`, re-query, repeat until the operation reports `done`.
///
/// Returns as soon as `done` is observed, including on the submitted operation
/// itself. A pending operation is always re-queried at least once; the optional
/// timeout is checked after each poll and cancellation during each wait.
pub async fn wait_for_completion<S>(
    source: &S,
    mut operation: VideoOperation,
    config: &PollConfig,
    cancel: &CancellationToken,
) -> Result<VideoOperation, PollError>
where
    S: OperationSource + ?Sized,
{
    let deadline = config.timeout.map(|timeout| Instant::now() + timeout);
    let mut polls: u32 = 0;

    while !operation.done {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!(operation = %operation.name, polls, "Video polling cancelled");
                return Err(PollError::Cancelled);
            }
            _ = tokio::time::sleep(config.interval) => {}
        }

        operation = source.fetch_operation(&operation.name).await?;
        polls += 1;
        tracing::debug!(operation = %operation.name, polls, done = operation.done, "Polled video operation");

        if let (false, Some(deadline), Some(timeout)) = (operation.done, deadline, config.timeout) {
            if Instant::now() >= deadline {
                tracing::warn!(operation = %operation.name, polls, "Video operation timed out");
                return Err(PollError::TimedOut(timeout));
            }
        }
    }

    tracing::info!(operation = %operation.name, polls, "✅ Video operation finished");
    Ok(operation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Arc;

    /// Reports `done` on the `complete_after`-th fetch.
    struct ScriptedSource {
        complete_after: u32,
        calls: AtomicU32,
    }

    impl ScriptedSource {
        fn new(complete_after: u32) -> Self {
            Self {
                complete_after,
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl OperationSource for ScriptedSource {
        async fn fetch_operation(&self, name: &str) -> Result<VideoOperation, GeminiError> {
            let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            Ok(VideoOperation {
                name: name.to_string(),
                done: call >= self.complete_after,
                ..Default::default()
            })
        }
    }

    fn pending(name: &str) -> VideoOperation {
        VideoOperation {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn fast_config(timeout: Option<Duration>) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(5),
            timeout,
        }
    }

    #[tokio::test]
    async fn test_polls_until_done_and_not_after() {
        let source = ScriptedSource::new(3);
        let result = wait_for_completion(
            &source,
            pending("operations/1"),
            &fast_config(None),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert!(result.done);
        assert_eq!(source.calls(), 3);
    }

    #[tokio::test]
    async fn test_already_done_operation_is_not_polled() {
        let source = ScriptedSource::new(1);
        let done = VideoOperation {
            name: "operations/1".to_string(),
            done: true,
            ..Default::default()
        };

        let result = wait_for_completion(&source, done, &fast_config(None), &CancellationToken::new())
            .await
            .unwrap();
        assert!(result.done);
        assert_eq!(source.calls(), 0);
    }

    #[tokio::test]
    async fn test_waits_the_interval_between_polls() {
        let source = ScriptedSource::new(2);
        let config = PollConfig {
            interval: Duration::from_millis(40),
            timeout: None,
        };

        let started = std::time::Instant::now();
        wait_for_completion(&source, pending("operations/1"), &config, &CancellationToken::new())
            .await
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn test_cancellation_stops_polling() {
        let source = Arc::new(ScriptedSource::new(u32::MAX));
        let cancel = CancellationToken::new();

        let task = {
            let source = source.clone();
            let cancel = cancel.clone();
            tokio::spawn(async move {
                wait_for_completion(source.as_ref(), pending("operations/1"), &fast_config(None), &cancel)
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(30)).await;
        cancel.cancel();

        let result = task.await.unwrap();
        assert!(matches!(result, Err(PollError::Cancelled)));
        let calls_at_cancel = source.calls();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert_eq!(source.calls(), calls_at_cancel);
    }

    #[tokio::test]
    async fn test_timeout_bounds_the_loop() {
        let source = ScriptedSource::new(u32::MAX);
        let result = wait_for_completion(
            &source,
            pending("operations/1"),
            &fast_config(Some(Duration::from_millis(30))),
            &CancellationToken::new(),
        )
        .await;

        assert!(matches!(result, Err(PollError::TimedOut(_))));
        assert!(source.calls() > 0);
    }

    #[tokio::test]
    async fn test_timeout_shorter_than_interval_still_polls_once() {
        let source = ScriptedSource::new(1);
        let config = PollConfig {
            interval: Duration::from_millis(40),
            timeout: Some(Duration::from_millis(5)),
        };

        let result = wait_for_completion(&source, pending("operations/1"), &config, &CancellationToken::new())
            .await
            .unwrap();
        assert!(result.done);
        assert_eq!(source.calls(), 1);

        let stuck = ScriptedSource::new(u32::MAX);
        let result =
            wait_for_completion(&stuck, pending("operations/2"), &config, &CancellationToken::new()).await;
        assert!(matches!(result, Err(PollError::TimedOut(_))));
        assert_eq!(stuck.calls(), 1);
    }

    #[tokio::test]
    async fn test_fetch_errors_propagate() {
        struct Failing;

        #[async_trait]
        impl OperationSource for Failing {
            async fn fetch_operation(&self, _name: &str) -> Result<VideoOperation, GeminiError> {
                Err(GeminiError::Operation("boom".to_string()))
            }
        }

        let result = wait_for_completion(
            &Failing,
            pending("operations/1"),
            &fast_config(None),
            &CancellationToken::new(),
        )
        .await;
        assert!(matches!(result, Err(PollError::Gemini(_))));
    }
}
