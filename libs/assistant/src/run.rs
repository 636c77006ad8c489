use std::{fmt, future::Future, time::Duration};

use serde::Deserialize;
use tokio::time::{Instant, sleep, timeout};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::error::{AssistantError, Result};

pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
pub const DEFAULT_RUN_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Queued => "queued",
            RunStatus::InProgress => "in_progress",
            RunStatus::RequiresAction => "requires_action",
            RunStatus::Cancelling => "cancelling",
            RunStatus::Cancelled => "cancelled",
            RunStatus::Failed => "failed",
            RunStatus::Completed => "completed",
            RunStatus::Incomplete => "incomplete",
            RunStatus::Expired => "expired",
            RunStatus::Unknown => "unknown",
        }
    }

    /// The run will not make further progress on its own.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunStatus::Cancelled
                | RunStatus::Failed
                | RunStatus::Completed
                | RunStatus::Incomplete
                | RunStatus::Expired
        )
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Run {
    pub id: String,
    pub status: RunStatus,
}

/// Poll a run until it completes, sleeping `interval` between polls.
///
/// Gives up with [`AssistantError::RunTimeout`] after `limit`, and with
/// [`AssistantError::Cancelled`] as soon as `cancel` fires.
pub async fn wait_for_run<F, Fut>(
    run_id: &str,
    mut poll: F,
    interval: Duration,
    limit: Duration,
    cancel: &CancellationToken,
) -> Result<Run>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Run>>,
{
    let started = Instant::now();

    let work = async {
        let mut polls = 0u32;
        loop {
            let run = poll().await?;
            polls += 1;

            match run.status {
                RunStatus::Completed => {
                    info!(run_id, polls, elapsed = ?started.elapsed(), "run completed");
                    return Ok(run);
                }
                status if status.is_terminal() => {
                    return Err(AssistantError::RunFailed {
                        run_id: run.id,
                        status: status.to_string(),
                    });
                }
                status => {
                    debug!(run_id, polls, %status, "run pending");
                    sleep(interval).await;
                }
            }
        }
    };

    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(AssistantError::Cancelled),
        res = timeout(limit, work) => res.unwrap_or_else(|_| {
            Err(AssistantError::RunTimeout {
                run_id: run_id.to_string(),
                waited: started.elapsed(),
            })
        }),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;

    fn run(status: RunStatus) -> Run {
        Run {
            id: "run_1".to_string(),
            status,
        }
    }

    #[test]
    fn status_deserializes() {
        let r: Run = serde_json::from_str(r#"{"id": "run_1", "status": "in_progress"}"#).unwrap();
        assert_eq!(r.status, RunStatus::InProgress);

        let r: Run = serde_json::from_str(r#"{"id": "run_1", "status": "paused"}"#).unwrap();
        assert_eq!(r.status, RunStatus::Unknown);
    }

    #[tokio::test]
    async fn completes_after_pending_polls() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();

        let result = wait_for_run(
            "run_1",
            move || {
                let n = counter.fetch_add(1, Ordering::SeqCst);
                async move {
                    Ok(run(if n < 2 {
                        RunStatus::InProgress
                    } else {
                        RunStatus::Completed
                    }))
                }
            },
            Duration::from_millis(1),
            Duration::from_secs(5),
            &CancellationToken::new(),
        )
        .await
        .unwrap();

        assert_eq!(result.status, RunStatus::Completed);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn failed_run_stops_waiting() {
        let err = wait_for_run(
            "run_1",
            || async { Ok(run(RunStatus::Failed)) },
            Duration::from_millis(1),
            Duration::from_secs(5),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AssistantError::RunFailed { ref status, .. } if status == "failed"));
    }

    #[tokio::test]
    async fn stalled_run_times_out() {
        let err = wait_for_run(
            "run_1",
            || async { Ok(run(RunStatus::Queued)) },
            Duration::from_millis(5),
            Duration::from_millis(30),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AssistantError::RunTimeout { .. }));
    }

    #[tokio::test]
    async fn cancelled_token_aborts_wait() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = wait_for_run(
            "run_1",
            || async { Ok(run(RunStatus::InProgress)) },
            Duration::from_millis(5),
            Duration::from_secs(5),
            &cancel,
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AssistantError::Cancelled));
    }

    #[tokio::test]
    async fn poll_errors_propagate() {
        let err = wait_for_run(
            "run_1",
            || async { Err(AssistantError::EmptyResponse) },
            Duration::from_millis(1),
            Duration::from_secs(5),
            &CancellationToken::new(),
        )
        .await
        .unwrap_err();

        assert!(matches!(err, AssistantError::EmptyResponse));
    }
}
