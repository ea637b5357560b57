//! Latest-wins guard for data fetches driven by rapidly changing inputs.
//!
//! Each call to [`LatestOnly::run`] supersedes the one before it: the older
//! task is aborted, and if it still manages to finish its result is dropped.
//! A superseded call resolves to `None` so it can never overwrite a newer view.

use std::future::Future;
use std::sync::Mutex;

use tokio::task::AbortHandle;
use tracing::{debug, warn};

/// Runs at most one live request at a time; newer calls cancel older ones.
#[derive(Debug, Default)]
pub struct LatestOnly {
    current: Mutex<Current>,
}

/// Newest generation and the task that belongs to it, updated together.
#[derive(Debug, Default)]
struct Current {
    generation: u64,
    task: Option<AbortHandle>,
}

impl LatestOnly {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `future` as the newest request.
    ///
    /// Returns `None` if another call superseded this one before it finished.
    pub async fn run<F>(&self, future: F) -> Option<F::Output>
    where
        F: Future + Send + 'static,
        F::Output: Send + 'static,
    {
        let handle = tokio::spawn(future);

        // The stored task is always the one holding the highest generation.
        let generation = {
            let mut current = self.current.lock().unwrap_or_else(|e| e.into_inner());
            current.generation += 1;
            if let Some(previous) = current.task.replace(handle.abort_handle()) {
                previous.abort();
            }
            current.generation
        };

        match handle.await {
            Ok(value) if self.is_current(generation) => Some(value),
            Ok(_) => {
                debug!(generation, "dropping result of superseded request");
                None
            }
            Err(e) if e.is_cancelled() => {
                debug!(generation, "superseded request cancelled");
                None
            }
            Err(e) => {
                warn!(generation, error = %e, "request task failed");
                None
            }
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        let current = self.current.lock().unwrap_or_else(|e| e.into_inner());
        current.generation == generation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    #[tokio::test]
    async fn newer_request_supersedes_older() {
        let guard = Arc::new(LatestOnly::new());

        let older = {
            let guard = guard.clone();
            tokio::spawn(async move {
                guard
                    .run(async {
                        tokio::time::sleep(Duration::from_millis(300)).await;
                        "stale"
                    })
                    .await
            })
        };

        tokio::time::sleep(Duration::from_millis(30)).await;
        let newer = guard.run(async { "fresh" }).await;

        assert_eq!(newer, Some("fresh"));
        assert_eq!(older.await.unwrap(), None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn racing_pair_never_loses_the_newest_result() {
        for _ in 0..300 {
            let guard = Arc::new(LatestOnly::new());
            let start = Arc::new(tokio::sync::Barrier::new(2));

            let calls: Vec<_> = (0..2u32)
                .map(|id| {
                    let guard = guard.clone();
                    let start = start.clone();
                    tokio::spawn(async move {
                        start.wait().await;
                        guard
                            .run(async move {
                                tokio::time::sleep(Duration::from_millis(1)).await;
                                id
                            })
                            .await
                    })
                })
                .collect();

            let mut completed = 0;
            for call in calls {
                if call.await.unwrap().is_some() {
                    completed += 1;
                }
            }
            assert!(completed >= 1, "both racing requests were dropped");
        }
    }

    #[tokio::test]
    async fn sequential_requests_all_complete() {
        let guard = LatestOnly::new();
        assert_eq!(guard.run(async { 1 }).await, Some(1));
        assert_eq!(guard.run(async { 2 }).await, Some(2));
    }
}
