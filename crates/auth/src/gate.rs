//! Single-flight coordination for the session refresh routine.
//!
//! At most one refresh runs at a time. Callers arriving while it runs are
//! queued behind it and every one of them observes the same outcome, success
//! or failure. Waiters are released in arrival order. The routine runs on its
//! own task, so it completes even if the caller that started it goes away.

use minireq_types::{Error, Result};
use std::{
    future::Future,
    sync::{
        Arc, Mutex,
        atomic::{AtomicU64, Ordering},
    },
};
use tokio::sync::oneshot;

type Outcome = std::result::Result<String, String>;

/// Waiters of the in-flight refresh, in arrival order. `None` when idle.
type Waiters = Arc<Mutex<Option<Vec<oneshot::Sender<Outcome>>>>>;

/// Hands the outcome to every queued waiter and frees the slot.
///
/// If the routine panics the guard is dropped unsent: the queue is still
/// taken, so waiters see their sender vanish instead of hanging.
struct Release(Waiters);

impl Release {
    fn send(self, outcome: &Outcome) {
        for tx in self.take() {
            let _ = tx.send(outcome.clone());
        }
    }

    fn take(&self) -> Vec<oneshot::Sender<Outcome>> {
        self.0
            .lock()
            .map(|mut slot| slot.take().unwrap_or_default())
            .unwrap_or_default()
    }
}

impl Drop for Release {
    fn drop(&mut self) {
        drop(self.take());
    }
}

/// Shares one in-flight token refresh between all concurrent callers.
#[derive(Default)]
pub struct RefreshGate {
    waiters: Waiters,
    started: AtomicU64,
}

impl RefreshGate {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` while a refresh is in flight.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.waiters.lock().expect("refresh gate lock").is_some()
    }

    /// Number of refresh routines started over the gate's lifetime.
    #[must_use]
    pub fn started(&self) -> u64 {
        self.started.load(Ordering::Relaxed)
    }

    /// Join the in-flight refresh, or start one with `start` if none is running.
    ///
    /// `start` is only invoked when this caller becomes the leader; its future
    /// is spawned on the tokio runtime. Must be called from within a runtime.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Refresh`] carrying the routine's failure message; every
    /// caller that joined the same refresh receives the same message.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub async fn run<F, Fut>(&self, start: F) -> Result<String>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<String>> + Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        {
            let mut slot = self.waiters.lock().expect("refresh gate lock");
            if let Some(queue) = slot.as_mut() {
                tracing::debug!(position = queue.len(), "joining in-flight session refresh");
                queue.push(tx);
            } else {
                self.started.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("starting session refresh");
                *slot = Some(vec![tx]);
                let routine = start();
                let release = Release(Arc::clone(&self.waiters));
                tokio::spawn(async move {
                    let outcome = routine.await.map_err(|e| match e {
                        Error::Refresh(msg) => msg,
                        other => other.to_string(),
                    });
                    release.send(&outcome);
                });
            }
        }

        match rx.await {
            Ok(outcome) => outcome.map_err(Error::Refresh),
            Err(_) => Err(Error::Refresh("refresh routine was aborted".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{sync::Arc, time::Duration};

    #[tokio::test]
    async fn test_single_caller_success() {
        let gate = RefreshGate::new();
        let token = gate.run(|| async { Ok("new".to_string()) }).await.unwrap();
        assert_eq!(token, "new");
        assert_eq!(gate.started(), 1);
        assert!(!gate.is_running());
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_run() {
        let gate = Arc::new(RefreshGate::new());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let gate = Arc::clone(&gate);
            handles.push(tokio::spawn(async move {
                gate.run(|| async {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok("shared".to_string())
                })
                .await
            }));
        }
        for h in handles {
            assert_eq!(h.await.unwrap().unwrap(), "shared");
        }
        assert_eq!(gate.started(), 1);
    }

    #[tokio::test]
    async fn test_failure_reaches_every_waiter() {
        let gate = Arc::new(RefreshGate::new());
        let results = futures::future::join_all((0..4).map(|_| {
            let gate = Arc::clone(&gate);
            async move {
                gate.run(|| async {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Err(Error::Network("login unreachable".into()))
                })
                .await
            }
        }))
        .await;
        for r in results {
            let err = r.unwrap_err();
            assert!(matches!(&err, Error::Refresh(m) if m.contains("login unreachable")));
        }
        assert_eq!(gate.started(), 1);
    }

    #[tokio::test]
    async fn test_refresh_error_not_double_wrapped() {
        let gate = RefreshGate::new();
        let err = gate
            .run(|| async { Err(Error::Refresh("no token".into())) })
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "session refresh failed: no token");
    }

    #[tokio::test]
    async fn test_sequential_runs_start_fresh() {
        let gate = RefreshGate::new();
        gate.run(|| async { Ok("a".to_string()) }).await.unwrap();
        let second = gate.run(|| async { Ok("b".to_string()) }).await.unwrap();
        assert_eq!(second, "b");
        assert_eq!(gate.started(), 2);
    }

    #[tokio::test]
    async fn test_leader_dropped_followers_still_complete() {
        let gate = Arc::new(RefreshGate::new());
        let leader = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move {
                gate.run(|| async {
                    tokio::time::sleep(Duration::from_millis(50)).await;
                    Ok("survived".to_string())
                })
                .await
            })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let follower = {
            let gate = Arc::clone(&gate);
            tokio::spawn(async move { gate.run(|| async { Ok("unused".to_string()) }).await })
        };
        tokio::time::sleep(Duration::from_millis(5)).await;
        leader.abort();

        assert_eq!(follower.await.unwrap().unwrap(), "survived");
        assert!(!gate.is_running());
        assert_eq!(gate.started(), 1);
    }

    #[tokio::test]
    async fn test_waiters_released_in_arrival_order() {
        let gate = Arc::new(RefreshGate::new());
        let released = Arc::new(Mutex::new(Vec::new()));
        // Spawn order 0..5, arrival order 4, 3, 2, 1, 0.
        let handles: Vec<_> = (0..5u64)
            .map(|id| {
                let gate = Arc::clone(&gate);
                let released = Arc::clone(&released);
                tokio::spawn(async move {
                    tokio::time::sleep(Duration::from_millis((5 - id) * 10)).await;
                    gate.run(|| async {
                        tokio::time::sleep(Duration::from_millis(100)).await;
                        Ok("ordered".to_string())
                    })
                    .await
                    .unwrap();
                    released.lock().unwrap().push(id);
                })
            })
            .collect();
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(*released.lock().unwrap(), vec![4, 3, 2, 1, 0]);
        assert_eq!(gate.started(), 1);
    }

    #[tokio::test]
    async fn test_panicking_routine_rejects_waiters() {
        let gate = RefreshGate::new();
        let err = gate
            .run(|| async {
                let broken = true;
                assert!(!broken, "routine failed");
                Ok(String::new())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Refresh(_)));
    }
}
