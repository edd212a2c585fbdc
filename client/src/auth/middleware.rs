//! Single-flight coordination of session refreshes.
//!
//! When several requests fail with an expired session at the same time, only
//! one of them (the leader) calls the refresh endpoint. The others park on a
//! oneshot channel and receive the leader's outcome once it settles. The
//! coordinator is shared by every clone of the API client.

use std::future::Future;

use parking_lot::Mutex;
use tokio::sync::oneshot;

use crate::errors::{ApiError, ApiResult};

const ABANDONED_REFRESH_MESSAGE: &str = "Session refresh was interrupted";

type Waiter = oneshot::Sender<ApiResult<()>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshState {
    Idle,
    Refreshing,
}

#[derive(Default)]
struct Inner {
    refreshing: bool,
    waiters: Vec<Waiter>,
}

enum Role {
    Leader,
    Follower(oneshot::Receiver<ApiResult<()>>),
}

#[derive(Default)]
pub struct RefreshCoordinator {
    inner: Mutex<Inner>,
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RefreshState {
        if self.inner.lock().refreshing {
            RefreshState::Refreshing
        } else {
            RefreshState::Idle
        }
    }

    /// Number of requests parked behind the in-flight refresh.
    pub fn queued(&self) -> usize {
        self.inner.lock().waiters.len()
    }

    /// Resolves once the session has been refreshed, or fails with the
    /// refresh's error.
    ///
    /// `refresh` is only invoked when no other refresh is in flight; otherwise
    /// the caller waits for the running one and observes its outcome.
    pub async fn await_valid_session<F, Fut>(&self, refresh: F) -> ApiResult<()>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = ApiResult<()>>,
    {
        let role = {
            let mut inner = self.inner.lock();
            if inner.refreshing {
                let (tx, rx) = oneshot::channel();
                inner.waiters.push(tx);
                Role::Follower(rx)
            } else {
                inner.refreshing = true;
                Role::Leader
            }
        };

        match role {
            Role::Follower(rx) => {
                tracing::debug!("waiting for in-flight session refresh");
                rx.await
                    .unwrap_or_else(|_| Err(ApiError::authentication(ABANDONED_REFRESH_MESSAGE)))
            }
            Role::Leader => {
                let guard = RefreshGuard {
                    coordinator: self,
                    settled: false,
                };
                tracing::info!("session expired, refreshing");
                let outcome = refresh().await;
                match &outcome {
                    Ok(()) => tracing::info!("session refreshed"),
                    Err(err) => tracing::warn!("session refresh failed: {}", err),
                }
                guard.settle(outcome.clone());
                outcome
            }
        }
    }

    /// Returns to `Idle` and hands back everyone who was waiting.
    fn release(&self) -> Vec<Waiter> {
        let mut inner = self.inner.lock();
        inner.refreshing = false;
        std::mem::take(&mut inner.waiters)
    }
}

/// Holds the `Refreshing` state for the leader. Dropping it without settling
/// (the leader's future was cancelled) still returns to `Idle`; the parked
/// requests then see their channel closed.
struct RefreshGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl RefreshGuard<'_> {
    fn settle(mut self, outcome: ApiResult<()>) {
        self.settled = true;
        let waiters = self.coordinator.release();
        tracing::debug!("resuming {} queued request(s)", waiters.len());
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
    }
}

impl Drop for RefreshGuard<'_> {
    fn drop(&mut self) {
        if !self.settled {
            drop(self.coordinator.release());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use futures::future::join_all;

    use super::*;

    #[tokio::test]
    async fn test_single_refresh_for_concurrent_callers() {
        let coordinator = RefreshCoordinator::new();
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        let callers = (0..5).map(|_| {
            coordinator.await_valid_session(move || async move {
                counter.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(10)).await;
                Ok(())
            })
        });
        let outcomes = join_all(callers).await;

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert!(outcomes.iter().all(Result::is_ok));
        assert_eq!(coordinator.state(), RefreshState::Idle);
        assert_eq!(coordinator.queued(), 0);
    }

    #[tokio::test]
    async fn test_failure_is_broadcast_to_waiters() {
        let coordinator = RefreshCoordinator::new();

        let callers = (0..3).map(|_| {
            coordinator.await_valid_session(|| async {
                tokio::time::sleep(Duration::from_millis(10)).await;
                Err(ApiError::authentication("Refresh token expired"))
            })
        });
        let outcomes = join_all(callers).await;

        for outcome in outcomes {
            assert_eq!(
                outcome,
                Err(ApiError::authentication("Refresh token expired"))
            );
        }
        assert_eq!(coordinator.state(), RefreshState::Idle);
    }

    #[tokio::test]
    async fn test_sequential_refreshes_each_run() {
        let coordinator = RefreshCoordinator::new();
        let calls = AtomicUsize::new(0);
        let counter = &calls;

        for _ in 0..2 {
            coordinator
                .await_valid_session(move || async move {
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                })
                .await
                .unwrap();
        }

        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_cancelled_leader_releases_state() {
        let coordinator = RefreshCoordinator::new();

        let leader = coordinator.await_valid_session(|| async {
            tokio::time::sleep(Duration::from_secs(60)).await;
            Ok(())
        });
        let timed_out = tokio::time::timeout(Duration::from_millis(10), leader).await;
        assert!(timed_out.is_err());

        assert_eq!(coordinator.state(), RefreshState::Idle);
        let next = coordinator.await_valid_session(|| async { Ok(()) }).await;
        assert!(next.is_ok());
    }
}
