//! Single-flight access token refresh
//!
//! The coordinator is either idle or refreshing. The first caller to arrive
//! while idle becomes the leader and runs the refresh; anyone arriving while a
//! refresh is in flight parks a oneshot sender in the queue and waits. When the
//! leader finishes, every waiter receives the same outcome, in queue order, and
//! the coordinator returns to idle.
//!
//! The state mutex is never held across an await.

use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio::sync::oneshot;
use tracing::debug;

use crate::error::ApiError;

/// New access token, or the failure every waiter should see
pub type RefreshOutcome = std::result::Result<String, ApiError>;

type Waiter = oneshot::Sender<RefreshOutcome>;

#[derive(Debug, Default)]
enum RefreshState {
    #[default]
    Idle,
    Refreshing(Vec<Waiter>),
}

#[derive(Debug, Default)]
pub struct RefreshCoordinator {
    state: Mutex<RefreshState>,
}

enum Role {
    Leader,
    Follower(oneshot::Receiver<RefreshOutcome>),
}

impl RefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn is_refreshing(&self) -> bool {
        matches!(*self.state(), RefreshState::Refreshing(_))
    }

    /// Number of callers parked behind the in-flight refresh
    pub fn pending(&self) -> usize {
        match &*self.state() {
            RefreshState::Idle => 0,
            RefreshState::Refreshing(waiters) => waiters.len(),
        }
    }

    /// Run `refresh` unless one is already in flight, in which case wait for
    /// that one instead.
    pub async fn run<F, Fut>(&self, refresh: F) -> RefreshOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RefreshOutcome>,
    {
        let role = {
            let mut state = self.state();
            match &mut *state {
                RefreshState::Refreshing(waiters) => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push(tx);
                    debug!("Refresh in flight, queued as waiter #{}", waiters.len());
                    Role::Follower(rx)
                }
                RefreshState::Idle => {
                    *state = RefreshState::Refreshing(Vec::new());
                    Role::Leader
                }
            }
        };

        match role {
            Role::Follower(rx) => rx.await.unwrap_or_else(|_| Err(ApiError::refresh_abandoned())),
            Role::Leader => {
                let mut guard = LeaderGuard {
                    coordinator: self,
                    finished: false,
                };
                let outcome = refresh().await;
                guard.finish(&outcome);
                outcome
            }
        }
    }

    fn settle(&self, outcome: &RefreshOutcome) {
        let waiters = match std::mem::take(&mut *self.state()) {
            RefreshState::Refreshing(waiters) => waiters,
            RefreshState::Idle => Vec::new(),
        };

        debug!("Releasing {} queued request(s)", waiters.len());
        for waiter in waiters {
            // A waiter whose future was dropped no longer cares
            let _ = waiter.send(outcome.clone());
        }
    }
}

/// Returns the coordinator to idle even if the leader's future is dropped
/// mid-refresh. Waiters then observe a closed channel.
struct LeaderGuard<'a> {
    coordinator: &'a RefreshCoordinator,
    finished: bool,
}

impl LeaderGuard<'_> {
    fn finish(&mut self, outcome: &RefreshOutcome) {
        self.coordinator.settle(outcome);
        self.finished = true;
    }
}

impl Drop for LeaderGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.coordinator.settle(&Err(ApiError::refresh_abandoned()));
        }
    }
}
