//! Single-flight token refresh.
//!
//! At most one refresh runs at a time. Every caller that asks for a refresh
//! while one is pending awaits that same operation and sees its outcome.
//! Callers whose 401 arrives after a refresh already settled the session
//! get that result without starting another one.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;

use crate::error::RefreshFailure;
use crate::session::SessionStore;

/// Outcome of one refresh, shared by all of its waiters.
pub(crate) type RefreshOutcome = std::result::Result<(), RefreshFailure>;

type PendingRefresh = Shared<BoxFuture<'static, RefreshOutcome>>;

/// Slot holding the most recent refresh, in flight or resolved.
#[derive(Default)]
pub(crate) struct RefreshGate {
    last: Mutex<Option<PendingRefresh>>,
    started: AtomicU64,
}

impl RefreshGate {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Settle a 401 for a call that was sent with `sent_with`.
    ///
    /// Under the slot lock, in order:
    ///
    /// 1. a refresh in flight is joined;
    /// 2. if the stored access token changed since the call was sent, no
    ///    refresh starts: a newer token means retry (`Ok`), a cleared session
    ///    means the failure of the refresh that cleared it;
    /// 3. otherwise a refresh is started with `start`.
    ///
    /// The refresh runs on its own task, so it completes even if every caller
    /// stops waiting. It must store its tokens (or clear the session) before
    /// resolving.
    pub(crate) async fn refresh<F, Fut>(
        &self,
        session: &SessionStore,
        sent_with: Option<&str>,
        start: F,
    ) -> RefreshOutcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RefreshOutcome> + Send + 'static,
    {
        let pending = {
            let mut slot = self.last.lock();

            match slot.as_ref() {
                Some(pending) if in_flight(pending) => {
                    tracing::debug!("Joining token refresh already in flight");
                    pending.clone()
                }
                last => {
                    let current = session.access_token();
                    if current.is_some() && current.as_deref() != sent_with {
                        tracing::debug!("Access token changed since the call was sent");
                        return Ok(());
                    }
                    if current.is_none()
                        && (sent_with.is_some() || session.refresh_token().is_none())
                    {
                        if let Some(Err(failure)) = last.and_then(|last| last.peek()) {
                            tracing::debug!("Session already ended by an earlier refresh");
                            return Err(failure.clone());
                        }
                        if sent_with.is_some() {
                            return Err(RefreshFailure::MissingRefreshToken);
                        }
                    }

                    self.started.fetch_add(1, Ordering::SeqCst);
                    let task = tokio::spawn(start());
                    let pending = async move {
                        task.await
                            .unwrap_or_else(|e| Err(RefreshFailure::Aborted(e.to_string())))
                    }
                    .boxed()
                    .shared();
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };

        pending.await
    }

    /// Number of refreshes started over the gate's lifetime.
    pub(crate) fn started(&self) -> u64 {
        self.started.load(Ordering::SeqCst)
    }

    #[cfg(test)]
    pub(crate) fn is_pending(&self) -> bool {
        self.last.lock().as_ref().is_some_and(in_flight)
    }
}

/// Whether `pending` has not produced its outcome yet. Polls it once so an
/// outcome that nobody awaited is picked up.
fn in_flight(pending: &PendingRefresh) -> bool {
    pending.peek().is_none() && pending.clone().now_or_never().is_none()
}
