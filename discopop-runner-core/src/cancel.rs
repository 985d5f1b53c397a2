//! One-shot cooperative cancellation signal

use crate::error::{Error, Result};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;
use tracing::debug;

type Listener = Arc<dyn Fn() + Send + Sync>;

/// Handle returned by [`CancelToken::on_cancel`], used to unregister the listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// Cancellation signal shared by everything taking part in one logical operation
///
/// Clones share state. Once requested, cancellation never reverts, and the
/// registered listeners are invoked on the first [`cancel`](Self::cancel) only.
#[derive(Clone, Default)]
pub struct CancelToken {
    inner: Arc<Inner>,
}

#[derive(Default)]
struct Inner {
    requested: AtomicBool,
    next_id: AtomicU64,
    listeners: Mutex<Vec<(ListenerId, Listener)>>,
    notify: Notify,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.requested.load(Ordering::Acquire)
    }

    /// Fail with [`Error::Cancelled`] when cancellation was requested before `what` started
    pub fn check(&self, what: &str) -> Result<()> {
        if self.is_cancelled() {
            return Err(Error::cancelled(format!("{what} was not started")));
        }
        Ok(())
    }

    /// Register a listener invoked when cancellation is first requested
    pub fn on_cancel<F>(&self, listener: F) -> ListenerId
    where
        F: Fn() + Send + Sync + 'static,
    {
        let id = ListenerId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        self.listeners().push((id, Arc::new(listener)));
        id
    }

    /// Remove a listener; returns false when it was not registered
    pub fn off_cancel(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners();
        let before = listeners.len();
        listeners.retain(|(registered, _)| *registered != id);
        listeners.len() != before
    }

    /// Request cancellation
    ///
    /// Listeners run synchronously on the calling thread, from a snapshot taken
    /// before dispatch, so a listener may unregister itself safely.
    pub fn cancel(&self) {
        if self.inner.requested.swap(true, Ordering::AcqRel) {
            return;
        }
        let snapshot: Vec<Listener> =
            self.listeners().iter().map(|(_, listener)| listener.clone()).collect();
        debug!("Cancellation requested, notifying {} listener(s)", snapshot.len());
        for listener in snapshot {
            listener();
        }
        self.inner.notify.notify_waiters();
    }

    /// Resolves once cancellation has been requested
    pub async fn cancelled(&self) {
        let notified = self.inner.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();
        if self.is_cancelled() {
            return;
        }
        notified.await;
    }

    fn listeners(&self) -> std::sync::MutexGuard<'_, Vec<(ListenerId, Listener)>> {
        self.inner.listeners.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken").field("cancelled", &self.is_cancelled()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    #[test]
    fn test_cancel_is_sticky() {
        let token = CancelToken::new();
        assert!(!token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
        token.cancel();
        assert!(token.is_cancelled());
    }

    #[test]
    fn test_check_fails_after_cancel() {
        let token = CancelToken::new();
        assert!(token.check("make").is_ok());
        token.cancel();
        assert!(token.check("make").unwrap_err().is_cancellation());
    }

    #[test]
    fn test_listeners_fire_once() {
        let token = CancelToken::new();
        let calls = Arc::new(AtomicUsize::new(0));
        for _ in 0..3 {
            let calls = calls.clone();
            token.on_cancel(move || {
                calls.fetch_add(1, Ordering::SeqCst);
            });
        }

        token.cancel();
        token.cancel();
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_off_cancel_removes_listener() {
        let token = CancelToken::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counted = calls.clone();
        let id = token.on_cancel(move || {
            counted.fetch_add(1, Ordering::SeqCst);
        });

        assert!(token.off_cancel(id));
        assert!(!token.off_cancel(id));
        token.cancel();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_listener_may_unregister_itself() {
        let token = CancelToken::new();
        let slot: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));
        let handle = token.clone();
        let own_id = slot.clone();
        let id = token.on_cancel(move || {
            if let Some(id) = *own_id.lock().unwrap() {
                handle.off_cancel(id);
            }
        });
        *slot.lock().unwrap() = Some(id);

        token.cancel();
        assert!(!token.off_cancel(id));
    }

    #[test]
    fn test_clones_share_state() {
        let token = CancelToken::new();
        let clone = token.clone();
        clone.cancel();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_future_resolves() {
        let token = CancelToken::new();
        let trigger = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            trigger.cancel();
        });

        tokio::time::timeout(Duration::from_secs(5), token.cancelled())
            .await
            .expect("cancelled() should resolve after cancel()");
    }

    #[tokio::test]
    async fn test_cancelled_future_after_the_fact() {
        let token = CancelToken::new();
        token.cancel();
        tokio::time::timeout(Duration::from_millis(100), token.cancelled())
            .await
            .expect("already cancelled token resolves immediately");
    }
}
