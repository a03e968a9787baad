use std::sync::Arc;

use tokio::sync::watch;

/// Whether the user is signed in, as far as this process knows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// Startup; the token store has not been read yet.
    Loading,
    Authenticated,
    Unauthenticated,
}

/// Shared, observable session status.
///
/// Starts in [`SessionStatus::Loading`] and leaves it exactly once, when the
/// token store is first read. Clones share the same underlying state;
/// subscribers see every change.
#[derive(Debug, Clone)]
pub struct SessionState {
    tx: Arc<watch::Sender<SessionStatus>>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionState {
    #[must_use]
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionStatus::Loading);
        Self { tx: Arc::new(tx) }
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        *self.tx.borrow()
    }

    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.status() == SessionStatus::Authenticated
    }

    /// Receiver notified on every status change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.tx.subscribe()
    }

    /// Wait until startup has resolved the status.
    pub async fn wait_resolved(&self) -> SessionStatus {
        let mut rx = self.tx.subscribe();
        match rx.wait_for(|status| *status != SessionStatus::Loading).await {
            Ok(status) => *status,
            Err(_) => self.status(),
        }
    }

    /// Leave `Loading`. Returns `false` if startup was already resolved.
    pub(crate) fn resolve(&self, authenticated: bool) -> bool {
        let next = if authenticated {
            SessionStatus::Authenticated
        } else {
            SessionStatus::Unauthenticated
        };
        let resolved = self.tx.send_if_modified(|status| {
            if *status == SessionStatus::Loading {
                *status = next;
                true
            } else {
                false
            }
        });
        if resolved {
            tracing::debug!(status = ?next, "Session status resolved at startup");
        }
        resolved
    }

    pub(crate) fn set_authenticated(&self) {
        self.transition(SessionStatus::Authenticated);
    }

    pub(crate) fn set_unauthenticated(&self) {
        self.transition(SessionStatus::Unauthenticated);
    }

    fn transition(&self, next: SessionStatus) {
        let previous = self.tx.send_replace(next);
        if previous != next {
            tracing::debug!(from = ?previous, to = ?next, "Session status changed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_loading() {
        let state = SessionState::new();
        assert_eq!(state.status(), SessionStatus::Loading);
        assert!(!state.is_logged_in());
    }

    #[test]
    fn resolves_exactly_once() {
        let state = SessionState::new();
        assert!(state.resolve(true));
        assert_eq!(state.status(), SessionStatus::Authenticated);

        assert!(!state.resolve(false));
        assert_eq!(state.status(), SessionStatus::Authenticated);
    }

    #[test]
    fn clones_share_state() {
        let state = SessionState::new();
        let other = state.clone();
        state.resolve(false);
        assert_eq!(other.status(), SessionStatus::Unauthenticated);

        other.set_authenticated();
        assert!(state.is_logged_in());
    }

    #[tokio::test]
    async fn subscribers_observe_changes() {
        let state = SessionState::new();
        let mut rx = state.subscribe();

        state.resolve(true);
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), SessionStatus::Authenticated);

        state.set_unauthenticated();
        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow_and_update(), SessionStatus::Unauthenticated);
    }

    #[tokio::test]
    async fn wait_resolved_blocks_until_startup_completes() {
        let state = SessionState::new();
        let waiter = {
            let state = state.clone();
            tokio::spawn(async move { state.wait_resolved().await })
        };

        tokio::task::yield_now().await;
        assert!(!waiter.is_finished());

        state.resolve(false);
        assert_eq!(waiter.await.unwrap(), SessionStatus::Unauthenticated);
    }
}
