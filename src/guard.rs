use crate::navigation::Navigation;
use crate::session::{SessionState, SessionStatus};

/// What a protected view should do for the current session status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Status unknown yet: render nothing and do not redirect.
    Wait,
    /// Render the protected content.
    Admit,
    /// Render nothing and go to the login route.
    Redirect(Navigation),
}

/// Gate in front of authenticated views.
#[derive(Debug, Clone)]
pub struct Guard {
    login_route: String,
}

impl Guard {
    #[must_use]
    pub fn new(login_route: impl Into<String>) -> Self {
        Self {
            login_route: login_route.into(),
        }
    }

    /// Decide for a status snapshot. Never redirects while `Loading`.
    #[must_use]
    pub fn decide(&self, status: SessionStatus) -> GuardDecision {
        match status {
            SessionStatus::Loading => GuardDecision::Wait,
            SessionStatus::Authenticated => GuardDecision::Admit,
            SessionStatus::Unauthenticated => {
                GuardDecision::Redirect(Navigation::Reload(self.login_route.clone()))
            }
        }
    }

    /// Wait for startup to resolve, then decide.
    pub async fn check(&self, state: &SessionState) -> GuardDecision {
        self.decide(state.wait_resolved().await)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::client::AuthClient;
    use crate::config::AuthConfig;
    use crate::error::Error;
    use crate::store::{MemoryTokenStore, TokenStore};
    use crate::types::{AccessToken, RefreshToken, Session};

    /// Store whose first read takes a while, like a slow keychain.
    struct SlowStore {
        inner: MemoryTokenStore,
        delay: Duration,
    }

    impl TokenStore for SlowStore {
        async fn load(&self) -> Result<Session, Error> {
            tokio::time::sleep(self.delay).await;
            self.inner.load().await
        }

        async fn save(&self, session: Session) -> Result<(), Error> {
            self.inner.save(session).await
        }

        async fn replace_access_token(&self, token: AccessToken) -> Result<(), Error> {
            self.inner.replace_access_token(token).await
        }

        async fn save_nonce(&self, nonce: String) -> Result<(), Error> {
            self.inner.save_nonce(nonce).await
        }

        async fn take_nonce(&self) -> Result<Option<String>, Error> {
            self.inner.take_nonce().await
        }

        async fn clear(&self) -> Result<(), Error> {
            self.inner.clear().await
        }
    }

    #[test]
    fn decisions_per_status() {
        let guard = Guard::new("/login");
        assert_eq!(guard.decide(SessionStatus::Loading), GuardDecision::Wait);
        assert_eq!(guard.decide(SessionStatus::Authenticated), GuardDecision::Admit);
        assert_eq!(
            guard.decide(SessionStatus::Unauthenticated),
            GuardDecision::Redirect(Navigation::Reload("/login".into()))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn waits_while_slow_store_is_read() {
        let inner = MemoryTokenStore::new();
        inner
            .save(Session::issued(AccessToken::new("a"), RefreshToken::new("r")))
            .await
            .unwrap();
        let store = SlowStore {
            inner,
            delay: Duration::from_secs(5),
        };
        let config = AuthConfig::new(
            "http://backend.test".parse().unwrap(),
            "http://app.test".parse().unwrap(),
        );
        let client = AuthClient::new(config, store);
        let guard = Guard::new("/login");

        let restore = {
            let client = client.clone();
            tokio::spawn(async move { client.restore().await })
        };
        tokio::task::yield_now().await;

        // Token already stored, but the read has not finished.
        assert_eq!(guard.decide(client.session_state().status()), GuardDecision::Wait);

        assert_eq!(guard.check(client.session_state()).await, GuardDecision::Admit);
        assert_eq!(restore.await.unwrap(), SessionStatus::Authenticated);
    }
}
