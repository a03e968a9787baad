use std::sync::Arc;

use reqwest::{Method, StatusCode};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use url::Url;

use crate::config::AuthConfig;
use crate::error::Error;
use crate::navigation::Navigation;
use crate::nonce;
use crate::session::{SessionState, SessionStatus};
use crate::store::TokenStore;
use crate::types::{AccessToken, RefreshToken, Session, UserIdentity};

/// Session manager for the dashboard.
///
/// Owns the token store and the session status, and talks to the backend's
/// token, logout and login endpoints. Cheap to clone; clones share state.
pub struct AuthClient<S> {
    pub(crate) config: Arc<AuthConfig>,
    http: reqwest::Client,
    pub(crate) store: Arc<S>,
    pub(crate) state: SessionState,
    // Held by refresh for its whole read-post-commit cycle and by logout for
    // its final clear, so logout's clear always lands last.
    pub(crate) write_lock: Arc<Mutex<()>>,
}

// Manual Clone: avoid derive adding an `S: Clone` bound.
impl<S> Clone for AuthClient<S> {
    fn clone(&self) -> Self {
        Self {
            config: self.config.clone(),
            http: self.http.clone(),
            store: self.store.clone(),
            state: self.state.clone(),
            write_lock: self.write_lock.clone(),
        }
    }
}

/// Provider login redirect, with the nonce already stored.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct LoginRequest {
    pub url: Url,
    pub state: String,
}

impl LoginRequest {
    pub fn navigation(&self) -> Navigation {
        Navigation::External(self.url.clone())
    }
}

/// Result of an authenticated backend call.
#[derive(Debug)]
pub enum RequestOutcome {
    /// The backend accepted the call.
    Completed(reqwest::Response),
    /// The call was rejected as unauthorized and the access token has been
    /// refreshed. The caller should send it again.
    Refreshed,
}

#[derive(Serialize)]
struct RefreshTokenBody<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
struct RefreshResponse {
    #[serde(default)]
    access_token: Option<String>,
}

impl<S: TokenStore> AuthClient<S> {
    /// Create a client in the `Loading` state. Call [`restore`](Self::restore)
    /// once at startup.
    #[must_use]
    pub fn new(config: AuthConfig, store: S) -> Self {
        Self {
            config: Arc::new(config),
            http: reqwest::Client::new(),
            store: Arc::new(store),
            state: SessionState::new(),
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    #[must_use]
    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    #[must_use]
    pub fn store(&self) -> &S {
        &self.store
    }

    #[must_use]
    pub fn session_state(&self) -> &SessionState {
        &self.state
    }

    /// Resolve the startup status from the token store.
    ///
    /// Only the first call leaves `Loading`; later calls return the current
    /// status. An unreadable store resolves to signed out.
    pub async fn restore(&self) -> SessionStatus {
        let authenticated = match self.store.load().await {
            Ok(session) => session.is_authenticated(),
            Err(e) => {
                tracing::warn!(error = %e, "Token store unreadable at startup");
                false
            }
        };
        self.state.resolve(authenticated);
        self.state.status()
    }

    /// Current stored session.
    ///
    /// # Errors
    ///
    /// Returns the store's error if it cannot be read.
    pub async fn session(&self) -> Result<Session, Error> {
        self.store.load().await
    }

    /// Attach the signed-in user's display identity to the session.
    ///
    /// # Errors
    ///
    /// Returns the store's error if the session cannot be read or written.
    pub async fn set_user(&self, user: UserIdentity) -> Result<(), Error> {
        let _guard = self.write_lock.lock().await;
        let mut session = self.store.load().await?;
        session.user = Some(user);
        self.store.save(session).await
    }

    /// Build the provider login URL and remember its nonce.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the endpoint URLs cannot be built, or the
    /// store's error if the nonce cannot be saved.
    pub async fn begin_login(&self) -> Result<LoginRequest, Error> {
        let state = nonce::generate_state();
        let redirect_uri = self.config.callback_url()?;

        let mut url = self.config.endpoint(&self.config.provider_login_path)?;
        url.query_pairs_mut()
            .append_pair("redirect_uri", redirect_uri.as_str())
            .append_pair("state", &state);

        self.store.save_nonce(state.clone()).await?;
        tracing::debug!("Login nonce stored");

        Ok(LoginRequest { url, state })
    }

    /// Send a request with the stored access token as bearer credential.
    ///
    /// On `401 Unauthorized` the access token is refreshed once and
    /// [`RequestOutcome::Refreshed`] is returned; the request is not retried
    /// here.
    ///
    /// # Errors
    ///
    /// - [`Error::AuthExpired`] if the call was unauthorized and there is no
    ///   refresh token or the backend rejected it. The local session is
    ///   cleared first.
    /// - [`Error::Status`] for any other non-success status, including a
    ///   failing refresh endpoint. The session is kept.
    /// - [`Error::Network`] if the backend is unreachable. The session is kept.
    pub async fn authenticated_request(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<RequestOutcome, Error> {
        let url = self.config.endpoint(path)?;
        let session = self.store.load().await?;

        let mut request = self.http.request(method, url);
        if let Some(token) = &session.access_token {
            request = request.bearer_auth(token.as_str());
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;

        if response.status() == StatusCode::UNAUTHORIZED {
            return match self.refresh_session().await {
                Ok(()) => Ok(RequestOutcome::Refreshed),
                Err(Error::AuthExpired) => {
                    tracing::warn!(path, "Unauthorized and refresh impossible, ending session");
                    self.end_local_session().await;
                    Err(Error::AuthExpired)
                }
                Err(e) => {
                    tracing::warn!(path, error = %e, "Token refresh failed, keeping session");
                    Err(e)
                }
            };
        }

        let response = Self::ensure_success(response, "api request").await?;
        Ok(RequestOutcome::Completed(response))
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// Returns `false` when there is no refresh token (without touching the
    /// network), when the backend is unreachable, or when it rejects the
    /// token. Failures are logged, never returned. The refresh token itself
    /// is kept as is. On success the session status becomes
    /// `Authenticated`.
    pub async fn refresh(&self) -> bool {
        match self.refresh_session().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed");
                false
            }
        }
    }

    /// Refresh under the write lock and mark the session signed in on
    /// success. [`Error::AuthExpired`] means the refresh token is missing or
    /// was rejected; any other error leaves the stored session untouched.
    async fn refresh_session(&self) -> Result<(), Error> {
        let _guard = self.write_lock.lock().await;
        self.try_refresh().await?;
        self.state.set_authenticated();
        tracing::debug!("Access token refreshed");
        Ok(())
    }

    async fn try_refresh(&self) -> Result<(), Error> {
        let refresh_token = self
            .store
            .load()
            .await?
            .refresh_token
            .ok_or(Error::AuthExpired)?;

        let response = self
            .http
            .post(self.config.endpoint(&self.config.refresh_path)?)
            .json(&RefreshTokenBody {
                refresh_token: refresh_token.as_str(),
            })
            .send()
            .await?;

        if matches!(
            response.status(),
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN
        ) {
            tracing::info!(status = response.status().as_u16(), "Refresh token rejected");
            return Err(Error::AuthExpired);
        }

        let response = Self::ensure_success(response, "token refresh").await?;
        let status = response.status().as_u16();
        let body = response.json::<RefreshResponse>().await?;

        let access_token = body
            .access_token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| Error::Status {
                operation: "token refresh",
                status,
                detail: "response carried no access_token".into(),
            })?;

        self.store
            .replace_access_token(AccessToken::new(access_token))
            .await
    }

    /// Ask the backend to invalidate the refresh token. Best effort: failures
    /// are logged and otherwise ignored.
    pub async fn revoke(&self) {
        let refresh_token = match self.store.load().await {
            Ok(session) => session.refresh_token,
            Err(e) => {
                tracing::warn!(error = %e, "Token store unreadable, skipping revoke");
                return;
            }
        };
        let Some(refresh_token) = refresh_token else {
            tracing::debug!("No refresh token to revoke");
            return;
        };

        if let Err(e) = self.try_revoke(&refresh_token).await {
            tracing::warn!(error = %e, "Token revoke failed");
        }
    }

    async fn try_revoke(&self, refresh_token: &RefreshToken) -> Result<(), Error> {
        let response = self
            .http
            .post(self.config.endpoint(&self.config.revoke_path)?)
            .json(&RefreshTokenBody {
                refresh_token: refresh_token.as_str(),
            })
            .send()
            .await?;
        Self::ensure_success(response, "token revoke").await?;
        Ok(())
    }

    /// Revoke, notify the backend, then clear the local session.
    ///
    /// The clear and the returned navigation to the login route happen
    /// whatever the network calls did.
    pub async fn logout(&self) -> Navigation {
        self.revoke().await;

        if let Err(e) = self.notify_logout().await {
            tracing::warn!(error = %e, "Logout notification failed");
        }

        self.end_local_session().await;
        tracing::info!("Logged out");

        Navigation::Reload(self.config.login_route.clone())
    }

    async fn notify_logout(&self) -> Result<(), Error> {
        let response = self
            .http
            .get(self.config.endpoint(&self.config.logout_path)?)
            .send()
            .await?;
        Self::ensure_success(response, "logout").await?;
        Ok(())
    }

    /// Clear the store and mark the session signed out, after any refresh in
    /// flight has committed.
    pub(crate) async fn end_local_session(&self) {
        let _guard = self.write_lock.lock().await;
        if let Err(e) = self.store.clear().await {
            tracing::error!(error = %e, "Token store clear failed");
        }
        self.state.set_unauthenticated();
    }

    /// Whether the backend answers its health endpoint.
    pub async fn health_check(&self) -> bool {
        let url = match self.config.endpoint(&self.config.health_path) {
            Ok(url) => url,
            Err(e) => {
                tracing::warn!(error = %e, "Health check URL invalid");
                return false;
            }
        };
        match self.http.get(url).send().await {
            Ok(response) => response.status().is_success(),
            Err(e) => {
                tracing::warn!(error = %e, "Health check failed");
                false
            }
        }
    }

    /// Checks HTTP response status; returns the response on success or an error with details.
    async fn ensure_success(
        response: reqwest::Response,
        operation: &'static str,
    ) -> Result<reqwest::Response, Error> {
        if response.status().is_success() {
            return Ok(response);
        }
        let status = response.status().as_u16();
        let detail = response.text().await.unwrap_or_default();
        Err(Error::Status {
            operation,
            status,
            detail,
        })
    }
}
