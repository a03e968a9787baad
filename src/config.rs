use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::Error;
use crate::store::StorageScope;

/// Dashboard authentication configuration.
///
/// Required fields are constructor parameters; everything else has a default
/// and a `with_*` override.
///
/// ```rust,ignore
/// use dashboard_auth::AuthConfig;
///
/// let config = AuthConfig::new(
///     "https://api.example.com".parse()?,
///     "https://dashboard.example.com".parse()?,
/// )
/// .with_verify_state(true);
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct AuthConfig {
    pub(crate) backend_url: Url,
    pub(crate) frontend_url: Url,
    pub(crate) provider_login_path: String,
    pub(crate) callback_path: String,
    pub(crate) refresh_path: String,
    pub(crate) revoke_path: String,
    pub(crate) logout_path: String,
    pub(crate) health_path: String,
    pub(crate) login_route: String,
    pub(crate) home_route: String,
    pub(crate) error_redirect_delay: Duration,
    pub(crate) storage: StorageScope,
    pub(crate) verify_state: bool,
}

impl AuthConfig {
    /// Create a configuration for the given backend and dashboard origins.
    #[must_use]
    pub fn new(backend_url: Url, frontend_url: Url) -> Self {
        Self {
            backend_url,
            frontend_url,
            provider_login_path: "/auth/discord/login".into(),
            callback_path: "/auth/discord/callback".into(),
            refresh_path: "/token/refresh".into(),
            revoke_path: "/token/revoke".into(),
            logout_path: "/logout".into(),
            health_path: "/healthz".into(),
            login_route: "/login".into(),
            home_route: "/".into(),
            error_redirect_delay: Duration::from_millis(3000),
            storage: StorageScope::Session,
            verify_state: false,
        }
    }

    /// Create a configuration from environment variables.
    ///
    /// # Required env vars
    /// - `DASHBOARD_BACKEND_URL`: backend origin (token, logout and login endpoints)
    /// - `DASHBOARD_FRONTEND_URL`: dashboard origin (OAuth callback target)
    ///
    /// # Optional env vars
    /// - `DASHBOARD_TOKEN_FILE`: keep tokens in this file instead of memory
    /// - `DASHBOARD_VERIFY_STATE`: `"1"` or `"true"` to reject callbacks whose `state` differs
    /// - `DASHBOARD_ERROR_REDIRECT_MS`: delay before leaving a failed callback
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if a required var is missing or a value is invalid.
    pub fn from_env() -> Result<Self, Error> {
        let backend_url = required_url("DASHBOARD_BACKEND_URL")?;
        let frontend_url = required_url("DASHBOARD_FRONTEND_URL")?;

        let mut config = Self::new(backend_url, frontend_url);

        if let Ok(path) = std::env::var("DASHBOARD_TOKEN_FILE")
            && !path.trim().is_empty()
        {
            config = config.with_storage(StorageScope::Persistent(PathBuf::from(path)));
        }

        let verify_state = matches!(
            std::env::var("DASHBOARD_VERIFY_STATE").as_deref(),
            Ok("1") | Ok("true"),
        );
        config = config.with_verify_state(verify_state);

        if let Ok(ms) = std::env::var("DASHBOARD_ERROR_REDIRECT_MS") {
            let ms: u64 = ms
                .trim()
                .parse()
                .map_err(|e| Error::Config(format!("DASHBOARD_ERROR_REDIRECT_MS: {e}")))?;
            config = config.with_error_redirect_delay(Duration::from_millis(ms));
        }

        Ok(config)
    }

    #[must_use]
    pub fn with_provider_login_path(mut self, path: impl Into<String>) -> Self {
        self.provider_login_path = path.into();
        self
    }

    #[must_use]
    pub fn with_callback_path(mut self, path: impl Into<String>) -> Self {
        self.callback_path = path.into();
        self
    }

    #[must_use]
    pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
        self.refresh_path = path.into();
        self
    }

    #[must_use]
    pub fn with_revoke_path(mut self, path: impl Into<String>) -> Self {
        self.revoke_path = path.into();
        self
    }

    #[must_use]
    pub fn with_logout_path(mut self, path: impl Into<String>) -> Self {
        self.logout_path = path.into();
        self
    }

    #[must_use]
    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    #[must_use]
    pub fn with_home_route(mut self, route: impl Into<String>) -> Self {
        self.home_route = route.into();
        self
    }

    /// Delay before a failed callback moves on to the login route (default 3 s).
    #[must_use]
    pub fn with_error_redirect_delay(mut self, delay: Duration) -> Self {
        self.error_redirect_delay = delay;
        self
    }

    #[must_use]
    pub fn with_storage(mut self, storage: StorageScope) -> Self {
        self.storage = storage;
        self
    }

    /// Require the callback `state` to match the nonce stored at login.
    #[must_use]
    pub fn with_verify_state(mut self, verify: bool) -> Self {
        self.verify_state = verify;
        self
    }

    #[must_use]
    pub fn backend_url(&self) -> &Url {
        &self.backend_url
    }

    #[must_use]
    pub fn frontend_url(&self) -> &Url {
        &self.frontend_url
    }

    /// In-app route of the dashboard's OAuth callback.
    #[must_use]
    pub fn callback_path(&self) -> &str {
        &self.callback_path
    }

    #[must_use]
    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    #[must_use]
    pub fn home_route(&self) -> &str {
        &self.home_route
    }

    #[must_use]
    pub fn error_redirect_delay(&self) -> Duration {
        self.error_redirect_delay
    }

    #[must_use]
    pub fn storage(&self) -> &StorageScope {
        &self.storage
    }

    #[must_use]
    pub fn verify_state(&self) -> bool {
        self.verify_state
    }

    /// Absolute URL of the dashboard callback the provider redirects to.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the joined URL does not parse.
    pub fn callback_url(&self) -> Result<Url, Error> {
        join(&self.frontend_url, &self.callback_path)
    }

    /// Absolute URL of a backend endpoint.
    pub(crate) fn endpoint(&self, path: &str) -> Result<Url, Error> {
        join(&self.backend_url, path)
    }
}

/// Appends `path` to `base`, keeping any path prefix `base` already has.
fn join(base: &Url, path: &str) -> Result<Url, Error> {
    let joined = format!(
        "{}/{}",
        base.as_str().trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    joined
        .parse()
        .map_err(|e| Error::Config(format!("{joined}: {e}")))
}

fn required_url(var: &str) -> Result<Url, Error> {
    let value = std::env::var(var).map_err(|_| Error::Config(format!("{var} is required")))?;
    value
        .parse()
        .map_err(|e| Error::Config(format!("{var}: {e}")))
}
