//! OAuth redirect handling.
//!
//! The backend finishes the Discord exchange and redirects the browser to the
//! dashboard callback with either tokens or an error in the query string.
//! [`AuthClient::complete_login`] turns that query into exactly one terminal
//! action.

use url::Url;

use crate::client::AuthClient;
use crate::error::Error;
use crate::navigation::Navigation;
use crate::store::TokenStore;
use crate::types::{AccessToken, RefreshToken, Session};

/// Query parameters of the callback URL. Empty values count as absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct CallbackParams {
    pub auth: Option<String>,
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub error: Option<String>,
    pub error_description: Option<String>,
    pub state: Option<String>,
}

/// Which branch of the redirect state machine a callback takes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallbackKind {
    SuccessWithTokens {
        access_token: AccessToken,
        refresh_token: RefreshToken,
    },
    SuccessWithoutTokens,
    ProviderError {
        error: String,
        description: Option<String>,
    },
    Malformed,
}

impl CallbackParams {
    /// Parse a raw query string (without the leading `?`).
    ///
    /// The first occurrence of a key wins.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let mut params = Self::default();
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            let slot = match key.as_ref() {
                "auth" => &mut params.auth,
                "access_token" => &mut params.access_token,
                "refresh_token" => &mut params.refresh_token,
                "error" => &mut params.error,
                "error_description" => &mut params.error_description,
                "state" => &mut params.state,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some(value.into_owned());
            }
        }
        params
    }

    #[must_use]
    pub fn from_url(url: &Url) -> Self {
        Self::from_query(url.query().unwrap_or_default())
    }

    #[must_use]
    pub fn kind(&self) -> CallbackKind {
        let present = |v: &Option<String>| v.as_deref().filter(|s| !s.is_empty()).map(str::to_owned);

        if self.auth.as_deref() == Some("success") {
            return match (present(&self.access_token), present(&self.refresh_token)) {
                (Some(access), Some(refresh)) => CallbackKind::SuccessWithTokens {
                    access_token: AccessToken::new(access),
                    refresh_token: RefreshToken::new(refresh),
                },
                _ => CallbackKind::SuccessWithoutTokens,
            };
        }

        let error = present(&self.error);
        let description = present(&self.error_description);
        match (error, description) {
            (Some(error), description) => CallbackKind::ProviderError { error, description },
            (None, Some(description)) => CallbackKind::ProviderError {
                error: description.clone(),
                description: Some(description),
            },
            (None, None) => CallbackKind::Malformed,
        }
    }
}

/// Terminal action of one callback.
#[derive(Debug)]
#[must_use = "the outcome carries the navigation to perform"]
pub enum CallbackOutcome {
    /// Tokens committed; reload the home route.
    SignedIn(Navigation),
    /// `auth=success` but no tokens: go home and rely on an existing session.
    SuccessWithoutTokens(Navigation),
    /// Show `error` to the user, then leave for the login route.
    Failed {
        error: Error,
        navigation: Navigation,
    },
}

impl CallbackOutcome {
    #[must_use]
    pub fn navigation(&self) -> &Navigation {
        match self {
            Self::SignedIn(navigation) | Self::SuccessWithoutTokens(navigation) => navigation,
            Self::Failed { navigation, .. } => navigation,
        }
    }

    /// Message to surface, for failed callbacks.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Failed { error, .. } => Some(error.to_string()),
            _ => None,
        }
    }
}

impl<S: TokenStore> AuthClient<S> {
    /// Handle the provider's redirect back to the dashboard.
    ///
    /// The stored login nonce is consumed on every call. With
    /// `verify_state` enabled, success callbacks whose `state` does not match
    /// it fail with [`Error::StateMismatch`].
    pub async fn complete_login(&self, params: &CallbackParams) -> CallbackOutcome {
        let stored_nonce = match self.store.take_nonce().await {
            Ok(nonce) => nonce,
            Err(e) => {
                tracing::warn!(error = %e, "Login nonce unreadable");
                None
            }
        };

        match params.kind() {
            CallbackKind::SuccessWithTokens {
                access_token,
                refresh_token,
            } => {
                if let Err(e) = self.check_state(params, stored_nonce.as_deref()) {
                    return self.failed(e);
                }

                {
                    let _guard = self.write_lock.lock().await;
                    let session = Session::issued(access_token, refresh_token);
                    if let Err(e) = self.store.save(session).await {
                        return self.failed(e);
                    }
                    self.state.set_authenticated();
                }

                tracing::info!("OAuth login successful");
                CallbackOutcome::SignedIn(Navigation::Reload(self.config.home_route.clone()))
            }
            CallbackKind::SuccessWithoutTokens => {
                if let Err(e) = self.check_state(params, stored_nonce.as_deref()) {
                    return self.failed(e);
                }
                tracing::warn!("OAuth callback reported success without tokens");
                CallbackOutcome::SuccessWithoutTokens(Navigation::Reload(
                    self.config.home_route.clone(),
                ))
            }
            CallbackKind::ProviderError { error, description } => {
                self.failed(Error::Provider { error, description })
            }
            CallbackKind::Malformed => self.failed(Error::MalformedCallback),
        }
    }

    fn check_state(&self, params: &CallbackParams, stored: Option<&str>) -> Result<(), Error> {
        if !self.config.verify_state {
            return Ok(());
        }
        match (params.state.as_deref(), stored) {
            (Some(received), Some(stored)) if received == stored => Ok(()),
            _ => {
                tracing::warn!("OAuth state mismatch");
                Err(Error::StateMismatch)
            }
        }
    }

    fn failed(&self, error: Error) -> CallbackOutcome {
        tracing::warn!(error = %error, "OAuth callback failed");
        CallbackOutcome::Failed {
            error,
            navigation: Navigation::Delayed {
                to: self.config.login_route.clone(),
                after: self.config.error_redirect_delay,
            },
        }
    }
}
