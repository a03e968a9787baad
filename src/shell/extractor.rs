use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{StatusCode, header::RETRY_AFTER};
use axum::response::{IntoResponse, Redirect, Response};

use super::state::ShellState;
use crate::guard::GuardDecision;
use crate::store::TokenStore;
use crate::types::UserIdentity;

/// Signed-in user, extracted by the navigation guard.
///
/// Handlers taking this extractor only run when the session is
/// authenticated. While startup is still reading the token store the request
/// gets an empty `503` with `Retry-After`; once signed out it is redirected
/// to the login route.
///
/// ```rust,ignore
/// async fn dashboard(user: SignedIn) -> impl IntoResponse {
///     format!("Hello, {}", user.display_name())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub user: Option<UserIdentity>,
}

impl SignedIn {
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.user.as_ref().map_or("there", |u| u.username.as_str())
    }
}

/// Why the guard refused a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardRejection {
    /// Session status not known yet.
    Pending,
    /// Signed out; go to this route.
    Redirect(String),
}

impl IntoResponse for GuardRejection {
    fn into_response(self) -> Response {
        match self {
            Self::Pending => (StatusCode::SERVICE_UNAVAILABLE, [(RETRY_AFTER, "1")]).into_response(),
            Self::Redirect(to) => Redirect::to(&to).into_response(),
        }
    }
}

impl<S: TokenStore> FromRequestParts<ShellState<S>> for SignedIn {
    type Rejection = GuardRejection;

    async fn from_request_parts(
        _parts: &mut Parts,
        state: &ShellState<S>,
    ) -> Result<Self, Self::Rejection> {
        match state.guard.decide(state.client.session_state().status()) {
            GuardDecision::Wait => Err(GuardRejection::Pending),
            GuardDecision::Redirect(navigation) => {
                Err(GuardRejection::Redirect(navigation.target().to_string()))
            }
            GuardDecision::Admit => {
                let user = match state.client.session().await {
                    Ok(session) => session.user,
                    Err(e) => {
                        tracing::warn!(error = %e, "Session unreadable, rendering without user");
                        None
                    }
                };
                Ok(Self { user })
            }
        }
    }
}
