use axum::Router;
use axum::extract::{Query, RawQuery, State};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use serde::Deserialize;

use super::extractor::SignedIn;
use super::pages;
use super::state::ShellState;
use crate::callback::{CallbackOutcome, CallbackParams};
use crate::client::AuthClient;
use crate::error::Error;
use crate::guard::Guard;
use crate::navigation::Navigation;
use crate::store::TokenStore;

const LOGOUT_PATH: &str = "/logout";

/// Create the dashboard shell router.
///
/// Call [`AuthClient::restore`] before serving; until then the guarded
/// dashboard answers `503`.
pub fn shell_routes<S: TokenStore>(client: AuthClient<S>) -> Router {
    let config = client.config();
    let login_route = config.login_route().to_string();
    let callback_path = config.callback_path().to_string();
    let home_route = config.home_route().to_string();

    let state = ShellState {
        guard: Guard::new(login_route.clone()),
        client,
    };

    Router::new()
        .route(&login_route, get(login_page::<S>))
        .route(&start_path(&login_route), get(start_login::<S>))
        .route(&callback_path, get(callback::<S>))
        .route(LOGOUT_PATH, post(logout::<S>))
        .route(&home_route, get(dashboard))
        .with_state(state)
}

fn start_path(login_route: &str) -> String {
    format!("{}/discord", login_route.trim_end_matches('/'))
}

// ── Login ──────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct LoginPageParams {
    error: Option<String>,
}

async fn login_page<S: TokenStore>(
    State(state): State<ShellState<S>>,
    Query(params): Query<LoginPageParams>,
) -> Response {
    let config = state.client.config();
    if state.client.session_state().is_logged_in() {
        return Redirect::to(config.home_route()).into_response();
    }
    Html(pages::login(
        &start_path(config.login_route()),
        params.error.as_deref(),
    ))
    .into_response()
}

async fn start_login<S: TokenStore>(
    State(state): State<ShellState<S>>,
) -> Result<Response, Error> {
    let request = state.client.begin_login().await?;
    Ok(navigate(request.navigation()))
}

// ── Callback ───────────────────────────────────────────────────────

async fn callback<S: TokenStore>(
    State(state): State<ShellState<S>>,
    RawQuery(query): RawQuery,
) -> Response {
    let params = CallbackParams::from_query(query.as_deref().unwrap_or_default());

    match state.client.complete_login(&params).await {
        CallbackOutcome::SignedIn(navigation) | CallbackOutcome::SuccessWithoutTokens(navigation) => {
            navigate(navigation)
        }
        CallbackOutcome::Failed { error, navigation } => match navigation {
            Navigation::Delayed { to, after } => {
                Html(pages::callback_failed(&error.to_string(), &to, after)).into_response()
            }
            other => navigate(other),
        },
    }
}

// ── Logout ─────────────────────────────────────────────────────────

async fn logout<S: TokenStore>(State(state): State<ShellState<S>>) -> Response {
    navigate(state.client.logout().await)
}

// ── Dashboard ──────────────────────────────────────────────────────

async fn dashboard(user: SignedIn) -> Html<String> {
    Html(pages::dashboard(user.display_name(), LOGOUT_PATH))
}

// ── Helpers ────────────────────────────────────────────────────────

fn navigate(navigation: Navigation) -> Response {
    match navigation {
        Navigation::External(url) => Redirect::to(url.as_str()).into_response(),
        Navigation::Reload(to) => Redirect::to(&to).into_response(),
        Navigation::Delayed { to, after } => Html(pages::callback_failed("", &to, after)).into_response(),
    }
}
