//! Axum app shell around the session core.
//!
//! Serves the login page, the provider redirect, the OAuth callback, logout,
//! and the guarded dashboard route.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use dashboard_auth::{AuthClient, AuthConfig, shell::shell_routes};
//!
//! let config = AuthConfig::from_env()?;
//! let client = AuthClient::new(config.clone(), config.storage().open());
//! client.restore().await;
//!
//! let app = axum::Router::new().merge(shell_routes(client));
//! ```

mod error;
mod extractor;
mod pages;
mod routes;
mod state;

pub use extractor::{GuardRejection, SignedIn};
pub use routes::shell_routes;
