#![doc = include_str!("../README.md")]

pub mod callback;
pub mod client;
pub mod config;
pub mod error;
pub mod guard;
pub mod navigation;
pub mod nonce;
pub mod session;
#[cfg(feature = "shell")]
pub mod shell;
pub mod store;
pub mod types;

// Re-exports for convenient access
pub use callback::{CallbackKind, CallbackOutcome, CallbackParams};
pub use client::{AuthClient, LoginRequest, RequestOutcome};
pub use config::AuthConfig;
pub use error::Error;
pub use guard::{Guard, GuardDecision};
pub use navigation::Navigation;
pub use nonce::generate_state;
pub use session::{SessionState, SessionStatus};
pub use store::{FileTokenStore, MemoryTokenStore, ScopedTokenStore, StorageScope, TokenStore};
pub use types::{AccessToken, RefreshToken, Session, UserIdentity};

pub use reqwest::Method;
