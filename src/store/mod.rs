//! Token persistence.
//!
//! Every read and write of tokens, user identity and the login nonce goes
//! through [`TokenStore`]. Whether that storage lives only as long as the
//! process or survives restarts is picked once, with [`StorageScope`].

use std::future::Future;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::types::{AccessToken, Session};

mod file;
mod memory;

pub use file::FileTokenStore;
pub use memory::MemoryTokenStore;

/// Storage backend for the client-side session.
///
/// `clear()` must be atomic from the caller's view: after it returns, `load()`
/// yields an empty session and `take_nonce()` yields `None`, with no state in
/// between observable.
///
/// # Example
///
/// ```rust,ignore
/// impl TokenStore for KeyringStore {
///     async fn load(&self) -> Result<Session, Error> {
///         Ok(self.read_entry()?.unwrap_or_default())
///     }
///     // ...
/// }
/// ```
pub trait TokenStore: Send + Sync + 'static {
    /// Read the current session. Absent fields come back as `None`.
    fn load(&self) -> impl Future<Output = Result<Session, Error>> + Send;

    /// Replace the stored session. The login nonce is left untouched.
    fn save(&self, session: Session) -> impl Future<Output = Result<(), Error>> + Send;

    /// Swap the access token, keeping refresh token and user as they are.
    fn replace_access_token(
        &self,
        token: AccessToken,
    ) -> impl Future<Output = Result<(), Error>> + Send;

    /// Remember the `state` value sent with the login redirect.
    fn save_nonce(&self, nonce: String) -> impl Future<Output = Result<(), Error>> + Send;

    /// Remove and return the stored login nonce.
    fn take_nonce(&self) -> impl Future<Output = Result<Option<String>, Error>> + Send;

    /// Drop everything: tokens, user and nonce.
    fn clear(&self) -> impl Future<Output = Result<(), Error>> + Send;
}

/// Everything a store keeps, as one unit so it can be cleared in one step.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Record {
    #[serde(flatten)]
    pub(crate) session: Session,
    #[serde(default)]
    pub(crate) oauth_state: Option<String>,
}

/// Lifetime of stored credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StorageScope {
    /// In memory only; a new process always starts signed out.
    #[default]
    Session,
    /// JSON file at the given path.
    Persistent(PathBuf),
}

impl StorageScope {
    /// Open the store matching this scope.
    #[must_use]
    pub fn open(&self) -> ScopedTokenStore {
        match self {
            Self::Session => ScopedTokenStore::Memory(MemoryTokenStore::new()),
            Self::Persistent(path) => ScopedTokenStore::File(FileTokenStore::new(path.clone())),
        }
    }
}

/// Store selected at runtime from a [`StorageScope`].
#[derive(Debug)]
pub enum ScopedTokenStore {
    Memory(MemoryTokenStore),
    File(FileTokenStore),
}

impl TokenStore for ScopedTokenStore {
    async fn load(&self) -> Result<Session, Error> {
        match self {
            Self::Memory(store) => store.load().await,
            Self::File(store) => store.load().await,
        }
    }

    async fn save(&self, session: Session) -> Result<(), Error> {
        match self {
            Self::Memory(store) => store.save(session).await,
            Self::File(store) => store.save(session).await,
        }
    }

    async fn replace_access_token(&self, token: AccessToken) -> Result<(), Error> {
        match self {
            Self::Memory(store) => store.replace_access_token(token).await,
            Self::File(store) => store.replace_access_token(token).await,
        }
    }

    async fn save_nonce(&self, nonce: String) -> Result<(), Error> {
        match self {
            Self::Memory(store) => store.save_nonce(nonce).await,
            Self::File(store) => store.save_nonce(nonce).await,
        }
    }

    async fn take_nonce(&self) -> Result<Option<String>, Error> {
        match self {
            Self::Memory(store) => store.take_nonce().await,
            Self::File(store) => store.take_nonce().await,
        }
    }

    async fn clear(&self) -> Result<(), Error> {
        match self {
            Self::Memory(store) => store.clear().await,
            Self::File(store) => store.clear().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::RefreshToken;

    #[tokio::test]
    async fn session_scope_opens_memory_store() {
        let store = StorageScope::Session.open();
        assert!(matches!(store, ScopedTokenStore::Memory(_)));
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn persistent_scope_opens_file_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = StorageScope::Persistent(path.clone()).open();
        assert!(matches!(store, ScopedTokenStore::File(_)));

        store
            .save(Session::issued(AccessToken::new("a"), RefreshToken::new("r")))
            .await
            .unwrap();
        assert!(path.exists());
    }

    #[test]
    fn record_uses_flat_storage_keys() {
        let record = Record {
            session: Session::issued(AccessToken::new("a"), RefreshToken::new("r")),
            oauth_state: Some("nonce".into()),
        };
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["access_token"], "a");
        assert_eq!(json["refresh_token"], "r");
        assert_eq!(json["oauth_state"], "nonce");
        assert!(json.get("session").is_none());
    }
}
