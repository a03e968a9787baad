use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{Record, TokenStore};
use crate::error::Error;
use crate::types::{AccessToken, Session};

/// Session-scoped store: credentials live as long as this value.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    record: Mutex<Record>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn record(&self) -> MutexGuard<'_, Record> {
        // A panic elsewhere cannot leave a Record half-written.
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Session, Error> {
        Ok(self.record().session.clone())
    }

    async fn save(&self, session: Session) -> Result<(), Error> {
        self.record().session = session;
        Ok(())
    }

    async fn replace_access_token(&self, token: AccessToken) -> Result<(), Error> {
        self.record().session.access_token = Some(token);
        Ok(())
    }

    async fn save_nonce(&self, nonce: String) -> Result<(), Error> {
        self.record().oauth_state = Some(nonce);
        Ok(())
    }

    async fn take_nonce(&self) -> Result<Option<String>, Error> {
        Ok(self.record().oauth_state.take())
    }

    async fn clear(&self) -> Result<(), Error> {
        *self.record() = Record::default();
        Ok(())
    }
}
