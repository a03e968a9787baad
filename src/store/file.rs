use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::{Record, TokenStore};
use crate::error::Error;
use crate::types::{AccessToken, Session};

/// Persistent store backed by a single JSON file.
///
/// Writes land in a sibling `.tmp` file that is renamed over the target.
/// `clear()` removes the file, so a reader sees either the full record or
/// nothing.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    // serializes read-modify-write cycles
    lock: Mutex<()>,
}

impl FileTokenStore {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn read(&self) -> Result<Record, Error> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(Record::default()),
            Err(e) => Err(e.into()),
        }
    }

    async fn write(&self, record: &Record) -> Result<(), Error> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        // A stale temp file keeps its old mode, so start from a fresh one.
        match tokio::fs::remove_file(&tmp).await {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        let mut options = OpenOptions::new();
        options.write(true).create_new(true);
        #[cfg(unix)]
        options.mode(0o600);

        let mut file = options.open(&tmp).await?;
        file.write_all(&serde_json::to_vec_pretty(record)?).await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    async fn load(&self) -> Result<Session, Error> {
        let _guard = self.lock.lock().await;
        Ok(self.read().await?.session)
    }

    async fn save(&self, session: Session) -> Result<(), Error> {
        let _guard = self.lock.lock().await;
        let mut record = self.read().await?;
        record.session = session;
        self.write(&record).await
    }

    async fn replace_access_token(&self, token: AccessToken) -> Result<(), Error> {
        let _guard = self.lock.lock().await;
        let mut record = self.read().await?;
        record.session.access_token = Some(token);
        self.write(&record).await
    }

    async fn save_nonce(&self, nonce: String) -> Result<(), Error> {
        let _guard = self.lock.lock().await;
        let mut record = self.read().await?;
        record.oauth_state = Some(nonce);
        self.write(&record).await
    }

    async fn take_nonce(&self) -> Result<Option<String>, Error> {
        let _guard = self.lock.lock().await;
        let mut record = self.read().await?;
        let nonce = record.oauth_state.take();
        if nonce.is_some() {
            self.write(&record).await?;
        }
        Ok(nonce)
    }

    async fn clear(&self) -> Result<(), Error> {
        let _guard = self.lock.lock().await;
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{RefreshToken, UserIdentity};

    fn issued(access: &str, refresh: &str) -> Session {
        Session::issued(AccessToken::new(access), RefreshToken::new(refresh))
    }

    #[tokio::test]
    async fn missing_file_loads_empty_session() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("session.json"));

        assert!(store.load().await.unwrap().is_empty());
        assert_eq!(store.take_nonce().await.unwrap(), None);
    }

    #[tokio::test]
    async fn session_survives_a_new_store_instance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let mut session = issued("a1", "r1");
        session.user = Some(UserIdentity::new("7", "matcha").with_email("m@example.com"));
        FileTokenStore::new(&path).save(session.clone()).await.unwrap();

        let reopened = FileTokenStore::new(&path);
        assert_eq!(reopened.load().await.unwrap(), session);
    }

    #[tokio::test]
    async fn replace_access_token_rewrites_only_access_token() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("session.json"));
        store.save(issued("a1", "r1")).await.unwrap();
        store.save_nonce("n".into()).await.unwrap();

        store
            .replace_access_token(AccessToken::new("a2"))
            .await
            .unwrap();

        assert_eq!(store.load().await.unwrap(), issued("a2", "r1"));
        assert_eq!(store.take_nonce().await.unwrap().as_deref(), Some("n"));
    }

    #[tokio::test]
    async fn clear_removes_file_and_every_field() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let store = FileTokenStore::new(&path);
        store.save(issued("a", "r")).await.unwrap();
        store.save_nonce("n".into()).await.unwrap();

        store.clear().await.unwrap();
        store.clear().await.unwrap();

        assert!(!path.exists());
        assert!(store.load().await.unwrap().is_empty());
        assert_eq!(store.take_nonce().await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_file_is_a_serialization_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        std::fs::write(&path, b"not json").unwrap();

        let err = FileTokenStore::new(&path).load().await.unwrap_err();
        assert!(matches!(err, Error::Serialization(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn file_is_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        FileTokenStore::new(&path)
            .save(issued("a", "r"))
            .await
            .unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn stale_temp_file_does_not_leak_its_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        let tmp = dir.path().join("session.json.tmp");
        std::fs::write(&tmp, b"{}").unwrap();
        std::fs::set_permissions(&tmp, std::fs::Permissions::from_mode(0o644)).unwrap();

        let store = FileTokenStore::new(&path);
        store.save(issued("a", "r")).await.unwrap();

        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o600);
        assert!(!tmp.exists());
        assert_eq!(store.load().await.unwrap(), issued("a", "r"));
    }
}
