//! File-backed key-value store.
//!
//! Each key maps to one file in the data directory. The key is
//! percent-encoded into the file name so keys like `@GoBarber-cart` are safe
//! on every filesystem.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};

use super::{KeyValueStore, StorageError};

/// Key-value store persisting each key as a JSON file in a directory.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Io`] if the directory cannot be created.
    pub async fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        tokio::fs::create_dir_all(&dir).await?;
        debug!(dir = %dir.display(), "Opened file store");
        Ok(Self { dir })
    }

    /// Directory holding the stored values.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File that holds the value for `key`.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::InvalidKey`] for an empty key.
    pub fn path_for(&self, key: &str) -> Result<PathBuf, StorageError> {
        if key.is_empty() {
            return Err(StorageError::InvalidKey(key.to_owned()));
        }
        Ok(self.dir.join(format!("{}.json", urlencoding::encode(key))))
    }
}

impl KeyValueStore for FileStore {
    #[instrument(skip(self))]
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let path = self.path_for(key)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        // Invalid UTF-8 is bad data, not a failed read. Hand it on lossily
        // and let the caller's parser reject it.
        match String::from_utf8(bytes) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                warn!(path = %path.display(), "Stored value is not valid UTF-8");
                Ok(Some(String::from_utf8_lossy(e.as_bytes()).into_owned()))
            }
        }
    }

    #[instrument(skip(self, value), fields(bytes = value.len()))]
    async fn set(&self, key: &str, value: String) -> Result<(), StorageError> {
        let path = self.path_for(key)?;
        // Write beside the target and rename so readers never see a torn value.
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, value).await?;
        tokio::fs::rename(&tmp, &path).await?;
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_open_creates_directory() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("data");
        let store = FileStore::open(&dir).await.unwrap();
        assert!(store.dir().is_dir());
    }

    #[tokio::test]
    async fn test_get_missing_returns_none() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::open(tmp.path()).await.unwrap();
        assert_eq!(store.get("@GoBarber-cart").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_then_get() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::open(tmp.path()).await.unwrap();

        store.set("@GoBarber-cart", "[]".to_string()).await.unwrap();
        store
            .set("@GoBarber-cart", r#"[{"id":"1"}]"#.to_string())
            .await
            .unwrap();

        assert_eq!(
            store.get("@GoBarber-cart").await.unwrap().as_deref(),
            Some(r#"[{"id":"1"}]"#)
        );
        assert!(!store.path_for("@GoBarber-cart").unwrap().with_extension("json.tmp").exists());
    }

    #[tokio::test]
    async fn test_get_invalid_utf8_is_returned_lossily() {
        let tmp = tempfile::tempdir().unwrap();
        let store = FileStore::open(tmp.path()).await.unwrap();
        let path = store.path_for("@GoBarber-cart").unwrap();
        tokio::fs::write(&path, [0xff, 0xfe, b'[', b']']).await.unwrap();

        let value = store.get("@GoBarber-cart").await.unwrap().unwrap();
        assert_eq!(value, "\u{fffd}\u{fffd}[]");
    }

    #[test]
    fn test_path_for_encodes_key() {
        let store = FileStore {
            dir: PathBuf::from("/data"),
        };
        let path = store.path_for("@GoBarber-cart").unwrap();
        assert_eq!(path, PathBuf::from("/data/%40GoBarber-cart.json"));

        let path = store.path_for("../escape").unwrap();
        assert_eq!(path.parent(), Some(Path::new("/data")));
    }

    #[test]
    fn test_path_for_rejects_empty_key() {
        let store = FileStore {
            dir: PathBuf::from("/data"),
        };
        assert!(matches!(
            store.path_for(""),
            Err(StorageError::InvalidKey(_))
        ));
    }
}
