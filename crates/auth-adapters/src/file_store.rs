//! # FileSessionStore
//!
//! A JSON object on disk used like browser local storage: string keys,
//! values that are either JSON-encoded strings (the way a browser stores
//! them) or plain JSON objects. The current user lives under one key,
//! `currentUser` by default.

use std::path::{Path, PathBuf};

use domains::{CurrentUser, SessionStore};
use serde_json::{Map, Value};
use thiserror::Error;
use tracing::{debug, warn};

pub const DEFAULT_SESSION_KEY: &str = "currentUser";

#[derive(Error, Debug)]
pub enum SessionStoreError {
    #[error("failed to read session file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("session file {path} is not a JSON object: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("stored value under {key:?} is not a user record: {reason}")]
    InvalidRecord { key: String, reason: String },
}

#[derive(Debug, Clone)]
pub struct FileSessionStore {
    path: PathBuf,
    key: String,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_key(path, DEFAULT_SESSION_KEY)
    }

    pub fn with_key(path: impl Into<PathBuf>, key: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            key: key.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Strict read. A missing file or key, or a stored `null`, is `Ok(None)`.
    pub fn load(&self) -> Result<Option<CurrentUser>, SessionStoreError> {
        let raw = match std::fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no session file");
                return Ok(None);
            }
            Err(source) => {
                return Err(SessionStoreError::Io {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let entries: Map<String, Value> =
            serde_json::from_str(&raw).map_err(|e| SessionStoreError::Malformed {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;

        let record = match entries.get(&self.key) {
            None | Some(Value::Null) => return Ok(None),
            // Browser storage keeps the record as a JSON-encoded string.
            Some(Value::String(encoded)) => {
                serde_json::from_str::<Value>(encoded).map_err(|e| self.invalid(e))?
            }
            Some(other) => other.clone(),
        };

        if record.is_null() {
            return Ok(None);
        }
        serde_json::from_value(record).map(Some).map_err(|e| self.invalid(e))
    }

    fn invalid(&self, e: serde_json::Error) -> SessionStoreError {
        SessionStoreError::InvalidRecord {
            key: self.key.clone(),
            reason: e.to_string(),
        }
    }
}

impl SessionStore for FileSessionStore {
    /// Lenient read: anything unreadable counts as anonymous.
    fn current_user(&self) -> Option<CurrentUser> {
        match self.load() {
            Ok(user) => user,
            Err(e) => {
                warn!(error = %e, "ignoring unreadable session");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn store_with(contents: &str) -> (TempDir, FileSessionStore) {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, contents).unwrap();
        (dir, FileSessionStore::new(path))
    }

    #[test]
    fn missing_file_is_anonymous() {
        let dir = TempDir::new().unwrap();
        let store = FileSessionStore::new(dir.path().join("nope.json"));
        assert_eq!(store.load().unwrap(), None);
        assert!(!store.session().is_logged_in());
    }

    #[test]
    fn reads_browser_style_encoded_string() {
        let (_dir, store) =
            store_with(r#"{ "currentUser": "{\"username\":\"alice\",\"isAdmin\":false}" }"#);
        assert_eq!(store.current_user(), Some(CurrentUser::new("alice", false)));
    }

    #[test]
    fn reads_plain_object_record() {
        let (_dir, store) = store_with(r#"{ "currentUser": { "username": "root", "isAdmin": true } }"#);
        let session = store.session();
        assert!(session.is_admin());
        assert_eq!(session.author_name(), "root");
    }

    #[test]
    fn stored_null_is_anonymous() {
        let (_dir, store) = store_with(r#"{ "currentUser": "null", "other": 1 }"#);
        assert_eq!(store.load().unwrap(), None);
    }

    #[test]
    fn custom_key_is_honoured() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("s.json");
        fs::write(&path, r#"{ "me": { "username": "kim" } }"#).unwrap();
        let store = FileSessionStore::with_key(&path, "me");
        assert_eq!(store.current_user().and_then(|u| u.username), Some("kim".to_string()));
    }

    #[test]
    fn corrupt_record_is_an_error_but_reads_as_anonymous() {
        let (_dir, store) = store_with(r#"{ "currentUser": "{not json" }"#);
        assert!(matches!(store.load(), Err(SessionStoreError::InvalidRecord { .. })));
        assert_eq!(store.current_user(), None);

        let (_dir, store) = store_with("[1, 2, 3]");
        assert!(matches!(store.load(), Err(SessionStoreError::Malformed { .. })));
        assert_eq!(store.current_user(), None);
    }
}
