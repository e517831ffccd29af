use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::AppError;
use crate::models::history::{RideHistoryItem, User};

pub const HISTORY_LIMIT: usize = 50;

const HISTORY_KEY: &str = "ride_compare_history";
const USER_KEY: &str = "ride_compare_user";
const TOKEN_KEY: &str = "ride_compare_token";

/// Local string key-value persistence.
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, AppError>;
    fn set(&self, key: &str, value: String) -> Result<(), AppError>;
    fn remove(&self, key: &str) -> Result<(), AppError>;
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: DashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.entries.get(key).map(|entry| entry.value().clone()))
    }

    fn set(&self, key: &str, value: String) -> Result<(), AppError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        self.entries.remove(key);
        Ok(())
    }
}

/// All keys kept in a single JSON object on disk, rewritten on every change.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, String>>,
}

impl FileStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref().to_path_buf();

        let entries = match fs::read_to_string(&path) {
            Ok(raw) => serde_json::from_str(&raw).map_err(|err| {
                AppError::Internal(format!("corrupt store {}: {err}", path.display()))
            })?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => HashMap::new(),
            Err(err) => {
                return Err(AppError::Internal(format!(
                    "failed to read store {}: {err}",
                    path.display()
                )));
            }
        };

        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    fn flush(&self, entries: &HashMap<String, String>) -> Result<(), AppError> {
        let raw = serde_json::to_string_pretty(entries)
            .map_err(|err| AppError::Internal(format!("failed to encode store: {err}")))?;

        fs::write(&self.path, raw).map_err(|err| {
            AppError::Internal(format!("failed to write store {}: {err}", self.path.display()))
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>, AppError> {
        self.entries
            .lock()
            .map_err(|_| AppError::Internal("store lock poisoned".to_string()))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, AppError> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: String) -> Result<(), AppError> {
        let mut entries = self.lock()?;
        entries.insert(key.to_string(), value);
        self.flush(&entries)
    }

    fn remove(&self, key: &str) -> Result<(), AppError> {
        let mut entries = self.lock()?;
        if entries.remove(key).is_some() {
            self.flush(&entries)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: Option<User>,
    pub token: Option<String>,
}

/// Typed view over the key-value store: search history and the signed-in user.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<dyn KeyValueStore>,
    history_lock: Arc<Mutex<()>>,
}

impl SessionStore {
    pub fn new(inner: Arc<dyn KeyValueStore>) -> Self {
        Self {
            inner,
            history_lock: Arc::new(Mutex::new(())),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Newest first; unreadable history is treated as empty.
    pub fn history(&self) -> Result<Vec<RideHistoryItem>, AppError> {
        let Some(raw) = self.inner.get(HISTORY_KEY)? else {
            return Ok(Vec::new());
        };

        match serde_json::from_str(&raw) {
            Ok(items) => Ok(items),
            Err(err) => {
                warn!(error = %err, "discarding unreadable ride history");
                Ok(Vec::new())
            }
        }
    }

    /// Read-modify-write of the history list, serialised across handlers.
    pub fn record(&self, item: RideHistoryItem) -> Result<Vec<RideHistoryItem>, AppError> {
        let _guard = self
            .history_lock
            .lock()
            .map_err(|_| AppError::Internal("history lock poisoned".to_string()))?;
        let mut history = self.history()?;

        let position = history
            .iter()
            .position(|existing| existing.timestamp <= item.timestamp)
            .unwrap_or(history.len());
        history.insert(position, item);
        history.truncate(HISTORY_LIMIT);

        let raw = serde_json::to_string(&history)
            .map_err(|err| AppError::Internal(format!("failed to encode history: {err}")))?;
        self.inner.set(HISTORY_KEY, raw)?;

        Ok(history)
    }

    pub fn save_session(&self, user: &User, token: &str) -> Result<(), AppError> {
        let raw = serde_json::to_string(user)
            .map_err(|err| AppError::Internal(format!("failed to encode user: {err}")))?;

        self.inner.set(USER_KEY, raw)?;
        self.inner.set(TOKEN_KEY, token.to_string())
    }

    pub fn session(&self) -> Result<Session, AppError> {
        let user = match self.inner.get(USER_KEY)? {
            Some(raw) => serde_json::from_str(&raw).ok(),
            None => None,
        };

        Ok(Session {
            user,
            token: self.inner.get(TOKEN_KEY)?,
        })
    }

    pub fn clear_session(&self) -> Result<(), AppError> {
        self.inner.remove(USER_KEY)?;
        self.inner.remove(TOKEN_KEY)
    }
}
