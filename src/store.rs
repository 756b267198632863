//! Durable storage for the selected environment.
//!
//! A single key, `"environment"`, kept in `environment.json` under the state
//! directory. Writes are synchronous and report their outcome.

use serde::{Deserialize, Serialize};
use std::{
    path::{Path, PathBuf},
    sync::{
        atomic::{AtomicU64, Ordering},
        Mutex,
    },
};
use thiserror::Error;

pub const STATE_FILENAME: &str = "environment.json";

static TMP_SEQ: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed state file: {0}")]
    Json(#[from] serde_json::Error),
}

pub trait EnvironmentStore: Send + Sync {
    /// Persisted environment name, if any was saved.
    fn load(&self) -> Result<Option<String>, StoreError>;

    /// Returns only once the value is durable.
    fn save(&self, name: &str) -> Result<(), StoreError>;
}

#[derive(Default, Serialize, Deserialize)]
struct StateFile {
    environment: Option<String>,
}

#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(STATE_FILENAME)
    }

    fn read_state(path: &Path) -> Result<StateFile, StoreError> {
        match std::fs::read_to_string(path) {
            Ok(s) if s.trim().is_empty() => Ok(StateFile::default()),
            Ok(s) => Ok(serde_json::from_str(&s)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(StateFile::default()),
            Err(e) => Err(e.into()),
        }
    }
}

impl EnvironmentStore for FileStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        let state = Self::read_state(&self.path())?;
        Ok(state.environment.filter(|s| !s.trim().is_empty()))
    }

    fn save(&self, name: &str) -> Result<(), StoreError> {
        std::fs::create_dir_all(&self.dir)?;
        let state = StateFile { environment: Some(name.to_string()) };
        let body = serde_json::to_vec_pretty(&state)?;

        // write-then-rename so a crash never leaves a half-written file;
        // each write gets its own temp file so concurrent saves never share one
        let seq = TMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let tmp = self
            .dir
            .join(format!("{STATE_FILENAME}.{}.{seq}.tmp", std::process::id()));
        {
            use std::io::Write;
            let mut f = std::fs::File::create(&tmp)?;
            f.write_all(&body)?;
            f.sync_all()?;
        }
        std::fs::rename(&tmp, self.path())?;
        Ok(())
    }
}

/// Non-durable store for tests and embedders that persist elsewhere.
#[derive(Debug, Default)]
pub struct MemoryStore {
    value: Mutex<Option<String>>,
}

impl MemoryStore {
    pub fn with_value(name: impl Into<String>) -> Self {
        Self { value: Mutex::new(Some(name.into())) }
    }
}

impl EnvironmentStore for MemoryStore {
    fn load(&self) -> Result<Option<String>, StoreError> {
        Ok(self.value.lock().unwrap_or_else(|e| e.into_inner()).clone())
    }

    fn save(&self, name: &str) -> Result<(), StoreError> {
        *self.value.lock().unwrap_or_else(|e| e.into_inner()) = Some(name.to_string());
        Ok(())
    }
}
