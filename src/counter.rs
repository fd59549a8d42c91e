//! Persisted count of successful conversions.
//!
//! The engine never touches storage directly; it is handed a
//! [`CounterStore`] at construction. Tests use [`MemoryCounterStore`], the
//! CLI uses [`JsonFileCounterStore`] under the platform data directory.

use crate::error::StoreError;
use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tempfile::NamedTempFile;
use tracing::debug;

/// Key-value persistence for the counter value.
pub trait CounterStore: Send + Sync {
    fn load(&self) -> Result<u64, StoreError>;
    fn store(&self, value: u64) -> Result<(), StoreError>;
}

/// In-process store. Starts at the given value and forgets on drop.
#[derive(Debug, Default)]
pub struct MemoryCounterStore {
    value: AtomicU64,
}

impl MemoryCounterStore {
    pub fn new(initial: u64) -> Self {
        Self {
            value: AtomicU64::new(initial),
        }
    }
}

impl CounterStore for MemoryCounterStore {
    fn load(&self) -> Result<u64, StoreError> {
        Ok(self.value.load(Ordering::SeqCst))
    }

    fn store(&self, value: u64) -> Result<(), StoreError> {
        self.value.store(value, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct CounterFile {
    conversions: u64,
}

/// Store backed by a small JSON file, replaced atomically on every write.
#[derive(Debug, Clone)]
pub struct JsonFileCounterStore {
    path: PathBuf,
}

impl JsonFileCounterStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/pdf2xlsx/counter.json`, or `None` on platforms without one.
    pub fn default_path() -> Option<PathBuf> {
        dirs::data_dir().map(|d| d.join("pdf2xlsx").join("counter.json"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl CounterStore for JsonFileCounterStore {
    fn load(&self) -> Result<u64, StoreError> {
        match std::fs::read(&self.path) {
            Ok(raw) => {
                let file: CounterFile = serde_json::from_slice(&raw)?;
                Ok(file.conversions)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn store(&self, value: u64) -> Result<(), StoreError> {
        let dir = match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => PathBuf::from("."),
        };
        std::fs::create_dir_all(&dir)?;

        let body = serde_json::to_vec_pretty(&CounterFile { conversions: value })?;
        let mut tmp = NamedTempFile::new_in(&dir)?;
        tmp.write_all(&body)?;
        tmp.flush()?;
        tmp.as_file_mut().sync_all()?;
        tmp.persist(&self.path)?;

        debug!("Counter {} written to {}", value, self.path.display());
        Ok(())
    }
}

/// Monotonic counter over a [`CounterStore`].
#[derive(Clone)]
pub struct ConversionCounter {
    store: Arc<dyn CounterStore>,
}

impl ConversionCounter {
    pub fn new(store: Arc<dyn CounterStore>) -> Self {
        Self { store }
    }

    /// Counter that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryCounterStore::default()))
    }

    pub fn get(&self) -> Result<u64, StoreError> {
        self.store.load()
    }

    /// Read, add one, write back. Returns the new total.
    pub fn increment(&self) -> Result<u64, StoreError> {
        let next = self.store.load()?.saturating_add(1);
        self.store.store(next)?;
        Ok(next)
    }
}

impl std::fmt::Debug for ConversionCounter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConversionCounter")
            .field("store", &"<dyn CounterStore>")
            .finish()
    }
}
