//! Persistence service: mirrors the application state into the local
//! key-value store.
//!
//! The store is a best-effort mirror; the in-memory state is the source of
//! truth. Reads never fail (a missing or corrupt blob reads as the default
//! blob), while writes, exports and imports report errors to the caller.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::backup::{ExportDocument, STORAGE_VERSION, parse_backup};
use crate::kv::KeyValueStore;
use crate::model::{PartialBlob, PersistedBlob};
use crate::StorageError;

/// Key holding the JSON-encoded [`PersistedBlob`].
pub const STORAGE_KEY: &str = "sitconnect_data";

/// Sibling key holding [`STORAGE_VERSION`].
pub const VERSION_KEY: &str = "sitconnect_data_version";

const PROBE_KEY: &str = "__storage_test__";

/// Read-only summary shown by the data manager.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageStats {
    pub notice_count: usize,
    /// Applicant ids across every notice's application list.
    pub applicant_count: usize,
    /// Length of the raw stored blob in bytes.
    pub storage_bytes: usize,
    pub last_sync: Option<DateTime<Utc>>,
}

impl StorageStats {
    /// Size in kilobytes with two decimals, e.g. `"1.25 KB"`.
    pub fn storage_used(&self) -> String {
        format!("{:.2} KB", self.storage_bytes as f64 / 1024.0)
    }
}

/// Handle to the persisted blob. Cheap to clone; clones share the store.
#[derive(Clone)]
pub struct StorageService {
    store: Arc<dyn KeyValueStore>,
}

impl StorageService {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Overlay `partial` on the stored blob, stamp `last_sync`, and write it.
    ///
    /// `last_sync` never moves backwards even if the wall clock does.
    pub fn save(&self, partial: PartialBlob) -> Result<PersistedBlob, StorageError> {
        let mut blob = self.load();
        let previous = blob.last_sync;
        blob.merge(partial);
        let now = Utc::now();
        blob.last_sync = Some(previous.map_or(now, |p| p.max(now)));

        let encoded = serde_json::to_string(&blob)?;
        self.store
            .set(STORAGE_KEY, &encoded)
            .map_err(StorageError::Write)?;
        self.store
            .set(VERSION_KEY, STORAGE_VERSION)
            .map_err(StorageError::Write)?;

        tracing::debug!(
            bytes = encoded.len(),
            notices = blob.data.notices.len(),
            "saved data to local store"
        );
        Ok(blob)
    }

    /// The stored blob, or the default blob if there is none or it is unreadable.
    pub fn load(&self) -> PersistedBlob {
        let raw = match self.store.get(STORAGE_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return PersistedBlob::default(),
            Err(e) => {
                tracing::warn!(error = %e, "failed to read local store, using defaults");
                return PersistedBlob::default();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(blob) => blob,
            Err(e) => {
                tracing::warn!(error = %e, "stored data is unreadable, using defaults");
                PersistedBlob::default()
            }
        }
    }

    /// Remove the blob and version marker. Errors are logged, not returned.
    pub fn clear(&self) {
        for key in [STORAGE_KEY, VERSION_KEY] {
            if let Err(e) = self.store.remove(key) {
                tracing::warn!(key, error = %e, "failed to clear local store");
            }
        }
        tracing::debug!("cleared local store");
    }

    /// Wrap the current blob in an export document.
    pub fn export(&self) -> ExportDocument {
        ExportDocument::new(self.load())
    }

    /// Write an export document into `dir` and return the file path.
    pub fn export_to_dir(&self, dir: &Path) -> Result<PathBuf, StorageError> {
        let doc = self.export();
        let content = doc
            .to_pretty_json()
            .map_err(|e| StorageError::Export(format!("failed to encode backup: {}", e)))?;
        let path = dir.join(doc.file_name());
        std::fs::write(&path, content).map_err(|e| {
            StorageError::Export(format!("failed to write {}: {}", path.display(), e))
        })?;
        tracing::info!(path = %path.display(), "exported data");
        Ok(path)
    }

    /// Validate backup text, persist its data, and return that data.
    ///
    /// Nothing is written unless validation succeeds.
    pub fn import(&self, text: &str) -> Result<PartialBlob, StorageError> {
        let data = parse_backup(text)?;
        self.save(data.clone())?;
        tracing::info!("imported data");
        Ok(data)
    }

    pub fn import_file(&self, path: &Path) -> Result<PartialBlob, StorageError> {
        let text = std::fs::read_to_string(path)?;
        self.import(&text)
    }

    pub fn stats(&self) -> StorageStats {
        let raw = match self.store.get(STORAGE_KEY) {
            Ok(raw) => raw.unwrap_or_default(),
            Err(_) => String::new(),
        };
        let blob = self.load();
        StorageStats {
            notice_count: blob.data.notices.len(),
            applicant_count: blob.data.applicant_total(),
            storage_bytes: raw.len(),
            last_sync: blob.last_sync,
        }
    }

    /// Probe writability with a throwaway write and delete.
    pub fn is_available(&self) -> bool {
        self.store
            .set(PROBE_KEY, PROBE_KEY)
            .and_then(|_| self.store.remove(PROBE_KEY))
            .is_ok()
    }
}
