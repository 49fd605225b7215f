use thiserror::Error;

pub mod autosave;
pub mod backup;
pub mod config_file;
pub mod kv;
pub mod model;
pub mod notify;
pub mod storage;

// Re-export for convenience
pub use autosave::{AutoSaver, SyncEvent};
pub use backup::{ExportDocument, ImportError};
pub use kv::{KeyValueStore, MemoryStore, SqliteStore, open_store};
pub use model::{
    AppData, ApplicantIndex, Child, DraftError, Notice, NoticeDraft, ParentProfile, PartialBlob,
    PersistedBlob, Role, StudentProfile, next_notice_id,
};
pub use notify::{LogNotifier, Notification, NotificationService, Notifier, Permission};
pub use storage::{StorageService, StorageStats};

/// Errors raised by a [`KeyValueStore`] backend.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("storage quota exceeded: {needed} bytes needed, {quota} allowed")]
    QuotaExceeded { needed: usize, quota: usize },
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("store lock poisoned")]
    Poisoned,
}

/// Errors surfaced by the persistence service.
///
/// Read failures never show up here: [`StorageService::load`] absorbs them and
/// returns the default blob.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("failed to save data to local storage: {0}")]
    Write(#[source] StoreError),
    #[error("failed to serialize data: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to export data: {0}")]
    Export(String),
    #[error("failed to import data: {0}")]
    Import(#[from] ImportError),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
