//! Ties the controller to storage: load on open, debounced saves after every
//! accepted action, and a final flush on close.

use std::path::{Path, PathBuf};
use std::time::Duration;

use sitconnect_core::{
    AutoSaver, NotificationService, StorageError, StorageService, StorageStats, SyncEvent,
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::action::Action;
use crate::app::App;

pub struct Session {
    pub app: App,
    storage: StorageService,
    saver: AutoSaver,
    events: mpsc::UnboundedReceiver<SyncEvent>,
    cancel: CancellationToken,
}

impl Session {
    /// Load persisted state and start the auto-saver. Must be called inside a
    /// tokio runtime.
    pub fn open(
        storage: StorageService,
        notifications: NotificationService,
        autosave_delay: Duration,
    ) -> Self {
        let available = storage.is_available();
        let blob = if available {
            storage.load()
        } else {
            Default::default()
        };
        let found = blob.last_sync.is_some();
        let mut app = App::from_blob(blob, notifications);
        if !available {
            tracing::warn!("storage unavailable; starting with empty data");
            app.push_error("Storage is unavailable. Changes will not be saved.");
        } else if found {
            tracing::info!(notices = app.data().notices.len(), "loaded stored data");
            app.push_success("Data loaded from storage");
        }

        let cancel = CancellationToken::new();
        let (saver, events) = AutoSaver::spawn(storage.clone(), autosave_delay, cancel.clone());
        Self {
            app,
            storage,
            saver,
            events,
            cancel,
        }
    }

    /// Apply `action` and schedule a save if it changed anything.
    pub fn dispatch(&mut self, action: Action) -> bool {
        let accepted = self.app.update(action);
        self.sync();
        accepted
    }

    /// Cancelling this token makes the auto-saver write what is pending and stop.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn stats(&self) -> StorageStats {
        self.storage.stats()
    }

    /// Write pending changes now.
    pub async fn flush(&mut self) {
        self.sync();
        self.saver.flush().await;
        self.drain_events();
    }

    /// Flush, then write a dated backup into `dir`.
    pub async fn export_to_dir(&mut self, dir: &Path) -> Result<PathBuf, StorageError> {
        self.flush().await;
        self.storage.export_to_dir(dir)
    }

    /// Parse a backup file, write it to the store, then adopt it in memory.
    /// The adopted state is saved again once the import has been applied.
    pub async fn import_file(&mut self, path: &Path) -> Result<(), StorageError> {
        let partial = self.storage.import_file(path)?;
        self.dispatch(Action::ImportData(partial));
        self.flush().await;
        Ok(())
    }

    /// Wipe the store, then clear activity in memory. Profiles survive and
    /// are written back by the next save.
    pub async fn clear_all(&mut self) {
        self.saver.flush().await;
        self.storage.clear();
        self.dispatch(Action::ClearAllData);
    }

    /// Surface auto-save failures as user messages.
    pub fn drain_events(&mut self) {
        drain(&mut self.events, &mut self.app);
    }

    /// Flush and stop the auto-saver.
    pub async fn close(mut self) -> App {
        self.sync();
        let Session {
            mut app,
            saver,
            mut events,
            ..
        } = self;
        saver.shutdown().await;
        drain(&mut events, &mut app);
        app
    }

    fn sync(&mut self) {
        if let Some(snapshot) = self.app.take_snapshot() {
            self.saver.schedule(snapshot);
        }
        self.drain_events();
    }
}

fn drain(events: &mut mpsc::UnboundedReceiver<SyncEvent>, app: &mut App) {
    while let Ok(event) = events.try_recv() {
        match event {
            SyncEvent::Saved { last_sync } => {
                tracing::debug!(?last_sync, "auto-save complete");
            }
            SyncEvent::Failed { message } => {
                app.push_error(format!("Failed to save data: {}", message));
            }
        }
    }
}
