//! Debounced auto-save.
//!
//! A background task holds at most one pending [`PartialBlob`] and one timer.
//! Every [`AutoSaver::schedule`] merges into the pending blob and pushes the
//! deadline out by the configured delay, so a burst of changes turns into a
//! single write once things go quiet. Write failures are reported once on the
//! event channel and then dropped; there is no retry.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio::time::{Instant, sleep_until};
use tokio_util::sync::CancellationToken;

use crate::model::PartialBlob;
use crate::storage::StorageService;

/// Default quiet period before a pending change is written.
pub const DEFAULT_AUTOSAVE_DELAY: Duration = Duration::from_millis(2000);

/// Outcome of a write performed by the auto-save task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    Saved { last_sync: Option<DateTime<Utc>> },
    Failed { message: String },
}

enum SaveCommand {
    Schedule(PartialBlob),
    Flush(oneshot::Sender<()>),
}

/// Handle to the auto-save task.
pub struct AutoSaver {
    cmd_tx: mpsc::UnboundedSender<SaveCommand>,
    task: JoinHandle<()>,
}

impl AutoSaver {
    /// Start the task. Cancelling `cancel` writes whatever is pending and stops it.
    pub fn spawn(
        service: StorageService,
        delay: Duration,
        cancel: CancellationToken,
    ) -> (Self, mpsc::UnboundedReceiver<SyncEvent>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();
        let task = tokio::spawn(run(service, delay, cmd_rx, event_tx, cancel));
        (Self { cmd_tx, task }, event_rx)
    }

    /// Queue `partial` and restart the quiet-period timer.
    pub fn schedule(&self, partial: PartialBlob) {
        if self.cmd_tx.send(SaveCommand::Schedule(partial)).is_err() {
            tracing::warn!("auto-save task has stopped; change not scheduled");
        }
    }

    /// Write any pending change now and wait until it is done.
    pub async fn flush(&self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.cmd_tx.send(SaveCommand::Flush(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
    }

    /// Flush and stop the task.
    pub async fn shutdown(self) {
        drop(self.cmd_tx);
        let _ = self.task.await;
    }
}

async fn run(
    service: StorageService,
    delay: Duration,
    mut cmd_rx: mpsc::UnboundedReceiver<SaveCommand>,
    event_tx: mpsc::UnboundedSender<SyncEvent>,
    cancel: CancellationToken,
) {
    let mut pending: Option<PartialBlob> = None;
    let mut deadline: Option<Instant> = None;

    loop {
        let timer = async move {
            match deadline {
                Some(at) => sleep_until(at).await,
                None => std::future::pending().await,
            }
        };

        tokio::select! {
            biased;

            cmd = cmd_rx.recv() => match cmd {
                Some(SaveCommand::Schedule(partial)) => {
                    pending = Some(match pending.take() {
                        Some(prev) => prev.overlay(partial),
                        None => partial,
                    });
                    deadline = Some(Instant::now() + delay);
                }
                Some(SaveCommand::Flush(ack)) => {
                    deadline = None;
                    write_pending(&service, pending.take(), &event_tx);
                    let _ = ack.send(());
                }
                None => {
                    write_pending(&service, pending.take(), &event_tx);
                    break;
                }
            },
            _ = timer => {
                deadline = None;
                write_pending(&service, pending.take(), &event_tx);
            }
            _ = cancel.cancelled() => {
                write_pending(&service, pending.take(), &event_tx);
                break;
            }
        }
    }
    tracing::debug!("auto-save task stopped");
}

fn write_pending(
    service: &StorageService,
    pending: Option<PartialBlob>,
    event_tx: &mpsc::UnboundedSender<SyncEvent>,
) {
    let Some(partial) = pending else {
        return;
    };
    let event = match service.save(partial) {
        Ok(blob) => SyncEvent::Saved {
            last_sync: blob.last_sync,
        },
        Err(e) => {
            tracing::warn!(error = %e, "auto-save failed");
            SyncEvent::Failed {
                message: e.to_string(),
            }
        }
    };
    // Nobody listening is fine.
    let _ = event_tx.send(event);
}
