//! Background sync coordination: single-flight passes, periodic ticks and
//! an event channel towards whoever owns the UI.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::selection::SelectionStore;
use crate::sync::{HttpRemote, Remote, SyncEngine, SyncProgress, SyncStats, SyncStatus};

/// Events sent from background sync work to the UI loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncEvent {
    /// Status change inside a pass.
    Status(SyncStatus),
    FileDownloaded { name: String, bytes: u64 },
    FileFailed { name: String, error: String },
    /// A periodic tick found nothing selected.
    NothingSelected,
    /// A periodic tick found the probe host reachable and started a pass.
    Online,
    /// A periodic tick found the probe host unreachable.
    Offline,
    /// The selection file could not be read.
    SelectionError(String),
}

/// Forwards engine progress into the event channel.
pub struct ChannelProgress {
    pub tx: mpsc::UnboundedSender<SyncEvent>,
}

impl SyncProgress for ChannelProgress {
    fn on_status(&self, status: &SyncStatus) {
        let _ = self.tx.send(SyncEvent::Status(status.clone()));
    }

    fn on_file_downloaded(&self, name: &str, bytes: u64) {
        let _ = self.tx.send(SyncEvent::FileDownloaded {
            name: name.to_string(),
            bytes,
        });
    }

    fn on_file_error(&self, name: &str, error: &str) {
        let _ = self.tx.send(SyncEvent::FileFailed {
            name: name.to_string(),
            error: error.to_string(),
        });
    }
}

/// Result of asking for a pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// No pass was running; one was spawned.
    Started,
    /// A pass is running; one more pass will follow it.
    Coalesced,
}

/// Runs at most one sync pass at a time.
///
/// Triggers arriving while a pass runs collapse into a single follow-up
/// pass, which reloads the selection so it sees the latest toggles.
pub struct SyncCoordinator<R: Remote = HttpRemote> {
    engine: SyncEngine<R>,
    store: SelectionStore,
    events: mpsc::UnboundedSender<SyncEvent>,
    running: AtomicBool,
    pending: AtomicBool,
}

impl<R: Remote + 'static> SyncCoordinator<R> {
    #[must_use]
    pub fn new(
        engine: SyncEngine<R>,
        store: SelectionStore,
        events: mpsc::UnboundedSender<SyncEvent>,
    ) -> Arc<Self> {
        Arc::new(Self {
            engine,
            store,
            events,
            running: AtomicBool::new(false),
            pending: AtomicBool::new(false),
        })
    }

    #[must_use]
    pub const fn engine(&self) -> &SyncEngine<R> {
        &self.engine
    }

    #[must_use]
    pub const fn store(&self) -> &SelectionStore {
        &self.store
    }

    /// True while a pass (or its coalesced follow-up) is in flight.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Requests a pass over the current selection.
    pub fn trigger(self: &Arc<Self>) -> Trigger {
        self.pending.store(true, Ordering::SeqCst);
        if self.running.swap(true, Ordering::SeqCst) {
            log::debug!("Sync pass already running, coalescing trigger");
            return Trigger::Coalesced;
        }
        let this = Arc::clone(self);
        tokio::spawn(async move { this.drain().await });
        Trigger::Started
    }

    async fn drain(&self) {
        loop {
            while self.pending.swap(false, Ordering::SeqCst) {
                self.run_pass().await;
            }
            self.running.store(false, Ordering::SeqCst);
            // A trigger may have set `pending` after the last swap but seen
            // `running` still true; reclaim the flag if nobody else did.
            if !self.pending.load(Ordering::SeqCst) || self.running.swap(true, Ordering::SeqCst) {
                break;
            }
        }
    }

    /// Runs one pass inline over the stored selection.
    pub async fn run_pass(&self) -> Option<SyncStats> {
        let selection = match self.store.load() {
            Ok(selection) => selection,
            Err(e) => {
                log::error!("Cannot read selection: {e}");
                let _ = self.events.send(SyncEvent::SelectionError(e.to_string()));
                return None;
            }
        };
        let progress = ChannelProgress {
            tx: self.events.clone(),
        };
        Some(self.engine.sync_selected(&selection, &progress).await)
    }

    /// One periodic tick: skip when nothing is selected, probe connectivity,
    /// then trigger a pass when online.
    pub async fn tick(self: &Arc<Self>) {
        match self.store.load() {
            Ok(selection) if selection.is_empty() => {
                let _ = self.events.send(SyncEvent::NothingSelected);
                return;
            }
            Ok(_) => {}
            Err(e) => {
                let _ = self.events.send(SyncEvent::SelectionError(e.to_string()));
                return;
            }
        }

        if self.engine.remote().is_online().await {
            let _ = self.events.send(SyncEvent::Online);
            self.trigger();
        } else {
            log::info!("Offline, skipping periodic sync");
            let _ = self.events.send(SyncEvent::Offline);
        }
    }

    /// Ticks immediately and then every `interval` until `cancel` fires.
    /// A zero interval is raised to one millisecond.
    pub async fn run_periodic(self: Arc<Self>, interval: Duration, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(interval.max(Duration::from_millis(1)));
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                () = cancel.cancelled() => break,
                _ = ticker.tick() => self.tick().await,
            }
        }
        log::debug!("Periodic sync stopped");
    }
}
