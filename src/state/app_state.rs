//! Main application state management

use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
    time::Instant,
};
use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use super::{Snapshot, TimerPatch, TimerRecord, TimerStore};
use crate::error::SyncError;

/// Number of snapshots a slow client may fall behind before it skips ahead
const SNAPSHOT_CHANNEL_CAPACITY: usize = 64;

/// Last mutation applied through a client command
#[derive(Debug, Clone)]
struct LastAction {
    timer_id: String,
    at: DateTime<Utc>,
}

/// Shared server state: the authoritative timer store and its broadcast channel.
///
/// Every mutation takes the store lock, applies the change and publishes the
/// resulting snapshot before releasing it, so subscribers observe snapshots in
/// exactly the order mutations were applied.
#[derive(Debug)]
pub struct AppState {
    store: Mutex<TimerStore>,
    snapshot_tx: broadcast::Sender<Arc<Snapshot>>,
    last_action: Mutex<Option<LastAction>>,
    connected_clients: AtomicUsize,
    pub start_time: Instant,
}

impl AppState {
    /// Create a new AppState around an already initialized store
    pub fn new(store: TimerStore) -> Self {
        let (snapshot_tx, _) = broadcast::channel(SNAPSHOT_CHANNEL_CAPACITY);

        Self {
            store: Mutex::new(store),
            snapshot_tx,
            last_action: Mutex::new(None),
            connected_clients: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    fn store(&self) -> MutexGuard<'_, TimerStore> {
        self.store.lock().unwrap_or_else(|poisoned| {
            warn!("Timer store lock was poisoned, recovering");
            PoisonError::into_inner(poisoned)
        })
    }

    /// Publish a snapshot while the caller still holds the store lock
    fn publish(&self, store: &TimerStore) {
        // no receivers just means nobody is connected
        if self.snapshot_tx.send(Arc::new(store.snapshot())).is_err() {
            debug!("No clients connected, snapshot not delivered");
        }
    }

    /// Apply a client's partial update and broadcast the new snapshot to everyone.
    ///
    /// A start request for a depleted timer is neutralized before the broadcast.
    pub fn apply_update(&self, timer_id: &str, patch: &TimerPatch) -> Result<TimerRecord, SyncError> {
        let mut store = self.store();

        if store.apply_partial_update(timer_id, patch).is_none() {
            return Err(SyncError::UnknownTimer(timer_id.to_string()));
        }
        if store.settle(timer_id) {
            debug!(timer_id, "Ignoring start of a timer with no time remaining");
        }

        let record = store
            .get(timer_id)
            .cloned()
            .ok_or_else(|| SyncError::UnknownTimer(timer_id.to_string()))?;
        self.publish(&store);
        drop(store);

        if let Ok(mut last_action) = self.last_action.lock() {
            *last_action = Some(LastAction {
                timer_id: timer_id.to_string(),
                at: Utc::now(),
            });
        }

        Ok(record)
    }

    /// Run one tick over every timer, broadcasting only if something changed
    pub fn tick(&self) -> bool {
        let mut store = self.store();
        let changed = store.tick();
        if changed {
            self.publish(&store);
        }
        changed
    }

    /// Current snapshot of every timer
    pub fn snapshot(&self) -> Snapshot {
        self.store().snapshot()
    }

    /// Look up a single timer
    pub fn get_timer(&self, timer_id: &str) -> Option<TimerRecord> {
        self.store().get(timer_id).cloned()
    }

    pub fn timer_count(&self) -> usize {
        self.store().len()
    }

    /// Subscribe to future snapshots and read the current one atomically.
    ///
    /// No mutation can land between the two, so the receiver yields exactly the
    /// snapshots that follow the returned one.
    pub fn subscribe(&self) -> (Arc<Snapshot>, broadcast::Receiver<Arc<Snapshot>>) {
        let store = self.store();
        let rx = self.snapshot_tx.subscribe();
        (Arc::new(store.snapshot()), rx)
    }

    /// Record a new client connection, returning the connected count
    pub fn client_connected(&self) -> usize {
        let clients = self.connected_clients.fetch_add(1, Ordering::Relaxed) + 1;
        info!(clients, "Client connected");
        clients
    }

    /// Record a client disconnect, returning the connected count
    pub fn client_disconnected(&self) -> usize {
        let clients = self
            .connected_clients
            .fetch_sub(1, Ordering::Relaxed)
            .saturating_sub(1);
        info!(clients, "Client disconnected");
        clients
    }

    pub fn connected_clients(&self) -> usize {
        self.connected_clients.load(Ordering::Relaxed)
    }

    /// Calculate server uptime as a formatted string
    pub fn get_uptime(&self) -> String {
        let duration = self.start_time.elapsed();
        let hours = duration.as_secs() / 3600;
        let minutes = (duration.as_secs() % 3600) / 60;
        let seconds = duration.as_secs() % 60;

        if hours > 0 {
            format!("{}h {}m {}s", hours, minutes, seconds)
        } else if minutes > 0 {
            format!("{}m {}s", minutes, seconds)
        } else {
            format!("{}s", seconds)
        }
    }

    /// Get last action information
    pub fn get_last_action(&self) -> (Option<String>, Option<DateTime<Utc>>) {
        self.last_action
            .lock()
            .ok()
            .and_then(|action| action.clone())
            .map_or((None, None), |action| (Some(action.timer_id), Some(action.at)))
    }
}
