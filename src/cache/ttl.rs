//! Time-bounded in-memory cache for raw response bodies
//!
//! Entries are keyed by request URL and hold the undecoded body bytes. Reads
//! never look at an entry's age: a background sweep task, ticking once per
//! `interval`, removes every entry older than `interval`. A stale entry can
//! therefore be served for just under two intervals after insertion.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use parking_lot::RwLock;
use thiserror::Error;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, warn};

/// Errors that can occur when constructing a cache
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CacheError {
    /// The sweep interval was zero
    #[error("Cache interval must be greater than zero")]
    InvalidInterval,

    /// No tokio runtime was available to run the sweep task
    #[error("Cache sweep requires a running tokio runtime")]
    NoRuntime,
}

/// A single cached payload
#[derive(Debug, Clone)]
struct CacheEntry {
    /// The raw body bytes
    value: Bytes,
    /// When the entry was inserted
    created_at: Instant,
}

type Entries = Arc<RwLock<HashMap<String, CacheEntry>>>;

/// Stop signal and join handle for the sweep task
///
/// The handle sits behind an async mutex that `shutdown` holds while joining,
/// so concurrent callers queue behind the first one.
#[derive(Debug)]
struct Sweeper {
    shutdown_tx: mpsc::Sender<()>,
    task: Mutex<Option<JoinHandle<()>>>,
}

/// Thread-safe cache of response bodies with periodic expiry
///
/// Clones share the same entries and the same sweep task. The task stops when
/// [`TtlCache::shutdown`] is called or when the last clone is dropped.
#[derive(Debug, Clone)]
pub struct TtlCache {
    entries: Entries,
    interval: Duration,
    sweeper: Arc<Sweeper>,
}

impl TtlCache {
    /// Creates an empty cache and starts its sweep task on the current runtime
    ///
    /// # Arguments
    /// * `interval` - Both the sweep period and the age after which entries are removed
    ///
    /// # Returns
    /// * `Ok(TtlCache)` with the sweep task running
    /// * `Err(CacheError::InvalidInterval)` if `interval` is zero
    /// * `Err(CacheError::NoRuntime)` if called outside a tokio runtime
    pub fn new(interval: Duration) -> Result<Self, CacheError> {
        if interval.is_zero() {
            return Err(CacheError::InvalidInterval);
        }
        let runtime = tokio::runtime::Handle::try_current().map_err(|_| CacheError::NoRuntime)?;

        let entries: Entries = Arc::default();
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        let task = runtime.spawn(sweep_loop(Arc::clone(&entries), interval, shutdown_rx));

        debug!(interval_ms = interval.as_millis() as u64, "cache sweep started");

        Ok(Self {
            entries,
            interval,
            sweeper: Arc::new(Sweeper {
                shutdown_tx,
                task: Mutex::new(Some(task)),
            }),
        })
    }

    /// Inserts or replaces the entry for `key`, stamping it with the current time
    pub fn add(&self, key: impl Into<String>, value: impl Into<Bytes>) {
        let entry = CacheEntry {
            value: value.into(),
            created_at: Instant::now(),
        };
        self.entries.write().insert(key.into(), entry);
    }

    /// Returns the payload stored for `key`, if any
    ///
    /// Age is not checked here. An entry is only absent once a sweep pass has
    /// removed it.
    pub fn get(&self, key: &str) -> Option<Bytes> {
        self.entries.read().get(key).map(|entry| entry.value.clone())
    }

    /// Runs one sweep pass as of `now`, returning how many entries were removed
    pub fn purge_expired(&self, now: Instant) -> usize {
        purge(&self.entries, self.interval, now)
    }

    /// Number of entries currently held, stale or not
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the cache holds no entries
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// The sweep period and expiry age
    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Whether the sweep task is still running
    pub fn is_sweeping(&self) -> bool {
        match self.sweeper.task.try_lock() {
            Ok(task) => task.as_ref().is_some_and(|task| !task.is_finished()),
            // A shutdown is still joining the task
            Err(_) => true,
        }
    }

    /// Stops the sweep task and waits for it to exit
    ///
    /// Every caller returns only after the task has exited, including callers
    /// that race an in-progress shutdown. Entries stay readable and writable
    /// afterwards but are no longer reclaimed. Calling this more than once is
    /// a no-op.
    pub async fn shutdown(&self) {
        // A full channel means a stop is already pending
        let _ = self.sweeper.shutdown_tx.try_send(());

        let mut task = self.sweeper.task.lock().await;
        if let Some(handle) = task.take() {
            if let Err(e) = handle.await {
                warn!(error = %e, "cache sweep task ended abnormally");
            }
        }
    }
}

/// Removes every entry whose age at `now` exceeds `interval`
fn purge(entries: &RwLock<HashMap<String, CacheEntry>>, interval: Duration, now: Instant) -> usize {
    let mut entries = entries.write();
    let before = entries.len();
    entries.retain(|_, entry| now.saturating_duration_since(entry.created_at) <= interval);
    before - entries.len()
}

/// Background task: one sweep pass per `interval` until stopped
async fn sweep_loop(entries: Entries, interval: Duration, mut shutdown_rx: mpsc::Receiver<()>) {
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Skip the first tick (immediate)
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let removed = purge(&entries, interval, Instant::now());
                if removed > 0 {
                    debug!(removed, "swept expired cache entries");
                }
            }
            // Explicit stop, or every cache handle dropped
            _ = shutdown_rx.recv() => {
                break;
            }
        }
    }

    debug!("cache sweep stopped");
}
