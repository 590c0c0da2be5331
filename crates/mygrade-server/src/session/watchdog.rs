//! Inactivity watchdogs
//!
//! A watchdog is a task holding a deadline. Every recorded activity pushes
//! the deadline out to `now + timeout`; when the deadline passes the expiry
//! callback runs once and the watchdog stays in the fired state. Dropping the
//! watchdog aborts the task, so an owner that goes away never fires.
//!
//! [`InactivityMonitor`] keeps one watchdog per signed-in administrator and
//! per student view, keyed by [`WatchKey`]. A watchdog that fires removes
//! itself from the monitor, so the registry only holds live deadlines. The
//! browser session remembers what it armed; see [`WatchStatus::for_armed_key`].

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{
    atomic::{AtomicBool, AtomicU64, Ordering},
    Arc, Mutex, MutexGuard, PoisonError, Weak,
};
use std::time::Duration;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::Instant,
};

/// User interaction that counts as activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityKind {
    PointerMove,
    KeyPress,
    Click,
    Scroll,
}

pub struct InactivityWatchdog {
    activity: mpsc::UnboundedSender<Instant>,
    fired: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

impl InactivityWatchdog {
    /// Arm a watchdog that calls `on_expire` after `timeout` without activity.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start<F>(timeout: Duration, on_expire: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        let (activity, mut seen) = mpsc::unbounded_channel::<Instant>();
        let fired = Arc::new(AtomicBool::new(false));

        // The first deadline counts from arming, not from the task's first poll.
        let deadline = tokio::time::sleep(timeout);
        let flag = fired.clone();
        let mut on_expire = Some(on_expire);

        let task = tokio::spawn(async move {
            tokio::pin!(deadline);
            loop {
                tokio::select! {
                    _ = &mut deadline => {
                        flag.store(true, Ordering::SeqCst);
                        if let Some(on_expire) = on_expire.take() {
                            on_expire();
                        }
                        return;
                    },
                    at = seen.recv() => match at {
                        Some(at) => deadline.as_mut().reset(at + timeout),
                        None => return,
                    },
                }
            }
        });

        Self {
            activity,
            fired,
            task,
        }
    }

    /// Reset the deadline. Returns `false` once the watchdog has fired.
    pub fn record(&self, kind: ActivityKind) -> bool {
        if self.has_fired() {
            return false;
        }
        tracing::trace!(?kind, "Activity recorded");
        self.activity.send(Instant::now()).is_ok()
    }

    pub fn has_fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}

impl Drop for InactivityWatchdog {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// What a watchdog guards
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum WatchKey {
    /// A signed-in administrator, by identity token
    Admin(String),
    /// A student's saved record view, by session-scoped key
    Viewer(String),
}

/// State of a watched key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WatchStatus {
    /// Armed and not yet expired
    Active,
    /// The deadline passed without activity
    Expired,
    /// Nothing is being watched
    Inactive,
}

impl WatchStatus {
    /// Status of a key this browser armed earlier. Fired watchdogs are
    /// reaped, so a key with no watchdog left has expired.
    pub fn for_armed_key(self) -> Self {
        match self {
            WatchStatus::Inactive => WatchStatus::Expired,
            other => other,
        }
    }
}

struct Entry {
    generation: u64,
    watchdog: InactivityWatchdog,
}

type Registry = Mutex<HashMap<WatchKey, Entry>>;

/// Registry of watchdogs shared by all requests
#[derive(Clone)]
pub struct InactivityMonitor {
    timeout: Duration,
    watchdogs: Arc<Registry>,
    generations: Arc<AtomicU64>,
}

impl InactivityMonitor {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            watchdogs: Arc::new(Mutex::new(HashMap::new())),
            generations: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Start watching `key`, replacing any previous watchdog for it.
    ///
    /// On expiry `on_expire` runs and the watchdog drops out of the monitor.
    pub fn arm<F>(&self, key: WatchKey, on_expire: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let generation = self.generations.fetch_add(1, Ordering::Relaxed);
        let registry: Weak<Registry> = Arc::downgrade(&self.watchdogs);
        let reaped = key.clone();

        let watchdog = InactivityWatchdog::start(self.timeout, move || {
            on_expire();
            if let Some(registry) = registry.upgrade() {
                let mut watchdogs = registry.lock().unwrap_or_else(PoisonError::into_inner);
                // a newer watchdog may have replaced this one
                if watchdogs.get(&reaped).is_some_and(|entry| entry.generation == generation) {
                    watchdogs.remove(&reaped);
                }
            }
        });

        tracing::debug!(?key, timeout_secs = self.timeout.as_secs(), "Inactivity watchdog armed");
        self.lock().insert(
            key,
            Entry {
                generation,
                watchdog,
            },
        );
    }

    /// Record activity for `key`.
    pub fn touch(&self, key: &WatchKey, kind: ActivityKind) -> WatchStatus {
        match self.lock().get(key) {
            Some(entry) if entry.watchdog.record(kind) => WatchStatus::Active,
            Some(_) => WatchStatus::Expired,
            None => WatchStatus::Inactive,
        }
    }

    pub fn status(&self, key: &WatchKey) -> WatchStatus {
        match self.lock().get(key) {
            Some(entry) if entry.watchdog.has_fired() => WatchStatus::Expired,
            Some(_) => WatchStatus::Active,
            None => WatchStatus::Inactive,
        }
    }

    /// Number of live watchdogs
    pub fn watched(&self) -> usize {
        self.lock().len()
    }

    /// Stop watching `key`. Returns whether a watchdog was registered.
    pub fn disarm(&self, key: &WatchKey) -> bool {
        self.lock().remove(key).is_some()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<WatchKey, Entry>> {
        self.watchdogs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
