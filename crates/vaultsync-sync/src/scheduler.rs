//! Sync scheduler - periodic passes and "sync now" requests
//!
//! The [`SyncScheduler`] drives `vaultsync sync --watch`. It runs a pass at
//! start-up, then once per configured interval, and in between whenever
//! [`request_sync()`](SyncScheduler::request_sync) raised the flag.
//!
//! ## Flow
//!
//! ```text
//! interval tick ──┐
//!                 ├──→ pass() ──→ SyncOrchestrator::run
//! request flag ───┘
//! ```
//!
//! Overlap is prevented one level down by [`PassGate`]: the orchestrator
//! refuses a pass while another holds the gate.

use std::{
    future::Future,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::sync::watch;
use tracing::{debug, info};

// ============================================================================
// PassGate
// ============================================================================

/// Single-slot busy flag shared by everything that can start a pass
#[derive(Debug, Clone, Default)]
pub struct PassGate {
    busy: Arc<AtomicBool>,
}

impl PassGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the gate, or `None` if a pass is already running.
    pub fn try_begin(&self) -> Option<PassPermit> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| PassPermit {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Held for the duration of one pass; releases the gate on drop
#[derive(Debug)]
pub struct PassPermit {
    busy: Arc<AtomicBool>,
}

impl Drop for PassPermit {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

// ============================================================================
// SyncScheduler
// ============================================================================

/// Schedules sync passes on a timer and on request
pub struct SyncScheduler {
    /// Shared flag raised by "sync now"
    sync_requested: Arc<AtomicBool>,
    /// Time between periodic passes
    interval: Duration,
    /// How often the request flag is checked
    poll_interval: Duration,
}

impl SyncScheduler {
    /// Creates a new `SyncScheduler`
    ///
    /// # Returns
    /// A tuple of `(SyncScheduler, Arc<AtomicBool>)`. Setting the flag to
    /// `true` asks for a pass at the next poll.
    pub fn new(interval: Duration, poll_interval: Duration) -> (Self, Arc<AtomicBool>) {
        let sync_requested = Arc::new(AtomicBool::new(false));
        let flag = sync_requested.clone();

        info!(
            interval_secs = interval.as_secs(),
            poll_ms = poll_interval.as_millis() as u64,
            "Creating sync scheduler"
        );

        let scheduler = Self {
            sync_requested,
            interval,
            poll_interval,
        };
        (scheduler, flag)
    }

    /// Requests a pass at the next poll, without waiting for the interval
    pub fn request_sync(&self) {
        info!("User-initiated sync requested");
        self.sync_requested.store(true, Ordering::Release);
    }

    /// Returns whether a sync has been requested, without resetting it
    pub fn is_sync_requested(&self) -> bool {
        self.sync_requested.load(Ordering::Acquire)
    }

    pub fn clear_sync_request(&self) {
        self.sync_requested.store(false, Ordering::Release);
    }

    /// Main loop
    ///
    /// Calls `pass` once immediately, then on every interval tick and
    /// whenever the request flag is found raised. Returns when `shutdown`
    /// turns `true` or its sender is dropped.
    pub async fn run<F, Fut>(&self, mut shutdown: watch::Receiver<bool>, mut pass: F)
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ()>,
    {
        info!("Sync scheduler starting");

        let mut interval_timer = tokio::time::interval(self.interval);
        let mut poll_timer = tokio::time::interval(self.poll_interval);

        loop {
            tokio::select! {
                _ = interval_timer.tick() => {
                    debug!("Interval elapsed");
                    self.clear_sync_request();
                    pass().await;
                }

                _ = poll_timer.tick() => {
                    if self.sync_requested.swap(false, Ordering::AcqRel) {
                        debug!("Running requested pass");
                        pass().await;
                    }
                }

                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        info!("Sync scheduler stopped");
    }
}

// ============================================================================
// Unit tests
// ============================================================================
