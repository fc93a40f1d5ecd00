//! Cache Scanner Task
//!
//! Background task that runs reconciliation cycles over the file cache,
//! either when the scan timer fires or when a scan is triggered by hand.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::cache::CacheStore;

/// Why the scanner woke up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Wake {
    Timer,
    Trigger,
    Shutdown,
}

/// Handle to a running scanner task.
///
/// Dropping the handle closes the shutdown channel, which stops the task.
/// The task keeps its own `Arc<CacheStore>`, so a handle owned by that store
/// is never dropped on its own: stop it with `CacheStore::set_enabled(false)`
/// or `CacheStore::shutdown`.
#[derive(Debug)]
pub struct ScanTask {
    shutdown: watch::Sender<bool>,
    /// Single-slot queue; a full slot means a scan is already pending
    trigger: mpsc::Sender<()>,
    handle: JoinHandle<()>,
}

impl ScanTask {
    /// Queues an out-of-band scan. Returns false if one is already pending.
    pub fn trigger(&self) -> bool {
        self.trigger.try_send(()).is_ok()
    }

    /// Asks the task to stop at its next wake.
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Waits for the task to exit.
    pub async fn join(self) {
        if let Err(err) = self.handle.await {
            warn!("Cache scanner task ended abnormally: {}", err);
        }
    }
}

/// Spawns the reconciliation loop for `store`.
///
/// The loop waits on the scan timer, a manual trigger, or the shutdown signal.
/// Each timer or trigger wake runs one full cycle. Once the store is seen
/// disabled (or shutdown is signalled) the loop drops every cached entry and
/// exits.
///
/// # Arguments
/// * `store` - Shared cache store to reconcile
///
/// # Returns
/// A `ScanTask` used to trigger scans, stop the loop, and await its exit.
pub fn spawn_scan_task(store: Arc<CacheStore>) -> ScanTask {
    let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
    let (trigger_tx, mut trigger_rx) = mpsc::channel::<()>(1);
    // A zero period would make the ticker panic
    let period = store.scan_interval().max(Duration::from_millis(1));

    let handle = tokio::spawn(async move {
        info!(
            "Starting cache scanner with interval of {} ms",
            period.as_millis()
        );

        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let wake = tokio::select! {
                biased;
                _ = shutdown_rx.changed() => Wake::Shutdown,
                Some(()) = trigger_rx.recv() => Wake::Trigger,
                _ = ticker.tick() => Wake::Timer,
            };

            if wake == Wake::Shutdown || !store.is_enabled() {
                break;
            }
            if wake == Wake::Trigger {
                // Next timed scan comes one full interval after this one
                ticker.reset();
            }

            let report = store.run_cycle().await;
            if report.has_changes() {
                info!(
                    ?wake,
                    visited = report.visited(),
                    evicted = report.evicted(),
                    refreshed = report.refreshed(),
                    invalidated = report.invalidated,
                    "Cache scan finished"
                );
            } else {
                debug!(
                    ?wake,
                    visited = report.visited(),
                    missing = report.not_exist,
                    "Cache scan found no changes"
                );
            }
        }

        let dropped = store.clear().await;
        info!("Cache scanner stopped, dropped {} entries", dropped);
    });

    ScanTask {
        shutdown: shutdown_tx,
        trigger: trigger_tx,
        handle,
    }
}
