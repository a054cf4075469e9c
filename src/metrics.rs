// Runtime metrics module
//
// Lightweight counters for the settings store and gesture dispatch

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Runtime counters shared by the settings store and action dispatch.
///
/// Uses atomic operations so the saver thread, the gesture thread and the UI
/// thread can all record without locks. Hand the same `Arc<Metrics>` to the
/// store and the [`ActionContext`](crate::services::ActionContext) to get one
/// combined summary.
#[derive(Debug)]
pub struct Metrics {
    /// Physical writes of the settings file
    saves_written: AtomicU64,

    /// Saves that failed (reload fallback or dropped)
    save_failures: AtomicU64,

    /// Successful reloads from disk
    reloads: AtomicU64,

    /// Reloads that failed and kept the previous entries
    reload_failures: AtomicU64,

    /// Corrupt entries rewritten with their default
    self_heals: AtomicU64,

    /// Gestures that produced their effect
    gestures_dispatched: AtomicU64,

    /// Gestures that reported failure
    gestures_failed: AtomicU64,

    /// Time spent inside successful dispatches in microseconds
    dispatch_time_us: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            saves_written: AtomicU64::new(0),
            save_failures: AtomicU64::new(0),
            reloads: AtomicU64::new(0),
            reload_failures: AtomicU64::new(0),
            self_heals: AtomicU64::new(0),
            gestures_dispatched: AtomicU64::new(0),
            gestures_failed: AtomicU64::new(0),
            dispatch_time_us: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    pub fn record_save(&self) {
        self.saves_written.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_save_failure(&self) {
        self.save_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reload(&self) {
        self.reloads.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_reload_failure(&self) {
        self.reload_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_self_heal(&self) {
        self.self_heals.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful dispatch and how long it took.
    pub fn record_dispatch(&self, duration: Duration) {
        self.gestures_dispatched.fetch_add(1, Ordering::Relaxed);
        self.dispatch_time_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
    }

    pub fn record_dispatch_failure(&self) {
        self.gestures_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn saves_written(&self) -> u64 {
        self.saves_written.load(Ordering::Relaxed)
    }

    pub fn save_failures(&self) -> u64 {
        self.save_failures.load(Ordering::Relaxed)
    }

    pub fn reloads(&self) -> u64 {
        self.reloads.load(Ordering::Relaxed)
    }

    pub fn reload_failures(&self) -> u64 {
        self.reload_failures.load(Ordering::Relaxed)
    }

    pub fn self_heals(&self) -> u64 {
        self.self_heals.load(Ordering::Relaxed)
    }

    pub fn gestures_dispatched(&self) -> u64 {
        self.gestures_dispatched.load(Ordering::Relaxed)
    }

    pub fn gestures_failed(&self) -> u64 {
        self.gestures_failed.load(Ordering::Relaxed)
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average duration of a successful dispatch in milliseconds
    pub fn avg_dispatch_time_ms(&self) -> f64 {
        let total = self.dispatch_time_us.load(Ordering::Relaxed);
        let count = self.gestures_dispatched();
        if count > 0 {
            total as f64 / count as f64 / 1000.0
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Runtime Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Settings: {} saves, {} failed saves, {} reloads, {} failed reloads, {} healed entries",
            self.saves_written(),
            self.save_failures(),
            self.reloads(),
            self.reload_failures(),
            self.self_heals()
        );
        tracing::info!(
            "Gestures: {} dispatched, {} failed (avg: {:.2}ms)",
            self.gestures_dispatched(),
            self.gestures_failed(),
            self.avg_dispatch_time_ms()
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
