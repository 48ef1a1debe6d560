//! Prometheus metrics published from selector snapshots.
//!
//! Nothing here is touched by the dispatch path. Each dispatcher gets its own
//! [`MetricsObserver`] from a shared [`DispatchMetrics`]; callers take a
//! [`SelectorSnapshot`] whenever they like (per batch, on a timer, at
//! shutdown) and hand it to [`MetricsObserver::observe`].
//!
//! # Usage
//!
//! ```ignore
//! let registry = prometheus::Registry::new();
//! let metrics = DispatchMetrics::with_prefix("sort")?;
//! metrics.register(&registry)?;
//!
//! // One observer per dispatcher
//! let mut observer = metrics.observer();
//! // ... run the dispatcher ...
//! observer.observe(&dispatcher.snapshot());
//!
//! let encoder = prometheus::TextEncoder::new();
//! let text = encoder.encode_to_string(&registry.gather())?;
//! ```

use prometheus::{IntCounter, IntGauge, Opts, Registry};

use crate::error::Result;
use crate::selector::SelectorSnapshot;

/// Prometheus view of a dispatcher's learned state.
///
/// Clones share the underlying metrics. Several dispatchers, on any threads,
/// publish into one set through their own [`MetricsObserver`]s: gauges show
/// the latest snapshot from any of them, counters sum over all of them.
#[derive(Clone)]
pub struct DispatchMetrics {
    // === Gauges (latest snapshot) ===
    /// Best option of the latest snapshot
    pub best_option: IntGauge,

    /// Option in use when the latest snapshot was taken
    pub current_option: IntGauge,

    /// Consecutive sweeps won by the best option
    pub streak: IntGauge,

    /// Calls in the current exploit window
    pub exploit_window: IntGauge,

    /// Measured cost of the best option, -1 while unmeasured
    pub best_ticks: IntGauge,

    // === Counters (cumulative) ===
    /// Completed sweeps (probes for epsilon-greedy), summed over observers
    pub sweeps: IntCounter,

    /// Snapshots published
    pub observations: IntCounter,
}

/// Replace characters Prometheus does not accept in metric names.
///
/// Valid characters are `[a-zA-Z_:]` for the first character and
/// `[a-zA-Z0-9_:]` for the rest.
fn sanitize_prefix(prefix: &str) -> String {
    prefix
        .chars()
        .enumerate()
        .map(|(i, c)| {
            let valid = c.is_ascii_alphabetic()
                || c == '_'
                || c == ':'
                || (i > 0 && c.is_ascii_digit());
            if valid {
                c
            } else {
                '_'
            }
        })
        .collect()
}

impl DispatchMetrics {
    /// Create metrics named `veer_*`.
    pub fn new() -> Result<Self> {
        Self::with_prefix("veer")
    }

    /// Create metrics named `{prefix}_best_option`, `{prefix}_sweeps`, etc.
    ///
    /// The prefix is sanitized first, so `"my-sort"` yields `my_sort_*`.
    pub fn with_prefix(prefix: &str) -> Result<Self> {
        let prefix = sanitize_prefix(prefix);
        let gauge = |name: &str, help: &str| {
            IntGauge::with_opts(Opts::new(format!("{prefix}_{name}"), help))
        };
        let counter = |name: &str, help: &str| {
            IntCounter::with_opts(Opts::new(format!("{prefix}_{name}"), help))
        };

        Ok(Self {
            best_option: gauge("best_option", "Index of the fastest candidate found")?,
            current_option: gauge("current_option", "Index of the candidate in use")?,
            streak: gauge("streak", "Consecutive sweeps won by the best candidate")?,
            exploit_window: gauge("exploit_window", "Calls in the current exploit window")?,
            best_ticks: gauge(
                "best_ticks",
                "Measured ticks of the best candidate, -1 while unmeasured",
            )?,
            sweeps: counter("sweeps", "Completed measurement sweeps")?,
            observations: counter("observations", "Selector snapshots published")?,
        })
    }

    /// Register all metrics with a Registry for exposition.
    ///
    /// # Errors
    ///
    /// Returns an error if any metric fails to register (e.g., duplicate names).
    pub fn register(&self, registry: &Registry) -> Result<()> {
        registry.register(Box::new(self.best_option.clone()))?;
        registry.register(Box::new(self.current_option.clone()))?;
        registry.register(Box::new(self.streak.clone()))?;
        registry.register(Box::new(self.exploit_window.clone()))?;
        registry.register(Box::new(self.best_ticks.clone()))?;
        registry.register(Box::new(self.sweeps.clone()))?;
        registry.register(Box::new(self.observations.clone()))?;
        Ok(())
    }

    /// A publisher for one dispatcher's snapshots.
    ///
    /// Create one per dispatcher. Each observer tracks the sweeps it has
    /// already counted, so the shared counter stays a total.
    pub fn observer(&self) -> MetricsObserver {
        MetricsObserver {
            metrics: self.clone(),
            counted_sweeps: 0,
        }
    }

    fn set_gauges(&self, snapshot: &SelectorSnapshot) {
        self.best_option.set(snapshot.best_option as i64);
        self.current_option.set(snapshot.current_option as i64);
        self.streak.set(i64::from(snapshot.streak));
        self.exploit_window
            .set(i64::try_from(snapshot.exploit_window).unwrap_or(i64::MAX));
        let best_ticks = if snapshot.best_ticks.is_max() {
            -1
        } else {
            i64::try_from(snapshot.best_ticks.get()).unwrap_or(i64::MAX)
        };
        self.best_ticks.set(best_ticks);
    }
}

/// Publishes one dispatcher's snapshots into a shared [`DispatchMetrics`].
///
/// Obtained from [`DispatchMetrics::observer`]. Not shared between
/// dispatchers: the sweeps already counted belong to one selector.
#[derive(Debug)]
pub struct MetricsObserver {
    metrics: DispatchMetrics,
    counted_sweeps: u64,
}

impl MetricsObserver {
    /// Publish a snapshot.
    ///
    /// Adds the sweeps completed since this observer's previous snapshot to
    /// the shared counter.
    pub fn observe(&mut self, snapshot: &SelectorSnapshot) {
        self.metrics.set_gauges(snapshot);

        let new_sweeps = snapshot.sweeps.saturating_sub(self.counted_sweeps);
        if new_sweeps > 0 {
            self.metrics.sweeps.inc_by(new_sweeps);
        }
        // A replaced selector restarts its count
        self.counted_sweeps = snapshot.sweeps;
        self.metrics.observations.inc();
    }
}

impl std::fmt::Debug for DispatchMetrics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchMetrics")
            .field("best_option", &self.best_option.get())
            .field("streak", &self.streak.get())
            .field("sweeps", &self.sweeps.get())
            .field("observations", &self.observations.get())
            .finish()
    }
}
