//! Optional startup calibration of the tick source.
//!
//! Calibration measures what a timed call costs on top of the candidate
//! itself (two back-to-back clock reads) and how ticks relate to wall-clock
//! nanoseconds. Neither number changes selector decisions, which only compare
//! ticks with ticks, but both help when reading snapshots and metrics.
//!
//! # Default Behavior
//!
//! Calibration is **disabled by default** for fast unit test startup.
//! Enable it via `DispatchBuilder::calibrate(true)` or `[calibration]` in a
//! config file.

use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

use crate::clock::Clock;

/// Results from clock calibration.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CalibrationResult {
    /// Median ticks between two back-to-back clock reads.
    pub read_overhead_p50: f64,

    /// P99 of the same samples (useful for understanding tail latency)
    pub read_overhead_p99: f64,

    /// Ticks per wall-clock nanosecond. Zero if the clock did not advance.
    pub ticks_per_ns: f64,
}

/// Configuration for the calibration phase.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CalibrationConfig {
    /// Whether the builder runs calibration.
    /// Default: false (for fast unit test startup)
    #[serde(default)]
    pub enabled: bool,

    /// Number of warmup iterations before measuring.
    /// Default: 100
    #[serde(default = "default_warmup_iterations")]
    pub warmup_iterations: usize,

    /// Number of measurement samples.
    /// Default: 1000
    #[serde(default = "default_sample_count")]
    pub sample_count: usize,

    /// Wall-clock span over which ticks are compared with `Instant`.
    /// Default: 1000
    #[serde(default = "default_reference_window_us")]
    pub reference_window_us: u64,
}

fn default_warmup_iterations() -> usize {
    100
}

fn default_sample_count() -> usize {
    1000
}

fn default_reference_window_us() -> u64 {
    1000
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            warmup_iterations: default_warmup_iterations(),
            sample_count: default_sample_count(),
            reference_window_us: default_reference_window_us(),
        }
    }
}

impl CalibrationConfig {
    /// Create a new calibration config with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable calibration.
    pub fn enabled(mut self) -> Self {
        self.enabled = true;
        self
    }

    /// Set the number of warmup iterations.
    pub fn warmup_iterations(mut self, count: usize) -> Self {
        self.warmup_iterations = count;
        self
    }

    /// Set the number of measurement samples.
    pub fn sample_count(mut self, count: usize) -> Self {
        self.sample_count = count;
        self
    }

    /// Set the reference window in microseconds.
    pub fn reference_window_us(mut self, us: u64) -> Self {
        self.reference_window_us = us;
        self
    }
}

/// Measure `clock`'s read overhead and tick rate.
///
/// Runs regardless of `config.enabled`; the flag only tells the builder
/// whether to call this.
pub fn calibrate<K: Clock + ?Sized>(clock: &K, config: &CalibrationConfig) -> CalibrationResult {
    // Warmup: populate caches, let the counter settle
    for _ in 0..config.warmup_iterations {
        std::hint::black_box(clock.now());
    }

    let mut samples = Vec::with_capacity(config.sample_count);
    for _ in 0..config.sample_count {
        let start = clock.now();
        let end = clock.now();
        samples.push(end.elapsed_since(start).get());
    }
    samples.sort_unstable();

    CalibrationResult {
        read_overhead_p50: percentile_sorted(&samples, 50.0),
        read_overhead_p99: percentile_sorted(&samples, 99.0),
        ticks_per_ns: ticks_per_ns(clock, Duration::from_micros(config.reference_window_us)),
    }
}

/// Busy-wait for `window` and compare the clock's advance with `Instant`.
fn ticks_per_ns<K: Clock + ?Sized>(clock: &K, window: Duration) -> f64 {
    let wall_start = Instant::now();
    let start = clock.now();
    while wall_start.elapsed() < window {
        std::hint::spin_loop();
    }
    let ticks = clock.now().elapsed_since(start).get();
    let nanos = wall_start.elapsed().as_nanos();
    if nanos == 0 {
        return 0.0;
    }
    ticks as f64 / nanos as f64
}

/// Calculate a percentile from a sorted slice.
fn percentile_sorted(sorted: &[u64], pct: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let idx = ((pct / 100.0) * (sorted.len() - 1) as f64).round() as usize;
    sorted[idx.min(sorted.len() - 1)] as f64
}
