//! Metrics for dispatcher observability.
//!
//! Selectors keep their state in plain fields. Metrics are published from
//! [`SelectorSnapshot`](crate::selector::SelectorSnapshot)s, so exposition
//! costs nothing on the dispatch path.
//!
//! # Available Metrics
//!
//! ## Gauges (latest snapshot)
//!
//! - `veer_best_option` - Index of the fastest candidate found
//! - `veer_current_option` - Index of the candidate in use
//! - `veer_streak` - Consecutive sweeps won by the best candidate
//! - `veer_exploit_window` - Calls in the current exploit window
//! - `veer_best_ticks` - Measured ticks of the best candidate (-1 while unmeasured)
//!
//! ## Counters (cumulative)
//!
//! - `veer_sweeps` - Completed measurement sweeps, summed over dispatchers
//! - `veer_observations` - Snapshots published
//!
//! The `veer` prefix follows the configured dispatcher name.

mod prometheus;

pub use self::prometheus::{DispatchMetrics, MetricsObserver};
