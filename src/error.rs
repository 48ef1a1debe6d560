//! Error types for veer-rs.

use thiserror::Error;

/// Errors that can occur when configuring a dispatcher.
///
/// Nothing on the dispatch path returns an error; these all surface at
/// construction time.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Error extracting configuration from figment.
    #[error("configuration error: {0}")]
    Config(#[from] Box<figment::Error>),

    /// Measurement window of zero calls.
    #[error("measure_calls must be at least 1")]
    InvalidMeasureWindow,

    /// Exploit window would be shifted past the supported streak.
    #[error("max_streak {requested} exceeds the supported maximum of {max}")]
    StreakTooLarge { requested: u32, max: u32 },

    /// Epsilon-greedy probe interval of zero calls.
    #[error("explore_interval must be at least 1, got {0}")]
    InvalidExploreInterval(u32),

    /// Error registering metrics with a Prometheus registry.
    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

/// Result type alias for dispatcher configuration.
pub type Result<T> = std::result::Result<T, DispatchError>;
