//! Configuration knobs for the option selectors.
//!
//! All knobs have sensible defaults tuned for calls in the nanosecond to
//! microsecond range. Most users won't need to modify these values.

use serde::{Deserialize, Serialize};

use crate::error::{DispatchError, Result};

/// Default number of untimed warmup calls before measuring a candidate.
pub const DEFAULT_WARMUP_CALLS: u32 = 4;

/// Default number of timed calls charged to a candidate per sweep.
pub const DEFAULT_MEASURE_CALLS: u32 = 4;

/// Default base length of the exploit window.
pub const DEFAULT_EXPLOIT_CALLS: u32 = 128;

/// Ceiling on the winning streak; the exploit window grows at most `1 << MAX_STREAK` times.
pub const MAX_STREAK: u32 = 10;

/// Default number of calls between probes of the epsilon-greedy policy.
pub const DEFAULT_EXPLORE_INTERVAL: u32 = 100;

/// Configuration knobs for the option selectors.
///
/// # Canonical policy
///
/// Each sweep spends `warmup_calls` untimed calls and then `measure_calls`
/// timed calls on every candidate. The winner is then used for
/// ```text
/// exploit_window = exploit_calls << streak
/// ```
/// calls, where `streak` counts consecutive sweeps won by the same candidate,
/// capped at `max_streak`.
///
/// # Epsilon-greedy policy
///
/// Only `explore_interval` is used: the number of untimed calls of the best
/// option between two probes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorKnobs {
    /// Untimed calls per candidate before measuring.
    /// Default: 4
    #[serde(default = "default_warmup_calls")]
    pub warmup_calls: u32,

    /// Timed calls per candidate per sweep. Must be at least 1.
    /// Default: 4
    #[serde(default = "default_measure_calls")]
    pub measure_calls: u32,

    /// Base exploit window in calls.
    /// Default: 128
    #[serde(default = "default_exploit_calls")]
    pub exploit_calls: u32,

    /// Cap on the winning streak, at most [`MAX_STREAK`].
    /// Default: 10 (exploit window grows up to x1024)
    #[serde(default = "default_max_streak")]
    pub max_streak: u32,

    /// Epsilon-greedy: calls between probes, including the baseline call. Must be at least 1.
    /// Default: 100
    #[serde(default = "default_explore_interval")]
    pub explore_interval: u32,
}

fn default_warmup_calls() -> u32 {
    DEFAULT_WARMUP_CALLS
}

fn default_measure_calls() -> u32 {
    DEFAULT_MEASURE_CALLS
}

fn default_exploit_calls() -> u32 {
    DEFAULT_EXPLOIT_CALLS
}

fn default_max_streak() -> u32 {
    MAX_STREAK
}

fn default_explore_interval() -> u32 {
    DEFAULT_EXPLORE_INTERVAL
}

impl Default for SelectorKnobs {
    fn default() -> Self {
        Self {
            warmup_calls: DEFAULT_WARMUP_CALLS,
            measure_calls: DEFAULT_MEASURE_CALLS,
            exploit_calls: DEFAULT_EXPLOIT_CALLS,
            max_streak: MAX_STREAK,
            explore_interval: DEFAULT_EXPLORE_INTERVAL,
        }
    }
}

impl SelectorKnobs {
    /// Create knobs with all defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that the knobs describe a selector that always makes progress.
    ///
    /// # Errors
    ///
    /// - `measure_calls == 0`: a sweep would never time anything
    /// - `max_streak > MAX_STREAK`
    /// - `explore_interval == 0`: the epsilon-greedy policy would never refresh its baseline
    pub fn validate(&self) -> Result<()> {
        if self.measure_calls == 0 {
            return Err(DispatchError::InvalidMeasureWindow);
        }
        if self.max_streak > MAX_STREAK {
            return Err(DispatchError::StreakTooLarge {
                requested: self.max_streak,
                max: MAX_STREAK,
            });
        }
        if self.explore_interval == 0 {
            return Err(DispatchError::InvalidExploreInterval(self.explore_interval));
        }
        Ok(())
    }

    /// Exploit window length for a given streak.
    #[inline]
    pub fn exploit_window(&self, streak: u32) -> u64 {
        u64::from(self.exploit_calls) << streak.min(self.max_streak)
    }

    /// Calls needed for one full sweep over `n_options` candidates.
    pub fn sweep_calls(&self, n_options: usize) -> u64 {
        (u64::from(self.warmup_calls) + u64::from(self.measure_calls)) * n_options as u64
    }

    /// Builder method to set the warmup window.
    pub fn with_warmup_calls(mut self, calls: u32) -> Self {
        self.warmup_calls = calls;
        self
    }

    /// Builder method to set the measurement window.
    pub fn with_measure_calls(mut self, calls: u32) -> Self {
        self.measure_calls = calls;
        self
    }

    /// Builder method to set the base exploit window.
    pub fn with_exploit_calls(mut self, calls: u32) -> Self {
        self.exploit_calls = calls;
        self
    }

    /// Builder method to set the streak cap.
    pub fn with_max_streak(mut self, streak: u32) -> Self {
        self.max_streak = streak;
        self
    }

    /// Builder method to set the epsilon-greedy probe interval.
    pub fn with_explore_interval(mut self, calls: u32) -> Self {
        self.explore_interval = calls;
        self
    }
}
