//! Core types shared by the option selectors.
//!
//! This module defines the fundamental types used throughout the selector system:
//! - `Ticks`: Elapsed clock ticks reported for one measured call
//! - `Decision`: What the selector wants done with the next call
//! - `Phase`: The three phases of the canonical selector
//! - `SelectorSnapshot`: A read-only view of selector state for logs and metrics

use std::fmt;
use std::ops::{Add, AddAssign};

use serde::{Deserialize, Serialize};

/// Maximum number of candidates a dispatcher can choose between.
pub const MAX_OPTIONS: usize = 10;

/// Elapsed clock ticks.
///
/// Hardware cycle-counter ticks on x86_64/aarch64, nanoseconds elsewhere.
/// `Ticks::MAX` stands for "nothing measured yet" and compares worse than
/// any real measurement.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Default, Serialize, Deserialize)]
pub struct Ticks(pub u64);

impl Ticks {
    /// Zero elapsed ticks.
    pub const ZERO: Ticks = Ticks(0);

    /// Sentinel for "no measurement yet".
    pub const MAX: Ticks = Ticks(u64::MAX);

    /// Raw tick count.
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }

    /// Whether this is the "no measurement" sentinel.
    #[inline]
    pub fn is_max(self) -> bool {
        self.0 == u64::MAX
    }

    /// Elapsed ticks between two clock readings, clamped at zero.
    #[inline]
    pub fn elapsed_since(self, start: Ticks) -> Ticks {
        Ticks(self.0.saturating_sub(start.0))
    }

    /// Convert to nanoseconds given a calibrated tick rate.
    ///
    /// See [`calibrate`](crate::calibrate) for obtaining `ticks_per_ns`.
    pub fn as_nanos(self, ticks_per_ns: f64) -> f64 {
        if ticks_per_ns <= 0.0 {
            return self.0 as f64;
        }
        self.0 as f64 / ticks_per_ns
    }
}

impl Add for Ticks {
    type Output = Ticks;

    /// Saturating: accumulated cost never wraps around to look cheap.
    #[inline]
    fn add(self, rhs: Ticks) -> Ticks {
        Ticks(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Ticks {
    #[inline]
    fn add_assign(&mut self, rhs: Ticks) {
        *self = *self + rhs;
    }
}

impl From<u64> for Ticks {
    fn from(value: u64) -> Self {
        Ticks(value)
    }
}

impl fmt::Display for Ticks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_max() {
            write!(f, "unmeasured")
        } else {
            write!(f, "{} ticks", self.0)
        }
    }
}

/// The selector's verdict for one call.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub struct Decision {
    /// Index of the candidate to invoke.
    pub option: usize,
    /// Whether this call must be timed and reported back.
    pub armed: bool,
}

impl Decision {
    /// Invoke `option` without timing it.
    #[inline]
    pub fn exploit(option: usize) -> Self {
        Self {
            option,
            armed: false,
        }
    }

    /// Invoke `option` and report its elapsed ticks.
    #[inline]
    pub fn measure(option: usize) -> Self {
        Self {
            option,
            armed: true,
        }
    }
}

/// Phases of the canonical selector. Exactly one is active at a time.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Untimed calls that let caches and branch predictors settle.
    Warmup,
    /// Timed calls whose cost is charged to the current option.
    Measure,
    /// Untimed calls of the best option found by the last sweep.
    Exploit,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Warmup => write!(f, "warmup"),
            Phase::Measure => write!(f, "measure"),
            Phase::Exploit => write!(f, "exploit"),
        }
    }
}

/// Read-only view of a selector's learned state.
///
/// Taking a snapshot never touches the dispatch path; it is meant for
/// logging and for [`MetricsObserver::observe`](crate::MetricsObserver::observe).
#[derive(Clone, Copy, PartialEq, Eq, Debug, Serialize)]
pub struct SelectorSnapshot {
    /// Name of the policy that produced this snapshot.
    pub policy: &'static str,
    /// Number of candidates.
    pub n_options: usize,
    /// Option the selector is currently exercising.
    pub current_option: usize,
    /// Best option known so far.
    pub best_option: usize,
    /// Cost of the best option, `Ticks::MAX` if nothing was measured yet.
    pub best_ticks: Ticks,
    /// Active phase (canonical policy only).
    pub phase: Option<Phase>,
    /// Consecutive sweeps won by `best_option` (canonical policy only).
    pub streak: u32,
    /// Length of the current exploit window in calls.
    pub exploit_window: u64,
    /// Completed sweeps (canonical) or completed probes (epsilon-greedy).
    pub sweeps: u64,
}
