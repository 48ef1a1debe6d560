//! Phase-based selector.
//!
//! The selector cycles through three phases. Transitions only happen when the
//! current phase's call budget runs out, so the steady-state cost of `next()`
//! is one decrement and one comparison.

use tracing::{debug, trace};

use super::knobs::{SelectorKnobs, MAX_STREAK};
use super::types::{Decision, Phase, SelectorSnapshot, Ticks};
use super::{check_option_count, Selector};

/// Canonical sweep/exploit selector.
///
/// See the [module documentation](super) for the phase diagram.
#[derive(Clone, Debug)]
pub struct PhaseSelector {
    n_options: usize,
    warmup_calls: u32,
    measure_calls: u32,
    exploit_calls: u32,
    max_streak: u32,

    /// Option currently being warmed up, measured or exploited
    current_option: usize,
    phase: Phase,
    /// Calls left before the next transition
    phase_left: u64,
    /// Accumulated cost of `current_option` in this measurement window
    current_duration: Ticks,

    /// Winner of the sweep in progress (or of the last one while exploiting)
    best_option: usize,
    best_duration: Ticks,

    /// Winner of the previous sweep and its cost
    last_best_option: Option<usize>,
    last_best_duration: Ticks,
    best_option_streak: u32,

    sweeps: u64,
}

impl PhaseSelector {
    /// Create a selector with default knobs.
    pub fn new(n_options: usize) -> Self {
        Self::with_knobs(n_options, &SelectorKnobs::default())
    }

    /// Phase currently active.
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Calls left in the current phase.
    pub fn phase_left(&self) -> u64 {
        self.phase_left
    }

    /// Consecutive sweeps won by the current best option.
    pub fn streak(&self) -> u32 {
        self.best_option_streak
    }

    /// Completed sweeps.
    pub fn sweeps(&self) -> u64 {
        self.sweeps
    }

    fn exploit_window(&self) -> u64 {
        u64::from(self.exploit_calls) << self.best_option_streak
    }

    /// Run one phase transition. Only called when `phase_left` hit zero.
    #[cold]
    fn advance_phase(&mut self) {
        match self.phase {
            Phase::Warmup => self.begin_measure(),
            Phase::Measure => self.finish_measure(),
            Phase::Exploit => self.begin_sweep(),
        }
    }

    fn begin_sweep(&mut self) {
        self.best_duration = Ticks::MAX;
        self.best_option = 0;
        self.current_option = 0;
        self.enter(Phase::Warmup, u64::from(self.warmup_calls));
    }

    fn begin_measure(&mut self) {
        self.current_duration = Ticks::ZERO;
        self.enter(Phase::Measure, u64::from(self.measure_calls));
    }

    fn finish_measure(&mut self) {
        if self.current_duration < self.best_duration {
            self.best_duration = self.current_duration;
            self.best_option = self.current_option;
        }
        trace!(
            option = self.current_option,
            ticks = self.current_duration.get(),
            "measured option"
        );

        self.current_option += 1;
        if self.current_option != self.n_options {
            self.enter(Phase::Warmup, u64::from(self.warmup_calls));
            return;
        }

        // Sweep complete
        self.best_option_streak = if self.last_best_option == Some(self.best_option) {
            (self.best_option_streak + 1).min(self.max_streak)
        } else {
            0
        };
        self.sweeps += 1;
        self.current_option = self.best_option;
        self.last_best_option = Some(self.best_option);
        self.last_best_duration = self.best_duration;

        let window = self.exploit_window();
        debug!(
            best_option = self.best_option,
            best_ticks = self.best_duration.get(),
            streak = self.best_option_streak,
            exploit_window = window,
            sweeps = self.sweeps,
            "sweep complete"
        );
        self.enter(Phase::Exploit, window);
    }

    #[inline]
    fn enter(&mut self, phase: Phase, budget: u64) {
        trace!(%phase, option = self.current_option, budget, "phase transition");
        self.phase = phase;
        self.phase_left = budget;
    }
}

impl Selector for PhaseSelector {
    fn with_knobs(n_options: usize, knobs: &SelectorKnobs) -> Self {
        check_option_count(n_options);
        Self {
            n_options,
            warmup_calls: knobs.warmup_calls,
            // A zero-length measurement window would make every sweep a tie
            measure_calls: knobs.measure_calls.max(1),
            exploit_calls: knobs.exploit_calls,
            max_streak: knobs.max_streak.min(MAX_STREAK),
            current_option: 0,
            // Exploit with an empty budget: the first call starts a sweep
            phase: Phase::Exploit,
            phase_left: 0,
            current_duration: Ticks::ZERO,
            best_option: 0,
            best_duration: Ticks::MAX,
            last_best_option: None,
            last_best_duration: Ticks::MAX,
            best_option_streak: 0,
            sweeps: 0,
        }
    }

    #[inline]
    fn next(&mut self) -> Decision {
        // Terminates: a measurement window is never empty
        while self.phase_left == 0 {
            self.advance_phase();
        }
        self.phase_left -= 1;
        Decision {
            option: self.current_option,
            armed: self.phase == Phase::Measure,
        }
    }

    #[inline]
    fn report(&mut self, elapsed: Ticks, option: usize) {
        debug_assert_eq!(
            option, self.current_option,
            "report for option {option} while measuring {}",
            self.current_option
        );
        debug_assert_eq!(self.phase, Phase::Measure, "report outside the measure phase");
        self.current_duration += elapsed;
    }

    fn n_options(&self) -> usize {
        self.n_options
    }

    /// Winner of the last completed sweep, or the running best before the
    /// first sweep completes.
    fn best_option(&self) -> usize {
        self.last_best_option.unwrap_or(self.best_option)
    }

    fn snapshot(&self) -> SelectorSnapshot {
        SelectorSnapshot {
            policy: "phase",
            n_options: self.n_options,
            current_option: self.current_option,
            best_option: self.best_option(),
            best_ticks: match self.last_best_option {
                Some(_) => self.last_best_duration,
                None => self.best_duration,
            },
            phase: Some(self.phase),
            streak: self.best_option_streak,
            exploit_window: self.exploit_window(),
            sweeps: self.sweeps,
        }
    }
}
