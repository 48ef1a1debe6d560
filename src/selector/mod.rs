//! Adaptive option selectors.
//!
//! A selector decides, for every call through an
//! [`AdaptiveDispatcher`](crate::AdaptiveDispatcher), which candidate to run
//! and whether that call should be timed. Timed calls are reported back with
//! [`Selector::report`], and the selector updates its belief about which
//! candidate is fastest.
//!
//! # Policies
//!
//! ## Phase-based (canonical)
//!
//! [`PhaseSelector`] sweeps over every candidate with a short untimed warmup
//! followed by a short timed measurement window, then exploits the winner for
//! a window that doubles every time the same candidate wins again:
//!
//! ```text
//! ┌────────── sweep ──────────┐
//! W0 M0  W1 M1  ...  Wn-1 Mn-1   Exploit(best) x (exploit_calls << streak)   W0 M0 ...
//! ```
//!
//! A stable winner is re-verified less and less often. A change of winner
//! resets the streak, so exploration speeds up again.
//!
//! ## Epsilon-greedy (reference)
//!
//! [`EpsGreedySelector`] keeps only a best index. Every `explore_interval`
//! calls it times the best option once for a fresh baseline, then times one
//! other option and switches if that option was strictly faster.
//!
//! # Usage
//!
//! Selectors are normally driven by a dispatcher, but can be used directly:
//!
//! ```ignore
//! use veer_rs::selector::{PhaseSelector, Selector, SelectorKnobs};
//!
//! let mut sel = PhaseSelector::with_knobs(3, &SelectorKnobs::default());
//! let decision = sel.next();
//! // ... run candidate `decision.option`, timing it if `decision.armed` ...
//! if decision.armed {
//!     sel.report(elapsed, decision.option);
//! }
//! ```
//!
//! # Contract
//!
//! - `next()` always returns `option < n_options()`.
//! - Every `next()` with `armed == true` is followed by exactly one
//!   `report()` for the same option before the next `next()`.
//! - Selectors hold no synchronization: one instance per call site.

mod eps_greedy;
mod knobs;
mod phase;
mod policy;
mod types;

pub use eps_greedy::EpsGreedySelector;
pub use knobs::{
    SelectorKnobs, DEFAULT_EXPLOIT_CALLS, DEFAULT_EXPLORE_INTERVAL, DEFAULT_MEASURE_CALLS,
    DEFAULT_WARMUP_CALLS, MAX_STREAK,
};
pub use phase::PhaseSelector;
pub use policy::{Policy, PolicySelector};
pub use types::{Decision, Phase, SelectorSnapshot, Ticks, MAX_OPTIONS};

/// Online policy choosing among a fixed number of options.
pub trait Selector {
    /// Create a selector for `n_options` candidates.
    ///
    /// # Panics
    ///
    /// Panics if `n_options` is zero or larger than [`MAX_OPTIONS`].
    fn with_knobs(n_options: usize, knobs: &SelectorKnobs) -> Self
    where
        Self: Sized;

    /// Pick the option for the next call and whether to time it.
    fn next(&mut self) -> Decision;

    /// Report the elapsed ticks of an armed call.
    ///
    /// Must only be called for a decision returned with `armed == true`,
    /// passing that decision's option.
    fn report(&mut self, elapsed: Ticks, option: usize);

    /// Number of candidates this selector chooses between.
    fn n_options(&self) -> usize;

    /// Best option found so far.
    fn best_option(&self) -> usize;

    /// Read-only view of the learned state.
    fn snapshot(&self) -> SelectorSnapshot;
}

/// Panic unless `n_options` is a supported candidate count.
pub(crate) fn check_option_count(n_options: usize) {
    assert!(
        (1..=MAX_OPTIONS).contains(&n_options),
        "selector needs between 1 and {MAX_OPTIONS} options, got {n_options}"
    );
}
