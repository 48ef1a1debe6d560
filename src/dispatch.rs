//! Adaptive dispatcher: selector + candidates + clock.

use std::fmt;

use crate::clock::{Clock, CycleClock};
use crate::measure::Measurement;
use crate::selector::{PhaseSelector, Selector, SelectorKnobs, SelectorSnapshot};
use crate::switch::{Arity, Candidates};

/// Calls one of a fixed set of equivalent candidates, learning online which
/// one is fastest.
///
/// One dispatcher serves one call site on one thread. For multi-threaded
/// code, give each thread its own dispatcher (cloning one is cheap).
///
/// ```ignore
/// use veer_rs::AdaptiveDispatcher;
///
/// let mut sort = AdaptiveDispatcher::new((
///     |v: &mut Vec<u32>| v.sort_unstable(),
///     |v: &mut Vec<u32>| v.sort(),
/// ));
/// for mut batch in batches {
///     sort.call(&mut batch);
/// }
/// ```
#[derive(Clone)]
pub struct AdaptiveDispatcher<C, S = PhaseSelector, K = CycleClock> {
    candidates: C,
    selector: S,
    clock: K,
}

impl<C: Arity> AdaptiveDispatcher<C> {
    /// Dispatcher using the phase-based selector with default knobs and the
    /// hardware cycle counter.
    pub fn new(candidates: C) -> Self {
        Self::with_knobs(candidates, &SelectorKnobs::default())
    }

    /// Dispatcher using the phase-based selector with the given knobs.
    pub fn with_knobs(candidates: C, knobs: &SelectorKnobs) -> Self {
        let selector = PhaseSelector::with_knobs(C::LEN, knobs);
        Self::with_selector_and_clock(candidates, selector, CycleClock)
    }
}

impl<C: Arity, K: Clock> AdaptiveDispatcher<C, PhaseSelector, K> {
    /// Dispatcher using the phase-based selector with default knobs and a
    /// custom clock.
    pub fn with_clock(candidates: C, clock: K) -> Self {
        let selector = PhaseSelector::new(C::LEN);
        Self::with_selector_and_clock(candidates, selector, clock)
    }
}

impl<C: Arity, S: Selector> AdaptiveDispatcher<C, S> {
    /// Dispatcher driven by an already constructed selector.
    pub fn with_selector(candidates: C, selector: S) -> Self {
        Self::with_selector_and_clock(candidates, selector, CycleClock)
    }
}

impl<C: Arity, S: Selector, K: Clock> AdaptiveDispatcher<C, S, K> {
    /// Assemble a dispatcher from its parts.
    ///
    /// # Panics
    ///
    /// Panics if the selector was built for a different number of options.
    pub fn with_selector_and_clock(candidates: C, selector: S, clock: K) -> Self {
        assert_eq!(
            selector.n_options(),
            C::LEN,
            "selector built for {} options, dispatcher has {} candidates",
            selector.n_options(),
            C::LEN
        );
        Self {
            candidates,
            selector,
            clock,
        }
    }

    /// Run the chosen candidate on `args` and return its result.
    ///
    /// A single candidate is called directly without consulting the selector.
    /// Panics from a candidate propagate unchanged; a timed call still reports
    /// its elapsed ticks while unwinding.
    #[inline]
    pub fn call<Args, R>(&mut self, args: Args) -> R
    where
        C: Candidates<Args, R>,
    {
        if C::LEN == 1 {
            return self.candidates.invoke(0, args);
        }

        let decision = self.selector.next();
        let _timer = Measurement::for_decision(decision, &mut self.selector, &self.clock);
        self.candidates.invoke(decision.option, args)
    }

    /// Number of candidates.
    pub fn len(&self) -> usize {
        C::LEN
    }

    /// Always false: a dispatcher holds at least one candidate.
    pub fn is_empty(&self) -> bool {
        false
    }

    /// Best candidate found so far.
    pub fn best_option(&self) -> usize {
        self.selector.best_option()
    }

    /// Read-only view of the selector's learned state.
    pub fn snapshot(&self) -> SelectorSnapshot {
        self.selector.snapshot()
    }

    /// The selector, for inspecting policy-specific state.
    pub fn selector(&self) -> &S {
        &self.selector
    }

    /// The candidate set.
    pub fn candidates(&self) -> &C {
        &self.candidates
    }

    /// The clock timing measured calls.
    pub fn clock(&self) -> &K {
        &self.clock
    }

    /// Take the dispatcher apart.
    pub fn into_parts(self) -> (C, S, K) {
        (self.candidates, self.selector, self.clock)
    }
}

impl<C, S: fmt::Debug, K: fmt::Debug> fmt::Debug for AdaptiveDispatcher<C, S, K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AdaptiveDispatcher")
            .field("selector", &self.selector)
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}
