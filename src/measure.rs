//! Scoped timing of a single candidate call.

use crate::clock::Clock;
use crate::selector::{Decision, Selector, Ticks};

struct Armed<'a, S: ?Sized, K: ?Sized> {
    selector: &'a mut S,
    clock: &'a K,
    start: Ticks,
}

/// Guard that reports a call's elapsed ticks to its selector on drop.
///
/// An unarmed guard holds no selector and its drop does nothing. An armed guard
/// reads the clock when armed and again when dropped, then calls
/// [`Selector::report`] exactly once.
///
/// Panic-safe: the report also runs when the timed call unwinds, so the
/// selector never sees an armed decision without its report.
///
/// ```ignore
/// let _timer = Measurement::for_decision(decision, &mut selector, &clock);
/// candidates.invoke(decision.option, args)
/// // `_timer` drops after the call returns, reporting the elapsed ticks
/// ```
#[must_use = "a measurement reports when dropped; binding it to `_` drops it immediately"]
pub struct Measurement<'a, S: Selector + ?Sized, K: Clock + ?Sized> {
    armed: Option<Armed<'a, S, K>>,
    option: usize,
}

impl<'a, S: Selector + ?Sized, K: Clock + ?Sized> Measurement<'a, S, K> {
    /// A guard that will not report anything.
    #[inline]
    pub fn unarmed(option: usize) -> Self {
        Self {
            armed: None,
            option,
        }
    }

    /// A guard that starts timing now and reports `option` on drop.
    #[inline]
    pub fn armed(selector: &'a mut S, clock: &'a K, option: usize) -> Self {
        let mut m = Self::unarmed(option);
        m.arm(selector, clock);
        m
    }

    /// Arm or skip arming according to a selector decision.
    #[inline]
    pub fn for_decision(decision: Decision, selector: &'a mut S, clock: &'a K) -> Self {
        if decision.armed {
            Self::armed(selector, clock, decision.option)
        } else {
            Self::unarmed(decision.option)
        }
    }

    /// Start timing. A guard can be armed at most once.
    #[inline]
    pub fn arm(&mut self, selector: &'a mut S, clock: &'a K) {
        debug_assert!(self.armed.is_none(), "measurement armed twice");
        let start = clock.now();
        self.armed = Some(Armed {
            selector,
            clock,
            start,
        });
    }

    /// Whether dropping this guard will report.
    #[inline]
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }

    /// Option this guard times.
    #[inline]
    pub fn option(&self) -> usize {
        self.option
    }
}

impl<S: Selector + ?Sized, K: Clock + ?Sized> Drop for Measurement<'_, S, K> {
    #[inline]
    fn drop(&mut self) {
        if let Some(armed) = self.armed.take() {
            let elapsed = armed.clock.now().elapsed_since(armed.start);
            armed.selector.report(elapsed, self.option);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::selector::{SelectorKnobs, SelectorSnapshot};

    /// Records every report it receives.
    #[derive(Default)]
    struct Recorder {
        reports: Vec<(Ticks, usize)>,
    }

    impl Selector for Recorder {
        fn with_knobs(_n_options: usize, _knobs: &SelectorKnobs) -> Self {
            Self::default()
        }

        fn next(&mut self) -> Decision {
            Decision::measure(0)
        }

        fn report(&mut self, elapsed: Ticks, option: usize) {
            self.reports.push((elapsed, option));
        }

        fn n_options(&self) -> usize {
            1
        }

        fn best_option(&self) -> usize {
            0
        }

        fn snapshot(&self) -> SelectorSnapshot {
            unreachable!("not used by these tests")
        }
    }

    #[test]
    fn test_armed_reports_elapsed_on_drop() {
        let clock = ManualClock::new();
        let mut rec = Recorder::default();
        {
            let m = Measurement::armed(&mut rec, &clock, 2);
            assert!(m.is_armed());
            assert_eq!(m.option(), 2);
            clock.advance(17);
        }
        assert_eq!(rec.reports, vec![(Ticks(17), 2)]);
        assert_eq!(clock.reads(), 2);
    }

    #[test]
    fn test_unarmed_never_reads_clock() {
        let clock = ManualClock::new();
        {
            let m: Measurement<'_, Recorder, ManualClock> = Measurement::unarmed(1);
            assert!(!m.is_armed());
            clock.advance(5);
        }
        assert_eq!(clock.reads(), 0);
    }

    #[test]
    fn test_for_decision() {
        let clock = ManualClock::new();
        let mut rec = Recorder::default();

        drop(Measurement::for_decision(Decision::exploit(0), &mut rec, &clock));
        assert!(rec.reports.is_empty());

        drop(Measurement::for_decision(Decision::measure(1), &mut rec, &clock));
        assert_eq!(rec.reports, vec![(Ticks(0), 1)]);
    }

    #[test]
    fn test_value_flows_through() {
        let clock = ManualClock::new();
        let mut rec = Recorder::default();

        let value = {
            let _m = Measurement::armed(&mut rec, &clock, 0);
            clock.advance(4);
            "result"
        };
        assert_eq!(value, "result");
        assert_eq!(rec.reports, vec![(Ticks(4), 0)]);
    }

    #[test]
    fn test_reports_on_unwind() {
        let clock = ManualClock::new();
        let mut rec = Recorder::default();

        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _m = Measurement::armed(&mut rec, &clock, 0);
            clock.advance(9);
            panic!("candidate failed");
        }));

        assert!(outcome.is_err());
        assert_eq!(rec.reports, vec![(Ticks(9), 0)]);
    }
}
