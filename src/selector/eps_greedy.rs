//! Epsilon-greedy reference selector.
//!
//! Kept as a cross-check for [`PhaseSelector`](super::PhaseSelector): simpler
//! state, slower and noisier convergence. Each probe compares a single timed
//! call of one challenger against a single timed call of the incumbent.

use tracing::debug;

use super::knobs::SelectorKnobs;
use super::types::{Decision, SelectorSnapshot, Ticks};
use super::{check_option_count, Selector};

/// Probe-one-challenger-every-N-calls selector.
#[derive(Clone, Debug)]
pub struct EpsGreedySelector {
    n_options: usize,
    explore_interval: u32,

    best_index: usize,
    /// Calls left before the next probe. At 1 the incumbent is timed, at 0 a challenger.
    left_exploiting: u32,
    /// Next challenger, never equal to `best_index` when `n_options > 1`
    next_explore: usize,
    /// Most recent timed call of `best_index`
    baseline: Ticks,

    probes: u64,
}

impl EpsGreedySelector {
    /// Create a selector with default knobs.
    pub fn new(n_options: usize) -> Self {
        Self::with_knobs(n_options, &SelectorKnobs::default())
    }

    /// Option that will be challenged next.
    pub fn next_explore(&self) -> usize {
        self.next_explore
    }

    /// Most recent timed cost of the incumbent.
    pub fn baseline(&self) -> Ticks {
        self.baseline
    }

    #[inline]
    fn following(&self, index: usize) -> usize {
        let next = index + 1;
        if next == self.n_options {
            0
        } else {
            next
        }
    }
}

impl Selector for EpsGreedySelector {
    fn with_knobs(n_options: usize, knobs: &SelectorKnobs) -> Self {
        check_option_count(n_options);
        Self {
            n_options,
            explore_interval: knobs.explore_interval.max(1),
            best_index: 0,
            // First call times the incumbent to seed the baseline
            left_exploiting: 1,
            next_explore: if n_options > 1 { 1 } else { 0 },
            baseline: Ticks::MAX,
            probes: 0,
        }
    }

    #[inline]
    fn next(&mut self) -> Decision {
        match self.left_exploiting {
            0 => {
                self.left_exploiting = self.explore_interval;
                Decision::measure(self.next_explore)
            }
            1 => {
                self.left_exploiting = 0;
                Decision::measure(self.best_index)
            }
            _ => {
                self.left_exploiting -= 1;
                Decision::exploit(self.best_index)
            }
        }
    }

    fn report(&mut self, elapsed: Ticks, option: usize) {
        debug_assert!(
            option < self.n_options,
            "report for option {option} of {}",
            self.n_options
        );
        if option != self.best_index {
            self.probes += 1;
            if elapsed < self.baseline {
                debug!(
                    from = self.best_index,
                    to = option,
                    challenger_ticks = elapsed.get(),
                    baseline_ticks = self.baseline.get(),
                    "switching best option"
                );
                self.best_index = option;
            }
            self.next_explore = self.following(self.next_explore);
            if self.next_explore == self.best_index {
                self.next_explore = self.following(self.next_explore);
            }
        } else {
            self.baseline = elapsed;
        }
    }

    fn n_options(&self) -> usize {
        self.n_options
    }

    fn best_option(&self) -> usize {
        self.best_index
    }

    fn snapshot(&self) -> SelectorSnapshot {
        SelectorSnapshot {
            policy: "epsilon_greedy",
            n_options: self.n_options,
            current_option: self.best_index,
            best_option: self.best_index,
            best_ticks: self.baseline,
            phase: None,
            streak: 0,
            exploit_window: u64::from(self.explore_interval),
            sweeps: self.probes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drive(sel: &mut EpsGreedySelector, costs: &[u64], calls: usize) -> Vec<Decision> {
        (0..calls)
            .map(|_| {
                let d = sel.next();
                if d.armed {
                    sel.report(Ticks(costs[d.option]), d.option);
                }
                d
            })
            .collect()
    }

    #[test]
    fn test_first_calls_seed_baseline_then_probe() {
        let mut sel = EpsGreedySelector::new(3);

        assert_eq!(sel.next(), Decision::measure(0));
        sel.report(Ticks(30), 0);
        assert_eq!(sel.baseline(), Ticks(30));

        assert_eq!(sel.next(), Decision::measure(1));
        sel.report(Ticks(10), 1);
        assert_eq!(sel.best_option(), 1);
        // Challenger pointer skips the new incumbent
        assert_eq!(sel.next_explore(), 2);
    }

    #[test]
    fn test_probe_cycle_layout() {
        let mut sel = EpsGreedySelector::new(2);
        let decisions = drive(&mut sel, &[1, 2], 2 + 101);

        assert!(decisions[0].armed);
        assert!(decisions[1].armed);
        // 99 unarmed exploit calls, then baseline, then probe
        assert!(decisions[2..101].iter().all(|d| !d.armed));
        assert_eq!(decisions[101], Decision::measure(0));
        assert_eq!(decisions[102], Decision::measure(1));
    }

    #[test]
    fn test_converges_to_cheapest() {
        let mut sel = EpsGreedySelector::new(3);
        drive(&mut sel, &[30, 10, 20], 1000);
        assert_eq!(sel.best_option(), 1);
    }

    #[test]
    fn test_slower_challenger_does_not_switch() {
        let mut sel = EpsGreedySelector::new(2);
        drive(&mut sel, &[5, 9], 500);
        assert_eq!(sel.best_option(), 0);
        assert!(sel.snapshot().sweeps >= 4);
    }

    #[test]
    fn test_equal_cost_does_not_switch() {
        let mut sel = EpsGreedySelector::new(2);
        drive(&mut sel, &[5, 5], 500);
        assert_eq!(sel.best_option(), 0);
    }

    #[test]
    fn test_challenger_never_equals_best() {
        let mut sel = EpsGreedySelector::new(4);
        let costs = [40, 30, 20, 10];
        for _ in 0..2000 {
            let d = sel.next();
            if d.armed {
                sel.report(Ticks(costs[d.option]), d.option);
            }
            assert_ne!(sel.next_explore(), sel.best_option());
        }
        assert_eq!(sel.best_option(), 3);
    }

    #[test]
    fn test_single_option() {
        let mut sel = EpsGreedySelector::new(1);
        let decisions = drive(&mut sel, &[3], 300);
        assert!(decisions.iter().all(|d| d.option == 0));
    }

    #[test]
    fn test_custom_interval() {
        let knobs = SelectorKnobs::default().with_explore_interval(4);
        let mut sel = EpsGreedySelector::with_knobs(2, &knobs);
        let decisions = drive(&mut sel, &[1, 2], 2 + 5);
        let armed: Vec<bool> = decisions.iter().map(|d| d.armed).collect();
        assert_eq!(armed, vec![true, true, false, false, false, true, true]);
    }
}
