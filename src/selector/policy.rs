//! Runtime choice between selector policies.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::eps_greedy::EpsGreedySelector;
use super::knobs::SelectorKnobs;
use super::phase::PhaseSelector;
use super::types::{Decision, SelectorSnapshot, Ticks};
use super::Selector;

/// Selector policy, as named in configuration files and on the command line.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum Policy {
    /// Sweep/exploit policy with a doubling exploit window.
    #[default]
    Phase,
    /// Periodic single-challenger probes.
    EpsilonGreedy,
}

impl fmt::Display for Policy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Policy::Phase => write!(f, "phase"),
            Policy::EpsilonGreedy => write!(f, "epsilon_greedy"),
        }
    }
}

/// A selector whose policy is picked at construction time from a [`Policy`].
///
/// This enum-based approach keeps the dispatcher's type independent of the
/// configured policy at the cost of one predictable branch per call.
#[derive(Clone, Debug)]
pub enum PolicySelector {
    /// Canonical policy
    Phase(PhaseSelector),
    /// Reference policy
    EpsilonGreedy(EpsGreedySelector),
}

impl PolicySelector {
    /// Create a selector of the given policy.
    pub fn new(policy: Policy, n_options: usize, knobs: &SelectorKnobs) -> Self {
        match policy {
            Policy::Phase => PolicySelector::Phase(PhaseSelector::with_knobs(n_options, knobs)),
            Policy::EpsilonGreedy => {
                PolicySelector::EpsilonGreedy(EpsGreedySelector::with_knobs(n_options, knobs))
            }
        }
    }

    /// Policy of the wrapped selector.
    pub fn policy(&self) -> Policy {
        match self {
            PolicySelector::Phase(_) => Policy::Phase,
            PolicySelector::EpsilonGreedy(_) => Policy::EpsilonGreedy,
        }
    }
}

impl Selector for PolicySelector {
    fn with_knobs(n_options: usize, knobs: &SelectorKnobs) -> Self {
        Self::new(Policy::default(), n_options, knobs)
    }

    #[inline]
    fn next(&mut self) -> Decision {
        match self {
            PolicySelector::Phase(s) => s.next(),
            PolicySelector::EpsilonGreedy(s) => s.next(),
        }
    }

    #[inline]
    fn report(&mut self, elapsed: Ticks, option: usize) {
        match self {
            PolicySelector::Phase(s) => s.report(elapsed, option),
            PolicySelector::EpsilonGreedy(s) => s.report(elapsed, option),
        }
    }

    fn n_options(&self) -> usize {
        match self {
            PolicySelector::Phase(s) => s.n_options(),
            PolicySelector::EpsilonGreedy(s) => s.n_options(),
        }
    }

    fn best_option(&self) -> usize {
        match self {
            PolicySelector::Phase(s) => s.best_option(),
            PolicySelector::EpsilonGreedy(s) => s.best_option(),
        }
    }

    fn snapshot(&self) -> SelectorSnapshot {
        match self {
            PolicySelector::Phase(s) => s.snapshot(),
            PolicySelector::EpsilonGreedy(s) => s.snapshot(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_policy_display_matches_serde() {
        for policy in [Policy::Phase, Policy::EpsilonGreedy] {
            let json = serde_json::to_string(&policy).unwrap();
            assert_eq!(json, format!("\"{policy}\""));
        }
    }

    #[test]
    fn test_default_is_phase() {
        let sel = PolicySelector::with_knobs(3, &SelectorKnobs::default());
        assert_eq!(sel.policy(), Policy::Phase);
        assert_eq!(sel.snapshot().policy, "phase");
    }

    #[test]
    fn test_delegates_to_wrapped_policy() {
        let knobs = SelectorKnobs::default();
        let mut phase = PolicySelector::new(Policy::Phase, 2, &knobs);
        let mut eps = PolicySelector::new(Policy::EpsilonGreedy, 2, &knobs);

        // Phase policy warms up first, epsilon-greedy times the incumbent first
        assert!(!phase.next().armed);
        assert!(eps.next().armed);
        assert_eq!(eps.snapshot().policy, "epsilon_greedy");
        assert_eq!(eps.n_options(), 2);
    }
}
