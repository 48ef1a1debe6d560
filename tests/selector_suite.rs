//! Shared behavioral suite run against every `Selector` implementation.

use std::collections::BTreeSet;

use veer_rs::{
    Decision, EpsGreedySelector, PhaseSelector, PolicySelector, Selector, SelectorKnobs, Ticks,
    MAX_OPTIONS,
};

/// Small windows so every policy cycles quickly.
fn knobs() -> SelectorKnobs {
    SelectorKnobs::default()
        .with_exploit_calls(8)
        .with_explore_interval(4)
}

/// Costs falling with the index: the last option is the cheapest.
fn falling_costs(n: usize) -> Vec<u64> {
    (0..n).map(|i| 10 * (n - i) as u64).collect()
}

/// Drive `sel`, charging `costs[option]` to armed calls and checking that
/// every decision names a valid option.
fn drive<S: Selector>(sel: &mut S, costs: &[u64], calls: usize) -> Vec<Decision> {
    let n = sel.n_options();
    (0..calls)
        .map(|call| {
            let d = sel.next();
            assert!(d.option < n, "call {call}: option {} of {n}", d.option);
            if d.armed {
                sel.report(Ticks(costs[d.option]), d.option);
            }
            d
        })
        .collect()
}

fn index_validity<S: Selector>() {
    for n in 1..=MAX_OPTIONS {
        let mut sel = S::with_knobs(n, &knobs());
        let costs: Vec<u64> = (0..n).map(|i| ((i * 7) % 5 + 1) as u64).collect();
        drive(&mut sel, &costs, 2_000);
        assert!(sel.best_option() < n);
    }
}

fn converges_to_cheapest<S: Selector>() {
    for n in 2..=MAX_OPTIONS {
        let mut sel = S::with_knobs(n, &knobs());
        drive(&mut sel, &falling_costs(n), 5_000);
        assert_eq!(sel.best_option(), n - 1, "{n} options");
    }
}

fn every_option_gets_measured<S: Selector>() {
    for n in 2..=MAX_OPTIONS {
        let mut sel = S::with_knobs(n, &knobs());
        // Cheapest first, so no policy ever leaves option 0
        let costs: Vec<u64> = (0..n).map(|i| i as u64 + 1).collect();
        let measured: BTreeSet<usize> = drive(&mut sel, &costs, 1_000)
            .into_iter()
            .filter(|d| d.armed)
            .map(|d| d.option)
            .collect();
        assert_eq!(measured, (0..n).collect(), "{n} options");
        assert_eq!(sel.best_option(), 0);
    }
}

fn single_option_is_stable<S: Selector>() {
    let mut sel = S::with_knobs(1, &knobs());
    let decisions = drive(&mut sel, &[5], 1_000);
    assert!(decisions.iter().all(|d| d.option == 0));
    assert_eq!(sel.best_option(), 0);
}

fn snapshot_agrees_with_selector<S: Selector>() {
    let mut sel = S::with_knobs(4, &knobs());
    drive(&mut sel, &falling_costs(4), 777);
    let snap = sel.snapshot();
    assert_eq!(snap.n_options, 4);
    assert_eq!(snap.best_option, sel.best_option());
    assert!(snap.current_option < 4);
    assert!(!snap.best_ticks.is_max());
    assert!(snap.sweeps > 0);
}

fn adapts_when_costs_shift<S: Selector>() {
    let mut sel = S::with_knobs(3, &knobs());
    drive(&mut sel, &[30, 10, 20], 3_000);
    assert_eq!(sel.best_option(), 1);

    drive(&mut sel, &[30, 10, 5], 20_000);
    assert_eq!(sel.best_option(), 2);
}

macro_rules! selector_suite {
    ($name:ident, $ty:ty) => {
        mod $name {
            use super::*;

            #[test]
            fn test_index_validity() {
                index_validity::<$ty>();
            }

            #[test]
            fn test_converges_to_cheapest() {
                converges_to_cheapest::<$ty>();
            }

            #[test]
            fn test_every_option_gets_measured() {
                every_option_gets_measured::<$ty>();
            }

            #[test]
            fn test_single_option_is_stable() {
                single_option_is_stable::<$ty>();
            }

            #[test]
            fn test_snapshot_agrees_with_selector() {
                snapshot_agrees_with_selector::<$ty>();
            }

            #[test]
            fn test_adapts_when_costs_shift() {
                adapts_when_costs_shift::<$ty>();
            }
        }
    };
}

selector_suite!(phase, PhaseSelector);
selector_suite!(eps_greedy, EpsGreedySelector);
selector_suite!(policy, PolicySelector);

#[test]
fn test_phase_sweep_measures_each_option_equally() {
    let knobs = SelectorKnobs::default();
    for n in 1..=MAX_OPTIONS {
        let mut sel = PhaseSelector::with_knobs(n, &knobs);
        let sweep = knobs.sweep_calls(n) as usize;
        let decisions = drive(&mut sel, &falling_costs(n), sweep);

        for option in 0..n {
            let measured = decisions
                .iter()
                .filter(|d| d.armed && d.option == option)
                .count();
            assert_eq!(measured, knobs.measure_calls as usize, "option {option} of {n}");
        }
    }
}
