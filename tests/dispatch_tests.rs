//! Integration tests for dispatchers built through the public API.

use prometheus::Registry;
use veer_rs::{
    AdaptiveDispatcher, DispatchArgs, DispatchBuilder, DispatchMetrics, ManualClock, Phase,
    PhaseSelector, Policy, Selector, SelectorKnobs,
};

/// Install a subscriber that prints every level, so all log statements run.
fn verbose_logging() -> tracing::subscriber::DefaultGuard {
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .finish();
    tracing::subscriber::set_default(subscriber)
}

#[test]
fn test_sorts_stay_correct_whatever_is_chosen() {
    let mut sort = AdaptiveDispatcher::new((
        |v: &mut Vec<i32>| {
            if !v.is_sorted() {
                v.sort_unstable();
            }
        },
        |v: &mut Vec<i32>| v.sort(),
        |v: &mut Vec<i32>| v.sort_unstable(),
    ));

    let mut v = Vec::new();
    for round in 0..2_000 {
        v.clear();
        if round % 2 == 0 {
            v.extend(0..64);
        } else {
            v.extend((0..64).rev());
        }
        sort.call(&mut v);
        assert!(v.is_sorted(), "round {round}");
    }
    assert!(sort.snapshot().sweeps > 0);
}

#[test]
fn test_end_to_end_with_logging() {
    let _guard = verbose_logging();

    let clock = ManualClock::new();
    let (c0, c1, c2) = (clock.clone(), clock.clone(), clock.clone());
    let mut d = AdaptiveDispatcher::with_clock(
        (
            move |()| c0.advance(30),
            move |()| c1.advance(10),
            move |()| c2.advance(20),
        ),
        clock.clone(),
    );

    for _ in 0..24 + 128 {
        d.call(());
    }
    assert_eq!(d.best_option(), 1);
    assert_eq!(d.selector().phase(), Phase::Exploit);
    assert_eq!(d.selector().phase_left(), 0);

    d.call(());
    assert_eq!(d.selector().phase(), Phase::Warmup);
    assert_eq!(d.snapshot().current_option, 0);
}

#[test]
fn test_builder_to_metrics() {
    let _guard = verbose_logging();
    let registry = Registry::new();

    let config = DispatchBuilder::new()
        .name("int-test")
        .exploit_calls(16)
        .prometheus_registry(registry.clone())
        .extract()
        .unwrap();
    let metrics = config.metrics().unwrap();

    let clock = ManualClock::new();
    let (c0, c1) = (clock.clone(), clock.clone());
    let mut d = AdaptiveDispatcher::with_selector_and_clock(
        (move |x: u64| {
            c0.advance(50);
            x
        }, move |x: u64| {
            c1.advance(5);
            x
        }),
        config.selector(2),
        clock,
    );
    for i in 0..500 {
        assert_eq!(d.call(i), i);
    }
    metrics.observer().observe(&d.snapshot());

    assert_eq!(metrics.best_option.get(), 1);
    assert_eq!(metrics.best_ticks.get(), 20);
    let families = registry.gather();
    let sweeps = families
        .iter()
        .find(|f| f.get_name() == "int_test_sweeps")
        .expect("sweeps metric registered");
    assert!(sweeps.get_metric()[0].get_counter().get_value() >= 2.0);
}

#[test]
fn test_cli_policy_reaches_dispatcher() {
    let args = DispatchArgs {
        veer_policy: Some(Policy::EpsilonGreedy),
        veer_explore_interval: Some(10),
        ..Default::default()
    };
    let candidates: [fn(u8) -> u8; 2] = [|x| x, |x| x.wrapping_add(1)];
    let d = DispatchBuilder::new()
        .with_cli_args(&args)
        .build(candidates)
        .unwrap();
    assert_eq!(d.selector().policy(), Policy::EpsilonGreedy);
    assert_eq!(d.snapshot().exploit_window, 10);
}

#[test]
fn test_per_thread_dispatchers() {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(3)
        .build()
        .unwrap();
    let knobs = SelectorKnobs::default().with_exploit_calls(8);

    let winners = pool.broadcast(|ctx| {
        let clock = ManualClock::new();
        // Each thread sees a different cheapest candidate
        let cheap = ctx.index();
        let costs: [u64; 3] = std::array::from_fn(|i| if i == cheap { 1 } else { 9 });
        let candidates = costs.map(|cost| {
            let clock = clock.clone();
            move |()| clock.advance(cost)
        });
        let mut d = AdaptiveDispatcher::with_selector_and_clock(
            candidates,
            PhaseSelector::with_knobs(3, &knobs),
            clock,
        );
        for _ in 0..200 {
            d.call(());
        }
        (cheap, d.best_option())
    });

    for (cheap, best) in winners {
        assert_eq!(cheap, best);
    }
}

#[test]
fn test_shared_metrics_sum_sweeps_over_threads() {
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(3)
        .build()
        .unwrap();
    let metrics = DispatchMetrics::with_prefix("shared").unwrap();
    let knobs = SelectorKnobs::default().with_exploit_calls(8);

    let per_thread = pool.broadcast(|ctx| {
        let clock = ManualClock::new();
        let mut observer = metrics.observer();
        let (c0, c1) = (clock.clone(), clock.clone());
        let mut d = AdaptiveDispatcher::with_selector_and_clock(
            (move |()| c0.advance(3), move |()| c1.advance(7)),
            PhaseSelector::with_knobs(2, &knobs),
            clock,
        );
        // Uneven call counts per thread
        for _ in 0..100 * (ctx.index() + 1) {
            d.call(());
            observer.observe(&d.snapshot());
        }
        d.snapshot().sweeps
    });

    let total: u64 = per_thread.iter().sum();
    assert!(total > *per_thread.iter().max().unwrap());
    assert_eq!(metrics.sweeps.get(), total);
    assert_eq!(metrics.observations.get(), 600);
}
