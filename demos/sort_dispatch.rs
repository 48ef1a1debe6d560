//! Sort Dispatch Example
//!
//! Three interchangeable sorts behind one adaptive dispatcher per worker
//! thread. Each phase of the run feeds a different input shape, so the
//! fastest sort can change mid-run:
//!
//! - Sorted input: the checked sort only scans
//! - Reversed input: the checked sort scans and then sorts anyway
//! - Nearly sorted input: a few displaced elements
//!
//! Run: cargo run --example sort_dispatch --release -- --veer-policy phase
//!
//! Set `RUST_LOG=veer_rs=debug` to watch sweeps complete.

use clap::Parser;
use prometheus::{Encoder, Registry, TextEncoder};
use rand::Rng;
use tracing_subscriber::EnvFilter;
use veer_rs::{
    AdaptiveDispatcher, DispatchArgs, DispatchBuilder, DispatchConfig, DispatchMetrics,
    SelectorSnapshot,
};

#[derive(Parser, Debug)]
#[command(about = "Adaptive sort selection across input shapes")]
struct Cli {
    /// Optional config file (TOML, YAML or JSON)
    #[arg(long)]
    config: Option<std::path::PathBuf>,

    /// Worker threads, each with its own dispatcher
    #[arg(long, default_value_t = 4)]
    threads: usize,

    /// Sorts per shape per thread
    #[arg(long, default_value_t = 5_000)]
    batches: usize,

    /// Input length
    #[arg(long, default_value_t = 1_000)]
    len: usize,

    #[command(flatten)]
    veer: DispatchArgs,
}

#[derive(Clone, Copy, Debug)]
enum Shape {
    Sorted,
    Reversed,
    NearlySorted,
}

impl Shape {
    const ALL: [Shape; 3] = [Shape::Sorted, Shape::Reversed, Shape::NearlySorted];

    fn fill(self, v: &mut Vec<i32>, len: usize, rng: &mut impl Rng) {
        v.clear();
        v.extend(0..len as i32);
        match self {
            Shape::Sorted => {}
            Shape::Reversed => v.reverse(),
            Shape::NearlySorted => {
                // A handful of displaced elements
                for _ in 0..(len / 100).max(1) {
                    let a = rng.gen_range(0..len);
                    let b = rng.gen_range(0..len);
                    v.swap(a, b);
                }
            }
        }
    }
}

const SORT_NAMES: [&str; 3] = ["checked_unstable", "stable", "unstable"];

fn checked_unstable(v: &mut Vec<i32>) {
    if !v.is_sorted() {
        v.sort_unstable();
    }
}

/// Runs every shape on one worker and reports the winner per shape.
fn run_worker(
    config: &DispatchConfig,
    cli: &Cli,
    metrics: &DispatchMetrics,
) -> Vec<(Shape, SelectorSnapshot)> {
    let mut sort = AdaptiveDispatcher::with_selector(
        (
            |v: &mut Vec<i32>| checked_unstable(v),
            |v: &mut Vec<i32>| v.sort(),
            |v: &mut Vec<i32>| v.sort_unstable(),
        ),
        config.selector(3),
    );

    let mut observer = metrics.observer();
    let mut rng = rand::thread_rng();
    let mut v = Vec::with_capacity(cli.len);
    let mut results = Vec::new();
    for shape in Shape::ALL {
        for _ in 0..cli.batches {
            shape.fill(&mut v, cli.len, &mut rng);
            sort.call(&mut v);
            debug_assert!(v.is_sorted());
        }
        let snapshot = sort.snapshot();
        observer.observe(&snapshot);
        results.push((shape, snapshot));
    }
    results
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let registry = Registry::new();
    let mut builder = DispatchBuilder::new().name("sort");
    if let Some(ref path) = cli.config {
        builder = builder.file(path);
    }
    let config = builder
        .env_prefix("VEER")
        .with_cli_args(&cli.veer)
        .prometheus_registry(registry.clone())
        .extract()?;
    let metrics = config.metrics()?;

    println!("=== Sort Dispatch Example ===\n");
    println!(
        "policy: {}, {} threads, {} sorts of {} elements per shape\n",
        config.policy, cli.threads, cli.batches, cli.len
    );
    if let Some(ref calibration) = config.calibration_result {
        println!(
            "clock: {:.1} ticks/ns, read overhead p50 {:.0} ticks\n",
            calibration.ticks_per_ns, calibration.read_overhead_p50
        );
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(cli.threads)
        .thread_name(|i| format!("sort-{i:02}"))
        .build()?;
    let per_thread = pool.broadcast(|_| run_worker(&config, &cli, &metrics));

    let ticks_per_ns = config
        .calibration_result
        .as_ref()
        .map_or(0.0, |c| c.ticks_per_ns);
    for (thread, results) in per_thread.iter().enumerate() {
        for (shape, snapshot) in results {
            let cost = if ticks_per_ns > 0.0 {
                format!("{:.0} ns", snapshot.best_ticks.as_nanos(ticks_per_ns))
            } else {
                snapshot.best_ticks.to_string()
            };
            println!(
                "thread {thread}: {shape:?} -> {} ({cost} per measure window, {} sweeps so far)",
                SORT_NAMES[snapshot.best_option], snapshot.sweeps
            );
        }
    }

    let mut buffer = Vec::new();
    TextEncoder::new().encode(&registry.gather(), &mut buffer)?;
    println!("\n--- metrics ---\n{}", String::from_utf8(buffer)?);

    Ok(())
}
