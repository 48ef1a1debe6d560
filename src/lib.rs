//! # veer-rs
//!
//! **Pick the fastest of several equivalent implementations, at runtime**
//!
//! An adaptive dispatcher: you hand it a small fixed set of interchangeable
//! callables (say, three sort routines) and call it in a loop. It times a few
//! calls of each, settles on the fastest, and re-checks its choice less and
//! less often while the same candidate keeps winning.
//!
//! ## Features
//!
//! - **Static Dispatch**: Candidates are a tuple or array; each call is a `match` on the chosen index
//! - **Cheap Steady State**: Untimed calls cost one decrement and one comparison on top of the candidate
//! - **Cycle Timing**: `rdtsc` on x86_64, `cntvct_el0` on aarch64, `Instant` elsewhere
//! - **Two Policies**: Sweep/exploit with doubling windows (default), or epsilon-greedy probing
//! - **Flexible Configuration**: Configure via files (TOML/YAML/JSON), environment variables, or code
//! - **CLI Integration**: Built-in clap support for command-line overrides
//! - **Observability**: `tracing` events on decisions, Prometheus metrics from snapshots
//!
//! ## Quick Start
//!
//! ```ignore
//! use veer_rs::AdaptiveDispatcher;
//!
//! let mut sort = AdaptiveDispatcher::new((
//!     |v: &mut Vec<u64>| v.sort_unstable(),
//!     |v: &mut Vec<u64>| v.sort(),
//!     |v: &mut Vec<u64>| v.sort_unstable_by(|a, b| a.cmp(b)),
//! ));
//!
//! for batch in &mut batches {
//!     sort.call(batch);
//! }
//! println!("fastest sort: {}", sort.best_option());
//! ```
//!
//! Candidates taking several arguments take a tuple, and return values flow
//! back from `call`:
//!
//! ```ignore
//! let mut find = AdaptiveDispatcher::new((
//!     |(hay, needle): (&[u32], u32)| hay.iter().position(|&x| x == needle),
//!     |(hay, needle): (&[u32], u32)| hay.binary_search(&needle).ok(),
//! ));
//! let idx = find.call((&haystack, 42));
//! ```
//!
//! ## Threads
//!
//! A dispatcher takes `&mut self` and holds no locks. Give each thread its
//! own dispatcher; they learn independently.
//!
//! ## Configuration
//!
//! Configuration sources are merged in order (later sources override earlier):
//!
//! 1. Default values
//! 2. Config files (via `.file()`)
//! 3. Environment variables (via `.env_prefix()`)
//! 4. Programmatic overrides and CLI arguments (via `.with_cli_args()`)
//!
//! ### Config File Example (TOML)
//!
//! ```toml
//! name = "sort"
//! policy = "phase"
//!
//! [knobs]
//! warmup_calls = 4
//! measure_calls = 4
//! exploit_calls = 128
//! max_streak = 10
//!
//! [calibration]
//! enabled = true
//! ```
//!
//! ### Environment Variables
//!
//! With `.env_prefix("VEER")`:
//! - `VEER_NAME=sort`
//! - `VEER_POLICY=epsilon_greedy`
//! - `VEER_KNOBS__EXPLOIT_CALLS=256`
//! - `VEER_CALIBRATION__ENABLED=true`
//!
//! ### CLI Arguments
//!
//! ```ignore
//! use clap::Parser;
//! use veer_rs::{DispatchArgs, DispatchBuilder};
//!
//! #[derive(Parser)]
//! struct MyArgs {
//!     #[command(flatten)]
//!     veer: DispatchArgs,
//! }
//!
//! let args = MyArgs::parse();
//! let sort = DispatchBuilder::new()
//!     .file("veer.toml")
//!     .env_prefix("VEER")
//!     .with_cli_args(&args.veer)
//!     .build(candidates)?;
//! ```
//!
//! ## Testing
//!
//! [`ManualClock`] makes a dispatcher deterministic: candidates advance the
//! clock by a fixed cost and the test asserts on the decisions taken.

pub mod builder;
pub mod calibration;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod measure;
pub mod metrics;
pub mod selector;
pub mod switch;

pub use builder::{DispatchArgs, DispatchBuilder};
pub use calibration::{calibrate, CalibrationConfig, CalibrationResult};
pub use clock::{Clock, CycleClock, ManualClock, MonotonicClock};
pub use config::DispatchConfig;
pub use dispatch::AdaptiveDispatcher;
pub use error::{DispatchError, Result};
pub use measure::Measurement;
pub use metrics::{DispatchMetrics, MetricsObserver};
pub use selector::{
    Decision, EpsGreedySelector, Phase, PhaseSelector, Policy, PolicySelector, Selector,
    SelectorKnobs, SelectorSnapshot, Ticks, MAX_OPTIONS,
};
pub use switch::{Arity, Candidates};
