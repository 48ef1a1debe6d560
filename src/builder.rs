//! Builder pattern for constructing dispatchers from layered configuration.
//!
//! The builder supports multiple configuration sources using figment:
//! - Default values
//! - Config files (TOML, YAML, JSON)
//! - Environment variables
//! - Programmatic overrides
//! - CLI arguments via clap

use std::path::Path;

use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use figment::Figment;
use prometheus::Registry;
use tracing::info;

use crate::calibration::{calibrate, CalibrationConfig};
use crate::clock::CycleClock;
use crate::config::DispatchConfig;
use crate::dispatch::AdaptiveDispatcher;
use crate::error::Result;
use crate::selector::{Policy, PolicySelector, Selector, SelectorKnobs};
use crate::switch::Arity;

/// Builder for constructing an [`AdaptiveDispatcher`].
///
/// Configuration sources are merged in the following order (later sources override earlier):
/// 1. Default values
/// 2. Config files (in order added)
/// 3. Environment variables
/// 4. Programmatic overrides and CLI arguments (in call order)
///
/// # Examples
///
/// ```ignore
/// use veer_rs::DispatchBuilder;
///
/// let mut sort = DispatchBuilder::new()
///     .file("veer.toml")
///     .env_prefix("VEER")
///     .name("sort")
///     .exploit_calls(256)
///     .build((
///         |v: &mut Vec<u32>| v.sort_unstable(),
///         |v: &mut Vec<u32>| v.sort(),
///     ))?;
/// ```
pub struct DispatchBuilder {
    figment: Figment,
    prometheus_registry: Option<Registry>,
}

impl Default for DispatchBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for DispatchBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatchBuilder")
            .field("figment", &self.figment)
            .field(
                "prometheus_registry",
                &self.prometheus_registry.as_ref().map(|_| "<Registry>"),
            )
            .finish()
    }
}

impl DispatchBuilder {
    /// Create a new builder with default configuration.
    pub fn new() -> Self {
        Self {
            figment: Figment::from(Serialized::defaults(DispatchConfig::default())),
            prometheus_registry: None,
        }
    }

    /// Add a configuration file.
    ///
    /// Supports TOML, YAML, and JSON formats (detected by extension, TOML
    /// otherwise). Files are merged in the order they are added; a missing
    /// file contributes nothing.
    ///
    /// ```ignore
    /// let builder = DispatchBuilder::new()
    ///     .file("veer.toml")
    ///     .file("veer.local.toml"); // Overrides values from veer.toml
    /// ```
    pub fn file<P: AsRef<Path>>(mut self, path: P) -> Self {
        let path = path.as_ref();
        let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");

        self.figment = match extension.to_lowercase().as_str() {
            "yaml" | "yml" => self.figment.merge(Yaml::file(path)),
            "json" => self.figment.merge(Json::file(path)),
            _ => self.figment.merge(Toml::file(path)),
        };
        self
    }

    /// Add environment variables with a prefix.
    ///
    /// Top-level keys read `{PREFIX}_{KEY}` (`VEER_NAME`, `VEER_POLICY`).
    /// Nested keys use a double underscore: `VEER_KNOBS__EXPLOIT_CALLS`,
    /// `VEER_CALIBRATION__ENABLED`.
    pub fn env_prefix(mut self, prefix: &str) -> Self {
        let prefix = format!("{}_", prefix.trim_end_matches('_'));
        self.figment = self.figment.merge(Env::prefixed(&prefix).split("__"));
        self
    }

    /// Set the dispatcher name, used as metric prefix and log label.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.figment = self.figment.merge(Serialized::default("name", name.into()));
        self
    }

    /// Set the selector policy.
    pub fn policy(mut self, policy: Policy) -> Self {
        self.figment = self.figment.merge(Serialized::default("policy", policy));
        self
    }

    /// Replace all selector knobs.
    ///
    /// ```ignore
    /// let sort = DispatchBuilder::new()
    ///     .knobs(SelectorKnobs::default().with_measure_calls(8))
    ///     .build(candidates)?;
    /// ```
    pub fn knobs(mut self, knobs: SelectorKnobs) -> Self {
        self.figment = self.figment.merge(Serialized::default("knobs", knobs));
        self
    }

    pub fn warmup_calls(self, n: u32) -> Self {
        self.knob("warmup_calls", n)
    }

    pub fn measure_calls(self, n: u32) -> Self {
        self.knob("measure_calls", n)
    }

    pub fn exploit_calls(self, n: u32) -> Self {
        self.knob("exploit_calls", n)
    }

    pub fn max_streak(self, n: u32) -> Self {
        self.knob("max_streak", n)
    }

    pub fn explore_interval(self, n: u32) -> Self {
        self.knob("explore_interval", n)
    }

    fn knob(mut self, key: &str, value: u32) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default(&format!("knobs.{key}"), value));
        self
    }

    /// Enable clock calibration while building.
    ///
    /// Default: disabled (for fast unit test startup).
    pub fn calibrate(mut self, enabled: bool) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("calibration.enabled", enabled));
        self
    }

    /// Set calibration configuration.
    ///
    /// ```ignore
    /// let config = DispatchBuilder::new()
    ///     .calibration_config(CalibrationConfig::new().enabled().sample_count(500))
    ///     .extract()?;
    /// ```
    pub fn calibration_config(mut self, config: CalibrationConfig) -> Self {
        self.figment = self
            .figment
            .merge(Serialized::default("calibration", config));
        self
    }

    /// Provide an external Prometheus registry.
    ///
    /// [`DispatchConfig::metrics`] registers its metrics with it.
    pub fn prometheus_registry(mut self, registry: Registry) -> Self {
        self.prometheus_registry = Some(registry);
        self
    }

    /// Apply CLI argument overrides.
    ///
    /// This method applies any non-None values from the `DispatchArgs` struct.
    pub fn with_cli_args(mut self, args: &DispatchArgs) -> Self {
        if let Some(ref name) = args.veer_name {
            self = self.name(name.clone());
        }
        if let Some(policy) = args.veer_policy {
            self = self.policy(policy);
        }
        if let Some(n) = args.veer_warmup_calls {
            self = self.warmup_calls(n);
        }
        if let Some(n) = args.veer_measure_calls {
            self = self.measure_calls(n);
        }
        if let Some(n) = args.veer_exploit_calls {
            self = self.exploit_calls(n);
        }
        if let Some(n) = args.veer_max_streak {
            self = self.max_streak(n);
        }
        if let Some(n) = args.veer_explore_interval {
            self = self.explore_interval(n);
        }
        if args.veer_calibrate {
            self = self.calibrate(true);
        }
        self
    }

    /// Extract and validate the merged configuration.
    ///
    /// Runs calibration on the cycle clock if it is enabled and stores the
    /// result in [`DispatchConfig::calibration_result`].
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration extraction fails
    /// - The knobs fail [`SelectorKnobs::validate`]
    pub fn extract(self) -> Result<DispatchConfig> {
        let mut config: DispatchConfig = self.figment.extract().map_err(Box::new)?;
        config.knobs.validate()?;
        config.prometheus_registry = self.prometheus_registry;

        info!(
            name = %config.name,
            policy = %config.policy,
            warmup_calls = config.knobs.warmup_calls,
            measure_calls = config.knobs.measure_calls,
            exploit_calls = config.knobs.exploit_calls,
            max_streak = config.knobs.max_streak,
            explore_interval = config.knobs.explore_interval,
            "dispatch configuration loaded"
        );

        if config.calibration_enabled() {
            let calibration = config.calibration.clone().unwrap_or_default();
            let clock = CycleClock::new();
            let result = calibrate(&clock, &calibration);
            info!(
                name = %config.name,
                clock = clock.name(),
                read_overhead_p50 = result.read_overhead_p50,
                read_overhead_p99 = result.read_overhead_p99,
                ticks_per_ns = result.ticks_per_ns,
                "clock calibrated"
            );
            config.calibration_result = Some(result);
        }

        Ok(config)
    }

    /// Build a dispatcher whose policy comes from configuration.
    pub fn build<C: Arity>(self, candidates: C) -> Result<AdaptiveDispatcher<C, PolicySelector>> {
        let config = self.extract()?;
        let selector = config.selector(C::LEN);
        info!(name = %config.name, policy = %config.policy, n_options = C::LEN, "dispatcher built");
        Ok(AdaptiveDispatcher::with_selector(candidates, selector))
    }

    /// Build a dispatcher with a statically chosen selector type.
    ///
    /// The configured `policy` is ignored; knobs still apply.
    pub fn build_with<S: Selector, C: Arity>(self, candidates: C) -> Result<AdaptiveDispatcher<C, S>> {
        let config = self.extract()?;
        let selector = S::with_knobs(C::LEN, &config.knobs);
        info!(
            name = %config.name,
            policy = selector.snapshot().policy,
            n_options = C::LEN,
            "dispatcher built"
        );
        Ok(AdaptiveDispatcher::with_selector(candidates, selector))
    }
}

/// CLI arguments for dispatcher configuration.
///
/// Use with clap's `Parser` derive macro. These arguments can be applied
/// to a `DispatchBuilder` using `with_cli_args`.
///
/// # Examples
///
/// ```ignore
/// use clap::Parser;
/// use veer_rs::{DispatchArgs, DispatchBuilder};
///
/// #[derive(Parser)]
/// struct MyArgs {
///     #[command(flatten)]
///     veer: DispatchArgs,
///     // ... other args
/// }
///
/// let args = MyArgs::parse();
/// let config = DispatchBuilder::new().with_cli_args(&args.veer).extract()?;
/// ```
#[derive(Debug, Default, Clone, clap::Args)]
pub struct DispatchArgs {
    /// Dispatcher name (metric prefix)
    #[arg(long)]
    pub veer_name: Option<String>,

    /// Selector policy
    #[arg(long, value_enum)]
    pub veer_policy: Option<Policy>,

    /// Untimed warmup calls per candidate per sweep
    #[arg(long)]
    pub veer_warmup_calls: Option<u32>,

    /// Timed calls per candidate per sweep
    #[arg(long)]
    pub veer_measure_calls: Option<u32>,

    /// Base exploit window in calls
    #[arg(long)]
    pub veer_exploit_calls: Option<u32>,

    /// Cap on the winning streak
    #[arg(long)]
    pub veer_max_streak: Option<u32>,

    /// Calls between epsilon-greedy probes
    #[arg(long)]
    pub veer_explore_interval: Option<u32>,

    /// Calibrate the cycle clock at startup
    #[arg(long)]
    pub veer_calibrate: bool,
}
