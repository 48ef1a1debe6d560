//! Configuration types for veer-rs dispatchers.

use prometheus::Registry;
use serde::{Deserialize, Serialize};

use crate::calibration::{CalibrationConfig, CalibrationResult};
use crate::error::Result;
use crate::metrics::DispatchMetrics;
use crate::selector::{Policy, PolicySelector, SelectorKnobs};

/// Configuration for one dispatcher (or one family of per-thread dispatchers).
///
/// This struct can be deserialized from TOML, YAML, JSON, or environment variables
/// using figment.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DispatchConfig {
    /// Name used as metric prefix and log label (default: "veer")
    #[serde(default = "default_name")]
    pub name: String,

    /// Selector policy (default: phase)
    #[serde(default)]
    pub policy: Policy,

    /// Selector knobs. Missing fields take their defaults.
    #[serde(default)]
    pub knobs: SelectorKnobs,

    /// Calibration configuration.
    /// If None or disabled, calibration is skipped.
    #[serde(default)]
    pub calibration: Option<CalibrationConfig>,

    /// Result of calibration, filled in by the builder when it ran.
    #[serde(skip)]
    pub calibration_result: Option<CalibrationResult>,

    /// Prometheus registry for metrics exposition.
    /// Not serializable - must be set programmatically.
    #[serde(skip)]
    pub prometheus_registry: Option<Registry>,
}

fn default_name() -> String {
    "veer".to_string()
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            policy: Policy::default(),
            knobs: SelectorKnobs::default(),
            calibration: None,
            calibration_result: None,
            prometheus_registry: None,
        }
    }
}

impl DispatchConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the builder should run calibration.
    pub fn calibration_enabled(&self) -> bool {
        self.calibration.as_ref().is_some_and(|c| c.enabled)
    }

    /// A fresh selector of the configured policy for `n_options` candidates.
    ///
    /// Call once per dispatcher; selectors are never shared.
    pub fn selector(&self, n_options: usize) -> PolicySelector {
        PolicySelector::new(self.policy, n_options, &self.knobs)
    }

    /// Metrics named after this configuration, registered with the configured
    /// registry if there is one.
    pub fn metrics(&self) -> Result<DispatchMetrics> {
        let metrics = DispatchMetrics::with_prefix(&self.name)?;
        if let Some(ref registry) = self.prometheus_registry {
            metrics.register(registry)?;
        }
        Ok(metrics)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::Selector;

    #[test]
    fn test_default_config() {
        let config = DispatchConfig::default();
        assert_eq!(config.name, "veer");
        assert_eq!(config.policy, Policy::Phase);
        assert_eq!(config.knobs, SelectorKnobs::default());
        assert!(config.calibration.is_none());
        assert!(!config.calibration_enabled());
    }

    #[test]
    fn test_deserialize_config() {
        let toml = r#"
            name = "sort"
            policy = "epsilon_greedy"

            [knobs]
            warmup_calls = 2
            explore_interval = 50

            [calibration]
            enabled = true
            sample_count = 10
        "#;

        let config: DispatchConfig = toml::from_str(toml).unwrap();
        assert_eq!(config.name, "sort");
        assert_eq!(config.policy, Policy::EpsilonGreedy);
        assert_eq!(config.knobs.warmup_calls, 2);
        assert_eq!(config.knobs.measure_calls, 4);
        assert_eq!(config.knobs.explore_interval, 50);
        assert!(config.calibration_enabled());
        assert_eq!(config.calibration.unwrap().sample_count, 10);
    }

    #[test]
    fn test_selector_follows_policy() {
        let mut config = DispatchConfig::default();
        assert_eq!(config.selector(3).snapshot().policy, "phase");

        config.policy = Policy::EpsilonGreedy;
        let sel = config.selector(3);
        assert_eq!(sel.policy(), Policy::EpsilonGreedy);
        assert_eq!(sel.n_options(), 3);
    }

    #[test]
    fn test_metrics_registered_with_config_registry() {
        let registry = Registry::new();
        let config = DispatchConfig {
            name: "sort".to_string(),
            prometheus_registry: Some(registry.clone()),
            ..Default::default()
        };

        let metrics = config.metrics().unwrap();
        metrics.observations.inc();
        assert!(registry
            .gather()
            .iter()
            .any(|f| f.get_name() == "sort_observations"));
    }

    #[test]
    fn test_metrics_without_registry() {
        let metrics = DispatchConfig::default().metrics().unwrap();
        assert_eq!(metrics.sweeps.get(), 0);
    }
}
