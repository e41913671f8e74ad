use std::time::Duration;

use duration_str::deserialize_duration;
use serde::{Deserialize, Serialize};

/// Per-network circuit breaker thresholds. One breaker instance is kept per network,
/// tracking the primary and fallback upstreams independently.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(
        default = "default_recovery_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub recovery_timeout: Duration,
    #[serde(
        default = "default_monitoring_period",
        deserialize_with = "deserialize_duration"
    )]
    pub monitoring_period: Duration,
}

fn default_failure_threshold() -> u32 {
    5
}

fn default_recovery_timeout() -> Duration {
    Duration::from_secs(60)
}

fn default_monitoring_period() -> Duration {
    Duration::from_secs(300)
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            recovery_timeout: default_recovery_timeout(),
            monitoring_period: default_monitoring_period(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = CircuitBreakerConfig::default();
        assert_eq!(config.failure_threshold, 5);
        assert_eq!(config.recovery_timeout, Duration::from_secs(60));
        assert_eq!(config.monitoring_period, Duration::from_secs(300));
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let yaml = "failure_threshold: 3\n";
        let config: CircuitBreakerConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.failure_threshold, 3);
        assert_eq!(config.recovery_timeout, default_recovery_timeout());
    }
}
