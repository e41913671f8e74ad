use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

use crate::cache_config::CacheConfig;
use crate::canned_response_config::CannedResponseConfig;
use crate::circuit_breaker_config::CircuitBreakerConfig;
use crate::cors_config::CorsConfig;
use crate::dispatcher_config::DispatcherConfig;
use crate::logging_config::LoggingConfig;
use crate::metrics_config::MetricsConfig;
use crate::network_config::NetworkConfig;
use crate::request_coalescing_config::RequestCoalescingConfig;
use crate::request_queue_config::RequestQueueConfig;
use crate::server_config::ServerConfig;
use crate::upstream_health_checks_config::UpstreamHealthChecksConfig;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub upstream_health_checks: UpstreamHealthChecksConfig,

    #[serde(default)]
    pub circuit_breaker: CircuitBreakerConfig,

    #[serde(default)]
    pub request_queue: RequestQueueConfig,

    #[serde(default)]
    pub dispatcher: DispatcherConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub canned_responses: CannedResponseConfig,

    #[serde(default)]
    pub request_coalescing: RequestCoalescingConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,

    #[serde(default)]
    pub cors: CorsConfig,

    /// Network used for `POST /` when no `:network` segment is given. Defaults to
    /// the lexicographically smallest network key when unset, since the network
    /// map itself carries no ordering.
    #[serde(default)]
    pub default_network: Option<String>,

    pub networks: HashMap<String, NetworkConfig>,
}

impl Config {
    pub fn from_yaml_str(s: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let config: Config = serde_yaml::from_str(s).map_err(|e| format!("invalid yaml: {}", e))?;

        if config.networks.is_empty() {
            return Err("networks map cannot be empty".into());
        }

        Ok(config)
    }

    pub fn from_yaml_file(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn from_yaml_path_buf(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&contents)
    }

    pub fn network(&self, key: &str) -> Option<&NetworkConfig> {
        self.networks.get(key)
    }

    /// Resolves the key used for `POST /`.
    pub fn default_network_key(&self) -> Option<&str> {
        if let Some(key) = &self.default_network {
            return Some(key.as_str());
        }
        self.networks.keys().map(String::as_str).min()
    }
}


#[cfg(test)]
mod tests {
    use crate::config::test_helpers::{remove_env_var_with_retry, set_env_var_with_retry};

    use super::*;
    use std::time::Duration;

    #[test]
    fn test_default_server_config() {
        let config_str = r#"
networks:
  mainnet:
    primary:
      url: "http://example.com"
"#;
        let config = Config::from_yaml_str(config_str).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert!(config.canned_responses.enabled);
        assert!(config.canned_responses.methods.web3_client_version);
        assert!(config.canned_responses.methods.eth_chain_id);
    }

    #[test]
    fn test_parse_valid_config() {
        let config_str = r#"
server:
  host: "127.0.0.1"
  port: 8080

circuit_breaker:
  failure_threshold: 3
  recovery_timeout: "30s"

networks:
  mainnet:
    chain_id: 1
    primary:
      url: "http://example.com"
      timeout: "10s"
      max_retries: 2
"#;

        let config = Config::from_yaml_str(config_str).unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.circuit_breaker.failure_threshold, 3);
        assert_eq!(config.circuit_breaker.recovery_timeout, Duration::from_secs(30));

        let network = config.networks.get("mainnet").unwrap();
        assert_eq!(network.chain_id, Some(1));
        assert_eq!(network.primary.url.as_str(), "http://example.com/");
        assert_eq!(network.primary.timeout, Duration::from_secs(10));
        assert!(!network.has_fallback());
    }

    #[test]
    fn test_multiple_networks_with_fallback() {
        let config_str = r#"
networks:
  mainnet:
    primary:
      url: "http://primary.example.com"
    fallback:
      url: "http://archive.example.com"
  polygon:
    primary:
      url: "http://polygon.example.com"
"#;

        let config = Config::from_yaml_str(config_str).unwrap();

        assert_eq!(config.networks.len(), 2);

        let mainnet = config.networks.get("mainnet").unwrap();
        assert!(mainnet.has_fallback());
        assert_eq!(
            mainnet.fallback.as_ref().unwrap().url.as_str(),
            "http://archive.example.com/"
        );

        let polygon = config.networks.get("polygon").unwrap();
        assert!(!polygon.has_fallback());
    }

    #[test]
    fn test_empty_networks_map_rejected() {
        let config_str = r#"
server:
  host: "localhost"
  port: 8080

networks: {}
"#;

        let result = Config::from_yaml_str(config_str);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("networks map cannot be empty"));
    }

    #[test]
    fn test_missing_networks_map() {
        let config_str = r#"
server:
  host: "localhost"
  port: 8080
"#;

        let result = Config::from_yaml_str(config_str);
        assert!(result.is_err());
    }

    #[test]
    fn test_invalid_duration() {
        let config_str = r#"
circuit_breaker:
  recovery_timeout: "invalid duration"

networks:
  mainnet:
    primary:
      url: "http://example.com"
"#;

        let result = Config::from_yaml_str(config_str);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("invalid duration"));
    }

    #[test]
    fn test_invalid_port() {
        let config_str = r#"
server:
  port: 70000

networks:
  mainnet:
    primary:
      url: "http://example.com"
"#;

        let result = Config::from_yaml_str(config_str);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(
            err.to_string()
                .contains("invalid value: integer `70000`, expected u16")
        );
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let config_str = r#"
networks:
  mainnet:
    primary:
      url: "http://example.com"
      timeout: "0s"
"#;

        let result = Config::from_yaml_str(config_str);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(err.to_string().contains("timeout cannot be zero"));
    }

    #[test]
    fn test_env_var_url() {
        set_env_var_with_retry(
            "RPC_GATEWAY_CONFIG_TEST_URL",
            "https://eth-mainnet.g.alchemy.com/v2/test-key",
        )
        .unwrap();

        let config_str = r#"
networks:
  mainnet:
    primary:
      url: "$RPC_GATEWAY_CONFIG_TEST_URL"
"#;

        let config = Config::from_yaml_str(config_str).unwrap();
        let network = config.networks.get("mainnet").unwrap();
        assert_eq!(
            network.primary.url.as_str(),
            "https://eth-mainnet.g.alchemy.com/v2/test-key"
        );

        remove_env_var_with_retry("RPC_GATEWAY_CONFIG_TEST_URL").unwrap();
    }

    #[test]
    fn test_cache_config_default() {
        let config_str = r#"
networks:
  mainnet:
    primary:
      url: "http://example.com"
"#;
        let config = Config::from_yaml_str(config_str).unwrap();
        assert!(matches!(config.cache, CacheConfig::Disabled));
    }

    #[test]
    fn test_cache_config_local_with_max_age() {
        let config_str = r#"
cache:
  type: "local"
  capacity: 5000
  max_age: "10s"

networks:
  mainnet:
    primary:
      url: "http://example.com"
"#;

        let config = Config::from_yaml_str(config_str).unwrap();
        assert!(matches!(config.cache, CacheConfig::Local(_)));
        assert_eq!(config.cache.max_age(), Some(Duration::from_secs(10)));
    }

    #[test]
    fn test_upstream_health_checks_default() {
        let config_str = r#"
networks:
  mainnet:
    primary:
      url: "http://example.com"
"#;
        let config = Config::from_yaml_str(config_str).unwrap();
        assert!(config.upstream_health_checks.enabled);
        assert_eq!(
            config.upstream_health_checks.interval,
            Duration::from_secs(300)
        );
    }

    #[test]
    fn test_canned_responses_partial_methods() {
        let config_str = r#"
canned_responses:
  enabled: true
  methods:
    web3_client_version: false

networks:
  mainnet:
    primary:
      url: "http://example.com"
"#;

        let config = Config::from_yaml_str(config_str).unwrap();
        assert!(config.canned_responses.enabled);
        assert!(!config.canned_responses.methods.web3_client_version);
        assert!(config.canned_responses.methods.eth_chain_id);
    }

    #[test]
    fn test_request_coalescing_default() {
        let config_str = r#"
networks:
  mainnet:
    primary:
      url: "http://example.com"
"#;
        let config = Config::from_yaml_str(config_str).unwrap();
        assert!(config.request_coalescing.enabled);
    }

    #[test]
    fn test_metrics_config_default() {
        let config_str = r#"
networks:
  mainnet:
    primary:
      url: "http://example.com"
"#;
        let config = Config::from_yaml_str(config_str).unwrap();
        assert!(config.metrics.enabled);
        assert_eq!(config.metrics.port, 8082);
        assert_eq!(config.metrics.host_bytes(), Ok([127, 0, 0, 1]));
    }

    #[test]
    fn test_dispatcher_config_default() {
        let config_str = r#"
networks:
  mainnet:
    primary:
      url: "http://example.com"
"#;
        let config = Config::from_yaml_str(config_str).unwrap();
        assert_eq!(config.dispatcher.batch_concurrency_limit, 10);
    }

    #[test]
    fn test_invalid_yaml() {
        let config_str = r#"
invalid_yaml: [
"#;

        let result = Config::from_yaml_str(config_str);
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("invalid yaml"));
    }
}
