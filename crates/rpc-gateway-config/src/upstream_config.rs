use std::time::Duration;

use duration_str::deserialize_duration;
use serde::{Deserialize, Serialize};
use url::Url;

/// Which slot an upstream fills for a network: primary is tried first, fallback
/// ("archive") only after the primary fails or the archive-fallback predicate fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpstreamRole {
    Primary,
    Fallback,
}

impl UpstreamRole {
    pub fn as_metric_label(self) -> &'static str {
        match self {
            UpstreamRole::Primary => "primary",
            UpstreamRole::Fallback => "fallback",
        }
    }

    /// Used only to distinguish primary from fallback in metrics, per the descriptor's `priority`.
    pub fn priority(self) -> u8 {
        match self {
            UpstreamRole::Primary => 0,
            UpstreamRole::Fallback => 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    #[serde(with = "url_serde")]
    pub url: Url,
    #[serde(default = "default_timeout", deserialize_with = "validate_timeout")]
    pub timeout: Duration,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(
        default = "default_retry_delay",
        deserialize_with = "deserialize_duration"
    )]
    pub retry_delay: Duration,
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}

fn default_max_retries() -> u32 {
    2
}

fn default_retry_delay() -> Duration {
    Duration::from_millis(250)
}

fn validate_timeout<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let duration = deserialize_duration(deserializer)?;
    if duration.is_zero() {
        return Err(serde::de::Error::custom("timeout cannot be zero"));
    }
    Ok(duration)
}

pub trait UrlProcessor {
    fn process_url(&self, url_str: &str) -> Result<String, String>;
}

#[derive(Debug, Clone)]
pub struct EnvVarUrlProcessor;

impl UrlProcessor for EnvVarUrlProcessor {
    fn process_url(&self, url_str: &str) -> Result<String, String> {
        if let Some(var_name) = url_str.strip_prefix('$') {
            std::env::var(var_name)
                .map_err(|e| format!("Environment variable '{}' not found: {}", var_name, e))
        } else {
            Ok(url_str.to_string())
        }
    }
}

mod url_serde {
    use super::*;
    use serde::{Deserializer, Serializer};
    use std::str::FromStr;

    pub fn serialize<S>(url: &Url, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(url.as_str())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Url, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let processed = EnvVarUrlProcessor
            .process_url(&s)
            .map_err(serde::de::Error::custom)?;
        Url::from_str(&processed).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_var_url_is_substituted() {
        unsafe {
            std::env::set_var("RPC_GATEWAY_TEST_UPSTREAM_URL", "https://example.test/rpc");
        }
        let yaml = "url: \"$RPC_GATEWAY_TEST_UPSTREAM_URL\"\n";
        let config: UpstreamConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.url.as_str(), "https://example.test/rpc");
        unsafe {
            std::env::remove_var("RPC_GATEWAY_TEST_UPSTREAM_URL");
        }
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let yaml = "url: \"https://example.test/rpc\"\ntimeout: \"0s\"\n";
        let result: Result<UpstreamConfig, _> = serde_yaml::from_str(yaml);
        assert!(result.is_err());
    }
}
