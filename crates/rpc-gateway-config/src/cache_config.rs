use std::time::Duration;

use duration_str::deserialize_duration;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CacheConfig {
    Disabled,
    Redis(RedisCacheConfig),
    Local(LocalCacheConfig),
}

impl CacheConfig {
    /// The flat TTL applied to TIME_CACHEABLE methods. `Disabled` has none.
    pub fn max_age(&self) -> Option<Duration> {
        match self {
            CacheConfig::Disabled => None,
            CacheConfig::Redis(c) => Some(c.max_age),
            CacheConfig::Local(c) => Some(c.max_age),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisCacheConfig {
    #[serde(default = "default_redis_url")]
    pub url: String,
    pub key_prefix: Option<String>,
    #[serde(default = "default_max_age", deserialize_with = "deserialize_duration")]
    pub max_age: Duration,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalCacheConfig {
    #[serde(default = "default_cache_capacity")]
    pub capacity: u64,
    #[serde(default = "default_max_age", deserialize_with = "deserialize_duration")]
    pub max_age: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::Disabled
    }
}

impl Default for LocalCacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            max_age: default_max_age(),
        }
    }
}

impl Default for RedisCacheConfig {
    fn default() -> Self {
        Self {
            url: default_redis_url(),
            key_prefix: None,
            max_age: default_max_age(),
        }
    }
}

fn default_cache_capacity() -> u64 {
    10_000 // Default cache capacity of 10,000 entries
}

fn default_redis_url() -> String {
    "redis://localhost:6379".to_string()
}

fn default_max_age() -> Duration {
    Duration::from_secs(5)
}
