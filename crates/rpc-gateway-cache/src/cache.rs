use std::time::{Duration, Instant};

use moka::future::Cache;
use moka::Expiry;
use redis::{AsyncCommands, FromRedisValue, RedisWrite, ToRedisArgs};
use rpc_gateway_config::CacheConfig;
use serde_json::Value;
use tracing::error;

/// One stored cache entry: the raw JSON-RPC `result` payload plus the TTL it was
/// written with. `ttl == None` means the entry never expires.
#[derive(Debug, Clone)]
struct CacheEntry {
    value: Value,
    ttl: Option<Duration>,
}

/// Newtype so we can implement the redis conversion traits for a plain JSON value.
#[derive(Debug, Clone)]
struct StoredJson(Value);

impl FromRedisValue for StoredJson {
    fn from_redis_value(v: &redis::Value) -> redis::RedisResult<Self> {
        let bytes: Vec<u8> = match v {
            redis::Value::SimpleString(s) => s.as_bytes().to_vec(),
            redis::Value::BulkString(bytes) => bytes.clone(),
            _ => {
                return Err(redis::RedisError::from((
                    redis::ErrorKind::TypeError,
                    "unexpected redis value shape for cached json",
                )));
            }
        };
        serde_json::from_slice(&bytes)
            .map(StoredJson)
            .map_err(|e| {
                redis::RedisError::from((
                    redis::ErrorKind::TypeError,
                    "failed to deserialize cached json",
                    e.to_string(),
                ))
            })
    }
}

impl ToRedisArgs for StoredJson {
    fn write_redis_args<W>(&self, out: &mut W)
    where
        W: ?Sized + RedisWrite,
    {
        if let Ok(bytes) = serde_json::to_vec(&self.0) {
            out.write_arg(&bytes);
        }
    }
}

struct TtlExpiry;

impl Expiry<String, CacheEntry> for TtlExpiry {
    fn expire_after_create(&self, _key: &String, value: &CacheEntry, _now: Instant) -> Option<Duration> {
        value.ttl
    }

    fn expire_after_update(
        &self,
        key: &String,
        value: &CacheEntry,
        updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        self.expire_after_create(key, value, updated_at)
    }
}

struct LocalCache {
    cache: Cache<String, CacheEntry>,
}

impl LocalCache {
    fn new(max_capacity: u64) -> Self {
        Self {
            cache: Cache::builder()
                .max_capacity(max_capacity)
                .expire_after(TtlExpiry)
                .build(),
        }
    }

    async fn get(&self, key: &str) -> Option<Value> {
        self.cache.get(key).await.map(|entry| entry.value)
    }

    async fn insert(&self, key: String, value: Value, ttl: Option<Duration>) {
        self.cache.insert(key, CacheEntry { value, ttl }).await;
    }

    async fn clear(&self) {
        self.cache.invalidate_all();
    }
}

struct RedisCache {
    client: redis::Client,
    key_prefix: Option<String>,
}

/// One year, used as a practical stand-in for "forever" in stores that require a TTL.
const INFINITE_TTL: Duration = Duration::from_secs(365 * 24 * 60 * 60);

impl RedisCache {
    fn new(client: redis::Client, key_prefix: Option<String>) -> Self {
        Self { client, key_prefix }
    }

    fn prefixed(&self, key: &str) -> String {
        match &self.key_prefix {
            Some(prefix) => format!("{prefix}:{key}"),
            None => key.to_string(),
        }
    }

    async fn get(&self, key: &str) -> Option<Value> {
        let key = self.prefixed(key);
        let mut conn = match self.client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(err) => {
                error!(error = ?err, "failed to establish redis connection");
                return None;
            }
        };

        let value: Result<Option<StoredJson>, _> = conn.get(&key).await;
        match value {
            Ok(stored) => stored.map(|s| s.0),
            Err(err) => {
                error!(error = ?err, key, "redis get error");
                None
            }
        }
    }

    async fn insert(&self, key: String, value: Value, ttl: Option<Duration>) {
        let key = self.prefixed(&key);
        let mut conn = match self.client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(err) => {
                error!(error = ?err, "failed to establish redis connection");
                return;
            }
        };

        let ttl_secs = ttl.unwrap_or(INFINITE_TTL).as_secs().max(1);
        let result: Result<(), _> = conn.set_ex(&key, StoredJson(value), ttl_secs).await;
        if let Err(err) = result {
            error!(error = ?err, key, "redis set error");
        }
    }

    async fn clear(&self) {
        let mut conn = match self.client.get_multiplexed_async_connection().await {
            Ok(conn) => conn,
            Err(err) => {
                error!(error = ?err, "failed to establish redis connection");
                return;
            }
        };
        let pattern = match &self.key_prefix {
            Some(prefix) => format!("{prefix}:*"),
            None => "*".to_string(),
        };
        let keys: Result<Vec<String>, _> = conn.keys(&pattern).await;
        if let Ok(keys) = keys {
            if !keys.is_empty() {
                let _: Result<(), _> = conn.del(keys).await;
            }
        }
    }
}

enum CacheBackend {
    Local(LocalCache),
    Redis(RedisCache),
}

/// The process-wide cache store. Opaque string keys in, raw JSON-RPC `result` values out.
pub struct RpcCache {
    backend: CacheBackend,
}

impl RpcCache {
    pub fn from_config(config: &CacheConfig) -> Option<Self> {
        let backend = match config {
            CacheConfig::Disabled => return None,
            CacheConfig::Local(local) => CacheBackend::Local(LocalCache::new(local.capacity)),
            CacheConfig::Redis(redis_config) => {
                let client = match redis::Client::open(redis_config.url.clone()) {
                    Ok(client) => client,
                    Err(err) => {
                        error!(error = ?err, "failed to construct redis client");
                        return None;
                    }
                };
                CacheBackend::Redis(RedisCache::new(client, redis_config.key_prefix.clone()))
            }
        };
        Some(Self { backend })
    }

    pub async fn get(&self, key: &str) -> Option<Value> {
        match &self.backend {
            CacheBackend::Local(cache) => cache.get(key).await,
            CacheBackend::Redis(cache) => cache.get(key).await,
        }
    }

    pub async fn insert(&self, key: String, value: Value, ttl: Option<Duration>) {
        match &self.backend {
            CacheBackend::Local(cache) => cache.insert(key, value, ttl).await,
            CacheBackend::Redis(cache) => cache.insert(key, value, ttl).await,
        }
    }

    pub async fn clear(&self) {
        match &self.backend {
            CacheBackend::Local(cache) => cache.clear().await,
            CacheBackend::Redis(cache) => cache.clear().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rpc_gateway_config::LocalCacheConfig;
    use serde_json::json;

    #[tokio::test]
    async fn local_cache_round_trips_a_value() {
        let config = CacheConfig::Local(LocalCacheConfig {
            capacity: 100,
            max_age: Duration::from_secs(5),
        });
        let cache = RpcCache::from_config(&config).unwrap();

        assert_eq!(cache.get("mainnet:eth_chainId").await, None);
        cache
            .insert("mainnet:eth_chainId".to_string(), json!("0x1"), None)
            .await;
        assert_eq!(cache.get("mainnet:eth_chainId").await, Some(json!("0x1")));
    }

    #[tokio::test]
    async fn clear_empties_the_local_cache() {
        let config = CacheConfig::Local(LocalCacheConfig {
            capacity: 100,
            max_age: Duration::from_secs(5),
        });
        let cache = RpcCache::from_config(&config).unwrap();
        cache
            .insert("mainnet:eth_chainId".to_string(), json!("0x1"), None)
            .await;
        cache.clear().await;
        assert_eq!(cache.get("mainnet:eth_chainId").await, None);
    }

    #[test]
    fn disabled_config_yields_no_cache() {
        assert!(RpcCache::from_config(&CacheConfig::Disabled).is_none());
    }
}
