#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

mod cache_config;
mod canned_response_config;
mod circuit_breaker_config;
mod config;
mod cors_config;
mod dispatcher_config;
mod logging_config;
mod metrics_config;
mod network_config;
mod request_coalescing_config;
mod request_queue_config;
mod server_config;
mod upstream_config;
mod upstream_health_checks_config;

pub use cache_config::{CacheConfig, LocalCacheConfig, RedisCacheConfig};
pub use canned_response_config::{CannedResponseConfig, CannedResponseMethods};
pub use circuit_breaker_config::CircuitBreakerConfig;
pub use config::Config;
pub use cors_config::CorsConfig;
pub use dispatcher_config::DispatcherConfig;
pub use logging_config::LoggingConfig;
pub use metrics_config::MetricsConfig;
pub use network_config::NetworkConfig;
pub use request_coalescing_config::RequestCoalescingConfig;
pub use request_queue_config::RequestQueueConfig;
pub use server_config::ServerConfig;
pub use upstream_config::{EnvVarUrlProcessor, UpstreamConfig, UpstreamRole, UrlProcessor};
pub use upstream_health_checks_config::UpstreamHealthChecksConfig;
