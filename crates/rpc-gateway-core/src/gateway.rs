use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use rpc_gateway_cache::RpcCache;
use rpc_gateway_config::Config;
use rpc_gateway_rpc::{ResponseResult, RpcCall, RpcError, RpcResponse};
use tracing::{info, instrument, warn};

use crate::dispatcher;
use crate::pipeline::NetworkPipeline;

/// The network registry: one [`NetworkPipeline`] per configured network, a shared
/// cache store, and the bookkeeping `GET /health` and `GET /stats` need.
pub struct Gateway {
    pipelines: HashMap<String, Arc<NetworkPipeline>>,
    config: Config,
    started_at: Instant,
}

impl Gateway {
    pub fn new(config: Config) -> Self {
        let cache = RpcCache::from_config(&config.cache).map(Arc::new);

        let pipelines = config
            .networks
            .iter()
            .map(|(key, network)| {
                let pipeline = NetworkPipeline::new(
                    key.clone(),
                    network,
                    &config.circuit_breaker,
                    &config.request_queue,
                    &config.request_coalescing,
                    &config.canned_responses,
                    &config.cache,
                    cache.clone(),
                );
                (key.clone(), Arc::new(pipeline))
            })
            .collect();

        info!(networks = pipelines.len(), "gateway initialized");
        Self { pipelines, config, started_at: Instant::now() }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.started_at.elapsed()
    }

    pub fn pipeline(&self, network_key: &str) -> Option<&Arc<NetworkPipeline>> {
        self.pipelines.get(network_key)
    }

    pub fn default_pipeline(&self) -> Option<&Arc<NetworkPipeline>> {
        let key = self.config.default_network_key()?;
        self.pipeline(key)
    }

    pub fn network_keys(&self) -> impl Iterator<Item = &str> {
        self.pipelines.keys().map(String::as_str)
    }

    /// Runs a single call or batch against one network's pipeline, honoring the
    /// configured batch-size ceiling. An over-size batch answers with an isolated
    /// error per item rather than being silently truncated.
    #[instrument(skip(self, calls), fields(network = %network_key, items = calls.len()))]
    pub async fn handle(&self, network_key: &str, calls: Vec<RpcCall>) -> Option<Vec<RpcResponse>> {
        let pipeline = self.pipeline(network_key)?;
        if !dispatcher::enforce_max_batch_size(&calls, &self.config.dispatcher) {
            return Some(
                calls
                    .iter()
                    .map(|call| RpcResponse::new(call.id(), ResponseResult::Error(RpcError::invalid_request())))
                    .collect(),
            );
        }
        Some(dispatcher::dispatch(pipeline, calls, &self.config.dispatcher).await)
    }

    /// Probes every network's primary upstream once; used at startup and by the
    /// periodic health-check loop. Returns the number of networks that responded.
    pub async fn run_upstream_health_checks_once(&self) -> usize {
        let mut healthy = 0;
        for (key, pipeline) in &self.pipelines {
            if pipeline.probe_primary().await {
                healthy += 1;
            } else {
                warn!(network = %key, "primary upstream did not respond to startup probe");
            }
        }
        info!(healthy, total = self.pipelines.len(), "upstream health check complete");
        healthy
    }

    /// Aggregate liveness used by `GET /health`: `true` unless every configured
    /// network's breaker is open.
    pub fn any_network_healthy(&self) -> bool {
        self.pipelines.is_empty() || self.pipelines.values().any(|p| !p.breaker_is_open())
    }

    /// Runs forever, re-probing every network's primary upstream on the configured
    /// interval. Callers race this against a cancellation signal.
    pub async fn start_upstream_health_check_loops(&self) {
        if !self.config.upstream_health_checks.enabled {
            warn!("upstream health checks are disabled");
            std::future::pending::<()>().await;
            return;
        }
        let mut interval = tokio::time::interval(self.config.upstream_health_checks.interval);
        interval.tick().await;
        loop {
            interval.tick().await;
            self.run_upstream_health_checks_once().await;
        }
    }

    pub async fn clear_cache(&self) {
        if let Some(cache) = self.pipelines.values().next().and_then(|p| p.cache()) {
            cache.clear().await;
        }
    }
}
