use std::sync::Arc;
use std::sync::LazyLock;
use std::time::{Duration, Instant};

use metrics::{counter, histogram};
use rpc_gateway_cache::RpcCache;
use rpc_gateway_config::{CacheConfig, CannedResponseConfig, CircuitBreakerConfig, NetworkConfig, RequestCoalescingConfig, RequestQueueConfig};
use rpc_gateway_rpc::{Id, RequestParams, ResponseResult, RpcError, RpcMethodCall, RpcResponse};
use rpc_gateway_config::UpstreamRole;
use rpc_gateway_upstream::Upstream;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::breaker::{BreakerDecision, CircuitBreaker};
use crate::coalescer::Coalescer;
use crate::fingerprint::{fingerprint, BlockPointer};
use crate::queue::RequestQueue;

static CANNED_CLIENT_VERSION: LazyLock<Value> =
    LazyLock::new(|| Value::String(format!("rpc-gateway/{}", env!("CARGO_PKG_VERSION"))));

/// Where a response ultimately came from, for logging and the `cache_status` metric label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseSource {
    Canned,
    Cached,
    Coalesced,
    Upstream,
    UpstreamFallback,
    QueueRejected,
    BreakerOpen,
}

impl ResponseSource {
    pub(crate) fn cache_status_label(self) -> &'static str {
        match self {
            ResponseSource::Cached => "hit",
            ResponseSource::Canned => "canned",
            _ => "miss",
        }
    }
}

#[derive(Debug, Clone)]
struct PipelineOutcome {
    source: ResponseSource,
    result: ResponseResult,
}

/// The per-network request pipeline: normalization, cacheability, coalescing,
/// the request queue, the circuit breaker, and primary/fallback upstream routing.
pub struct NetworkPipeline {
    key: String,
    chain_id: Option<u64>,
    primary: Upstream,
    fallback: Option<Upstream>,
    breaker: CircuitBreaker,
    queue: RequestQueue,
    coalescer: Coalescer<PipelineOutcome>,
    block_pointer: BlockPointer,
    cache: Option<Arc<RpcCache>>,
    cache_max_age: Option<Duration>,
    coalescing_enabled: bool,
    canned: CannedResponseConfig,
    cache_writes: std::sync::atomic::AtomicUsize,
}

impl NetworkPipeline {
    pub fn new(
        key: String,
        network: &NetworkConfig,
        breaker_config: &CircuitBreakerConfig,
        queue_config: &RequestQueueConfig,
        coalescing_config: &RequestCoalescingConfig,
        canned: &CannedResponseConfig,
        cache_config: &CacheConfig,
        cache: Option<Arc<RpcCache>>,
    ) -> Self {
        Self {
            key,
            chain_id: network.chain_id,
            primary: Upstream::new(UpstreamRole::Primary, network.primary.clone()),
            fallback: network.fallback.clone().map(|cfg| Upstream::new(UpstreamRole::Fallback, cfg)),
            breaker: CircuitBreaker::new(breaker_config.clone()),
            queue: RequestQueue::new(queue_config),
            coalescer: Coalescer::new(Duration::from_secs(30)),
            block_pointer: BlockPointer::new(),
            cache,
            cache_max_age: cache_config.max_age(),
            coalescing_enabled: coalescing_config.enabled,
            canned: canned.clone(),
            cache_writes: std::sync::atomic::AtomicUsize::new(0),
        }
    }

    #[cfg(test)]
    pub(crate) fn cache_write_count(&self) -> usize {
        self.cache_writes.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub fn network_key(&self) -> &str {
        &self.key
    }

    pub fn breaker_is_open(&self) -> bool {
        self.breaker.state() == crate::breaker::BreakerState::Open
    }

    pub fn breaker_state_label(&self) -> &'static str {
        self.breaker.state().as_metric_label()
    }

    pub fn cache(&self) -> Option<&Arc<RpcCache>> {
        self.cache.as_ref()
    }

    pub fn chain_id(&self) -> Option<u64> {
        self.chain_id
    }

    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Probes the primary upstream with `eth_chainId`. Used for the startup and
    /// periodic liveness checks, not on the request hot path.
    pub async fn probe_primary(&self) -> bool {
        let call = rpc_gateway_rpc::RpcCall::MethodCall(RpcMethodCall {
            method: "eth_chainId".to_string(),
            params: RequestParams::None,
            id: Id::Number(1),
        });
        matches!(
            self.primary.call(&call).await.map(|r| r.result),
            Ok(ResponseResult::Success(_))
        )
    }

    #[instrument(skip(self, call), fields(network = %self.key, method = %call.method))]
    pub async fn handle(self: &Arc<Self>, call: RpcMethodCall) -> RpcResponse {
        let start = Instant::now();
        let RpcMethodCall { method, params, id } = call;

        counter!("rpc_network_requests_total", "network" => self.key.clone(), "method" => method.clone()).increment(1);

        if let Some(result) = self.try_canned(&method) {
            self.record_http_metrics(&method, ResponseSource::Canned, &result, start);
            return RpcResponse::new(id, result);
        }

        let normalized_params = self.block_pointer.normalize(&method, params);
        let fp = fingerprint(&self.key, &method, &normalized_params);

        if let Some(cache) = &self.cache {
            if let Some(ttl_policy) = rpc_gateway_cache::resolve_ttl(&method, &normalized_params, self.cache_max_age.unwrap_or(Duration::from_secs(5))) {
                let _ = ttl_policy;
                if let Some(cached) = cache.get(&fp).await {
                    counter!("rpc_cache_hits_total", "method" => method.clone()).increment(1);
                    let result = ResponseResult::Success(cached);
                    self.record_http_metrics(&method, ResponseSource::Cached, &result, start);
                    return RpcResponse::new(id, result);
                }
                counter!("rpc_cache_misses_total", "method" => method.clone()).increment(1);
            }
        }

        let (outcome, coalesced) = if self.coalescing_enabled {
            let this = Arc::clone(self);
            let method_owned = method.clone();
            let params_owned = normalized_params.clone();
            let (outcome, coalesced) = self
                .coalescer
                .run(fp.clone(), async move { this.drive_upstream(method_owned, params_owned).await })
                .await;
            if coalesced {
                (PipelineOutcome { source: ResponseSource::Coalesced, result: outcome.result }, true)
            } else {
                (outcome, false)
            }
        } else {
            (self.drive_upstream(method.clone(), normalized_params.clone()).await, false)
        };

        if let Some(block_number) = observed_block_number(&method, &outcome.result) {
            self.block_pointer.observe(&block_number);
        }

        // Only the caller that actually drove the upstream call writes the cache entry;
        // coalesced waiters share that single write rather than each repeating it.
        if !coalesced {
            self.try_cache_write(&method, &normalized_params, &fp, &outcome).await;
        }
        self.record_http_metrics(&method, outcome.source, &outcome.result, start);
        RpcResponse::new(id, outcome.result)
    }

    fn try_canned(&self, method: &str) -> Option<ResponseResult> {
        if !self.canned.enabled {
            return None;
        }
        match method {
            "web3_clientVersion" if self.canned.methods.web3_client_version => {
                Some(ResponseResult::Success(CANNED_CLIENT_VERSION.clone()))
            }
            "eth_chainId" if self.canned.methods.eth_chain_id => {
                self.chain_id.map(|id| ResponseResult::Success(Value::String(format!("0x{id:x}"))))
            }
            _ => None,
        }
    }

    async fn drive_upstream(&self, method: String, params: RequestParams) -> PipelineOutcome {
        let decision = self.queue.acquire().await;
        let Ok(_ticket) = decision else {
            return PipelineOutcome {
                source: ResponseSource::QueueRejected,
                result: ResponseResult::Error(RpcError::internal_error_with("request queue is full")),
            };
        };

        let breaker_decision = self.breaker.admit();
        if breaker_decision == BreakerDecision::Reject {
            return PipelineOutcome {
                source: ResponseSource::BreakerOpen,
                result: ResponseResult::Error(RpcError::upstream_unavailable(&self.key)),
            };
        }

        let call = rpc_gateway_rpc::RpcCall::MethodCall(RpcMethodCall {
            method: method.clone(),
            params: params.clone(),
            id: Id::Number(1),
        });

        counter!("rpc_routing_decisions_total", "network" => self.key.clone(), "upstream_type" => "primary", "reason" => "default").increment(1);

        let primary_start = Instant::now();
        let primary_outcome = self.primary.call(&call).await;
        histogram!("rpc_upstream_response_time_ms", "network" => self.key.clone(), "upstream_type" => "primary")
            .record(primary_start.elapsed().as_secs_f64() * 1000.0);

        let primary_response = match primary_outcome {
            Ok(response) => {
                self.breaker.record_success(breaker_decision);
                response.result
            }
            Err(err) => {
                self.breaker.record_failure(breaker_decision);
                warn!(network = %self.key, method = %method, ?err, "primary upstream call failed");
                ResponseResult::Error(RpcError::upstream_error(err.to_string()))
            }
        };

        let fallback_reason = rpc_gateway_upstream::classify(&method, &params, &primary_response);
        let Some(reason) = fallback_reason else {
            return PipelineOutcome { source: ResponseSource::Upstream, result: primary_response };
        };

        let Some(fallback) = &self.fallback else {
            return PipelineOutcome { source: ResponseSource::Upstream, result: primary_response };
        };

        counter!(
            "rpc_fallback_requests_total",
            "network" => self.key.clone(),
            "upstream_type" => "fallback",
            "reason" => reason.as_metric_label()
        )
        .increment(1);
        counter!("rpc_archive_node_requests_total", "network" => self.key.clone(), "method" => method.clone()).increment(1);

        let fallback_start = Instant::now();
        let fallback_outcome = fallback.call(&call).await;
        histogram!("rpc_upstream_response_time_ms", "network" => self.key.clone(), "upstream_type" => "fallback")
            .record(fallback_start.elapsed().as_secs_f64() * 1000.0);

        let fallback_response = match fallback_outcome {
            Ok(response) => response.result,
            Err(err) => {
                warn!(network = %self.key, method = %method, ?err, "archive fallback call also failed");
                primary_response
            }
        };

        PipelineOutcome { source: ResponseSource::UpstreamFallback, result: fallback_response }
    }

    async fn try_cache_write(&self, method: &str, params: &RequestParams, key: &str, outcome: &PipelineOutcome) {
        if matches!(outcome.source, ResponseSource::Cached | ResponseSource::Canned) {
            return;
        }
        let Some(cache) = &self.cache else { return };
        let Some(max_age) = self.cache_max_age else { return };
        let Some(ttl) = rpc_gateway_cache::resolve_ttl(method, params, max_age) else { return };

        if let Some(reason) = rpc_gateway_cache::problematic_reason(&outcome.result) {
            counter!(
                "rpc_cache_invalid_entries_total",
                "network" => self.key.clone(),
                "method" => method.to_string(),
                "reason" => reason.as_metric_label()
            )
            .increment(1);
            debug!(network = %self.key, method, ?reason, "refusing to cache problematic response");
            return;
        }

        if let ResponseResult::Success(value) = &outcome.result {
            cache.insert(key.to_string(), value.clone(), ttl).await;
            self.cache_writes.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        }
    }

    fn record_http_metrics(&self, method: &str, source: ResponseSource, result: &ResponseResult, start: Instant) {
        let outcome = match result {
            ResponseResult::Success(_) => "success",
            ResponseResult::Error(_) => "error",
        };
        let cache_status = source.cache_status_label();

        counter!(
            "rpc_http_requests_total",
            "method" => method.to_string(),
            "cache_status" => cache_status,
            "outcome" => outcome
        )
        .increment(1);

        histogram!("rpc_request_duration_ms", "method" => method.to_string(), "cache_status" => cache_status)
            .record(start.elapsed().as_secs_f64() * 1000.0);

        let size = match result {
            ResponseResult::Success(value) => serde_json::to_vec(value).map(|b| b.len()),
            ResponseResult::Error(error) => serde_json::to_vec(error).map(|b| b.len()),
        };
        if let Ok(size) = size {
            histogram!("rpc_response_size_bytes", "method" => method.to_string()).record(size as f64);
        }
    }
}

fn observed_block_number(method: &str, result: &ResponseResult) -> Option<String> {
    if method != "eth_blockNumber" {
        return None;
    }
    match result {
        ResponseResult::Success(Value::String(s)) if s.starts_with("0x") => Some(s.clone()),
        _ => None,
    }
}
