use std::time::Duration;

use metrics::counter;
use rand::Rng;
use reqwest::{Client, StatusCode};
use rpc_gateway_config::{UpstreamConfig, UpstreamRole};
use rpc_gateway_rpc::{RpcCall, RpcResponse};
use tracing::{debug, error, instrument, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpstreamError {
    Transport,
    HttpStatus(StatusCode),
    Decode,
}

impl UpstreamError {
    /// A transport error, a 5xx, or a 429 counts against the circuit breaker and is retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            UpstreamError::Transport => true,
            UpstreamError::HttpStatus(status) => {
                status.is_server_error() || *status == StatusCode::TOO_MANY_REQUESTS
            }
            UpstreamError::Decode => false,
        }
    }
}

impl std::fmt::Display for UpstreamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UpstreamError::Transport => write!(f, "transport error"),
            UpstreamError::HttpStatus(status) => write!(f, "upstream returned status {status}"),
            UpstreamError::Decode => write!(f, "could not decode upstream response"),
        }
    }
}

impl std::error::Error for UpstreamError {}

/// One configured upstream endpoint (primary or archive fallback) for a network.
#[derive(Debug)]
pub struct Upstream {
    pub role: UpstreamRole,
    pub config: UpstreamConfig,
    client: Client,
}

impl Upstream {
    pub fn new(role: UpstreamRole, config: UpstreamConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(30))
            .build()
            .expect("reqwest client configuration is valid");

        Self { role, config, client }
    }

    #[instrument(skip(self, call), fields(role = self.role.as_metric_label()))]
    async fn call_once(&self, call: &RpcCall) -> Result<RpcResponse, UpstreamError> {
        let response = self
            .client
            .post(self.config.url.as_str())
            .json(call)
            .send()
            .await
            .map_err(|e| {
                error!(error = %e, "upstream transport error");
                UpstreamError::Transport
            })?;

        let status = response.status();
        counter!("rpc_http_upstream_responses_total", "status_code" => status.as_u16().to_string()).increment(1);
        if !status.is_success() {
            warn!(%status, "upstream returned non-success status");
            return Err(UpstreamError::HttpStatus(status));
        }

        let body = response.bytes().await.map_err(|e| {
            error!(error = %e, "failed reading upstream response body");
            UpstreamError::Transport
        })?;

        serde_json::from_slice::<RpcResponse>(&body).map_err(|e| {
            error!(error = %e, "failed decoding upstream json-rpc response");
            UpstreamError::Decode
        })
    }

    /// Calls the upstream, retrying with exponential backoff and jitter on transport
    /// errors, 5xx, and 429. A decoded JSON-RPC `error` reply is not retried.
    #[instrument(skip(self, call), fields(role = self.role.as_metric_label()))]
    pub async fn call(&self, call: &RpcCall) -> Result<RpcResponse, UpstreamError> {
        let mut attempt = 0u32;
        let mut delay = self.config.retry_delay;

        loop {
            match self.call_once(call).await {
                Ok(response) => return Ok(response),
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    let jitter = Duration::from_millis(rand::rng().random_range(0..100));
                    warn!(attempt, ?err, delay = ?delay, "retrying upstream call");
                    tokio::time::sleep(delay + jitter).await;
                    attempt += 1;
                    delay *= 2;
                }
                Err(err) => {
                    debug!(attempt, ?err, "upstream call exhausted retries or is not retryable");
                    return Err(err);
                }
            }
        }
    }
}
