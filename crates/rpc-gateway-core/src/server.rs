use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use actix_web::{web, App, HttpResponse, HttpServer};
use rpc_gateway_config::Config;
use rpc_gateway_rpc::{Id, ResponseResult, RpcCall, RpcError, RpcResponse};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, instrument};
use tracing_actix_web::TracingLogger;

use crate::gateway::Gateway;

/// A request body is either a single call or a batch, per the JSON-RPC 2.0 spec.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RpcBody {
    Batch(Vec<RpcCall>),
    Single(RpcCall),
}

impl RpcBody {
    fn into_calls(self) -> (Vec<RpcCall>, bool) {
        match self {
            RpcBody::Batch(calls) => (calls, true),
            RpcBody::Single(call) => (vec![call], false),
        }
    }
}

/// A response body mirrors the request shape: a lone object for a single call, an
/// array in the same order for a batch.
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum RpcReply {
    Batch(Vec<RpcResponse>),
    Single(Box<RpcResponse>),
}

fn reply(responses: Vec<RpcResponse>, was_batch: bool) -> RpcReply {
    if was_batch {
        RpcReply::Batch(responses)
    } else {
        RpcReply::Single(Box::new(
            responses.into_iter().next().unwrap_or_else(|| RpcResponse::new(Id::Null, ResponseResult::Error(RpcError::internal_error()))),
        ))
    }
}

#[instrument(skip(gateway, body), fields(network = %network))]
async fn handle_network(
    network: &str,
    body: web::Json<RpcBody>,
    gateway: &Gateway,
) -> HttpResponse {
    let (calls, was_batch) = body.into_inner().into_calls();
    match gateway.handle(network, calls).await {
        Some(responses) => HttpResponse::Ok().json(reply(responses, was_batch)),
        None => HttpResponse::NotFound().json(json!({ "error": format!("unknown network: {network}") })),
    }
}

async fn handle_root(body: web::Json<RpcBody>, gateway: web::Data<Arc<Gateway>>) -> HttpResponse {
    let Some(default_pipeline) = gateway.default_pipeline() else {
        return HttpResponse::NotFound().json(json!({ "error": "no default network configured" }));
    };
    let network = default_pipeline.network_key().to_string();
    handle_network(&network, body, &gateway).await
}

async fn handle_named(
    path: web::Path<String>,
    body: web::Json<RpcBody>,
    gateway: web::Data<Arc<Gateway>>,
) -> HttpResponse {
    let network = path.into_inner();
    handle_network(&network, body, &gateway).await
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime: f64,
    memory: Option<u64>,
    version: &'static str,
    upstream: &'static str,
    timestamp: u64,
}

fn unix_timestamp() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).map(|d| d.as_secs()).unwrap_or(0)
}

/// Best-effort resident set size, in kilobytes, read from `/proc/self/status` on
/// Linux. Any other platform, or a read failure, reports `None` rather than erroring.
#[cfg(target_os = "linux")]
fn resident_memory_kb() -> Option<u64> {
    let status = std::fs::read_to_string("/proc/self/status").ok()?;
    status.lines().find_map(|line| {
        line.strip_prefix("VmRSS:").map(|rest| rest.trim().trim_end_matches(" kB").trim().parse().ok()).flatten()
    })
}

#[cfg(not(target_os = "linux"))]
fn resident_memory_kb() -> Option<u64> {
    None
}

async fn health(gateway: web::Data<Arc<Gateway>>) -> HttpResponse {
    let healthy = gateway.any_network_healthy();
    let body = HealthResponse {
        status: if healthy { "healthy" } else { "degraded" },
        uptime: gateway.uptime().as_secs_f64(),
        memory: resident_memory_kb(),
        version: env!("CARGO_PKG_VERSION"),
        upstream: if healthy { "connected" } else { "disconnected" },
        timestamp: unix_timestamp(),
    };
    HttpResponse::Ok().json(body)
}

async fn stats(gateway: web::Data<Arc<Gateway>>) -> HttpResponse {
    let networks: Vec<Value> = gateway
        .network_keys()
        .filter_map(|key| gateway.pipeline(key))
        .map(|pipeline| {
            json!({
                "network": pipeline.network_key(),
                "chain_id": pipeline.chain_id(),
                "breaker_state": pipeline.breaker_state_label(),
                "has_fallback": pipeline.has_fallback(),
            })
        })
        .collect();

    HttpResponse::Ok().json(json!({
        "uptime": gateway.uptime().as_secs_f64(),
        "networks": networks,
    }))
}

async fn clear_cache(gateway: web::Data<Arc<Gateway>>) -> HttpResponse {
    gateway.clear_cache().await;
    HttpResponse::Ok().json(json!({ "cleared": true }))
}

async fn not_found() -> HttpResponse {
    HttpResponse::NotFound().json(json!({ "error": "not found" }))
}

/// The main JSON-RPC HTTP surface. `GET /metrics` is served separately by
/// [`crate::metrics::run`], matching the teacher's split between the RPC server
/// and the Prometheus exporter's own listener.
pub struct GatewayServer {
    gateway: Arc<Gateway>,
    config: Arc<Config>,
}

impl GatewayServer {
    pub fn new(gateway: Arc<Gateway>, config: Arc<Config>) -> Self {
        Self { gateway, config }
    }

    pub async fn start(self) -> std::io::Result<()> {
        let host = self.config.server.host.clone();
        let port = self.config.server.port;
        let max_body_bytes = self.config.server.max_body_bytes;

        info!(host = %host, port = %port, "starting rpc gateway http server");

        let gateway = self.gateway.clone();
        let config = self.config.clone();

        HttpServer::new(move || {
            let cors = crate::cors::cors_middleware(&config.cors);
            App::new()
                .wrap(TracingLogger::default())
                .wrap(cors)
                .app_data(web::Data::new(gateway.clone()))
                .app_data(web::JsonConfig::default().limit(max_body_bytes))
                .route("/", web::post().to(handle_root))
                .route("/health", web::get().to(health))
                .route("/stats", web::get().to(stats))
                .route("/cache/clear", web::post().to(clear_cache))
                .route("/{network}", web::post().to(handle_named))
                .default_service(web::route().to(not_found))
        })
        .bind((host.as_str(), port))?
        .run()
        .await
    }
}

