use std::sync::Arc;

use futures::future::join_all;
use rpc_gateway_config::DispatcherConfig;
use rpc_gateway_rpc::{Id, ResponseResult, RpcCall, RpcError, RpcMethodCall, RpcResponse};

use crate::pipeline::NetworkPipeline;

/// Runs a (possibly batched) set of calls through a network's pipeline, preserving
/// response-array order and isolating per-item failures. A single non-batched call
/// is just the one-item case of the same path.
pub async fn dispatch(
    pipeline: &Arc<NetworkPipeline>,
    calls: Vec<RpcCall>,
    config: &DispatcherConfig,
) -> Vec<RpcResponse> {
    let mut responses = Vec::with_capacity(calls.len());
    for chunk in calls.chunks(config.batch_concurrency_limit.max(1)) {
        let futures = chunk.iter().cloned().map(|call| {
            let pipeline = Arc::clone(pipeline);
            async move { dispatch_one(&pipeline, call).await }
        });
        responses.extend(join_all(futures).await);
    }
    responses
}

async fn dispatch_one(pipeline: &Arc<NetworkPipeline>, call: RpcCall) -> RpcResponse {
    match call {
        RpcCall::MethodCall(method_call) => pipeline.handle(method_call).await,
        RpcCall::Notification(notification) => {
            pipeline
                .handle(RpcMethodCall {
                    method: notification.method,
                    params: notification.params,
                    id: Id::Null,
                })
                .await
        }
        RpcCall::Invalid { id } => RpcResponse::new(id, ResponseResult::Error(RpcError::invalid_request())),
    }
}

/// Enforces the configured batch-size ceiling before dispatch; returns `None` (the
/// batch is too large) rather than truncating it silently.
pub fn enforce_max_batch_size(calls: &[RpcCall], config: &DispatcherConfig) -> bool {
    calls.len() <= config.max_batch_size
}
