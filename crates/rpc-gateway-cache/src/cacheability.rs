use std::time::Duration;

use rpc_gateway_rpc::{RequestParams, ResponseResult};
use serde_json::Value;

/// The three cacheability classes from the method partition, plus the TTL each resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cacheability {
    Infinite,
    Timed,
    NotCacheable,
}

const INFINITELY_CACHEABLE: &[&str] = &[
    "eth_chainId",
    "net_version",
    "eth_getTransactionReceipt",
    "eth_getTransactionByHash",
    "eth_getBlockByHash",
];

const TIME_CACHEABLE: &[&str] = &[
    "eth_blockNumber",
    "eth_gasPrice",
    "eth_getLogs",
    "eth_call",
    "eth_getBlockByNumber",
    "eth_getBalance",
    "eth_getCode",
    "eth_getStorageAt",
];

/// Classifies a method, taking into account the two TIME_CACHEABLE → infinite promotions:
/// `eth_call` pinned to a specific block, and `eth_getBlockByNumber` with a concrete block number.
pub fn classify(method: &str, params: &RequestParams) -> Cacheability {
    if INFINITELY_CACHEABLE.contains(&method) {
        return Cacheability::Infinite;
    }
    if !TIME_CACHEABLE.contains(&method) {
        return Cacheability::NotCacheable;
    }

    if method == "eth_call" && is_pinned_eth_call(params) {
        return Cacheability::Infinite;
    }
    if method == "eth_getBlockByNumber" && is_pinned_block_number(params) {
        return Cacheability::Infinite;
    }
    Cacheability::Timed
}

fn is_pinned_eth_call(params: &RequestParams) -> bool {
    let has_block_hash = params
        .get(0)
        .and_then(|v| v.as_object())
        .is_some_and(|obj| obj.contains_key("blockHash"));
    let has_hex_block = params
        .get(1)
        .and_then(|v| v.as_str())
        .is_some_and(|s| s.starts_with("0x"));
    has_block_hash || has_hex_block
}

fn is_pinned_block_number(params: &RequestParams) -> bool {
    params.get(0).and_then(|v| v.as_str()).is_some_and(|tag| {
        tag.starts_with("0x") && tag != "latest" && tag != "pending"
    })
}

/// Resolves the TTL for a method/params pair, or `None` if not cacheable at all.
/// `Cacheability::Infinite` resolves to `None` inside `Some` — callers distinguish
/// "not cacheable" from "cacheable forever" via the outer/inner option nesting.
pub fn resolve_ttl(
    method: &str,
    params: &RequestParams,
    max_age: Duration,
) -> Option<Option<Duration>> {
    match classify(method, params) {
        Cacheability::NotCacheable => None,
        Cacheability::Infinite => Some(None),
        Cacheability::Timed => Some(Some(max_age)),
    }
}

/// Why a response must not be cached, for the `cache_invalid_entries_total{reason}` metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProblematicReason {
    NullResult,
    EmptyArray,
    EmptyObject,
    ErrorString,
}

impl ProblematicReason {
    pub fn as_metric_label(self) -> &'static str {
        match self {
            ProblematicReason::NullResult => "null_result",
            ProblematicReason::EmptyArray => "empty_array",
            ProblematicReason::EmptyObject => "empty_object",
            ProblematicReason::ErrorString => "error_string",
        }
    }
}

const ERROR_STRING_MARKERS: &[&str] = &["error", "not found", "unavailable"];

/// The cache-poisoning guard: a response matching any of these must never be written.
pub fn problematic_reason(response: &ResponseResult) -> Option<ProblematicReason> {
    let result = response.as_success()?;
    problematic_value_reason(result)
}

fn problematic_value_reason(result: &Value) -> Option<ProblematicReason> {
    match result {
        Value::Null => Some(ProblematicReason::NullResult),
        Value::Array(items) if items.is_empty() => Some(ProblematicReason::EmptyArray),
        Value::Object(fields) if fields.is_empty() => Some(ProblematicReason::EmptyObject),
        Value::String(s) if ERROR_STRING_MARKERS.iter().any(|m| s.contains(m)) => {
            Some(ProblematicReason::ErrorString)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn array_params(values: Vec<Value>) -> RequestParams {
        RequestParams::Array(values)
    }

    #[test]
    fn infinitely_cacheable_methods_never_expire() {
        assert_eq!(
            classify("eth_chainId", &RequestParams::None),
            Cacheability::Infinite
        );
    }

    #[test]
    fn unknown_methods_are_not_cacheable() {
        assert_eq!(
            classify("eth_sendRawTransaction", &RequestParams::None),
            Cacheability::NotCacheable
        );
    }

    #[test]
    fn eth_call_pinned_to_hex_block_is_promoted_to_infinite() {
        let params = array_params(vec![json!({}), json!("0x10")]);
        assert_eq!(classify("eth_call", &params), Cacheability::Infinite);
    }

    #[test]
    fn eth_call_with_latest_stays_timed() {
        let params = array_params(vec![json!({}), json!("latest")]);
        assert_eq!(classify("eth_call", &params), Cacheability::Timed);
    }

    #[test]
    fn eth_call_with_block_hash_is_promoted_to_infinite() {
        let params = array_params(vec![json!({"blockHash": "0xabc"}), json!(null)]);
        assert_eq!(classify("eth_call", &params), Cacheability::Infinite);
    }

    #[test]
    fn eth_get_block_by_number_with_concrete_number_is_infinite() {
        let params = array_params(vec![json!("0x5"), json!(false)]);
        assert_eq!(
            classify("eth_getBlockByNumber", &params),
            Cacheability::Infinite
        );
    }

    #[test]
    fn eth_get_block_by_number_with_latest_stays_timed() {
        let params = array_params(vec![json!("latest"), json!(false)]);
        assert_eq!(
            classify("eth_getBlockByNumber", &params),
            Cacheability::Timed
        );
    }

    #[test]
    fn resolve_ttl_is_none_for_not_cacheable() {
        assert_eq!(
            resolve_ttl("eth_sendRawTransaction", &RequestParams::None, Duration::from_secs(5)),
            None
        );
    }

    #[test]
    fn resolve_ttl_is_some_none_for_infinite() {
        assert_eq!(
            resolve_ttl("eth_chainId", &RequestParams::None, Duration::from_secs(5)),
            Some(None)
        );
    }

    #[test]
    fn resolve_ttl_is_some_some_for_timed() {
        assert_eq!(
            resolve_ttl("eth_blockNumber", &RequestParams::None, Duration::from_secs(5)),
            Some(Some(Duration::from_secs(5)))
        );
    }

    #[test]
    fn null_result_is_problematic() {
        let response = ResponseResult::Success(Value::Null);
        assert_eq!(problematic_reason(&response), Some(ProblematicReason::NullResult));
    }

    #[test]
    fn empty_array_is_problematic() {
        let response = ResponseResult::Success(json!([]));
        assert_eq!(problematic_reason(&response), Some(ProblematicReason::EmptyArray));
    }

    #[test]
    fn empty_object_is_problematic() {
        let response = ResponseResult::Success(json!({}));
        assert_eq!(problematic_reason(&response), Some(ProblematicReason::EmptyObject));
    }

    #[test]
    fn error_substring_in_string_result_is_problematic() {
        let response = ResponseResult::Success(json!("block not found upstream"));
        assert_eq!(problematic_reason(&response), Some(ProblematicReason::ErrorString));
    }

    #[test]
    fn ordinary_result_is_not_problematic() {
        let response = ResponseResult::Success(json!("0x1"));
        assert_eq!(problematic_reason(&response), None);
    }

    #[test]
    fn error_responses_are_never_cached_but_not_via_this_predicate() {
        use rpc_gateway_rpc::RpcError;
        let response = ResponseResult::Error(RpcError::internal_error());
        assert_eq!(problematic_reason(&response), None);
    }
}
