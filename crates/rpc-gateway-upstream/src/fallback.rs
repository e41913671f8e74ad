use std::sync::LazyLock;

use regex::RegexSet;
use rpc_gateway_rpc::{RequestParams, ResponseResult, RpcError};

/// Why a response triggered (or didn't trigger) an archive-fallback attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackReason {
    NullResult,
    ErrorPattern,
    BlockTolerance,
}

impl FallbackReason {
    pub fn as_metric_label(self) -> &'static str {
        match self {
            FallbackReason::NullResult => "null_result",
            FallbackReason::ErrorPattern => "error_pattern",
            FallbackReason::BlockTolerance => "block_tolerance",
        }
    }
}

const NULL_RESULT_METHODS: &[&str] = &[
    "eth_getBlockByNumber",
    "eth_getLogs",
    "eth_getTransactionReceipt",
];

const ERROR_PATTERN_SUBSTRINGS: &[&str] = &[
    "block not found",
    "transaction not found",
    "receipt not found",
    "logs not found",
    "state not found",
    "data not available",
    "block range not available",
    "historical data not available",
    "only recent blocks available",
    "archive node required",
];

static BLOCK_TOLERANCE_PATTERNS: LazyLock<RegexSet> = LazyLock::new(|| {
    RegexSet::new([
        r"(?i)block.*returned.*is after.*last block",
        r"(?i)non-deterministic error",
        r"(?i)block.*is after.*requested range",
        r"(?i)block ordering error",
        r"(?i)deterministic error",
    ])
    .expect("fallback patterns are valid regular expressions")
});

/// Centralizes the three archive-fallback conditions in one auditable table.
pub fn classify(
    method: &str,
    params: &RequestParams,
    result: &ResponseResult,
) -> Option<FallbackReason> {
    match result {
        ResponseResult::Success(value) => {
            if value.is_null() && is_null_result_eligible(method, params) {
                Some(FallbackReason::NullResult)
            } else {
                None
            }
        }
        ResponseResult::Error(error) => classify_error(method, params, error),
    }
}

fn is_null_result_eligible(method: &str, params: &RequestParams) -> bool {
    if method == "eth_getBlockByNumber" {
        return params
            .get(0)
            .and_then(|v| v.as_str())
            .is_some_and(|tag| tag != "latest" && tag != "pending");
    }
    NULL_RESULT_METHODS.contains(&method)
}

fn classify_error(method: &str, params: &RequestParams, error: &RpcError) -> Option<FallbackReason> {
    let haystack = error_haystack(error);

    if ERROR_PATTERN_SUBSTRINGS
        .iter()
        .any(|pattern| haystack.contains(pattern))
    {
        return Some(FallbackReason::ErrorPattern);
    }

    let is_latest_eth_call = method == "eth_call"
        && params.get(1).and_then(|v| v.as_str()) == Some("latest");
    if is_latest_eth_call && BLOCK_TOLERANCE_PATTERNS.is_match(&haystack) {
        return Some(FallbackReason::BlockTolerance);
    }

    None
}

fn error_haystack(error: &RpcError) -> String {
    let mut haystack = error.message.to_lowercase();
    if let Some(data) = &error.data {
        if let Some(s) = data.as_str() {
            haystack.push(' ');
            haystack.push_str(&s.to_lowercase());
        } else {
            haystack.push(' ');
            haystack.push_str(&data.to_string().to_lowercase());
        }
    }
    haystack
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(values: Vec<serde_json::Value>) -> RequestParams {
        RequestParams::Array(values)
    }

    #[test]
    fn null_result_triggers_for_get_logs() {
        let result = ResponseResult::Success(serde_json::Value::Null);
        let reason = classify("eth_getLogs", &RequestParams::None, &result);
        assert_eq!(reason, Some(FallbackReason::NullResult));
    }

    #[test]
    fn null_result_ignored_for_latest_block_tag() {
        let result = ResponseResult::Success(serde_json::Value::Null);
        let p = params(vec![json!("latest"), json!(false)]);
        let reason = classify("eth_getBlockByNumber", &p, &result);
        assert_eq!(reason, None);
    }

    #[test]
    fn null_result_triggers_for_specific_block_number() {
        let result = ResponseResult::Success(serde_json::Value::Null);
        let p = params(vec![json!("0x10"), json!(false)]);
        let reason = classify("eth_getBlockByNumber", &p, &result);
        assert_eq!(reason, Some(FallbackReason::NullResult));
    }

    #[test]
    fn error_pattern_is_case_insensitive_after_lowercasing() {
        let error = RpcError::new(-32000, "Block Not Found on this node");
        let result = ResponseResult::Error(error);
        let reason = classify("eth_getBalance", &RequestParams::None, &result);
        assert_eq!(reason, Some(FallbackReason::ErrorPattern));
    }

    #[test]
    fn block_tolerance_only_applies_to_eth_call_latest() {
        let error = RpcError::new(-32000, "deterministic error encountered");
        let result = ResponseResult::Error(error.clone());

        let p = params(vec![json!({}), json!("latest")]);
        assert_eq!(
            classify("eth_call", &p, &result),
            Some(FallbackReason::BlockTolerance)
        );

        let pinned = params(vec![json!({}), json!("0x10")]);
        assert_eq!(classify("eth_call", &pinned, &result), None);

        assert_eq!(classify("eth_getBalance", &p, &result), None);
    }

    #[test]
    fn unrelated_error_does_not_trigger_fallback() {
        let error = RpcError::new(-32602, "invalid params");
        let result = ResponseResult::Error(error);
        assert_eq!(classify("eth_getBalance", &RequestParams::None, &result), None);
    }
}
