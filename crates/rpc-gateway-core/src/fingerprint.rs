use std::sync::Mutex;
use std::time::{Duration, Instant};

use rpc_gateway_rpc::RequestParams;
use serde_json::Value;

/// How fresh a network's last observed block number must be before it can be used
/// to rewrite a `"latest"`/`"pending"` tag into a concrete block number.
const BLOCK_POINTER_MAX_AGE: Duration = Duration::from_secs(30);

/// The param index at which a given method carries a block tag, if any. Restricted
/// to `eth_call`: rewriting the tag on balance/code/storage/block-number reads would
/// silently substitute a potentially stale block for what the caller asked for.
fn block_tag_index(method: &str) -> Option<usize> {
    match method {
        "eth_call" => Some(1),
        _ => None,
    }
}

/// Tracks the most recently observed block number for one network, so that
/// `"latest"`/`"pending"` requests can be rewritten to a concrete block number
/// while the pointer is still fresh. This is what lets a burst of `"latest"`
/// reads collapse onto the infinitely-cacheable pinned-block entry.
#[derive(Debug, Default)]
pub struct BlockPointer {
    state: Mutex<Option<(String, Instant)>>,
}

impl BlockPointer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn observe(&self, hex_block_number: &str) {
        let mut state = self.state.lock().expect("block pointer mutex poisoned");
        *state = Some((hex_block_number.to_string(), Instant::now()));
    }

    fn fresh_value(&self) -> Option<String> {
        let state = self.state.lock().expect("block pointer mutex poisoned");
        let (value, observed_at) = state.as_ref()?;
        if observed_at.elapsed() <= BLOCK_POINTER_MAX_AGE {
            Some(value.clone())
        } else {
            None
        }
    }

    /// Rewrites a `"latest"`/`"pending"` tag to the fresh pinned block number, if any.
    /// Returns the original params unchanged when the method carries no tag, the
    /// supplied params don't actually carry the tag at the expected index, or the
    /// pointer is missing/stale.
    pub fn normalize(&self, method: &str, params: RequestParams) -> RequestParams {
        let Some(index) = block_tag_index(method) else {
            return params;
        };
        let RequestParams::Array(mut values) = params else {
            return params;
        };
        let Some(tag) = values.get(index).and_then(Value::as_str) else {
            return RequestParams::Array(values);
        };
        if tag != "latest" && tag != "pending" {
            return RequestParams::Array(values);
        }
        let Some(pinned) = self.fresh_value() else {
            return RequestParams::Array(values);
        };
        values[index] = Value::String(pinned);
        RequestParams::Array(values)
    }
}

/// Renders a single scalar the way a caller would write it in a URL or log line,
/// not its quoted JSON form -- `"latest"` rather than `"\"latest\""`.
fn scalar_as_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Builds the canonical cache/coalescing key for a `(network, method, params)` triple,
/// following the three-way branch: absent params (or an explicit empty array, which
/// a caller means the same way) collapse to the bare method name; a single positional
/// scalar serializes as itself rather than a one-element array; anything else falls
/// back to canonical JSON. `serde_json`'s default map is a `BTreeMap`, so object keys
/// already serialize in sorted order -- this is what makes the fingerprint stable
/// regardless of the client's original field ordering.
pub fn fingerprint(network: &str, method: &str, params: &RequestParams) -> String {
    let is_empty = params.is_none() || params.as_array().is_some_and(<[Value]>::is_empty);
    let suffix = if is_empty {
        method.to_string()
    } else if let Some(scalar) = params.single_scalar() {
        format!("{method}:{}", scalar_as_string(scalar))
    } else {
        let params_value: Value = Value::from(params.clone());
        let params_json = serde_json::to_string(&params_value).unwrap_or_default();
        format!("{method}:{params_json}")
    };
    format!("{network}:{suffix}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn fingerprint_is_stable_across_object_key_order() {
        let a = RequestParams::Array(vec![json!({"blockHash": "0x1", "to": "0x2"})]);
        let b = RequestParams::Array(vec![json!({"to": "0x2", "blockHash": "0x1"})]);
        assert_eq!(fingerprint("mainnet", "eth_call", &a), fingerprint("mainnet", "eth_call", &b));
    }

    #[test]
    fn fingerprint_differs_across_networks() {
        let params = RequestParams::None;
        assert_ne!(
            fingerprint("mainnet", "eth_chainId", &params),
            fingerprint("polygon", "eth_chainId", &params)
        );
    }

    #[test]
    fn single_scalar_param_fingerprints_as_bare_value_not_an_array() {
        let scalar = fingerprint("mainnet", "eth_getBlockByNumber", &RequestParams::Array(vec![json!(42)]));
        assert_eq!(scalar, "mainnet:eth_getBlockByNumber:42");

        let string_scalar = fingerprint("mainnet", "eth_call", &RequestParams::Array(vec![json!("latest")]));
        assert_eq!(string_scalar, "mainnet:eth_call:latest");
    }

    #[test]
    fn omitted_params_fingerprint_matches_empty_array() {
        let omitted = fingerprint("mainnet", "eth_chainId", &RequestParams::None);
        let empty_array = fingerprint("mainnet", "eth_chainId", &RequestParams::Array(vec![]));
        assert_eq!(omitted, empty_array);
    }

    #[test]
    fn fingerprint_is_idempotent_under_reserialization() {
        let params = RequestParams::Array(vec![json!({"to": "0x2", "blockHash": "0x1"})]);
        let once = fingerprint("mainnet", "eth_call", &params);
        let params_json = once.splitn(3, ':').nth(2).unwrap();
        let reparsed: Vec<Value> = serde_json::from_str(params_json).unwrap();
        let twice = fingerprint("mainnet", "eth_call", &RequestParams::Array(reparsed));
        assert_eq!(once, twice);
    }

    #[test]
    fn normalize_rewrites_latest_when_pointer_is_fresh() {
        let pointer = BlockPointer::new();
        pointer.observe("0x64");
        let params = RequestParams::Array(vec![json!({}), json!("latest")]);
        let normalized = pointer.normalize("eth_call", params);
        assert_eq!(normalized.get(1), Some(&json!("0x64")));
    }

    #[test]
    fn normalize_leaves_params_untouched_without_a_pointer() {
        let pointer = BlockPointer::new();
        let params = RequestParams::Array(vec![json!({}), json!("latest")]);
        let normalized = pointer.normalize("eth_call", params);
        assert_eq!(normalized.get(1), Some(&json!("latest")));
    }

    #[test]
    fn normalize_ignores_methods_without_a_block_tag() {
        let pointer = BlockPointer::new();
        pointer.observe("0x64");
        let params = RequestParams::Array(vec![json!("0xabc")]);
        let normalized = pointer.normalize("eth_getTransactionReceipt", params.clone());
        assert_eq!(normalized, params);
    }

    #[test]
    fn normalize_ignores_already_pinned_requests() {
        let pointer = BlockPointer::new();
        pointer.observe("0x64");
        let params = RequestParams::Array(vec![json!({}), json!("0x10")]);
        let normalized = pointer.normalize("eth_call", params.clone());
        assert_eq!(normalized, params);
    }
}
