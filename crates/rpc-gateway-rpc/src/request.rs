use serde::de::{Deserializer, Error as _};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The JSON-RPC protocol version tag. Only "2.0" is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Version;

impl Serialize for Version {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str("2.0")
    }
}

impl<'de> Deserialize<'de> for Version {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == "2.0" {
            Ok(Version)
        } else {
            Err(D::Error::custom(format!("unsupported jsonrpc version: {s}")))
        }
    }
}

/// A JSON-RPC request/response id. Batches may mix numeric, string, and null ids.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Id {
    Number(i64),
    String(String),
    Null,
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Id::Number(n) => serializer.serialize_i64(*n),
            Id::String(s) => serializer.serialize_str(s),
            Id::Null => serializer.serialize_unit(),
        }
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Id::try_from(value).map_err(D::Error::custom)
    }
}

impl TryFrom<Value> for Id {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(Id::Null),
            Value::String(s) => Ok(Id::String(s)),
            Value::Number(n) => n
                .as_i64()
                .map(Id::Number)
                .ok_or_else(|| format!("id out of range: {n}")),
            other => Err(format!("invalid id: {other}")),
        }
    }
}

impl std::fmt::Display for Id {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Id::Number(n) => write!(f, "{n}"),
            Id::String(s) => write!(f, "{s}"),
            Id::Null => write!(f, "null"),
        }
    }
}

/// `params` is array, object, or absent — the three shapes JSON-RPC 2.0 allows.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum RequestParams {
    #[default]
    None,
    Array(Vec<Value>),
    Object(Map<String, Value>),
}

impl RequestParams {
    pub fn is_none(&self) -> bool {
        matches!(self, RequestParams::None)
    }

    /// A single positional scalar, if params is a one-element array of a scalar JSON value.
    pub fn single_scalar(&self) -> Option<&Value> {
        match self {
            RequestParams::Array(values) if values.len() == 1 => {
                let v = &values[0];
                (!v.is_array() && !v.is_object()).then_some(v)
            }
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            RequestParams::Array(values) => Some(values),
            _ => None,
        }
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.as_array().and_then(|a| a.get(index))
    }
}

impl From<RequestParams> for Value {
    fn from(params: RequestParams) -> Self {
        match params {
            RequestParams::None => Value::Null,
            RequestParams::Array(values) => Value::Array(values),
            RequestParams::Object(map) => Value::Object(map),
        }
    }
}

impl TryFrom<Value> for RequestParams {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(RequestParams::None),
            Value::Array(values) => Ok(RequestParams::Array(values)),
            Value::Object(map) => Ok(RequestParams::Object(map)),
            other => Err(format!("params must be an array, object, or absent: {other}")),
        }
    }
}

/// A single `{method, params, id}` JSON-RPC call.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcMethodCall {
    pub method: String,
    pub params: RequestParams,
    pub id: Id,
}

/// A notification: a method call with no `id`, which produces no reply under the bare
/// JSON-RPC spec. This gateway still returns a positional reply for these (see the
/// dispatcher), so the distinction only matters for id substitution.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcNotification {
    pub method: String,
    pub params: RequestParams,
}

/// One item of a (possibly batched) incoming request.
#[derive(Debug, Clone, PartialEq)]
pub enum RpcCall {
    MethodCall(RpcMethodCall),
    Notification(RpcNotification),
    Invalid { id: Id },
}

impl RpcCall {
    pub fn id(&self) -> Id {
        match self {
            RpcCall::MethodCall(call) => call.id.clone(),
            RpcCall::Notification(_) => Id::Null,
            RpcCall::Invalid { id } => id.clone(),
        }
    }

    pub fn method(&self) -> Option<&str> {
        match self {
            RpcCall::MethodCall(call) => Some(&call.method),
            RpcCall::Notification(n) => Some(&n.method),
            RpcCall::Invalid { .. } => None,
        }
    }
}

#[derive(Deserialize)]
struct RawCall {
    jsonrpc: Option<Value>,
    method: Option<String>,
    #[serde(default)]
    params: Option<Value>,
    id: Option<Value>,
}

impl<'de> Deserialize<'de> for RpcCall {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = RawCall::deserialize(deserializer)?;

        let id = match raw.id {
            Some(v) => Some(Id::try_from(v).map_err(D::Error::custom)?),
            None => None,
        };

        let is_v2 = matches!(&raw.jsonrpc, Some(Value::String(s)) if s == "2.0");
        let method = match (&raw.method, is_v2) {
            (Some(method), true) => method.clone(),
            _ => return Ok(RpcCall::Invalid { id: id.unwrap_or(Id::Null) }),
        };

        let params = match raw.params {
            Some(v) => RequestParams::try_from(v).map_err(D::Error::custom)?,
            None => RequestParams::None,
        };

        Ok(match id {
            Some(id) => RpcCall::MethodCall(RpcMethodCall { method, params, id }),
            None => RpcCall::Notification(RpcNotification { method, params }),
        })
    }
}

impl Serialize for RpcCall {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let (method, params, id) = match self {
            RpcCall::MethodCall(call) => (&call.method, &call.params, Some(&call.id)),
            RpcCall::Notification(n) => (&n.method, &n.params, None),
            RpcCall::Invalid { id } => {
                let mut map = serializer.serialize_map(Some(3))?;
                map.serialize_entry("jsonrpc", "2.0")?;
                map.serialize_entry("id", id)?;
                return map.end();
            }
        };

        let len = 2 + usize::from(!params.is_none()) + usize::from(id.is_some());
        let mut map = serializer.serialize_map(Some(len))?;
        map.serialize_entry("jsonrpc", "2.0")?;
        map.serialize_entry("method", method)?;
        if !params.is_none() {
            map.serialize_entry("params", &Value::from(params.clone()))?;
        }
        if let Some(id) = id {
            map.serialize_entry("id", id)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn method_call_roundtrip() {
        let raw = br#"{"jsonrpc":"2.0","method":"eth_getBlockByNumber","params":["0x1",false],"id":1}"#;
        let call: RpcCall = serde_json::from_slice(raw).unwrap();
        assert_eq!(
            call,
            RpcCall::MethodCall(RpcMethodCall {
                method: "eth_getBlockByNumber".into(),
                params: RequestParams::Array(vec![json!("0x1"), json!(false)]),
                id: Id::Number(1),
            })
        );
    }

    #[test]
    fn params_absent_becomes_none() {
        let raw = br#"{"jsonrpc":"2.0","method":"eth_blockNumber","id":1}"#;
        let call: RpcCall = serde_json::from_slice(raw).unwrap();
        match call {
            RpcCall::MethodCall(call) => assert_eq!(call.params, RequestParams::None),
            other => panic!("expected method call, got {other:?}"),
        }
    }

    #[test]
    fn missing_id_is_notification() {
        let raw = br#"{"jsonrpc":"2.0","method":"eth_subscribe","params":[]}"#;
        let call: RpcCall = serde_json::from_slice(raw).unwrap();
        assert_eq!(
            call,
            RpcCall::Notification(RpcNotification {
                method: "eth_subscribe".into(),
                params: RequestParams::Array(vec![]),
            })
        );
    }

    #[test]
    fn bad_version_is_invalid() {
        let raw = br#"{"jsonrpc":"1.0","method":"eth_blockNumber","id":5}"#;
        let call: RpcCall = serde_json::from_slice(raw).unwrap();
        assert_eq!(call, RpcCall::Invalid { id: Id::Number(5) });
    }

    #[test]
    fn single_scalar_param_detection() {
        let params = RequestParams::Array(vec![json!("latest")]);
        assert_eq!(params.single_scalar(), Some(&json!("latest")));

        let params = RequestParams::Array(vec![json!({"a": 1})]);
        assert_eq!(params.single_scalar(), None);
    }
}
