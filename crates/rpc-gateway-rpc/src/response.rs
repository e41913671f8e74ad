use serde::de::{Deserializer, Error as _, MapAccess, Visitor};
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::error::RpcError;
use crate::request::Id;

/// Either the `result` or the `error` half of a JSON-RPC response.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseResult {
    Success(Value),
    Error(RpcError),
}

impl ResponseResult {
    pub fn is_success(&self) -> bool {
        matches!(self, ResponseResult::Success(_))
    }

    pub fn as_success(&self) -> Option<&Value> {
        match self {
            ResponseResult::Success(v) => Some(v),
            ResponseResult::Error(_) => None,
        }
    }

    pub fn as_error(&self) -> Option<&RpcError> {
        match self {
            ResponseResult::Error(e) => Some(e),
            ResponseResult::Success(_) => None,
        }
    }
}

/// A complete JSON-RPC response envelope.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcResponse {
    pub id: Id,
    pub result: ResponseResult,
}

impl RpcResponse {
    pub fn new(id: Id, result: ResponseResult) -> Self {
        Self { id, result }
    }

    pub fn success(id: Id, value: Value) -> Self {
        Self::new(id, ResponseResult::Success(value))
    }

    pub fn error(id: Id, error: RpcError) -> Self {
        Self::new(id, ResponseResult::Error(error))
    }

    pub fn invalid_request(id: Id) -> Self {
        Self::error(id, RpcError::invalid_request())
    }
}

impl Serialize for RpcResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(3))?;
        map.serialize_entry("jsonrpc", "2.0")?;
        map.serialize_entry("id", &self.id)?;
        match &self.result {
            ResponseResult::Success(value) => map.serialize_entry("result", value)?,
            ResponseResult::Error(error) => map.serialize_entry("error", error)?,
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for RpcResponse {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct RpcResponseVisitor;

        impl<'de> Visitor<'de> for RpcResponseVisitor {
            type Value = RpcResponse;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a JSON-RPC response object")
            }

            fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut id: Option<Id> = None;
                let mut result: Option<Value> = None;
                let mut error: Option<RpcError> = None;

                while let Some(key) = map.next_key::<String>()? {
                    match key.as_str() {
                        "id" => id = Some(map.next_value()?),
                        "result" => result = Some(map.next_value()?),
                        "error" => error = Some(map.next_value()?),
                        _ => {
                            let _ignored: Value = map.next_value()?;
                        }
                    }
                }

                let id = id.unwrap_or(Id::Null);
                match (result, error) {
                    (Some(_), Some(_)) => {
                        Err(A::Error::custom("response contains both result and error"))
                    }
                    (Some(result), None) => Ok(RpcResponse::success(id, result)),
                    (None, Some(error)) => Ok(RpcResponse::error(id, error)),
                    (None, None) => {
                        Err(A::Error::custom("response missing both result and error"))
                    }
                }
            }
        }

        deserializer.deserialize_map(RpcResponseVisitor)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn success_roundtrip() {
        let response = RpcResponse::success(Id::Number(1), json!("0x1"));
        let encoded = serde_json::to_string(&response).unwrap();
        let decoded: RpcResponse = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, response);
    }

    #[test]
    fn error_roundtrip() {
        let response = RpcResponse::error(Id::String("a".into()), RpcError::method_not_found());
        let encoded = serde_json::to_string(&response).unwrap();
        let decoded: RpcResponse = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, response);
    }

    #[test]
    fn missing_result_and_error_is_rejected() {
        let raw = r#"{"jsonrpc":"2.0","id":1}"#;
        let result: Result<RpcResponse, _> = serde_json::from_str(raw);
        assert!(result.is_err());
    }
}
