//! JSON-RPC 2.0 wire types.

use chainevents_core::error::TransportError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// JSON-RPC request ID: string, number, or null.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RpcId {
    Number(u64),
    String(String),
    Null,
}

impl std::fmt::Display for RpcId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Null => write!(f, "null"),
        }
    }
}

/// A JSON-RPC 2.0 request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    pub jsonrpc: String,
    pub method: String,
    pub params: Vec<Value>,
    pub id: RpcId,
}

impl JsonRpcRequest {
    pub fn new(id: u64, method: impl Into<String>, params: Vec<Value>) -> Self {
        Self {
            jsonrpc: "2.0".into(),
            method: method.into(),
            params,
            id: RpcId::Number(id),
        }
    }
}

/// A JSON-RPC 2.0 error object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// A JSON-RPC 2.0 response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: RpcId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    /// Unwrap the result value, mapping a JSON-RPC error object to
    /// `TransportError::Rpc`.
    pub fn into_result(self) -> Result<Value, TransportError> {
        match self.error {
            Some(err) => Err(TransportError::Rpc {
                code: err.code,
                message: err.message,
            }),
            None => Ok(self.result.unwrap_or(Value::Null)),
        }
    }
}

/// A server push on an `eth_subscribe` stream.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscriptionNotification {
    pub method: String,
    pub params: NotificationParams,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationParams {
    pub subscription: String,
    pub result: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_serialization() {
        let req = JsonRpcRequest::new(7, "eth_getLogs", vec![json!({"address": []})]);
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(json["jsonrpc"], "2.0");
        assert_eq!(json["method"], "eth_getLogs");
        assert_eq!(json["id"], 7);
    }

    #[test]
    fn error_response_maps_to_rpc_error() {
        let resp: JsonRpcResponse = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": 1,
            "error": {"code": -32005, "message": "query returned more than 10000 results"}
        }))
        .unwrap();
        match resp.into_result() {
            Err(TransportError::Rpc { code, message }) => {
                assert_eq!(code, -32005);
                assert!(message.contains("10000"));
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn null_result_is_ok() {
        let resp: JsonRpcResponse =
            serde_json::from_value(json!({"jsonrpc": "2.0", "id": "a", "result": null})).unwrap();
        assert_eq!(resp.id, RpcId::String("a".into()));
        assert_eq!(resp.into_result().unwrap(), Value::Null);
    }

    #[test]
    fn parses_notification() {
        let n: SubscriptionNotification = serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "method": "eth_subscription",
            "params": {"subscription": "0xabc", "result": {"removed": false}}
        }))
        .unwrap();
        assert_eq!(n.method, "eth_subscription");
        assert_eq!(n.params.subscription, "0xabc");
    }
}
