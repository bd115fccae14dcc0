//! JSON-RPC 2.0 envelopes for the stdio protocol.
//!
//! Payload types (tools, content, error data) come from [`rmcp::model`]; this
//! module only wraps them in request/response envelopes and decodes incoming
//! lines.

use rmcp::model::ErrorData;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

pub const JSONRPC_VERSION: &str = "2.0";

const NOTIFICATION_PREFIX: &str = "notifications/";

#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcRequest {
    pub id: Value,
    pub method: String,
    pub params: Option<Value>,
}

/// A decoded incoming message.
#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Request(JsonRpcRequest),
    /// No `id` member and a `notifications/` method; never answered.
    Notification { method: String },
}

#[derive(Debug, Error)]
#[error("{source}")]
pub struct DecodeError {
    /// Request id when it could be read before decoding failed, else null.
    pub id: Value,
    #[source]
    pub source: serde_json::Error,
}

#[derive(Debug, Deserialize)]
struct RawRequest {
    method: String,
    #[serde(default)]
    params: Option<Value>,
}

impl Message {
    /// Decodes one line of raw bytes. Bytes that are not valid UTF-8 fail here
    /// like any other malformed JSON.
    pub fn decode(raw: &[u8]) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_slice(raw).map_err(|source| DecodeError {
            id: Value::Null,
            source,
        })?;
        let id = value.get("id").cloned();

        let RawRequest { method, params } =
            serde_json::from_value(value).map_err(|source| DecodeError {
                id: id.clone().unwrap_or(Value::Null),
                source,
            })?;

        match id {
            None if method.starts_with(NOTIFICATION_PREFIX) => Ok(Message::Notification { method }),
            id => Ok(Message::Request(JsonRpcRequest {
                id: id.unwrap_or(Value::Null),
                method,
                params,
            })),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorData>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, error: ErrorData) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    /// Encodes the response as a single line without the trailing newline.
    pub fn to_line(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            // Only reachable if a result value fails to serialize.
            format!(
                r#"{{"jsonrpc":"2.0","id":null,"error":{{"code":-32603,"message":{}}}}}"#,
                Value::String(e.to_string())
            )
        })
    }
}
