use futures::FutureExt;
use rmcp::model::{
    CallToolRequestParam, ErrorCode, ErrorData, Implementation, InitializeResult,
    ListToolsResult, ProtocolVersion, ServerCapabilities,
};
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use thiserror::Error;

use crate::protocol::{DecodeError, JsonRpcRequest, JsonRpcResponse, Message};
use crate::tools::{DocTools, ToolError};

pub const METHOD_INITIALIZE: &str = "initialize";
pub const METHOD_LIST_TOOLS: &str = "tools/list";
pub const METHOD_CALL_TOOL: &str = "tools/call";

#[derive(Debug, Error)]
pub enum DispatchError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error("Method not found: {0}")]
    MethodNotFound(String),

    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error(transparent)]
    Tool(#[from] ToolError),

    #[error("Failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl DispatchError {
    /// Unknown methods get `-32601`; every other failure is an internal error.
    pub fn to_error_data(&self) -> ErrorData {
        match self {
            DispatchError::MethodNotFound(_) => {
                ErrorData::new(ErrorCode::METHOD_NOT_FOUND, self.to_string(), None)
            }
            _ => ErrorData::internal_error(self.to_string(), None),
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "request handler panicked".to_string()
    }
}

/// Routes decoded requests to the documentation tools.
///
/// Each request is handled to completion independently; the dispatcher holds
/// no per-connection state.
#[derive(Clone)]
pub struct Dispatcher {
    tools: DocTools,
}

impl Dispatcher {
    pub fn new(tools: DocTools) -> Self {
        Self { tools }
    }

    pub fn server_info(&self) -> InitializeResult {
        InitializeResult {
            protocol_version: ProtocolVersion::LATEST,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: env!("CARGO_PKG_NAME").to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
            instructions: Some(
                "This server provides Angular, TypeScript, RxJS, testing and Nx documentation. \
                 Use 'get_angular_docs' for the official Angular docs, 'get_tech_docs' for a \
                 technology and optional category, and 'get_custom_resource' for any URL. \
                 Results are cached for the rest of the day."
                    .to_string(),
            ),
        }
    }

    /// Handles one raw line. Returns `None` for notifications.
    pub async fn handle_line(&self, raw: &[u8]) -> Option<JsonRpcResponse> {
        match Message::decode(raw) {
            Ok(Message::Request(request)) => Some(self.handle_request(request).await),
            Ok(Message::Notification { method }) => {
                tracing::debug!("Received notification {}", method);
                None
            }
            Err(err) => {
                tracing::warn!("Failed to decode request: {}", err);
                let id = err.id.clone();
                Some(JsonRpcResponse::error(id, DispatchError::from(err).to_error_data()))
            }
        }
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> JsonRpcResponse {
        let id = request.id.clone();
        tracing::info!("Handling {} (id {})", request.method, id);

        let outcome = match AssertUnwindSafe(self.dispatch(request)).catch_unwind().await {
            Ok(outcome) => outcome,
            Err(payload) => Err(DispatchError::Internal(panic_message(payload))),
        };

        match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(err) => {
                tracing::error!("Request {} failed: {}", id, err);
                JsonRpcResponse::error(id, err.to_error_data())
            }
        }
    }

    async fn dispatch(&self, request: JsonRpcRequest) -> Result<Value, DispatchError> {
        match request.method.as_str() {
            METHOD_INITIALIZE => Ok(serde_json::to_value(self.server_info())?),
            METHOD_LIST_TOOLS => Ok(serde_json::to_value(ListToolsResult {
                next_cursor: None,
                tools: self.tools.definitions(),
            })?),
            METHOD_CALL_TOOL => {
                let params: CallToolRequestParam =
                    serde_json::from_value(request.params.unwrap_or(Value::Null))
                        .map_err(|e| DispatchError::InvalidParams(e.to_string()))?;
                tracing::info!("Calling tool {}", params.name);
                let result = self.tools.call(&params.name, params.arguments).await?;
                Ok(serde_json::to_value(result)?)
            }
            other => Err(DispatchError::MethodNotFound(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{Cache, InMemoryCache};
    use crate::catalog::Catalog;
    use crate::clock::{Clock, SystemClock};
    use crate::fetcher::HttpFetcher;
    use crate::resources::CachedFetcher;
    use crate::tools::AngularSources;
    use mockito::Server;
    use serde_json::json;
    use std::sync::Arc;
    use std::time::Duration;

    fn dispatcher_with(angular: AngularSources) -> Dispatcher {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);
        let cache: Arc<dyn Cache> = Arc::new(InMemoryCache::new(16, clock.clone()));
        let fetcher = CachedFetcher::new(HttpFetcher::new(Duration::from_secs(5)), cache, clock);
        Dispatcher::new(DocTools::new(fetcher, Arc::new(Catalog::default()), angular))
    }

    fn dispatcher() -> Dispatcher {
        dispatcher_with(AngularSources::default())
    }

    async fn roundtrip(d: &Dispatcher, request: Value) -> Value {
        let response = d.handle_line(request.to_string().as_bytes()).await.unwrap();
        serde_json::to_value(response).unwrap()
    }

    #[tokio::test]
    async fn test_initialize() {
        let d = dispatcher();
        let resp = roundtrip(&d, json!({"jsonrpc": "2.0", "id": 1, "method": "initialize", "params": {}})).await;

        assert_eq!(resp["jsonrpc"], "2.0");
        assert_eq!(resp["id"], 1);
        assert_eq!(resp["result"]["protocolVersion"], "2024-11-05");
        assert!(resp["result"]["capabilities"]["tools"].is_object());
        assert_eq!(resp["result"]["serverInfo"]["name"], env!("CARGO_PKG_NAME"));
        assert!(resp.get("error").is_none());
    }

    #[tokio::test]
    async fn test_ids_are_echoed_for_every_method() {
        let d = dispatcher();
        for (id, method) in [
            (json!(10), METHOD_INITIALIZE),
            (json!("list-1"), METHOD_LIST_TOOLS),
            (json!(12), "resources/list"),
        ] {
            let resp = roundtrip(&d, json!({"jsonrpc": "2.0", "id": id, "method": method})).await;
            assert_eq!(resp["id"], id, "method {}", method);
        }
    }

    #[tokio::test]
    async fn test_list_tools_is_stable() {
        let d = dispatcher();
        let request = json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"});

        let first = roundtrip(&d, request.clone()).await;
        let _ = roundtrip(&d, json!({"jsonrpc": "2.0", "id": 3, "method": "initialize"})).await;
        let second = roundtrip(&d, request).await;

        let tools = first["result"]["tools"].as_array().unwrap();
        assert_eq!(tools.len(), 3);
        let names: Vec<&str> = tools.iter().map(|t| t["name"].as_str().unwrap()).collect();
        assert_eq!(names, vec!["get_angular_docs", "get_tech_docs", "get_custom_resource"]);
        assert!(tools.iter().all(|t| t["inputSchema"].is_object()));
        assert_eq!(first["result"], second["result"]);
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let d = dispatcher();
        let resp = roundtrip(&d, json!({"jsonrpc": "2.0", "id": 4, "method": "prompts/list"})).await;

        assert_eq!(resp["id"], 4);
        assert_eq!(resp["error"]["code"], -32601);
        assert!(resp["error"]["message"].as_str().unwrap().contains("prompts/list"));
        assert!(resp.get("result").is_none());
    }

    #[tokio::test]
    async fn test_malformed_input_has_null_id() {
        let d = dispatcher();
        let resp = d.handle_line(b"{\"jsonrpc\": \"2.0\", \"id\": 5,").await.unwrap();
        let resp = serde_json::to_value(resp).unwrap();

        assert_eq!(resp["id"], Value::Null);
        assert_eq!(resp["error"]["code"], -32603);
        assert!(!resp["error"]["message"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_notification_gets_no_response() {
        let d = dispatcher();
        let resp = d
            .handle_line(br#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await;
        assert!(resp.is_none());
    }

    #[tokio::test]
    async fn test_call_tool_unknown_technology_is_success() {
        let d = dispatcher();
        let resp = roundtrip(
            &d,
            json!({
                "jsonrpc": "2.0",
                "id": 6,
                "method": "tools/call",
                "params": {"name": "get_tech_docs", "arguments": {"technology": "bogus"}}
            }),
        )
        .await;

        assert!(resp.get("error").is_none());
        assert_eq!(resp["result"]["isError"], false);
        let text = resp["result"]["content"][0]["text"].as_str().unwrap();
        assert_eq!(resp["result"]["content"][0]["type"], "text");
        for tech in ["angular", "typescript", "rxjs", "testing", "nx"] {
            assert!(text.contains(tech), "missing {} in {}", tech, text);
        }
    }

    #[tokio::test]
    async fn test_call_tool_fetches_through_tools() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/llms.txt")
            .with_body("Angular in brief")
            .expect(1)
            .create_async()
            .await;
        let d = dispatcher_with(AngularSources {
            summary: format!("{}/llms.txt", server.url()),
            full: format!("{}/llms-full.txt", server.url()),
        });

        let request = json!({
            "jsonrpc": "2.0",
            "id": 7,
            "method": "tools/call",
            "params": {"name": "get_angular_docs", "arguments": {"section": "summary"}}
        });
        let first = roundtrip(&d, request.clone()).await;
        let second = roundtrip(&d, request).await;

        m.assert_async().await;
        assert_eq!(
            first["result"]["content"][0]["text"],
            "# Angular Documentation (summary)\n\nAngular in brief"
        );
        assert_eq!(first["result"], second["result"]);
    }

    #[tokio::test]
    async fn test_call_tool_unknown_name_is_empty_success() {
        let d = dispatcher();
        let resp = roundtrip(
            &d,
            json!({"jsonrpc": "2.0", "id": 8, "method": "tools/call", "params": {"name": "nope", "arguments": {}}}),
        )
        .await;

        assert!(resp.get("error").is_none());
        assert_eq!(resp["result"]["content"][0]["text"], "");
    }

    #[tokio::test]
    async fn test_call_tool_without_params_is_internal_error() {
        let d = dispatcher();
        let resp = roundtrip(&d, json!({"jsonrpc": "2.0", "id": 9, "method": "tools/call"})).await;

        assert_eq!(resp["id"], 9);
        assert_eq!(resp["error"]["code"], -32603);
    }

    #[tokio::test]
    async fn test_call_tool_bad_arguments_is_internal_error() {
        let d = dispatcher();
        let resp = roundtrip(
            &d,
            json!({"jsonrpc": "2.0", "id": 11, "method": "tools/call", "params": {"name": "get_custom_resource", "arguments": {}}}),
        )
        .await;

        assert_eq!(resp["error"]["code"], -32603);
        assert!(resp["error"]["message"].as_str().unwrap().contains("url"));
    }

    #[test]
    fn test_panic_message_extraction() {
        assert_eq!(panic_message(Box::new("boom")), "boom");
        assert_eq!(panic_message(Box::new("kaboom".to_string())), "kaboom");
        assert_eq!(panic_message(Box::new(42u8)), "request handler panicked");
    }
}
