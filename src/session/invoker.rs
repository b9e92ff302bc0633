//! Tool dispatch: control-plane RPC in standard mode, direct agent HTTP
//! in VPC mode.
//!
//! Both paths normalize the heterogeneous response envelopes into the one
//! [`ToolResult`] shape. VPC calls resolve through the per-session tool
//! routing table and never touch the control plane.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::types::McpToolEntry;
use crate::api::ApiClient;
use crate::models::session::VpcConfig;
use crate::models::tool::ToolResult;
use crate::redact::redact_with_secret;
use crate::Result;

/// Dispatches tool calls for one session.
#[derive(Debug)]
pub(crate) struct ToolInvoker {
    api: Arc<ApiClient>,
    http: reqwest::Client,
    session_id: String,
    vpc: Option<VpcConfig>,
    timeout: Duration,
    routing: RwLock<HashMap<String, String>>,
}

impl ToolInvoker {
    pub(crate) fn new(
        api: Arc<ApiClient>,
        http: reqwest::Client,
        session_id: String,
        vpc: Option<VpcConfig>,
        timeout: Duration,
    ) -> Self {
        Self {
            api,
            http,
            session_id,
            vpc,
            timeout,
            routing: RwLock::new(HashMap::new()),
        }
    }

    /// Invoke `name` with `args`, honoring an optional cancellation token.
    ///
    /// Cancellation aborts the in-flight HTTP exchange; work the server
    /// already started is not rolled back.
    pub(crate) async fn call_tool(
        &self,
        name: &str,
        args: &Value,
        cancel: Option<&CancellationToken>,
    ) -> ToolResult {
        match cancel {
            Some(token) => {
                tokio::select! {
                    () = token.cancelled() => ToolResult::failure("tool call cancelled"),
                    result = self.dispatch(name, args) => result,
                }
            }
            None => self.dispatch(name, args).await,
        }
    }

    async fn dispatch(&self, name: &str, args: &Value) -> ToolResult {
        if self.vpc.is_some() {
            self.call_vpc(name, args).await
        } else {
            self.call_standard(name, args).await
        }
    }

    async fn call_standard(&self, name: &str, args: &Value) -> ToolResult {
        let args_json = args.to_string();
        debug!(session_id = %self.session_id, tool = name, "tool call via control plane");

        match self
            .api
            .call_mcp_tool(&self.session_id, name, args_json)
            .await
        {
            Ok(response) => {
                let request_id = response.request_id;
                let Some(payload) = response.data else {
                    return ToolResult {
                        success: false,
                        data: String::new(),
                        error_message: format!("tool '{name}' response carried no payload"),
                        request_id,
                    };
                };
                Self::result_from_payload(name, &payload, request_id)
            }
            Err(err) => ToolResult {
                success: false,
                data: String::new(),
                error_message: err.to_string(),
                request_id: err.request_id().to_owned(),
            },
        }
    }

    async fn call_vpc(&self, name: &str, args: &Value) -> ToolResult {
        let Some(vpc) = &self.vpc else {
            return ToolResult::failure("session has no vpc transport");
        };
        let server = match self.routing.read().await.get(name) {
            Some(server) => server.clone(),
            None => {
                return ToolResult::failure(format!("server not found for tool {name}"));
            }
        };

        let api_key = vpc
            .token
            .clone()
            .unwrap_or_else(|| self.api.api_key().to_owned());
        let args_json = args.to_string();
        let url = format!("http://{}:{}/callTool", vpc.agent_host, vpc.agent_port);
        debug!(session_id = %self.session_id, tool = name, server = %server, "tool call via vpc agent");

        let response = match self
            .http
            .get(&url)
            .query(&[
                ("server", server.as_str()),
                ("tool", name),
                ("args", args_json.as_str()),
                ("apiKey", api_key.as_str()),
            ])
            .timeout(self.timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(err) => {
                return ToolResult::failure(redact_with_secret(
                    &format!("vpc call for tool '{name}' failed: {err}"),
                    &api_key,
                ));
            }
        };

        let body: Value = match response.json().await {
            Ok(body) => body,
            Err(err) => {
                return ToolResult::failure(redact_with_secret(
                    &format!("vpc response for tool '{name}' was not json: {err}"),
                    &api_key,
                ));
            }
        };

        let payload = unwrap_vpc_payload(body);
        let mut result = Self::result_from_payload(name, &payload, String::new());
        result.error_message = redact_with_secret(&result.error_message, &api_key);
        result
    }

    fn result_from_payload(name: &str, payload: &Value, request_id: String) -> ToolResult {
        match extract_content(payload) {
            Ok((is_error, text)) => {
                if is_error {
                    ToolResult {
                        success: false,
                        data: String::new(),
                        error_message: text,
                        request_id,
                    }
                } else {
                    ToolResult {
                        success: true,
                        data: text,
                        error_message: String::new(),
                        request_id,
                    }
                }
            }
            Err(detail) => ToolResult {
                success: false,
                data: String::new(),
                error_message: format!("tool '{name}' returned an unexpected payload: {detail}"),
                request_id,
            },
        }
    }

    /// Replace the routing table with `entries`.
    pub(crate) async fn install_routing(&self, entries: Vec<McpToolEntry>) {
        let mut routing = self.routing.write().await;
        routing.clear();
        for entry in entries {
            if !entry.name.is_empty() {
                routing.insert(entry.name, entry.server);
            }
        }
    }

    /// Re-query the available tools and rebuild the routing table.
    ///
    /// # Errors
    ///
    /// Propagates the RPC failure; the existing table is left untouched.
    pub(crate) async fn refresh_routing(&self) -> Result<usize> {
        let response = self.api.list_mcp_tools(&self.session_id).await?;
        let entries = response.data.unwrap_or_default();
        let count = entries.len();
        self.install_routing(entries).await;
        debug!(session_id = %self.session_id, tools = count, "tool routing table refreshed");
        Ok(count)
    }
}

/// Normalize the VPC agent's possibly double-wrapped body.
///
/// When `data` is a JSON string the real result hides inside it (under
/// `result` when present); when `data` is an object it is the result;
/// with no `data` at all the body itself is taken. No shape errors out:
/// an unparsable `data` string is surfaced as plain text content.
fn unwrap_vpc_payload(body: Value) -> Value {
    match body.get("data") {
        Some(Value::String(raw)) => match serde_json::from_str::<Value>(raw) {
            Ok(parsed) => match parsed.get("result") {
                Some(result) => result.clone(),
                None => parsed,
            },
            Err(_) => {
                warn!("vpc data member was an unparsable string; passing it through as text");
                serde_json::json!({ "content": [{ "text": raw }] })
            }
        },
        Some(other) => other.clone(),
        None => body,
    }
}

/// Extract `(isError, joined text)` from a tool payload.
///
/// `content` items are joined with newlines in order; items without a
/// `text` member are skipped.
fn extract_content(payload: &Value) -> std::result::Result<(bool, String), String> {
    let Some(object) = payload.as_object() else {
        return Err(format!("expected an object, got {payload}"));
    };
    let is_error = object
        .get("isError")
        .and_then(Value::as_bool)
        .unwrap_or(false);
    let text = match object.get("content") {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| item.get("text").and_then(Value::as_str))
            .collect::<Vec<_>>()
            .join("\n"),
        Some(other) => return Err(format!("content is not an array: {other}")),
        None => String::new(),
    };
    Ok((is_error, text))
}
