//! Wire types for the control-plane RPC surface.
//!
//! Every response travels in the same envelope (`success`, `code`,
//! `message`, `requestId`, `httpStatusCode`, `data`); the `data` member is
//! operation-specific. Payload structs default every field so a decodable
//! JSON object never fails to map, whatever the server omits.

use serde::{Deserialize, Serialize};

use crate::models::context::Context;

/// Common response envelope for all control-plane operations.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEnvelope {
    /// Application-level success flag.
    #[serde(default)]
    pub success: bool,
    /// Server-side error code, empty on success.
    #[serde(default)]
    pub code: String,
    /// Server-side message, empty on success.
    #[serde(default)]
    pub message: String,
    /// Request identifier; propagated verbatim onto results.
    #[serde(default)]
    pub request_id: String,
    /// HTTP status the gateway attached, when present.
    #[serde(default)]
    pub http_status_code: Option<u16>,
    /// Operation-specific payload.
    #[serde(default)]
    pub data: Option<serde_json::Value>,
}

/// Decoded successful response: request id plus the typed payload, when
/// the server sent one of the expected shape.
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    /// Request identifier from the envelope.
    pub request_id: String,
    /// Decoded payload; `None` when absent or mis-shaped.
    pub data: Option<T>,
}

// ── Requests ─────────────────────────────────────────────────

/// One mount declaration inside a `CreateSession` request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistenceData {
    /// Context to materialize.
    pub context_id: String,
    /// Sandbox path to materialize at.
    pub path: String,
    /// JSON-encoded sync policy; absent means server defaults.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy: Option<String>,
}

/// `CreateSession` request body.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionRequest {
    /// JSON-encoded label map.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<String>,
    /// Sandbox image to boot.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
    /// Server-side policy handle.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub policy_id: Option<String>,
    /// Request a VPC-mode session.
    pub vpc_resource: bool,
    /// Mount declarations.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub persistence_data_list: Vec<PersistenceData>,
    /// JSON-encoded extra configuration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extra_configs: Option<String>,
    /// JSON-encoded SDK statistics breadcrumb.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sdk_stats: Option<String>,
}

/// Request body for operations addressed by session id only.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionIdRequest {
    /// Target session.
    pub session_id: String,
}

/// `ListSession` request body.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSessionRequest {
    /// JSON-encoded label filter.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<String>,
    /// Page size.
    pub max_results: u32,
    /// Cursor from the previous page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

/// `CallMcpTool` request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallToolRequest {
    /// Target session.
    pub session_id: String,
    /// Tool name.
    pub name: String,
    /// JSON-encoded tool arguments.
    pub args: String,
}

/// `GetAndLoadInternalContext` request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalContextRequest {
    /// Target session.
    pub session_id: String,
    /// Internal context kinds to resolve, e.g. `file_transfer`.
    pub context_types: Vec<String>,
}

/// `SyncContext` request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncContextRequest {
    /// Target session.
    pub session_id: String,
    /// Restrict to one context; absent means every mount.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
    /// Restrict to one sandbox path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Direction token (`upload` | `download`).
    pub mode: String,
}

/// `GetContextInfo` request body.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextInfoRequest {
    /// Target session.
    pub session_id: String,
    /// Restrict to one context.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_id: Option<String>,
    /// Restrict to one sandbox path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Restrict to one task direction.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
}

/// Request body for presigned-URL minting.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUrlRequest {
    /// Owning context.
    pub context_id: String,
    /// Path within the context.
    pub file_path: String,
}

/// `GetContext` request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetContextRequest {
    /// Context display name.
    pub name: String,
    /// Create the context when it does not exist.
    pub allow_create: bool,
}

/// `ListContexts` request body.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListContextsRequest {
    /// Page size.
    pub max_results: u32,
    /// Cursor from the previous page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

/// `ModifyContext` request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModifyContextRequest {
    /// Context to rename.
    pub context_id: String,
    /// New display name.
    pub name: String,
}

/// `DeleteContext` request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteContextRequest {
    /// Context to delete.
    pub context_id: String,
}

/// `ListContextFiles` request body.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListContextFilesRequest {
    /// Owning context.
    pub context_id: String,
    /// Folder to list, relative to the context root.
    pub parent_folder_path: String,
    /// Page size.
    pub max_results: u32,
    /// Cursor from the previous page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_token: Option<String>,
}

/// `DeleteContextFile` request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteContextFileRequest {
    /// Owning context.
    pub context_id: String,
    /// Path within the context.
    pub file_path: String,
}

/// `SetLabel` request body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetLabelRequest {
    /// Target session.
    pub session_id: String,
    /// JSON-encoded label map.
    pub labels: String,
}

/// `GetLink` request body.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GetLinkRequest {
    /// Target session.
    pub session_id: String,
    /// Protocol to forward, e.g. `https`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_type: Option<String>,
    /// In-sandbox port to forward.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<i32>,
}

// ── Response payloads ────────────────────────────────────────

/// `CreateSession` payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionData {
    /// Opaque session identifier.
    #[serde(default)]
    pub session_id: Option<String>,
    /// Opaque resource URL for external wrappers.
    #[serde(default)]
    pub resource_url: String,
    /// Server-side app instance id; used for replay naming.
    #[serde(default)]
    pub app_instance_id: String,
    /// VPC agent host, present in VPC mode.
    #[serde(default)]
    pub network_interface_ip: Option<String>,
    /// VPC agent port, present in VPC mode.
    #[serde(default)]
    pub http_port: Option<u16>,
    /// Bearer token scoped to the VPC agent.
    #[serde(default)]
    pub token: Option<String>,
    /// Echo of the VPC flag.
    #[serde(default)]
    pub vpc_resource: Option<bool>,
}

/// `GetSession` payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetSessionData {
    /// Opaque session identifier.
    #[serde(default)]
    pub session_id: String,
    /// Server-side resource identifier.
    #[serde(default)]
    pub resource_id: String,
    /// Server-side app instance id.
    #[serde(default)]
    pub app_instance_id: String,
    /// VPC agent port.
    #[serde(default)]
    pub http_port: Option<u16>,
    /// VPC agent host.
    #[serde(default)]
    pub network_interface_ip: Option<String>,
    /// Bearer token scoped to the VPC agent.
    #[serde(default)]
    pub token: Option<String>,
    /// Whether the session runs in VPC mode.
    #[serde(default)]
    pub vpc_resource: Option<bool>,
    /// Opaque resource URL for external wrappers.
    #[serde(default)]
    pub resource_url: String,
    /// Lifecycle status token.
    #[serde(default)]
    pub status: String,
    /// Per-record success flag some gateways attach.
    #[serde(default)]
    pub success: Option<bool>,
}

/// One row in a `ListSession` page.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStub {
    /// Opaque session identifier.
    #[serde(default)]
    pub session_id: String,
}

/// `ListSession` payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListSessionData {
    /// Rows for this page.
    #[serde(default)]
    pub data: Vec<SessionStub>,
    /// Cursor for the next page; empty at the end.
    #[serde(default)]
    pub next_token: String,
    /// Echoed page size.
    #[serde(default)]
    pub max_results: Option<u32>,
    /// Total matching sessions, when the server counts them.
    #[serde(default)]
    pub total_count: Option<u32>,
}

/// One tool row from `ListMcpTools`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct McpToolEntry {
    /// Tool name.
    #[serde(default)]
    pub name: String,
    /// In-sandbox server hosting the tool.
    #[serde(default)]
    pub server: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: Option<String>,
}

/// One row from `GetAndLoadInternalContext`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InternalContextEntry {
    /// Context identifier.
    #[serde(default)]
    pub context_id: String,
    /// Sandbox path the context is mounted at.
    #[serde(default)]
    pub context_path: String,
}

/// `GetContextInfo` payload: the double-encoded status document.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContextInfoData {
    /// JSON string holding `[{type, data}, ...]`; the `data` members of
    /// `type="data"` entries are themselves JSON-encoded status arrays.
    #[serde(default)]
    pub context_status: String,
}

/// Presigned-URL payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UrlData {
    /// The presigned URL.
    #[serde(default)]
    pub url: Option<String>,
    /// Expiry, epoch seconds.
    #[serde(default)]
    pub expire_time: Option<i64>,
}

/// `ListContexts` payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListContextsData {
    /// Rows for this page.
    #[serde(default)]
    pub data: Vec<Context>,
    /// Cursor for the next page; empty at the end.
    #[serde(default)]
    pub next_token: String,
    /// Total matching contexts, when the server counts them.
    #[serde(default)]
    pub total_count: Option<u32>,
}

/// One row from `ListContextFiles`.
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContextFileEntry {
    /// File name within its folder.
    #[serde(default)]
    pub file_name: String,
    /// Full path within the context.
    #[serde(default)]
    pub file_path: String,
    /// Size in bytes, when known.
    #[serde(default)]
    pub size: Option<i64>,
    /// Last-modified timestamp, as the server formats it.
    #[serde(default)]
    pub modified_time: Option<String>,
}

/// `ListContextFiles` payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListContextFilesData {
    /// Rows for this page.
    #[serde(default)]
    pub entries: Vec<ContextFileEntry>,
    /// Cursor for the next page; empty at the end.
    #[serde(default)]
    pub next_token: String,
}

/// `GetLabel` payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelData {
    /// JSON-encoded label map.
    #[serde(default)]
    pub labels: Option<String>,
}

/// `GetLink` payload.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkData {
    /// Forwarding URL for the requested port.
    #[serde(default)]
    pub url: String,
}
