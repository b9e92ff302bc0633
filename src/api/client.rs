//! Control-plane RPC client.
//!
//! One POST per logical operation, addressed as `{base}/{Operation}`, with
//! the bearer credential in the `Authorization` header and a per-request
//! timeout. No retries happen at this layer.

use std::time::Duration;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::api::types::{
    ApiEnvelope, ApiResponse, CallToolRequest, ContextInfoData, ContextInfoRequest,
    CreateSessionData, CreateSessionRequest, DeleteContextFileRequest, DeleteContextRequest,
    FileUrlRequest, GetContextRequest, GetLinkRequest, GetSessionData, InternalContextEntry,
    InternalContextRequest, LabelData, LinkData, ListContextFilesData, ListContextFilesRequest,
    ListContextsData, ListContextsRequest, ListSessionData, ListSessionRequest, McpToolEntry,
    ModifyContextRequest, SessionIdRequest, SetLabelRequest, SyncContextRequest, UrlData,
};
use crate::config::Config;
use crate::models::context::Context;
use crate::models::sync::SyncMode;
use crate::redact::redact_with_secret;
use crate::{Result, SdkError};

/// Thin RPC layer over the control-plane HTTP surface.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    timeout: Duration,
}

impl ApiClient {
    /// Build a client from resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns `SdkError::Transport` if the underlying HTTP client cannot
    /// be constructed.
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| SdkError::Transport(format!("failed to build http client: {err}")))?;
        Ok(Self {
            http,
            base_url: config.base_url(),
            api_key: config.api_key.clone(),
            timeout: config.timeout,
        })
    }

    /// The bearer credential this client signs requests with.
    #[must_use]
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    /// Issue one signed RPC and decode the envelope.
    ///
    /// Network failures surface as `Transport`, non-JSON bodies as
    /// `Protocol` (or `Transport` when the HTTP status already signals a
    /// gateway failure), and `success=false` envelopes as `Remote` or its
    /// `NotFound` subtype.
    async fn call(&self, operation: &str, body: &impl Serialize) -> Result<ApiEnvelope> {
        let url = format!("{}/{}", self.base_url, operation);
        debug!(operation, "control-plane rpc");

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(|err| {
                SdkError::Transport(redact_with_secret(
                    &format!("{operation} failed: {err}"),
                    &self.api_key,
                ))
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|err| {
            SdkError::Transport(redact_with_secret(
                &format!("{operation} body read failed: {err}"),
                &self.api_key,
            ))
        })?;

        let envelope: ApiEnvelope = match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(SdkError::Transport(format!("{operation} returned http {status}")));
            }
            Err(err) => {
                return Err(SdkError::Protocol(format!(
                    "{operation} returned undecodable envelope: {err}"
                )));
            }
        };

        if envelope.success {
            Ok(envelope)
        } else if is_not_found(&envelope.code, &envelope.message) {
            Err(SdkError::NotFound {
                message: envelope.message,
                request_id: envelope.request_id,
            })
        } else {
            Err(SdkError::Remote {
                code: envelope.code,
                message: envelope.message,
                request_id: envelope.request_id,
            })
        }
    }

    fn decode<T: DeserializeOwned>(operation: &str, envelope: ApiEnvelope) -> ApiResponse<T> {
        let request_id = envelope.request_id;
        let data = envelope.data.and_then(|value| {
            match serde_json::from_value::<T>(value) {
                Ok(data) => Some(data),
                Err(err) => {
                    warn!(operation, %err, "response data did not match the expected shape");
                    None
                }
            }
        });
        ApiResponse { request_id, data }
    }

    async fn call_decoded<T: DeserializeOwned>(
        &self,
        operation: &str,
        body: &impl Serialize,
    ) -> Result<ApiResponse<T>> {
        let envelope = self.call(operation, body).await?;
        Ok(Self::decode(operation, envelope))
    }

    // ── Session lifecycle ────────────────────────────────────

    /// Submit a session create.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn create_session(
        &self,
        request: &CreateSessionRequest,
    ) -> Result<ApiResponse<CreateSessionData>> {
        self.call_decoded("CreateSession", request).await
    }

    /// Query one session.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`]; a missing session surfaces as
    /// `SdkError::NotFound`.
    pub async fn get_session(&self, session_id: &str) -> Result<ApiResponse<GetSessionData>> {
        let request = SessionIdRequest {
            session_id: session_id.to_owned(),
        };
        self.call_decoded("GetSession", &request).await
    }

    /// Fetch one page of sessions.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn list_sessions(
        &self,
        request: &ListSessionRequest,
    ) -> Result<ApiResponse<ListSessionData>> {
        self.call_decoded("ListSession", request).await
    }

    /// Request asynchronous session deletion.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn delete_session(&self, session_id: &str) -> Result<ApiResponse<serde_json::Value>> {
        let request = SessionIdRequest {
            session_id: session_id.to_owned(),
        };
        self.call_decoded("DeleteSessionAsync", &request).await
    }

    /// Request an asynchronous pause.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn pause_session(&self, session_id: &str) -> Result<ApiResponse<serde_json::Value>> {
        let request = SessionIdRequest {
            session_id: session_id.to_owned(),
        };
        self.call_decoded("PauseSessionAsync", &request).await
    }

    /// Request an asynchronous resume.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn resume_session(&self, session_id: &str) -> Result<ApiResponse<serde_json::Value>> {
        let request = SessionIdRequest {
            session_id: session_id.to_owned(),
        };
        self.call_decoded("ResumeSessionAsync", &request).await
    }

    // ── Tool invocation ──────────────────────────────────────

    /// Invoke a tool through the control plane.
    ///
    /// The payload is returned raw; the invoker owns its normalization.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn call_mcp_tool(
        &self,
        session_id: &str,
        name: &str,
        args_json: String,
    ) -> Result<ApiResponse<serde_json::Value>> {
        let request = CallToolRequest {
            session_id: session_id.to_owned(),
            name: name.to_owned(),
            args: args_json,
        };
        self.call_decoded("CallMcpTool", &request).await
    }

    /// List the tools available in the sandbox and their owning servers.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn list_mcp_tools(
        &self,
        session_id: &str,
    ) -> Result<ApiResponse<Vec<McpToolEntry>>> {
        let request = SessionIdRequest {
            session_id: session_id.to_owned(),
        };
        self.call_decoded("ListMcpTools", &request).await
    }

    // ── Context sync ─────────────────────────────────────────

    /// Ask the server to move data between a mounted context and object
    /// storage. The server performs the copy asynchronously.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn sync_context(
        &self,
        session_id: &str,
        context_id: Option<&str>,
        path: Option<&str>,
        mode: SyncMode,
    ) -> Result<ApiResponse<serde_json::Value>> {
        let request = SyncContextRequest {
            session_id: session_id.to_owned(),
            context_id: context_id.map(str::to_owned),
            path: path.map(str::to_owned),
            mode: mode.as_str().to_owned(),
        };
        self.call_decoded("SyncContext", &request).await
    }

    /// Fetch the aggregated sync status document for a session.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn get_context_info(
        &self,
        request: &ContextInfoRequest,
    ) -> Result<ApiResponse<ContextInfoData>> {
        self.call_decoded("GetContextInfo", request).await
    }

    /// Resolve (and load) internal contexts of the given kinds.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn get_and_load_internal_context(
        &self,
        session_id: &str,
        context_types: Vec<String>,
    ) -> Result<ApiResponse<Vec<InternalContextEntry>>> {
        let request = InternalContextRequest {
            session_id: session_id.to_owned(),
            context_types,
        };
        self.call_decoded("GetAndLoadInternalContext", &request).await
    }

    // ── Context CRUD ─────────────────────────────────────────

    /// Fetch a context by name, optionally creating it.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn get_context(
        &self,
        name: &str,
        allow_create: bool,
    ) -> Result<ApiResponse<Context>> {
        let request = GetContextRequest {
            name: name.to_owned(),
            allow_create,
        };
        self.call_decoded("GetContext", &request).await
    }

    /// Fetch one page of contexts.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn list_contexts(
        &self,
        request: &ListContextsRequest,
    ) -> Result<ApiResponse<ListContextsData>> {
        self.call_decoded("ListContexts", request).await
    }

    /// Rename a context.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn modify_context(
        &self,
        context_id: &str,
        name: &str,
    ) -> Result<ApiResponse<serde_json::Value>> {
        let request = ModifyContextRequest {
            context_id: context_id.to_owned(),
            name: name.to_owned(),
        };
        self.call_decoded("ModifyContext", &request).await
    }

    /// Delete a context.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn delete_context(&self, context_id: &str) -> Result<ApiResponse<serde_json::Value>> {
        let request = DeleteContextRequest {
            context_id: context_id.to_owned(),
        };
        self.call_decoded("DeleteContext", &request).await
    }

    // ── Presigned URLs & context files ───────────────────────

    /// Mint a presigned upload URL for `(context, path)`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn get_file_upload_url(
        &self,
        context_id: &str,
        file_path: &str,
    ) -> Result<ApiResponse<UrlData>> {
        let request = FileUrlRequest {
            context_id: context_id.to_owned(),
            file_path: file_path.to_owned(),
        };
        self.call_decoded("GetFileUploadUrl", &request).await
    }

    /// Mint a presigned download URL for `(context, path)`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn get_file_download_url(
        &self,
        context_id: &str,
        file_path: &str,
    ) -> Result<ApiResponse<UrlData>> {
        let request = FileUrlRequest {
            context_id: context_id.to_owned(),
            file_path: file_path.to_owned(),
        };
        self.call_decoded("GetFileDownloadUrl", &request).await
    }

    /// Fetch one page of files stored in a context folder.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn list_context_files(
        &self,
        request: &ListContextFilesRequest,
    ) -> Result<ApiResponse<ListContextFilesData>> {
        self.call_decoded("ListContextFiles", request).await
    }

    /// Delete one file stored in a context.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn delete_context_file(
        &self,
        context_id: &str,
        file_path: &str,
    ) -> Result<ApiResponse<serde_json::Value>> {
        let request = DeleteContextFileRequest {
            context_id: context_id.to_owned(),
            file_path: file_path.to_owned(),
        };
        self.call_decoded("DeleteContextFile", &request).await
    }

    // ── Labels & links ───────────────────────────────────────

    /// Replace the label map on a session.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn set_label(
        &self,
        session_id: &str,
        labels_json: String,
    ) -> Result<ApiResponse<serde_json::Value>> {
        let request = SetLabelRequest {
            session_id: session_id.to_owned(),
            labels: labels_json,
        };
        self.call_decoded("SetLabel", &request).await
    }

    /// Fetch the label map of a session.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn get_label(&self, session_id: &str) -> Result<ApiResponse<LabelData>> {
        let request = SessionIdRequest {
            session_id: session_id.to_owned(),
        };
        self.call_decoded("GetLabel", &request).await
    }

    /// Mint a forwarding link for a port inside the sandbox.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::call`].
    pub async fn get_link(&self, request: &GetLinkRequest) -> Result<ApiResponse<LinkData>> {
        self.call_decoded("GetLink", request).await
    }
}

/// Whether a `success=false` envelope marks the target as gone rather
/// than a generic remote failure.
fn is_not_found(code: &str, message: &str) -> bool {
    let code = code.to_ascii_lowercase();
    code.contains("notfound") || message.to_ascii_lowercase().contains("not found")
}
