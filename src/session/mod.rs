//! Per-session facade: tool calls, lifecycle, labels, links, and access
//! to the transfer and sync engines plus the in-session tool wrappers.

pub mod invoker;
pub mod manager;

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::api::types::GetLinkRequest;
use crate::api::ApiClient;
use crate::context::store::ContextService;
use crate::context::sync::{ContextSync, DEFAULT_POLL_INTERVAL};
use crate::models::context::{Context, ContextMount};
use crate::models::result::OperationResult;
use crate::models::session::{SessionState, VpcConfig};
use crate::models::sync::SyncMode;
use crate::models::tool::ToolResult;
use crate::session::invoker::ToolInvoker;
use crate::session::manager::SessionRegistry;
use crate::tools::app::AppManager;
use crate::tools::browser::Browser;
use crate::tools::code::Code;
use crate::tools::command::Command;
use crate::tools::filesystem::FileSystem;
use crate::tools::ui::Ui;
use crate::tools::window::WindowManager;
use crate::transfer::FileTransfer;
use crate::{Result, SdkError};

/// Budget for flushing auto-upload mounts during delete-with-sync.
const UPLOAD_FLUSH_TIMEOUT: Duration = Duration::from_secs(300);

/// Valid forwarding port range for [`Session::get_link`].
const LINK_PORT_RANGE: std::ops::RangeInclusive<i32> = 30100..=30199;

/// The session's file-transfer context, once resolved.
#[derive(Debug, Clone)]
pub(crate) struct FileTransferContext {
    /// Context identifier.
    pub id: String,
    /// Whether the SDK created it and should purge it on delete.
    pub owned: bool,
}

/// Labels attached to a session.
#[derive(Debug, Clone, Default)]
pub struct LabelResult {
    /// Request identifier from the underlying RPC.
    pub request_id: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Failure detail; empty on success.
    pub error_message: String,
    /// The label map.
    pub labels: HashMap<String, String>,
}

/// A forwarding link into the sandbox.
#[derive(Debug, Clone, Default)]
pub struct LinkResult {
    /// Request identifier from the underlying RPC.
    pub request_id: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Failure detail; empty on success.
    pub error_message: String,
    /// The forwarding URL.
    pub url: String,
}

/// Everything the manager resolves before assembling a session.
pub(crate) struct SessionSeed {
    pub id: String,
    pub resource_url: String,
    pub image_id: String,
    pub app_instance_id: String,
    pub vpc: Option<VpcConfig>,
    pub mounts: Vec<ContextMount>,
    pub file_transfer: Option<FileTransferContext>,
    pub keep_file_transfer_context: bool,
    pub replay_context_id: Option<String>,
}

/// An ephemeral remote sandbox.
///
/// Safe to share across tasks; the routing table is written once at
/// create time and once per successful tool-list refresh, and everything
/// else is read-only after construction.
pub struct Session {
    id: String,
    api: Arc<ApiClient>,
    http: reqwest::Client,
    invoker: ToolInvoker,
    registry: SessionRegistry,
    contexts: ContextService,
    resource_url: String,
    image_id: String,
    app_instance_id: String,
    vpc: Option<VpcConfig>,
    mounts: Vec<ContextMount>,
    file_transfer: Mutex<Option<FileTransferContext>>,
    keep_file_transfer_context: bool,
    replay_context_id: Option<String>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("vpc", &self.vpc.is_some())
            .field("image_id", &self.image_id)
            .finish_non_exhaustive()
    }
}

impl Session {
    pub(crate) fn new(
        seed: SessionSeed,
        api: Arc<ApiClient>,
        http: reqwest::Client,
        registry: SessionRegistry,
        contexts: ContextService,
        timeout: Duration,
    ) -> Self {
        let invoker = ToolInvoker::new(
            Arc::clone(&api),
            http.clone(),
            seed.id.clone(),
            seed.vpc.clone(),
            timeout,
        );
        Self {
            id: seed.id,
            api,
            http,
            invoker,
            registry,
            contexts,
            resource_url: seed.resource_url,
            image_id: seed.image_id,
            app_instance_id: seed.app_instance_id,
            vpc: seed.vpc,
            mounts: seed.mounts,
            file_transfer: Mutex::new(seed.file_transfer),
            keep_file_transfer_context: seed.keep_file_transfer_context,
            replay_context_id: seed.replay_context_id,
        }
    }

    // ── Accessors ────────────────────────────────────────────

    /// Opaque session identifier.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Opaque resource URL consumed by external wrappers.
    #[must_use]
    pub fn resource_url(&self) -> &str {
        &self.resource_url
    }

    /// Image the session was booted from; affects tool availability.
    #[must_use]
    pub fn image_id(&self) -> &str {
        &self.image_id
    }

    /// Whether tool calls bypass the control plane.
    #[must_use]
    pub fn is_vpc(&self) -> bool {
        self.vpc.is_some()
    }

    /// Replay context created for this session, when replay was enabled.
    #[must_use]
    pub fn replay_context_id(&self) -> Option<&str> {
        self.replay_context_id.as_deref()
    }

    /// The file-transfer context id, when one has been resolved.
    pub async fn file_transfer_context_id(&self) -> Option<String> {
        self.file_transfer
            .lock()
            .await
            .as_ref()
            .map(|context| context.id.clone())
    }

    /// Server-side app instance id backing this session.
    #[must_use]
    pub fn app_instance_id(&self) -> &str {
        &self.app_instance_id
    }

    pub(crate) fn http(&self) -> &reqwest::Client {
        &self.http
    }

    pub(crate) fn contexts(&self) -> &ContextService {
        &self.contexts
    }

    // ── Tool invocation ──────────────────────────────────────

    /// Invoke a tool inside the sandbox.
    pub async fn call_tool(&self, name: &str, args: serde_json::Value) -> ToolResult {
        self.invoker.call_tool(name, &args, None).await
    }

    /// [`Session::call_tool`] honoring a cancellation token.
    pub async fn call_tool_with_cancel(
        &self,
        name: &str,
        args: serde_json::Value,
        cancel: &CancellationToken,
    ) -> ToolResult {
        self.invoker.call_tool(name, &args, Some(cancel)).await
    }

    /// Re-query the in-sandbox tool list and rebuild the VPC routing
    /// table. Meaningful only for VPC sessions; tool calls fail with
    /// "server not found" until a refresh succeeds.
    pub async fn refresh_tool_routing(&self) -> OperationResult {
        match self.invoker.refresh_routing().await {
            Ok(count) => {
                info!(session_id = %self.id, tools = count, "tool routing populated");
                OperationResult::ok("")
            }
            Err(err) => OperationResult::from_error(&err),
        }
    }

    // ── Lifecycle ────────────────────────────────────────────

    /// Delete this session.
    ///
    /// With `sync_context`, every mount whose policy asks for
    /// auto-upload is flushed back to its context first, whether the
    /// caller declared it or create folded it in (the browser-data
    /// mount); flush failures are logged and do not block the delete.
    /// The SDK-owned file-transfer context is purged afterwards unless
    /// the session was created with `keep_file_transfer_context`.
    pub async fn delete(&self, sync_context: bool) -> OperationResult {
        if sync_context {
            let engine = self.context_sync();
            for mount in self.mounts.iter().filter(|m| m.wants_auto_upload()) {
                let flush = engine
                    .sync_and_wait(
                        Some(&mount.context_id),
                        Some(&mount.path),
                        SyncMode::Upload,
                        UPLOAD_FLUSH_TIMEOUT,
                        DEFAULT_POLL_INTERVAL,
                        None,
                    )
                    .await;
                if !flush.success {
                    warn!(
                        context_id = %mount.context_id,
                        path = %mount.path,
                        error = %flush.error_message,
                        "pre-delete flush failed"
                    );
                }
            }
        }

        let outcome = self.api.delete_session(&self.id).await;
        self.registry.write().await.remove(&self.id);

        if outcome.is_ok() && !self.keep_file_transfer_context {
            self.purge_owned_file_transfer_context().await;
        }

        match outcome {
            Ok(response) => {
                info!(session_id = %self.id, "session deleted");
                OperationResult::ok(response.request_id)
            }
            Err(err) => OperationResult::from_error(&err),
        }
    }

    async fn purge_owned_file_transfer_context(&self) {
        let owned_id = {
            let guard = self.file_transfer.lock().await;
            guard
                .as_ref()
                .filter(|context| context.owned)
                .map(|context| context.id.clone())
        };
        if let Some(id) = owned_id {
            let context = Context {
                id,
                ..Context::default()
            };
            let purge = self.contexts.delete(&context).await;
            if !purge.success {
                warn!(
                    session_id = %self.id,
                    error = %purge.error_message,
                    "file-transfer context purge failed"
                );
            }
        }
    }

    /// Request a pause without waiting for it to settle.
    pub async fn pause_async(&self) -> OperationResult {
        match self.api.pause_session(&self.id).await {
            Ok(response) => OperationResult::ok(response.request_id),
            Err(err) => OperationResult::from_error(&err),
        }
    }

    /// Request a resume without waiting for it to settle.
    pub async fn resume_async(&self) -> OperationResult {
        match self.api.resume_session(&self.id).await {
            Ok(response) => OperationResult::ok(response.request_id),
            Err(err) => OperationResult::from_error(&err),
        }
    }

    /// Pause and poll until the session reports `paused`.
    pub async fn pause(&self, timeout: Duration, poll_interval: Duration) -> OperationResult {
        let request = self.pause_async().await;
        if !request.success {
            return request;
        }
        self.await_state(SessionState::Paused, request.request_id, timeout, poll_interval)
            .await
    }

    /// Resume and poll until the session reports `running`.
    pub async fn resume(&self, timeout: Duration, poll_interval: Duration) -> OperationResult {
        let request = self.resume_async().await;
        if !request.success {
            return request;
        }
        self.await_state(SessionState::Running, request.request_id, timeout, poll_interval)
            .await
    }

    /// Poll `GetSession` until the status token maps to `target`.
    ///
    /// `pausing`/`resuming`/unknown tokens keep polling; budget
    /// exhaustion yields a timeout failure.
    async fn await_state(
        &self,
        target: SessionState,
        request_id: String,
        timeout: Duration,
        poll_interval: Duration,
    ) -> OperationResult {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            match self.fetch_state().await {
                Ok(state) if state == target => {
                    return OperationResult::ok(request_id);
                }
                Ok(state) => {
                    tracing::debug!(session_id = %self.id, ?state, ?target, "still settling");
                }
                Err(err) => {
                    warn!(session_id = %self.id, %err, "state poll failed");
                }
            }
            if tokio::time::Instant::now() + poll_interval > deadline {
                return OperationResult {
                    request_id,
                    success: false,
                    error_message: format!(
                        "timeout: session did not reach {target:?} within {} ms",
                        timeout.as_millis()
                    ),
                };
            }
            tokio::time::sleep(poll_interval).await;
        }
    }

    async fn fetch_state(&self) -> Result<SessionState> {
        let response = self.api.get_session(&self.id).await?;
        let data = response
            .data
            .ok_or_else(|| SdkError::Protocol("session query carried no data".into()))?;
        Ok(SessionState::parse(&data.status))
    }

    // ── Labels & links ───────────────────────────────────────

    /// Replace the label map on this session.
    pub async fn set_labels(&self, labels: &HashMap<String, String>) -> OperationResult {
        let encoded = match serde_json::to_string(labels) {
            Ok(encoded) => encoded,
            Err(err) => {
                return OperationResult {
                    request_id: String::new(),
                    success: false,
                    error_message: format!("labels are not serializable: {err}"),
                };
            }
        };
        match self.api.set_label(&self.id, encoded).await {
            Ok(response) => OperationResult::ok(response.request_id),
            Err(err) => OperationResult::from_error(&err),
        }
    }

    /// Fetch the label map of this session.
    pub async fn get_labels(&self) -> LabelResult {
        match self.api.get_label(&self.id).await {
            Ok(response) => {
                let raw = response.data.unwrap_or_default().labels.unwrap_or_default();
                let labels = if raw.is_empty() {
                    HashMap::new()
                } else {
                    match serde_json::from_str(&raw) {
                        Ok(labels) => labels,
                        Err(err) => {
                            return LabelResult {
                                request_id: response.request_id,
                                success: false,
                                error_message: format!("labels payload was not a json map: {err}"),
                                labels: HashMap::new(),
                            };
                        }
                    }
                };
                LabelResult {
                    request_id: response.request_id,
                    success: true,
                    error_message: String::new(),
                    labels,
                }
            }
            Err(err) => LabelResult {
                request_id: err.request_id().to_owned(),
                success: false,
                error_message: err.to_string(),
                labels: HashMap::new(),
            },
        }
    }

    /// Mint a forwarding link for a port inside the sandbox.
    ///
    /// `port`, when given, must fall in `30100..=30199`; out-of-range
    /// values fail locally without a network round trip.
    pub async fn get_link(
        &self,
        protocol_type: Option<&str>,
        port: Option<i32>,
    ) -> LinkResult {
        if let Some(port) = port {
            if !LINK_PORT_RANGE.contains(&port) {
                return LinkResult {
                    request_id: String::new(),
                    success: false,
                    error_message: format!(
                        "port {port} is outside the forwardable range {}..={}",
                        LINK_PORT_RANGE.start(),
                        LINK_PORT_RANGE.end()
                    ),
                    url: String::new(),
                };
            }
        }
        let request = GetLinkRequest {
            session_id: self.id.clone(),
            protocol_type: protocol_type.map(str::to_owned),
            port,
        };
        match self.api.get_link(&request).await {
            Ok(response) => {
                let url = response.data.unwrap_or_default().url;
                LinkResult {
                    request_id: response.request_id,
                    success: !url.is_empty(),
                    error_message: if url.is_empty() {
                        "response carried no link url".into()
                    } else {
                        String::new()
                    },
                    url,
                }
            }
            Err(err) => LinkResult {
                request_id: err.request_id().to_owned(),
                success: false,
                error_message: err.to_string(),
                url: String::new(),
            },
        }
    }

    // ── Subsystems ───────────────────────────────────────────

    /// Context sync engine scoped to this session.
    #[must_use]
    pub fn context_sync(&self) -> ContextSync {
        ContextSync::new(Arc::clone(&self.api), self.id.clone())
    }

    /// File transfer engine scoped to this session.
    #[must_use]
    pub fn file_transfer(&self) -> FileTransfer<'_> {
        FileTransfer::new(self)
    }

    /// Shell execution wrapper.
    #[must_use]
    pub fn command(&self) -> Command<'_> {
        Command::new(self)
    }

    /// Code execution wrapper.
    #[must_use]
    pub fn code(&self) -> Code<'_> {
        Code::new(self)
    }

    /// Sandbox filesystem wrapper.
    #[must_use]
    pub fn file_system(&self) -> FileSystem<'_> {
        FileSystem::new(self)
    }

    /// Mouse/keyboard/screen wrapper.
    #[must_use]
    pub fn ui(&self) -> Ui<'_> {
        Ui::new(self)
    }

    /// Window management wrapper.
    #[must_use]
    pub fn window(&self) -> WindowManager<'_> {
        WindowManager::new(self)
    }

    /// Application management wrapper.
    #[must_use]
    pub fn application(&self) -> AppManager<'_> {
        AppManager::new(self)
    }

    /// Browser initialization wrapper.
    #[must_use]
    pub fn browser(&self) -> Browser<'_> {
        Browser::new(self)
    }

    /// Resolve the file-transfer context, lazily loading it through the
    /// control plane on first use. The result is cached on the session,
    /// so subsequent transfers skip the RPC.
    pub(crate) async fn ensure_file_transfer_context(&self) -> Result<String> {
        let mut guard = self.file_transfer.lock().await;
        if let Some(context) = guard.as_ref() {
            return Ok(context.id.clone());
        }

        let response = self
            .api
            .get_and_load_internal_context(&self.id, vec!["file_transfer".to_owned()])
            .await?;
        let entry = response
            .data
            .unwrap_or_default()
            .into_iter()
            .find(|entry| !entry.context_id.is_empty())
            .ok_or_else(|| {
                SdkError::Protocol("server resolved no file-transfer context".into())
            })?;

        info!(
            session_id = %self.id,
            context_id = %entry.context_id,
            path = %entry.context_path,
            "file-transfer context resolved"
        );
        let id = entry.context_id.clone();
        *guard = Some(FileTransferContext {
            id: entry.context_id,
            // Resolved server-side, not created by us: never purged.
            owned: false,
        });
        Ok(id)
    }
}
