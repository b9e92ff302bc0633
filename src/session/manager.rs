//! Session factory, registry, and lifecycle controller.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

use crate::api::types::{CreateSessionRequest, ListSessionRequest, PersistenceData};
use crate::api::ApiClient;
use crate::config::Config;
use crate::context::store::ContextService;
use crate::context::sync::DEFAULT_POLL_INTERVAL;
use crate::models::context::{ContextMount, SyncPolicy};
use crate::models::result::OperationResult;
use crate::models::session::VpcConfig;
use crate::session::{FileTransferContext, Session, SessionSeed};
use crate::tools::mobile::{self, MobileExtraConfig};
use crate::{Result, SdkError};

/// Sandbox path the auto-created file-transfer context is mounted at.
pub const FILE_TRANSFER_MOUNT_PATH: &str = "/temp/file-transfer";
/// Sandbox path a dedicated browser context is mounted at.
pub const BROWSER_DATA_MOUNT_PATH: &str = "/tmp/agentbay_browser";
/// Sandbox path the replay context is mounted at.
pub const REPLAY_MOUNT_PATH: &str = "/tmp/agentbay_replay";

/// Mount-sync polling attempts allowed during create (~225 s total).
const CREATE_SYNC_ATTEMPTS: u32 = 150;

/// Shared registry of live sessions, keyed by session id.
pub(crate) type SessionRegistry = Arc<RwLock<HashMap<String, Arc<Session>>>>;

/// Dedicated browser-data context declaration.
#[derive(Debug, Clone)]
pub struct BrowserContext {
    /// Context holding browser profile data.
    pub context_id: String,
    /// Flush browser data back to the context on session delete.
    pub auto_upload: bool,
}

/// Extra configuration forwarded at session create.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtraConfigs {
    /// Mobile-image tweaks, applied through a tool call after create.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<MobileExtraConfig>,
}

/// Parameters for [`AgentBay::create`].
#[derive(Debug, Clone, Default)]
pub struct CreateSessionParams {
    /// Labels attached to the session, queryable via list.
    pub labels: HashMap<String, String>,
    /// Sandbox image to boot; server default when absent.
    pub image_id: Option<String>,
    /// Caller-declared context mounts.
    pub context_mounts: Vec<ContextMount>,
    /// Dedicated browser-data context.
    pub browser_context: Option<BrowserContext>,
    /// Route tool calls directly to the in-sandbox agent.
    pub vpc_mode: bool,
    /// Server-side policy handle.
    pub policy_id: Option<String>,
    /// Record a browser replay into a dedicated context.
    pub enable_browser_replay: bool,
    /// Extra configuration forwarded to the sandbox.
    pub extra_configs: Option<ExtraConfigs>,
    /// Framework tag reported in the SDK-stats breadcrumb.
    pub framework: Option<String>,
    /// Keep the auto-created file-transfer context on delete.
    pub keep_file_transfer_context: bool,
}

/// Outcome of a session create or lookup.
#[derive(Debug, Clone, Default)]
pub struct SessionResult {
    /// Request identifier from the underlying RPC.
    pub request_id: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Failure detail; empty on success.
    pub error_message: String,
    /// The session, on success.
    pub session: Option<Arc<Session>>,
}

impl SessionResult {
    fn failure(request_id: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            success: false,
            error_message: error_message.into(),
            session: None,
        }
    }

    fn from_error(err: &SdkError) -> Self {
        Self::failure(err.request_id().to_owned(), err.to_string())
    }
}

/// One page of session ids.
#[derive(Debug, Clone, Default)]
pub struct SessionListResult {
    /// Request identifier from the last page RPC issued.
    pub request_id: String,
    /// Whether the traversal succeeded.
    pub success: bool,
    /// Failure detail; empty on success.
    pub error_message: String,
    /// Session ids of the requested page.
    pub session_ids: Vec<String>,
    /// Cursor for the page after the requested one; empty at the end.
    pub next_token: String,
    /// Total matching sessions, when the server counts them.
    pub total_count: Option<u32>,
}

/// Entry point: session factory, registry, and context surface.
#[derive(Debug, Clone)]
pub struct AgentBay {
    api: Arc<ApiClient>,
    http: reqwest::Client,
    contexts: ContextService,
    registry: SessionRegistry,
    timeout: Duration,
}

impl AgentBay {
    /// Build a client from an explicit credential or the environment.
    ///
    /// # Errors
    ///
    /// Returns `SdkError::Config` when no credential can be resolved and
    /// `SdkError::Transport` when the HTTP client cannot be built.
    pub fn new(api_key: Option<&str>) -> Result<Self> {
        Self::with_config(Config::load(api_key)?)
    }

    /// Build a client from resolved configuration.
    ///
    /// # Errors
    ///
    /// Returns `SdkError::Transport` when the HTTP client cannot be built.
    pub fn with_config(config: Config) -> Result<Self> {
        let api = Arc::new(ApiClient::new(&config)?);
        let http = reqwest::Client::builder()
            .build()
            .map_err(|err| SdkError::Transport(format!("failed to build http client: {err}")))?;
        Ok(Self {
            contexts: ContextService::new(Arc::clone(&api)),
            api,
            http,
            registry: Arc::new(RwLock::new(HashMap::new())),
            timeout: config.timeout,
        })
    }

    /// Context CRUD and presigned-URL surface.
    #[must_use]
    pub fn contexts(&self) -> &ContextService {
        &self.contexts
    }

    /// Look up a live session in the in-memory registry.
    pub async fn find(&self, session_id: &str) -> Option<Arc<Session>> {
        self.registry.read().await.get(session_id).cloned()
    }

    /// Create a session and wait for its declared mounts to settle.
    ///
    /// A file-transfer context is auto-created and mounted; a browser
    /// context and a replay context are folded into the mount list when
    /// requested. Post-create steps (mobile config, replay renaming, VPC
    /// tool routing) and the mount-sync gate log failures instead of
    /// failing the returned session.
    pub async fn create(&self, params: CreateSessionParams) -> SessionResult {
        for mount in &params.context_mounts {
            if let Some(list) = mount
                .policy
                .as_ref()
                .and_then(|policy| policy.bw_list.as_ref())
            {
                if let Err(err) = list.validate() {
                    return SessionResult::failure("", err.to_string());
                }
            }
        }

        let mut mounts = params.context_mounts.clone();

        // Auto file-transfer context, one per session.
        let mut file_transfer = None;
        let auto_name = format!("file-transfer-{}", Uuid::new_v4());
        let auto = self.contexts.get(&auto_name, true).await;
        match auto.context {
            Some(context) => {
                mounts.push(ContextMount::new(&context.id, FILE_TRANSFER_MOUNT_PATH));
                file_transfer = Some(FileTransferContext {
                    id: context.id,
                    owned: true,
                });
            }
            None => {
                warn!(
                    error = %auto.error_message,
                    "file-transfer context unavailable; transfers will lazy-load one"
                );
            }
        }

        // Browser-context folding.
        if let Some(browser) = &params.browser_context {
            mounts.push(
                ContextMount::new(&browser.context_id, BROWSER_DATA_MOUNT_PATH)
                    .with_policy(SyncPolicy::with_auto_upload(browser.auto_upload)),
            );
        }

        // Replay context.
        let mut replay_context_id = None;
        if params.enable_browser_replay {
            let replay_name = format!("replay-{}", Uuid::new_v4());
            let replay = self.contexts.get(&replay_name, true).await;
            match replay.context {
                Some(context) => {
                    mounts.push(ContextMount::new(&context.id, REPLAY_MOUNT_PATH));
                    replay_context_id = Some(context.id);
                }
                None => {
                    warn!(error = %replay.error_message, "replay context unavailable");
                }
            }
        }

        let request = match build_create_request(&params, &mounts) {
            Ok(request) => request,
            Err(err) => return SessionResult::failure("", err.to_string()),
        };

        let response = match self.api.create_session(&request).await {
            Ok(response) => response,
            Err(err) => return SessionResult::from_error(&err),
        };
        let request_id = response.request_id.clone();
        let Some(data) = response.data else {
            return SessionResult::failure(request_id, "create response carried no data object");
        };
        let Some(session_id) = data.session_id.clone().filter(|id| !id.is_empty()) else {
            return SessionResult::failure(request_id, "create response carried no session id");
        };

        let vpc_mode = data.vpc_resource.unwrap_or(params.vpc_mode);
        let vpc = if vpc_mode {
            match (&data.network_interface_ip, data.http_port) {
                (Some(host), Some(port)) if !host.is_empty() => Some(VpcConfig {
                    agent_host: host.clone(),
                    agent_port: port,
                    token: data.token.clone(),
                }),
                _ => {
                    warn!(%session_id, "vpc session without agent address; tool calls will fail");
                    None
                }
            }
        } else {
            None
        };

        let session = Arc::new(Session::new(
            SessionSeed {
                id: session_id.clone(),
                resource_url: data.resource_url.clone(),
                image_id: params.image_id.clone().unwrap_or_default(),
                app_instance_id: data.app_instance_id.clone(),
                vpc,
                mounts: mounts.clone(),
                file_transfer,
                keep_file_transfer_context: params.keep_file_transfer_context,
                replay_context_id: replay_context_id.clone(),
            },
            Arc::clone(&self.api),
            self.http.clone(),
            Arc::clone(&self.registry),
            self.contexts.clone(),
            self.timeout,
        ));
        self.registry
            .write()
            .await
            .insert(session_id.clone(), Arc::clone(&session));
        info!(%session_id, vpc = session.is_vpc(), "session created");

        // Post-create fan-out. None of these abort the returned session.
        if let Some(mobile_config) = params.extra_configs.as_ref().and_then(|c| c.mobile.as_ref())
        {
            let applied = mobile::apply(&session, mobile_config).await;
            if !applied.success {
                warn!(%session_id, error = %applied.error_message, "mobile config not applied");
            }
        }

        if let Some(replay_id) = &replay_context_id {
            if data.app_instance_id.is_empty() {
                warn!(%session_id, "no app instance id; replay context keeps its provisional name");
            } else {
                let display_name = format!("browserreplay-{}", data.app_instance_id);
                if let Err(err) = self.api.modify_context(replay_id, &display_name).await {
                    warn!(%session_id, %err, "replay context rename failed");
                }
            }
        }

        if session.is_vpc() {
            let routing = session.refresh_tool_routing().await;
            if !routing.success {
                warn!(%session_id, error = %routing.error_message, "tool routing not populated");
            }
        }

        // Context-sync gate: block until every mount's latest task row is
        // terminal or the budget runs out; either way create succeeds.
        if !mounts.is_empty() {
            let budget = DEFAULT_POLL_INTERVAL * CREATE_SYNC_ATTEMPTS;
            let settled = session
                .context_sync()
                .wait_for_terminal(None, None, None, budget, DEFAULT_POLL_INTERVAL, None)
                .await;
            if !settled.success {
                warn!(
                    %session_id,
                    error = %settled.error_message,
                    "mounts did not settle; tool calls may race initialization"
                );
            }
        }

        SessionResult {
            request_id,
            success: true,
            error_message: String::new(),
            session: Some(session),
        }
    }

    /// Recover a session by id from the server.
    ///
    /// A fresh file-transfer context is attached, since recovered
    /// sessions may lack one. A missing session yields a failure record
    /// whose message starts with `not found:`, distinct from I/O errors.
    pub async fn get(&self, session_id: &str) -> SessionResult {
        let response = match self.api.get_session(session_id).await {
            Ok(response) => response,
            Err(err) => return SessionResult::from_error(&err),
        };
        let request_id = response.request_id.clone();
        let Some(data) = response.data else {
            return SessionResult::failure(request_id, "session query carried no data object");
        };
        if data.session_id.is_empty() {
            return SessionResult::failure(request_id, "session query carried no session id");
        }

        let vpc = if data.vpc_resource.unwrap_or(false) {
            match (&data.network_interface_ip, data.http_port) {
                (Some(host), Some(port)) if !host.is_empty() => Some(VpcConfig {
                    agent_host: host.clone(),
                    agent_port: port,
                    token: data.token.clone(),
                }),
                _ => None,
            }
        } else {
            None
        };

        let mut file_transfer = None;
        let auto_name = format!("file-transfer-{}", Uuid::new_v4());
        let auto = self.contexts.get(&auto_name, true).await;
        match auto.context {
            Some(context) => {
                file_transfer = Some(FileTransferContext {
                    id: context.id,
                    owned: true,
                });
            }
            None => {
                warn!(
                    session_id,
                    error = %auto.error_message,
                    "file-transfer context unavailable for recovered session"
                );
            }
        }

        let session = Arc::new(Session::new(
            SessionSeed {
                id: data.session_id.clone(),
                resource_url: data.resource_url.clone(),
                image_id: String::new(),
                app_instance_id: data.app_instance_id.clone(),
                vpc,
                mounts: Vec::new(),
                file_transfer,
                keep_file_transfer_context: false,
                replay_context_id: None,
            },
            Arc::clone(&self.api),
            self.http.clone(),
            Arc::clone(&self.registry),
            self.contexts.clone(),
            self.timeout,
        ));
        self.registry
            .write()
            .await
            .insert(data.session_id.clone(), Arc::clone(&session));

        if session.is_vpc() {
            let routing = session.refresh_tool_routing().await;
            if !routing.success {
                warn!(session_id, error = %routing.error_message, "tool routing not populated");
            }
        }

        SessionResult {
            request_id,
            success: true,
            error_message: String::new(),
            session: Some(session),
        }
    }

    /// Fetch one page of sessions matching `labels`.
    ///
    /// The server only exposes forward cursors, so page `N` walks `N`
    /// RPCs from the start; a page past the end fails with an
    /// out-of-range message.
    pub async fn list(
        &self,
        labels: Option<&HashMap<String, String>>,
        page: Option<u32>,
        limit: Option<u32>,
    ) -> SessionListResult {
        let page = page.unwrap_or(1).max(1);
        let limit = limit.unwrap_or(crate::context::store::DEFAULT_PAGE_SIZE);
        let labels_json = match labels.filter(|map| !map.is_empty()) {
            Some(map) => match serde_json::to_string(map) {
                Ok(encoded) => Some(encoded),
                Err(err) => {
                    return SessionListResult {
                        success: false,
                        error_message: format!("labels are not serializable: {err}"),
                        ..SessionListResult::default()
                    };
                }
            },
            None => None,
        };

        let mut next_token: Option<String> = None;
        for current in 1..=page {
            let request = ListSessionRequest {
                labels: labels_json.clone(),
                max_results: limit,
                next_token: next_token.take(),
            };
            let response = match self.api.list_sessions(&request).await {
                Ok(response) => response,
                Err(err) => {
                    return SessionListResult {
                        request_id: err.request_id().to_owned(),
                        success: false,
                        error_message: err.to_string(),
                        ..SessionListResult::default()
                    };
                }
            };
            let data = response.data.unwrap_or_default();

            if current == page {
                return SessionListResult {
                    request_id: response.request_id,
                    success: true,
                    error_message: String::new(),
                    session_ids: data
                        .data
                        .into_iter()
                        .map(|stub| stub.session_id)
                        .collect(),
                    next_token: data.next_token,
                    total_count: data.total_count,
                };
            }

            if data.next_token.is_empty() {
                return SessionListResult {
                    request_id: response.request_id,
                    success: false,
                    error_message: format!(
                        "page {page} is out of range; results end at page {current}"
                    ),
                    ..SessionListResult::default()
                };
            }
            next_token = Some(data.next_token);
        }

        SessionListResult::default()
    }

    /// Delete a session, flushing auto-upload mounts first when
    /// `sync_context` is set. Delegates to [`Session::delete`].
    pub async fn delete(&self, session: &Session, sync_context: bool) -> OperationResult {
        session.delete(sync_context).await
    }

    /// Request a pause without waiting for it to settle.
    pub async fn pause_session_async(&self, session_id: &str) -> OperationResult {
        match self.api.pause_session(session_id).await {
            Ok(response) => OperationResult::ok(response.request_id),
            Err(err) => OperationResult::from_error(&err),
        }
    }

    /// Request a resume without waiting for it to settle.
    pub async fn resume_session_async(&self, session_id: &str) -> OperationResult {
        match self.api.resume_session(session_id).await {
            Ok(response) => OperationResult::ok(response.request_id),
            Err(err) => OperationResult::from_error(&err),
        }
    }
}

/// Serialize create parameters and mounts into the wire request.
fn build_create_request(
    params: &CreateSessionParams,
    mounts: &[ContextMount],
) -> Result<CreateSessionRequest> {
    let labels = if params.labels.is_empty() {
        None
    } else {
        Some(serde_json::to_string(&params.labels)?)
    };

    let mut persistence_data_list = Vec::with_capacity(mounts.len());
    for mount in mounts {
        let policy = mount
            .policy
            .as_ref()
            .map(serde_json::to_string)
            .transpose()?;
        persistence_data_list.push(PersistenceData {
            context_id: mount.context_id.clone(),
            path: mount.path.clone(),
            policy,
        });
    }

    let extra_configs = params
        .extra_configs
        .as_ref()
        .map(serde_json::to_string)
        .transpose()?;

    let sdk_stats = serde_json::json!({
        "source": "sdk",
        "sdkLang": "rust",
        "sdkVersion": env!("CARGO_PKG_VERSION"),
        "release": cfg!(not(debug_assertions)),
        "framework": params.framework.clone().unwrap_or_default(),
    });

    Ok(CreateSessionRequest {
        labels,
        image_id: params.image_id.clone(),
        policy_id: params.policy_id.clone(),
        vpc_resource: params.vpc_mode,
        persistence_data_list,
        extra_configs,
        sdk_stats: Some(sdk_stats.to_string()),
    })
}
