//! Per-session context synchronization: trigger, status, and polling.
//!
//! The server moves data between mounted contexts and object storage
//! asynchronously; this engine triggers the copy, decodes the
//! double-encoded status document, and polls until every matching task
//! row reaches a terminal state.

use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::time::{sleep, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::api::types::ContextInfoRequest;
use crate::api::ApiClient;
use crate::models::result::OperationResult;
use crate::models::sync::{ContextStatusItem, SyncMode};

/// Default interval between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(1500);

/// One entry of the outer `contextStatus` document.
#[derive(Debug, Deserialize)]
struct StatusEnvelopeEntry {
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    data: Option<String>,
}

/// Result of a status query.
#[derive(Debug, Clone, Default)]
pub struct ContextInfoResult {
    /// Request identifier from the underlying RPC.
    pub request_id: String,
    /// Whether the query succeeded.
    pub success: bool,
    /// Failure detail; empty on success.
    pub error_message: String,
    /// Decoded task rows; empty when the server reported no tasks.
    pub items: Vec<ContextStatusItem>,
}

/// Drives sync between one session's mounted contexts and object storage.
#[derive(Debug, Clone)]
pub struct ContextSync {
    api: Arc<ApiClient>,
    session_id: String,
}

impl ContextSync {
    pub(crate) fn new(api: Arc<ApiClient>, session_id: String) -> Self {
        Self { api, session_id }
    }

    /// Ask the server to move data in `mode` direction for the given
    /// context/path scope. Returns as soon as the server accepts the
    /// request; the copy itself runs asynchronously.
    pub async fn sync(
        &self,
        context_id: Option<&str>,
        path: Option<&str>,
        mode: SyncMode,
    ) -> OperationResult {
        match self
            .api
            .sync_context(&self.session_id, context_id, path, mode)
            .await
        {
            Ok(response) => {
                debug!(
                    session_id = %self.session_id,
                    mode = mode.as_str(),
                    "sync accepted"
                );
                OperationResult::ok(response.request_id)
            }
            Err(err) => OperationResult::from_error(&err),
        }
    }

    /// Fetch and decode the aggregated sync state for this session.
    pub async fn info(
        &self,
        context_id: Option<&str>,
        path: Option<&str>,
        task_type: Option<SyncMode>,
    ) -> ContextInfoResult {
        let request = ContextInfoRequest {
            session_id: self.session_id.clone(),
            context_id: context_id.map(str::to_owned),
            path: path.map(str::to_owned),
            task_type: task_type.map(|mode| mode.as_str().to_owned()),
        };
        match self.api.get_context_info(&request).await {
            Ok(response) => {
                let raw = response.data.unwrap_or_default().context_status;
                ContextInfoResult {
                    request_id: response.request_id,
                    success: true,
                    error_message: String::new(),
                    items: parse_context_status(&raw),
                }
            }
            Err(err) => ContextInfoResult {
                request_id: err.request_id().to_owned(),
                success: false,
                error_message: err.to_string(),
                items: Vec::new(),
            },
        }
    }

    /// Trigger a sync, then poll until every matching task row is
    /// terminal or `timeout` expires.
    ///
    /// Matching rows are those whose `(context_id, path)` equal the
    /// request scope (where given) and whose task type equals `mode`.
    /// The returned record carries the trigger RPC's request id and
    /// succeeds only if every matching row ended success-equivalent.
    pub async fn sync_and_wait(
        &self,
        context_id: Option<&str>,
        path: Option<&str>,
        mode: SyncMode,
        timeout: Duration,
        poll_interval: Duration,
        cancel: Option<&CancellationToken>,
    ) -> OperationResult {
        let trigger = self.sync(context_id, path, mode).await;
        if !trigger.success {
            return trigger;
        }

        let wait = self
            .wait_for_terminal(context_id, path, Some(mode), timeout, poll_interval, cancel)
            .await;
        OperationResult {
            request_id: trigger.request_id,
            success: wait.success,
            error_message: wait.error_message,
        }
    }

    /// Poll the status document until every matching row is terminal or
    /// the budget expires.
    ///
    /// An empty matching set counts as settled: the server reports no
    /// tasks with an empty document.
    pub(crate) async fn wait_for_terminal(
        &self,
        context_id: Option<&str>,
        path: Option<&str>,
        task_type: Option<SyncMode>,
        timeout: Duration,
        poll_interval: Duration,
        cancel: Option<&CancellationToken>,
    ) -> OperationResult {
        let deadline = Instant::now() + timeout;
        let mut last_request_id = String::new();

        loop {
            if let Some(token) = cancel {
                if token.is_cancelled() {
                    return OperationResult {
                        request_id: last_request_id,
                        success: false,
                        error_message: "sync wait cancelled".into(),
                    };
                }
            }

            let info = self.info(context_id, path, task_type).await;
            if info.success {
                last_request_id.clone_from(&info.request_id);
                let matching: Vec<&ContextStatusItem> = info
                    .items
                    .iter()
                    .filter(|item| {
                        context_id.is_none_or(|id| item.context_id == id)
                            && path.is_none_or(|p| item.path == p)
                            && task_type.is_none_or(|mode| mode.matches(&item.task_type))
                    })
                    .collect();

                if matching.iter().all(|item| item.is_terminal()) {
                    let failures: Vec<String> = matching
                        .iter()
                        .filter(|item| !item.is_success())
                        .map(|item| {
                            format!(
                                "{} at {} ended '{}'{}",
                                item.task_type,
                                item.path,
                                item.status,
                                item.error_message
                                    .as_deref()
                                    .map(|msg| format!(": {msg}"))
                                    .unwrap_or_default()
                            )
                        })
                        .collect();
                    return OperationResult {
                        request_id: info.request_id,
                        success: failures.is_empty(),
                        error_message: failures.join("; "),
                    };
                }
            } else {
                // Transient status failures spend budget but do not abort
                // the wait; the next poll may succeed.
                warn!(
                    session_id = %self.session_id,
                    error = %info.error_message,
                    "status poll failed"
                );
            }

            if Instant::now() + poll_interval > deadline {
                return OperationResult {
                    request_id: last_request_id,
                    success: false,
                    error_message: format!(
                        "sync did not settle within {} ms",
                        timeout.as_millis()
                    ),
                };
            }

            match cancel {
                Some(token) => {
                    tokio::select! {
                        () = token.cancelled() => {}
                        () = sleep(poll_interval) => {}
                    }
                }
                None => sleep(poll_interval).await,
            }
        }
    }
}

/// Decode the double-encoded `contextStatus` document.
///
/// The outer layer is `[{type, data}, ...]`; entries with `type="data"`
/// carry a JSON-encoded array of status rows. An undecodable outer layer
/// means "no tasks" and yields an empty list; an undecodable inner entry
/// is skipped so one corrupt log entry cannot wedge a waiting poll.
pub(crate) fn parse_context_status(raw: &str) -> Vec<ContextStatusItem> {
    if raw.is_empty() {
        return Vec::new();
    }
    let Ok(entries) = serde_json::from_str::<Vec<StatusEnvelopeEntry>>(raw) else {
        return Vec::new();
    };

    let mut items = Vec::new();
    for entry in entries {
        if entry.kind != "data" {
            continue;
        }
        let Some(inner) = entry.data else {
            continue;
        };
        match serde_json::from_str::<Vec<ContextStatusItem>>(&inner) {
            Ok(mut rows) => items.append(&mut rows),
            Err(err) => warn!(%err, "skipping undecodable status entry"),
        }
    }
    items
}
