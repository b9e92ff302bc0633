//! Sync directions and the per-task status rows reported by the server.

use serde::{Deserialize, Serialize};

/// Direction of a context sync, from the sandbox's perspective:
/// `upload` moves sandbox→object storage, `download` the reverse.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Sandbox → object storage.
    Upload,
    /// Object storage → sandbox.
    Download,
}

impl SyncMode {
    /// Wire token for this direction.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Upload => "upload",
            Self::Download => "download",
        }
    }

    /// Whether `token` names this direction, case-insensitively.
    #[must_use]
    pub fn matches(self, token: &str) -> bool {
        token.eq_ignore_ascii_case(self.as_str())
    }
}

/// One row in the aggregated sync state for a session.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ContextStatusItem {
    /// Context this task belongs to.
    #[serde(default)]
    pub context_id: String,
    /// Sandbox path the task operates on.
    #[serde(default)]
    pub path: String,
    /// Task direction token (`upload` | `download`).
    #[serde(default)]
    pub task_type: String,
    /// Status token; see [`is_terminal_status`].
    #[serde(default)]
    pub status: String,
    /// Task start, epoch seconds.
    #[serde(default)]
    pub start_time: Option<i64>,
    /// Task finish, epoch seconds; absent while in flight.
    #[serde(default)]
    pub finish_time: Option<i64>,
    /// Failure detail, when `status` is a failure token.
    #[serde(default)]
    pub error_message: Option<String>,
}

impl ContextStatusItem {
    /// Whether this row is no longer in flight.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        is_terminal_status(&self.status)
    }

    /// Whether this row ended in a success-equivalent state.
    #[must_use]
    pub fn is_success(&self) -> bool {
        is_success_status(&self.status)
    }
}

/// Success-equivalent status tokens, lowercase.
const SUCCESS_STATUSES: &[&str] = &[
    "success",
    "successful",
    "ok",
    "finished",
    "done",
    "completed",
    "complete",
];

/// Whether `status` (case-folded) marks a task as no longer in flight.
#[must_use]
pub fn is_terminal_status(status: &str) -> bool {
    is_success_status(status) || status.eq_ignore_ascii_case("failed")
}

/// Whether `status` (case-folded) is a success-equivalent token.
#[must_use]
pub fn is_success_status(status: &str) -> bool {
    SUCCESS_STATUSES
        .iter()
        .any(|candidate| status.eq_ignore_ascii_case(candidate))
}
