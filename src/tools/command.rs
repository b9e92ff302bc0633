//! Shell execution inside the sandbox.

use serde_json::json;

use crate::session::Session;

const DEFAULT_TIMEOUT_MS: u64 = 1000;

/// Result of a shell execution.
#[derive(Debug, Clone, Default)]
pub struct CommandResult {
    /// Request identifier from the underlying tool call.
    pub request_id: String,
    /// Whether the command ran successfully.
    pub success: bool,
    /// Combined stdout/stderr text.
    pub output: String,
    /// Failure detail; empty on success.
    pub error_message: String,
}

/// Shell execution wrapper.
#[derive(Debug, Clone, Copy)]
pub struct Command<'a> {
    session: &'a Session,
}

impl<'a> Command<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Run a shell command, bounded by `timeout_ms` (default 1000).
    pub async fn execute_command(
        &self,
        command: &str,
        timeout_ms: Option<u64>,
    ) -> CommandResult {
        let args = json!({
            "command": command,
            "timeout_ms": timeout_ms.unwrap_or(DEFAULT_TIMEOUT_MS),
        });
        let result = self.session.call_tool("shell", args).await;
        CommandResult {
            request_id: result.request_id,
            success: result.success,
            output: result.data,
            error_message: result.error_message,
        }
    }
}
