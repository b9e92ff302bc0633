//! Window management inside the sandbox desktop.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::session::Session;

const DEFAULT_LIST_TIMEOUT_MS: u64 = 5000;

/// One desktop window.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Window {
    /// Window identifier.
    #[serde(default)]
    pub window_id: i64,
    /// Title text.
    #[serde(default)]
    pub title: String,
    /// Upper-left X, when known.
    #[serde(default)]
    pub absolute_upper_left_x: Option<i32>,
    /// Upper-left Y, when known.
    #[serde(default)]
    pub absolute_upper_left_y: Option<i32>,
    /// Width, when known.
    #[serde(default)]
    pub width: Option<i32>,
    /// Height, when known.
    #[serde(default)]
    pub height: Option<i32>,
    /// Owning process id, when known.
    #[serde(default)]
    pub pid: Option<i32>,
    /// Owning process name, when known.
    #[serde(default)]
    pub pname: Option<String>,
    /// Child windows.
    #[serde(default)]
    pub child_windows: Vec<Window>,
}

/// Result of a window operation with no payload.
#[derive(Debug, Clone, Default)]
pub struct WindowResult {
    /// Request identifier from the underlying tool call.
    pub request_id: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Failure detail; empty on success.
    pub error_message: String,
}

/// Result of a window query.
#[derive(Debug, Clone, Default)]
pub struct WindowListResult {
    /// Request identifier from the underlying tool call.
    pub request_id: String,
    /// Whether the query succeeded.
    pub success: bool,
    /// Failure detail; empty on success.
    pub error_message: String,
    /// Matching windows.
    pub windows: Vec<Window>,
}

/// Window management wrapper.
#[derive(Debug, Clone, Copy)]
pub struct WindowManager<'a> {
    session: &'a Session,
}

impl<'a> WindowManager<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// List top-level windows.
    pub async fn list_root_windows(&self, timeout_ms: Option<u64>) -> WindowListResult {
        let args = json!({
            "timeout_ms": timeout_ms.unwrap_or(DEFAULT_LIST_TIMEOUT_MS),
        });
        let result = self.session.call_tool("list_root_windows", args).await;
        if !result.success {
            return WindowListResult {
                request_id: result.request_id,
                success: false,
                error_message: result.error_message,
                windows: Vec::new(),
            };
        }
        match serde_json::from_str::<Vec<Window>>(&result.data) {
            Ok(windows) => WindowListResult {
                request_id: result.request_id,
                success: true,
                error_message: String::new(),
                windows,
            },
            Err(err) => WindowListResult {
                request_id: result.request_id,
                success: false,
                error_message: format!("window payload was not parseable: {err}"),
                windows: Vec::new(),
            },
        }
    }

    /// Fetch the currently focused window.
    pub async fn get_active_window(&self) -> WindowListResult {
        let result = self.session.call_tool("get_active_window", json!({})).await;
        if !result.success {
            return WindowListResult {
                request_id: result.request_id,
                success: false,
                error_message: result.error_message,
                windows: Vec::new(),
            };
        }
        match serde_json::from_str::<Window>(&result.data) {
            Ok(window) => WindowListResult {
                request_id: result.request_id,
                success: true,
                error_message: String::new(),
                windows: vec![window],
            },
            Err(err) => WindowListResult {
                request_id: result.request_id,
                success: false,
                error_message: format!("window payload was not parseable: {err}"),
                windows: Vec::new(),
            },
        }
    }

    /// Bring a window to the foreground.
    pub async fn activate_window(&self, window_id: i64) -> WindowResult {
        self.by_id("activate_window", window_id).await
    }

    /// Maximize a window.
    pub async fn maximize_window(&self, window_id: i64) -> WindowResult {
        self.by_id("maximize_window", window_id).await
    }

    /// Minimize a window.
    pub async fn minimize_window(&self, window_id: i64) -> WindowResult {
        self.by_id("minimize_window", window_id).await
    }

    /// Restore a window from maximized/minimized state.
    pub async fn restore_window(&self, window_id: i64) -> WindowResult {
        self.by_id("restore_window", window_id).await
    }

    /// Close a window.
    pub async fn close_window(&self, window_id: i64) -> WindowResult {
        self.by_id("close_window", window_id).await
    }

    /// Make a window fullscreen.
    pub async fn fullscreen_window(&self, window_id: i64) -> WindowResult {
        self.by_id("fullscreen_window", window_id).await
    }

    /// Toggle focus mode, which suppresses window switching.
    pub async fn focus_mode(&self, on: bool) -> WindowResult {
        let result = self.session.call_tool("focus_mode", json!({ "on": on })).await;
        WindowResult {
            request_id: result.request_id,
            success: result.success,
            error_message: result.error_message,
        }
    }

    async fn by_id(&self, tool: &str, window_id: i64) -> WindowResult {
        let result = self
            .session
            .call_tool(tool, json!({ "window_id": window_id }))
            .await;
        WindowResult {
            request_id: result.request_id,
            success: result.success,
            error_message: result.error_message,
        }
    }
}
