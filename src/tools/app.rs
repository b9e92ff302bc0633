//! Application management inside the sandbox.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::session::Session;

/// One installed application.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct InstalledApp {
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Command used to launch the app.
    #[serde(default)]
    pub start_cmd: String,
    /// Command used to stop the app, when known.
    #[serde(default)]
    pub stop_cmd: Option<String>,
    /// Working directory, when known.
    #[serde(default)]
    pub work_directory: Option<String>,
}

/// One running process.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Process {
    /// Process name.
    #[serde(default)]
    pub pname: String,
    /// Process id.
    #[serde(default)]
    pub pid: i32,
    /// Full command line, when known.
    #[serde(default)]
    pub cmdline: Option<String>,
}

/// Result of an operation with no payload.
#[derive(Debug, Clone, Default)]
pub struct AppResult {
    /// Request identifier from the underlying tool call.
    pub request_id: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Failure detail; empty on success.
    pub error_message: String,
}

/// Result of an installed-app query.
#[derive(Debug, Clone, Default)]
pub struct InstalledAppsResult {
    /// Request identifier from the underlying tool call.
    pub request_id: String,
    /// Whether the query succeeded.
    pub success: bool,
    /// Failure detail; empty on success.
    pub error_message: String,
    /// Matching applications.
    pub apps: Vec<InstalledApp>,
}

/// Result of a process query or app start.
#[derive(Debug, Clone, Default)]
pub struct ProcessListResult {
    /// Request identifier from the underlying tool call.
    pub request_id: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Failure detail; empty on success.
    pub error_message: String,
    /// Affected or visible processes.
    pub processes: Vec<Process>,
}

/// Application management wrapper.
#[derive(Debug, Clone, Copy)]
pub struct AppManager<'a> {
    session: &'a Session,
}

impl<'a> AppManager<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// List installed applications.
    pub async fn get_installed_apps(
        &self,
        start_menu: bool,
        desktop: bool,
        ignore_system_apps: bool,
    ) -> InstalledAppsResult {
        let args = json!({
            "start_menu": start_menu,
            "desktop": desktop,
            "ignore_system_apps": ignore_system_apps,
        });
        let result = self.session.call_tool("get_installed_apps", args).await;
        if !result.success {
            return InstalledAppsResult {
                request_id: result.request_id,
                success: false,
                error_message: result.error_message,
                apps: Vec::new(),
            };
        }
        match serde_json::from_str::<Vec<InstalledApp>>(&result.data) {
            Ok(apps) => InstalledAppsResult {
                request_id: result.request_id,
                success: true,
                error_message: String::new(),
                apps,
            },
            Err(err) => InstalledAppsResult {
                request_id: result.request_id,
                success: false,
                error_message: format!("app payload was not parseable: {err}"),
                apps: Vec::new(),
            },
        }
    }

    /// Launch an application and report the processes it spawned.
    ///
    /// `activity` targets a specific activity on mobile images.
    pub async fn start_app(
        &self,
        start_cmd: &str,
        work_directory: Option<&str>,
        activity: Option<&str>,
    ) -> ProcessListResult {
        let args = json!({
            "start_cmd": start_cmd,
            "work_directory": work_directory.unwrap_or(""),
            "activity": activity.unwrap_or(""),
        });
        self.process_list("start_app", args).await
    }

    /// Stop an application by process name.
    pub async fn stop_app_by_pname(&self, pname: &str) -> AppResult {
        let result = self
            .session
            .call_tool("stop_app_by_pname", json!({ "pname": pname }))
            .await;
        AppResult {
            request_id: result.request_id,
            success: result.success,
            error_message: result.error_message,
        }
    }

    /// Stop an application by process id.
    pub async fn stop_app_by_pid(&self, pid: i32) -> AppResult {
        let result = self
            .session
            .call_tool("stop_app_by_pid", json!({ "pid": pid }))
            .await;
        AppResult {
            request_id: result.request_id,
            success: result.success,
            error_message: result.error_message,
        }
    }

    /// List applications with visible windows.
    pub async fn list_visible_apps(&self) -> ProcessListResult {
        self.process_list("list_visible_apps", json!({})).await
    }

    async fn process_list(&self, tool: &str, args: serde_json::Value) -> ProcessListResult {
        let result = self.session.call_tool(tool, args).await;
        if !result.success {
            return ProcessListResult {
                request_id: result.request_id,
                success: false,
                error_message: result.error_message,
                processes: Vec::new(),
            };
        }
        match serde_json::from_str::<Vec<Process>>(&result.data) {
            Ok(processes) => ProcessListResult {
                request_id: result.request_id,
                success: true,
                error_message: String::new(),
                processes,
            },
            Err(err) => ProcessListResult {
                request_id: result.request_id,
                success: false,
                error_message: format!("process payload was not parseable: {err}"),
                processes: Vec::new(),
            },
        }
    }
}
