//! Browser initialization.
//!
//! The embedded browser itself lives outside the SDK; this shim only
//! forwards the init tool call, folding in the behavior-simulation flag.

use serde_json::json;

use crate::models::result::OperationResult;
use crate::session::Session;

/// Env var enabling behavior simulation on browser init.
pub const ENV_BEHAVIOR_SIMULATE: &str = "AGENTBAY_BROWSER_BEHAVIOR_SIMULATE";

/// Options for [`Browser::initialize`].
#[derive(Debug, Clone, Default)]
pub struct BrowserOptions {
    /// Sandbox path where the browser persists profile data, typically
    /// the browser-context mount path.
    pub persistent_path: Option<String>,
}

/// Browser initialization wrapper.
#[derive(Debug, Clone, Copy)]
pub struct Browser<'a> {
    session: &'a Session,
}

impl<'a> Browser<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Initialize the in-sandbox browser.
    ///
    /// `AGENTBAY_BROWSER_BEHAVIOR_SIMULATE` is read on every call, not
    /// cached: it is a request-time knob.
    pub async fn initialize(&self, opts: BrowserOptions) -> OperationResult {
        let simulate = behavior_simulate_enabled();
        let mut args = json!({ "simulateBehavior": simulate });
        if let Some(path) = &opts.persistent_path {
            args["persistentPath"] = json!(path);
        }

        let result = self.session.call_tool("init_browser", args).await;
        OperationResult {
            request_id: result.request_id,
            success: result.success,
            error_message: result.error_message,
        }
    }
}

fn behavior_simulate_enabled() -> bool {
    std::env::var(ENV_BEHAVIOR_SIMULATE)
        .map(|value| {
            let value = value.to_ascii_lowercase();
            matches!(value.as_str(), "1" | "true" | "yes" | "on")
        })
        .unwrap_or(false)
}
