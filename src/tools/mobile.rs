//! Mobile-image extra configuration.

use serde::{Deserialize, Serialize};

use crate::models::tool::ToolResult;
use crate::session::Session;

/// Allow/deny rule for the in-sandbox app manager.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AppManagerRule {
    /// `white` (allow-list) or `black` (deny-list).
    pub rule_type: String,
    /// Package names the rule applies to.
    pub app_package_name_list: Vec<String>,
}

/// Mobile tweaks applied right after session create.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MobileExtraConfig {
    /// Pin the display resolution.
    #[serde(default)]
    pub lock_resolution: bool,
    /// App-manager allow/deny rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_manager_rule: Option<AppManagerRule>,
}

/// Apply a mobile configuration through the tool surface.
///
/// Serialization problems come back as a failed result rather than an
/// error, matching the create-time fan-out which only logs them.
pub async fn apply(session: &Session, config: &MobileExtraConfig) -> ToolResult {
    match serde_json::to_value(config) {
        Ok(args) => session.call_tool("configure_mobile", args).await,
        Err(err) => ToolResult::failure(format!("mobile config not serializable: {err}")),
    }
}
