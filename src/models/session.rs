//! Session model: lifecycle states and VPC transport parameters.

use serde::{Deserialize, Serialize};

/// Lifecycle state for a sandbox session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// Session requested but not yet running.
    Creating,
    /// Session up and accepting tool calls.
    Running,
    /// Pause requested, not yet settled.
    Pausing,
    /// Session paused by the caller.
    Paused,
    /// Resume requested, not yet settled.
    Resuming,
    /// Delete requested, not yet settled.
    Terminating,
    /// Session gone, by delete or server-side expiry.
    Terminated,
    /// Status token the server sent was not recognized.
    Unknown,
}

impl SessionState {
    /// Map a server status token to a state, case-insensitively.
    ///
    /// Unrecognized tokens map to [`SessionState::Unknown`] rather than
    /// failing, since the server's status vocabulary is open-ended.
    #[must_use]
    pub fn parse(token: &str) -> Self {
        match token.to_ascii_lowercase().as_str() {
            "creating" => Self::Creating,
            "running" => Self::Running,
            "pausing" => Self::Pausing,
            "paused" => Self::Paused,
            "resuming" => Self::Resuming,
            "terminating" => Self::Terminating,
            "terminated" => Self::Terminated,
            _ => Self::Unknown,
        }
    }

    /// Whether this state is settled (no transition in flight).
    #[must_use]
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            Self::Running | Self::Paused | Self::Terminated | Self::Unknown
        )
    }
}

/// Transport parameters for a VPC-mode session.
///
/// In VPC mode tool calls bypass the control plane and go straight to the
/// agent endpoint inside the sandbox network.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VpcConfig {
    /// Agent host, typically the sandbox network interface IP.
    pub agent_host: String,
    /// Agent HTTP port.
    pub agent_port: u16,
    /// Bearer token scoped to the agent, when the server minted one.
    pub token: Option<String>,
}
