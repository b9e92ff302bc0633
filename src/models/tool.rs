//! Uniform tool-call results and the code-execution output document.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Uniform result shape for every tool call.
///
/// `data` is plain text or a JSON document whose schema is tool-specific;
/// `request_id` is empty on VPC-mode calls, which bypass the control plane.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolResult {
    /// Whether the call succeeded.
    pub success: bool,
    /// Concatenated payload text.
    pub data: String,
    /// Concatenated error text when the call failed.
    pub error_message: String,
    /// Control-plane request identifier, propagated verbatim.
    pub request_id: String,
}

impl ToolResult {
    /// A failure result with no request id.
    #[must_use]
    pub fn failure(error_message: impl Into<String>) -> Self {
        Self {
            success: false,
            error_message: error_message.into(),
            ..Self::default()
        }
    }
}

/// One MIME-tagged rich output from a code execution.
///
/// The server keys each rendering by MIME type, e.g. `text/plain`,
/// `text/html`, `image/png` (base64).
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RichOutput {
    /// Renderings keyed by MIME type.
    #[serde(flatten)]
    pub formats: HashMap<String, serde_json::Value>,
}

impl RichOutput {
    /// The `text/plain` rendering, when present.
    #[must_use]
    pub fn text(&self) -> Option<&str> {
        self.formats.get("text/plain").and_then(|value| value.as_str())
    }
}

/// Structured document returned by the code-execution tool.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CodeExecutionOutput {
    /// Rich outputs in evaluation order.
    #[serde(default, rename = "result")]
    pub results: Vec<RichOutput>,
    /// Captured stdout lines.
    #[serde(default)]
    pub stdout: Vec<String>,
    /// Captured stderr lines.
    #[serde(default)]
    pub stderr: Vec<String>,
    /// Runtime error raised by the executed code, if any.
    #[serde(default)]
    pub execution_error: Option<String>,
    /// Wall-clock execution time in seconds.
    #[serde(default)]
    pub execution_time: Option<f64>,
    /// Kernel execution counter.
    #[serde(default)]
    pub execution_count: Option<i64>,
}
