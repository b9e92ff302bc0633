//! Code execution inside the sandbox kernel.

use serde_json::json;

use crate::models::tool::CodeExecutionOutput;
use crate::session::Session;

const DEFAULT_TIMEOUT_S: u32 = 60;

/// Languages the in-sandbox kernel accepts.
const SUPPORTED_LANGUAGES: &[&str] = &["python", "r", "javascript", "java"];

/// Result of a code execution.
#[derive(Debug, Clone, Default)]
pub struct CodeResult {
    /// Request identifier from the underlying tool call.
    pub request_id: String,
    /// Whether the execution ran and its output parsed.
    pub success: bool,
    /// Failure detail; empty on success.
    pub error_message: String,
    /// Structured execution output.
    pub output: CodeExecutionOutput,
}

/// Code execution wrapper.
#[derive(Debug, Clone, Copy)]
pub struct Code<'a> {
    session: &'a Session,
}

impl<'a> Code<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Execute `code` in the named language, bounded by `timeout_s`
    /// (default 60).
    ///
    /// Unsupported languages fail locally without a network round trip.
    /// The tool's `data` is the structured document of rich outputs,
    /// stdout/stderr, and execution metadata.
    pub async fn run_code(
        &self,
        code: &str,
        language: &str,
        timeout_s: Option<u32>,
    ) -> CodeResult {
        let language = language.to_ascii_lowercase();
        if !SUPPORTED_LANGUAGES.contains(&language.as_str()) {
            return CodeResult {
                success: false,
                error_message: format!(
                    "unsupported language '{language}'; expected one of: {}",
                    SUPPORTED_LANGUAGES.join(", ")
                ),
                ..CodeResult::default()
            };
        }

        let args = json!({
            "code": code,
            "language": language,
            "timeout_s": timeout_s.unwrap_or(DEFAULT_TIMEOUT_S),
        });
        let result = self.session.call_tool("run_code", args).await;
        if !result.success {
            return CodeResult {
                request_id: result.request_id,
                success: false,
                error_message: result.error_message,
                output: CodeExecutionOutput::default(),
            };
        }

        match serde_json::from_str::<CodeExecutionOutput>(&result.data) {
            Ok(output) => CodeResult {
                request_id: result.request_id,
                success: true,
                error_message: String::new(),
                output,
            },
            Err(err) => CodeResult {
                request_id: result.request_id,
                success: false,
                error_message: format!("execution output was not parseable: {err}"),
                output: CodeExecutionOutput::default(),
            },
        }
    }
}
