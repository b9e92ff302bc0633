//! Generic operation result record.

use crate::SdkError;

/// Outcome of an operation that returns no payload.
///
/// Public SDK operations report failures through records like this one
/// instead of errors, so every captured request id survives the failure
/// path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationResult {
    /// Request identifier from the underlying RPC, when one was issued.
    pub request_id: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Failure detail; empty on success.
    pub error_message: String,
}

impl OperationResult {
    /// A success record carrying `request_id`.
    #[must_use]
    pub fn ok(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            success: true,
            error_message: String::new(),
        }
    }

    /// A failure record built from an internal error, preserving the
    /// request id the server attached to the failure, if any.
    #[must_use]
    pub fn from_error(err: &SdkError) -> Self {
        Self {
            request_id: err.request_id().to_owned(),
            success: false,
            error_message: err.to_string(),
        }
    }
}
