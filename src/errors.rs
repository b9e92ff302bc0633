//! Error types shared across the SDK.

use std::fmt::{Display, Formatter};

/// Shared SDK result type.
pub type Result<T> = std::result::Result<T, SdkError>;

/// SDK error enumeration covering all internal failure modes.
///
/// Public operations convert these into result records at the API
/// boundary; only constructors surface them directly.
#[derive(Debug)]
pub enum SdkError {
    /// Missing credential, malformed endpoint, or invalid configuration.
    Config(String),
    /// DNS, connection, TLS, or read-timeout failure. Never retried.
    Transport(String),
    /// The control plane answered with `success=false`.
    Remote {
        /// Server-side error code.
        code: String,
        /// Server-side error message.
        message: String,
        /// Request identifier returned with the failing envelope.
        request_id: String,
    },
    /// Envelope or payload shape violated the wire contract.
    Protocol(String),
    /// The server reported the session (or context) as gone.
    NotFound {
        /// Server-side message describing what is missing.
        message: String,
        /// Request identifier returned with the failing envelope.
        request_id: String,
    },
    /// A successful RPC whose tool payload carried `isError=true`.
    Tool(String),
    /// Missing local source, unwritable destination, or other file I/O.
    LocalIo(String),
    /// Polling budget exhausted before every task reached a terminal state.
    SyncTimeout(String),
}

impl SdkError {
    /// Request identifier attached to this error, when the server sent one.
    #[must_use]
    pub fn request_id(&self) -> &str {
        match self {
            Self::Remote { request_id, .. } | Self::NotFound { request_id, .. } => request_id,
            _ => "",
        }
    }

    /// Whether this error is the soft "session/context is gone" case.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl Display for SdkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "config: {msg}"),
            Self::Transport(msg) => write!(f, "transport: {msg}"),
            Self::Remote {
                code,
                message,
                request_id,
            } => write!(f, "remote failure [{code}]: {message} (request {request_id})"),
            Self::Protocol(msg) => write!(f, "protocol: {msg}"),
            Self::NotFound { message, .. } => write!(f, "not found: {message}"),
            Self::Tool(msg) => write!(f, "tool: {msg}"),
            Self::LocalIo(msg) => write!(f, "io: {msg}"),
            Self::SyncTimeout(msg) => write!(f, "sync timeout: {msg}"),
        }
    }
}

impl std::error::Error for SdkError {}

impl From<std::io::Error> for SdkError {
    fn from(err: std::io::Error) -> Self {
        Self::LocalIo(err.to_string())
    }
}

impl From<serde_json::Error> for SdkError {
    fn from(err: serde_json::Error) -> Self {
        Self::Protocol(format!("invalid json: {err}"))
    }
}
