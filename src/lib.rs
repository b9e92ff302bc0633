#![forbid(unsafe_code)]

//! Client SDK for the AgentBay agent sandbox cloud.
//!
//! The entry point is [`AgentBay`]: it creates, recovers, lists, and
//! deletes sandbox [`Session`]s. A session exposes the uniform tool-call
//! surface ([`Session::call_tool`]) plus typed wrappers for shell, code
//! execution, filesystem, UI, window, and application operations, a file
//! transfer engine bridging local files and sandbox paths through
//! presigned object-storage URLs, and persistent named contexts that
//! survive session lifetimes.
//!
//! The credential comes from the constructor or `AGENTBAY_API_KEY`;
//! `AGENTBAY_ENDPOINT` and `AGENTBAY_TIMEOUT_MS` override the control
//! plane address and request timeout, optionally via a `.env` file found
//! by walking parent directories.
//!
//! ```no_run
//! use agentbay::{AgentBay, CreateSessionParams};
//!
//! # async fn demo() -> agentbay::Result<()> {
//! let agent_bay = AgentBay::new(None)?;
//!
//! let created = agent_bay
//!     .create(CreateSessionParams {
//!         image_id: Some("linux_latest".into()),
//!         ..CreateSessionParams::default()
//!     })
//!     .await;
//! if let Some(session) = created.session {
//!     let echo = session
//!         .command()
//!         .execute_command("echo hi", Some(1000))
//!         .await;
//!     println!("{}", echo.output);
//!     session.delete(false).await;
//! }
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod config;
pub mod context;
pub mod errors;
pub mod models;
pub mod redact;
pub mod session;
pub mod tools;
pub mod transfer;

pub use config::Config;
pub use context::store::{ContextListParams, ContextService};
pub use context::sync::ContextSync;
pub use errors::{Result, SdkError};
pub use models::context::{ContextMount, SyncPolicy};
pub use models::result::OperationResult;
pub use models::sync::SyncMode;
pub use models::tool::ToolResult;
pub use session::manager::{
    AgentBay, BrowserContext, CreateSessionParams, ExtraConfigs, SessionListResult, SessionResult,
};
pub use session::Session;
pub use transfer::{DownloadOptions, DownloadResult, FileTransfer, UploadOptions, UploadResult};
