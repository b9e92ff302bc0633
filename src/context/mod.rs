//! Named persistent contexts: CRUD, presigned URLs, and per-session sync.

pub mod store;
pub mod sync;

pub use store::{ContextListParams, ContextService};
pub use sync::ContextSync;
