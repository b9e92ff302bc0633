//! Contexts, mounts, and the sync-policy family.
//!
//! A context is a named persistent storage volume. A [`ContextMount`]
//! declares that a context should be materialized at a sandbox path for
//! the lifetime of one session, with a [`SyncPolicy`] describing how data
//! moves between the context and the sandbox filesystem.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Result, SdkError};

/// A named persistent storage volume.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Context {
    /// Opaque context identifier.
    #[serde(rename = "contextId", default)]
    pub id: String,
    /// Display name, unique per tenant.
    #[serde(default)]
    pub name: String,
    /// Server-side state token (`available`, `in-use`, ...).
    #[serde(default)]
    pub state: String,
    /// Creation timestamp.
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Last-used timestamp.
    #[serde(default)]
    pub last_used_at: Option<DateTime<Utc>>,
}

/// Upload behavior for a mount, applied on session delete with sync.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UploadPolicy {
    /// Flush sandbox state back into the context on session delete.
    pub auto_upload: bool,
    /// Per-file streaming vs batched tarball transfer.
    #[serde(default)]
    pub upload_mode: UploadMode,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            auto_upload: true,
            upload_mode: UploadMode::default(),
        }
    }
}

/// Transfer shape for context uploads.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum UploadMode {
    /// Streaming per-file transfer.
    #[default]
    Stream,
    /// Batched tarball transfer.
    Archive,
}

/// Materialization behavior at session start.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DownloadPolicy {
    /// Materialize the context at the sandbox path when the session starts.
    pub auto_download: bool,
}

impl Default for DownloadPolicy {
    fn default() -> Self {
        Self {
            auto_download: true,
        }
    }
}

/// Cleanup behavior when a mount is released.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DeletePolicy {
    /// Purge the sandbox path on unmount.
    pub purge_on_unmount: bool,
}

/// One include root with optional exclusions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct WhiteList {
    /// Path (or glob) to include, relative to the mount root.
    pub path: String,
    /// Paths (or globs) under `path` to skip.
    #[serde(default)]
    pub exclude_paths: Vec<String>,
}

/// Include/exclude patterns applied to both sync directions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BwList {
    /// Include roots; empty means everything.
    #[serde(default)]
    pub white_lists: Vec<WhiteList>,
}

impl BwList {
    /// Validate that every pattern parses as a glob.
    ///
    /// # Errors
    ///
    /// Returns `SdkError::Config` naming the first pattern that fails.
    pub fn validate(&self) -> Result<()> {
        for entry in &self.white_lists {
            for pattern in std::iter::once(&entry.path).chain(entry.exclude_paths.iter()) {
                glob::Pattern::new(pattern).map_err(|err| {
                    SdkError::Config(format!("invalid bw-list pattern '{pattern}': {err}"))
                })?;
            }
        }
        Ok(())
    }
}

/// Behavior knobs attached to a mount.
///
/// `recycle_policy` and `extract_policy` are server-side concerns passed
/// through opaquely.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SyncPolicy {
    /// Upload behavior; absent means server default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upload_policy: Option<UploadPolicy>,
    /// Materialization behavior; absent means materialize.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_policy: Option<DownloadPolicy>,
    /// Unmount cleanup behavior; absent means server default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delete_policy: Option<DeletePolicy>,
    /// Include/exclude patterns for both directions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bw_list: Option<BwList>,
    /// Server-side retention policy, pass-through.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recycle_policy: Option<serde_json::Value>,
    /// Server-side archive handling, pass-through.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub extract_policy: Option<serde_json::Value>,
}

impl SyncPolicy {
    /// Policy with auto-upload enabled or disabled and defaults elsewhere.
    #[must_use]
    pub fn with_auto_upload(auto_upload: bool) -> Self {
        Self {
            upload_policy: Some(UploadPolicy {
                auto_upload,
                upload_mode: UploadMode::default(),
            }),
            ..Self::default()
        }
    }

    /// Whether this policy asks for a sandbox→context flush on delete.
    #[must_use]
    pub fn wants_auto_upload(&self) -> bool {
        self.upload_policy
            .as_ref()
            .is_some_and(|policy| policy.auto_upload)
    }
}

/// Declaration that a context is materialized at a sandbox path for one
/// session. Recreated at each session create.
#[derive(Debug, Clone, PartialEq)]
pub struct ContextMount {
    /// Context to materialize.
    pub context_id: String,
    /// Absolute path inside the sandbox.
    pub path: String,
    /// Behavior knobs; `None` means server defaults throughout.
    pub policy: Option<SyncPolicy>,
}

impl ContextMount {
    /// Mount `context_id` at `path` with server-default policy.
    #[must_use]
    pub fn new(context_id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            context_id: context_id.into(),
            path: path.into(),
            policy: None,
        }
    }

    /// Attach a policy to this mount.
    #[must_use]
    pub fn with_policy(mut self, policy: SyncPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Whether this mount asks for a sandbox→context flush on delete.
    #[must_use]
    pub fn wants_auto_upload(&self) -> bool {
        self.policy
            .as_ref()
            .is_some_and(SyncPolicy::wants_auto_upload)
    }
}
