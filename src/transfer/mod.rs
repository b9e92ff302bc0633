//! File transfer between the local machine and sandbox paths.
//!
//! Both directions are two-leg protocols: bytes move over a presigned
//! object-storage URL, and a context sync bridges object storage and the
//! sandbox filesystem. Upload PUTs first and then asks the sandbox to
//! pull (`sync download`); download asks the sandbox to push
//! (`sync upload`), waits until the push settles, then GETs.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::header::{CONTENT_LENGTH, CONTENT_TYPE, ETAG};
use tokio::io::AsyncWriteExt;
use tokio_util::io::ReaderStream;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::context::sync::DEFAULT_POLL_INTERVAL;
use crate::models::sync::SyncMode;
use crate::session::Session;

/// Default completion-gate budget for uploads (sandbox pull).
pub const DEFAULT_UPLOAD_WAIT: Duration = Duration::from_secs(30);
/// Default completion-gate budget for downloads (sandbox push).
pub const DEFAULT_DOWNLOAD_WAIT: Duration = Duration::from_secs(300);

/// Options for [`FileTransfer::upload`].
#[derive(Debug)]
pub struct UploadOptions {
    /// Wait for the sandbox to pull the bytes before returning.
    pub wait: bool,
    /// Completion-gate budget when `wait` is set.
    pub wait_timeout: Duration,
    /// Interval between completion polls.
    pub poll_interval: Duration,
    /// `Content-Type` for the presigned PUT.
    pub content_type: Option<String>,
    /// Cooperative cancellation; aborts HTTP and skips further polling.
    pub cancel: Option<CancellationToken>,
}

impl Default for UploadOptions {
    fn default() -> Self {
        Self {
            wait: true,
            wait_timeout: DEFAULT_UPLOAD_WAIT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            content_type: None,
            cancel: None,
        }
    }
}

/// Options for [`FileTransfer::download`].
pub struct DownloadOptions {
    /// Completion-gate budget for the sandbox push.
    pub wait_timeout: Duration,
    /// Interval between completion polls.
    pub poll_interval: Duration,
    /// Replace an existing local file; when false, an existing
    /// destination fails before any network I/O.
    pub overwrite: bool,
    /// Follow redirects on the presigned GET.
    pub follow_redirects: bool,
    /// Invoked with cumulative bytes received after each chunk.
    pub progress: Option<Box<dyn FnMut(u64) + Send>>,
    /// Cooperative cancellation; aborts HTTP and skips further polling.
    pub cancel: Option<CancellationToken>,
}

impl Default for DownloadOptions {
    fn default() -> Self {
        Self {
            wait_timeout: DEFAULT_DOWNLOAD_WAIT,
            poll_interval: DEFAULT_POLL_INTERVAL,
            overwrite: true,
            follow_redirects: true,
            progress: None,
            cancel: None,
        }
    }
}

impl std::fmt::Debug for DownloadOptions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadOptions")
            .field("wait_timeout", &self.wait_timeout)
            .field("poll_interval", &self.poll_interval)
            .field("overwrite", &self.overwrite)
            .field("follow_redirects", &self.follow_redirects)
            .field("progress", &self.progress.is_some())
            .finish_non_exhaustive()
    }
}

/// Outcome of an upload. Partial failures keep every captured request id.
#[derive(Debug, Clone, Default)]
pub struct UploadResult {
    /// Whether the full pipeline succeeded.
    pub success: bool,
    /// Bytes put to object storage.
    pub bytes_sent: u64,
    /// HTTP status of the presigned PUT; 0 when it never ran.
    pub http_status: u16,
    /// `ETag` the object store returned, when present.
    pub etag: String,
    /// Request id of the URL-minting RPC.
    pub request_id_upload_url: String,
    /// Request id of the sync-trigger RPC.
    pub request_id_sync: String,
    /// Target sandbox path.
    pub path: String,
    /// Failure detail; empty on success.
    pub error_message: String,
}

/// Outcome of a download. Partial failures keep every captured request id.
#[derive(Debug, Clone, Default)]
pub struct DownloadResult {
    /// Whether the full pipeline succeeded.
    pub success: bool,
    /// Bytes streamed to the local file.
    pub bytes_received: u64,
    /// HTTP status of the presigned GET; 0 when it never ran.
    pub http_status: u16,
    /// Request id of the URL-minting RPC.
    pub request_id_download_url: String,
    /// Request id of the sync-trigger RPC.
    pub request_id_sync: String,
    /// Source sandbox path.
    pub path: String,
    /// Local destination.
    pub local_path: PathBuf,
    /// Failure detail; empty on success.
    pub error_message: String,
}

/// Moves files between the local machine and one session's sandbox.
#[derive(Debug, Clone, Copy)]
pub struct FileTransfer<'a> {
    session: &'a Session,
}

impl<'a> FileTransfer<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Upload a local file to `sandbox_path`.
    ///
    /// Legs: presigned PUT of the file bytes, then a `sync download`
    /// asking the sandbox to pull from object storage, then (unless
    /// `opts.wait` is off) a completion gate on that pull.
    pub async fn upload(
        &self,
        local_path: impl AsRef<Path>,
        sandbox_path: &str,
        opts: UploadOptions,
    ) -> UploadResult {
        let local_path = local_path.as_ref();
        let mut result = UploadResult {
            path: sandbox_path.to_owned(),
            ..UploadResult::default()
        };

        let metadata = match tokio::fs::metadata(local_path).await {
            Ok(metadata) if metadata.is_file() => metadata,
            Ok(_) => {
                result.error_message = format!("{} is not a regular file", local_path.display());
                return result;
            }
            Err(err) => {
                result.error_message =
                    format!("cannot read {}: {err}", local_path.display());
                return result;
            }
        };
        let length = metadata.len();

        let context_id = match self.session.ensure_file_transfer_context().await {
            Ok(id) => id,
            Err(err) => {
                result.error_message = err.to_string();
                return result;
            }
        };

        let minted = self
            .session
            .contexts()
            .get_file_upload_url(&context_id, sandbox_path)
            .await;
        result.request_id_upload_url = minted.request_id.clone();
        if !minted.success {
            result.error_message = minted.error_message;
            return result;
        }

        let file = match tokio::fs::File::open(local_path).await {
            Ok(file) => file,
            Err(err) => {
                result.error_message =
                    format!("cannot open {}: {err}", local_path.display());
                return result;
            }
        };

        let mut request = self
            .session
            .http()
            .put(&minted.url)
            .header(CONTENT_LENGTH, length)
            .body(reqwest::Body::wrap_stream(ReaderStream::new(file)));
        if let Some(content_type) = &opts.content_type {
            request = request.header(CONTENT_TYPE, content_type.as_str());
        }

        let send = request.send();
        let response = match &opts.cancel {
            Some(token) => {
                tokio::select! {
                    () = token.cancelled() => {
                        result.error_message = "upload cancelled".into();
                        return result;
                    }
                    outcome = send => outcome,
                }
            }
            None => send.await,
        };
        let response = match response {
            Ok(response) => response,
            Err(err) => {
                result.error_message = format!("presigned put failed: {err}");
                return result;
            }
        };

        result.http_status = response.status().as_u16();
        result.etag = response
            .headers()
            .get(ETAG)
            .and_then(|value| value.to_str().ok())
            .map(|value| value.trim_matches('"').to_owned())
            .unwrap_or_default();
        if !matches!(result.http_status, 200 | 201 | 204) {
            result.error_message = format!("Upload failed with HTTP {}", result.http_status);
            return result;
        }
        result.bytes_sent = length;
        debug!(path = sandbox_path, bytes = length, "presigned put complete");

        // The sandbox pulls from object storage: direction is download
        // from its perspective.
        let engine = self.session.context_sync();
        let trigger = engine
            .sync(Some(&context_id), Some(sandbox_path), SyncMode::Download)
            .await;
        result.request_id_sync = trigger.request_id.clone();
        if !trigger.success {
            result.error_message = trigger.error_message;
            return result;
        }

        if opts.wait {
            let settled = engine
                .wait_for_terminal(
                    Some(&context_id),
                    Some(sandbox_path),
                    Some(SyncMode::Download),
                    opts.wait_timeout,
                    opts.poll_interval,
                    opts.cancel.as_ref(),
                )
                .await;
            if !settled.success {
                result.error_message = settled.error_message;
                return result;
            }
        }

        info!(path = sandbox_path, bytes = length, "upload complete");
        result.success = true;
        result
    }

    /// Download `sandbox_path` into a local file.
    ///
    /// Legs: a `sync upload` asking the sandbox to push into object
    /// storage, a mandatory completion gate (the presigned GET 404s
    /// before the push settles), then a streamed GET into `local_path`.
    /// Bytes already on disk are left in place when a later leg fails.
    pub async fn download(
        &self,
        sandbox_path: &str,
        local_path: impl Into<PathBuf>,
        mut opts: DownloadOptions,
    ) -> DownloadResult {
        let local_path = local_path.into();
        let mut result = DownloadResult {
            path: sandbox_path.to_owned(),
            local_path: local_path.clone(),
            ..DownloadResult::default()
        };

        if !opts.overwrite && local_path.exists() {
            result.error_message = format!(
                "{} already exists and overwrite is disabled",
                local_path.display()
            );
            return result;
        }

        let context_id = match self.session.ensure_file_transfer_context().await {
            Ok(id) => id,
            Err(err) => {
                result.error_message = err.to_string();
                return result;
            }
        };

        // The sandbox pushes into object storage: direction is upload
        // from its perspective. The gate is mandatory.
        let engine = self.session.context_sync();
        let trigger = engine
            .sync(Some(&context_id), Some(sandbox_path), SyncMode::Upload)
            .await;
        result.request_id_sync = trigger.request_id.clone();
        if !trigger.success {
            result.error_message = trigger.error_message;
            return result;
        }
        let settled = engine
            .wait_for_terminal(
                Some(&context_id),
                Some(sandbox_path),
                Some(SyncMode::Upload),
                opts.wait_timeout,
                opts.poll_interval,
                opts.cancel.as_ref(),
            )
            .await;
        if !settled.success {
            result.error_message = settled.error_message;
            return result;
        }

        let minted = self
            .session
            .contexts()
            .get_file_download_url(&context_id, sandbox_path)
            .await;
        result.request_id_download_url = minted.request_id.clone();
        if !minted.success {
            result.error_message = minted.error_message;
            return result;
        }

        let response = match self.presigned_get(&minted.url, &opts).await {
            Ok(response) => response,
            Err(message) => {
                result.error_message = message;
                return result;
            }
        };
        result.http_status = response.status().as_u16();
        if result.http_status != 200 {
            result.error_message = format!("Download failed with HTTP {}", result.http_status);
            return result;
        }

        if let Some(parent) = local_path.parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(err) = tokio::fs::create_dir_all(parent).await {
                    result.error_message =
                        format!("cannot create {}: {err}", parent.display());
                    return result;
                }
            }
        }
        let mut file = match tokio::fs::File::create(&local_path).await {
            Ok(file) => file,
            Err(err) => {
                result.error_message =
                    format!("cannot create {}: {err}", local_path.display());
                return result;
            }
        };

        let mut received: u64 = 0;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            if opts
                .cancel
                .as_ref()
                .is_some_and(CancellationToken::is_cancelled)
            {
                result.bytes_received = received;
                result.error_message = "download cancelled".into();
                return result;
            }
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(err) => {
                    result.bytes_received = received;
                    result.error_message = format!("presigned get stream failed: {err}");
                    return result;
                }
            };
            if let Err(err) = file.write_all(&chunk).await {
                result.bytes_received = received;
                result.error_message =
                    format!("cannot write {}: {err}", local_path.display());
                return result;
            }
            received += chunk.len() as u64;
            if let Some(progress) = opts.progress.as_mut() {
                progress(received);
            }
        }
        if let Err(err) = file.flush().await {
            result.bytes_received = received;
            result.error_message = format!("cannot flush {}: {err}", local_path.display());
            return result;
        }

        info!(path = sandbox_path, bytes = received, "download complete");
        result.bytes_received = received;
        result.success = true;
        result
    }

    async fn presigned_get(
        &self,
        url: &str,
        opts: &DownloadOptions,
    ) -> std::result::Result<reqwest::Response, String> {
        let send = if opts.follow_redirects {
            self.session.http().get(url).send()
        } else {
            // One-off client: redirect policy is client-wide in reqwest.
            let client = reqwest::Client::builder()
                .redirect(reqwest::redirect::Policy::none())
                .build()
                .map_err(|err| format!("failed to build http client: {err}"))?;
            client.get(url).send()
        };

        let outcome = match &opts.cancel {
            Some(token) => {
                tokio::select! {
                    () = token.cancelled() => return Err("download cancelled".into()),
                    outcome = send => outcome,
                }
            }
            None => send.await,
        };
        outcome.map_err(|err| format!("presigned get failed: {err}"))
    }
}
