//! Context CRUD, presigned-URL minting, and context file listings.

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::types::{ContextFileEntry, ListContextFilesRequest, ListContextsRequest};
use crate::api::ApiClient;
use crate::models::context::Context;
use crate::models::result::OperationResult;

/// Default page size for list operations.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// Result of a context lookup or creation.
#[derive(Debug, Clone, Default)]
pub struct ContextResult {
    /// Request identifier from the underlying RPC.
    pub request_id: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Failure detail; empty on success.
    pub error_message: String,
    /// The context, on success.
    pub context: Option<Context>,
}

/// One page of contexts.
#[derive(Debug, Clone, Default)]
pub struct ContextListResult {
    /// Request identifier from the last page RPC issued.
    pub request_id: String,
    /// Whether the traversal succeeded.
    pub success: bool,
    /// Failure detail; empty on success.
    pub error_message: String,
    /// Rows of the requested page.
    pub contexts: Vec<Context>,
    /// Cursor for the page after the requested one; empty at the end.
    pub next_token: String,
    /// Total matching contexts, when the server counts them.
    pub total_count: Option<u32>,
}

/// Result of minting a presigned URL.
#[derive(Debug, Clone, Default)]
pub struct UrlResult {
    /// Request identifier from the underlying RPC.
    pub request_id: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Failure detail; empty on success.
    pub error_message: String,
    /// The presigned URL, on success.
    pub url: String,
    /// URL expiry, epoch seconds, when the server reported one.
    pub expire_timestamp: Option<i64>,
}

/// One page of files stored in a context.
#[derive(Debug, Clone, Default)]
pub struct ContextFileListResult {
    /// Request identifier from the last page RPC issued.
    pub request_id: String,
    /// Whether the traversal succeeded.
    pub success: bool,
    /// Failure detail; empty on success.
    pub error_message: String,
    /// Rows of the requested page.
    pub entries: Vec<ContextFileEntry>,
}

/// Pagination parameters for [`ContextService::list`].
#[derive(Debug, Clone, Copy)]
pub struct ContextListParams {
    /// 1-based page to fetch.
    pub page: u32,
    /// Page size.
    pub limit: u32,
}

impl Default for ContextListParams {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

/// CRUD over named contexts and their object-storage surface.
#[derive(Debug, Clone)]
pub struct ContextService {
    api: Arc<ApiClient>,
}

impl ContextService {
    pub(crate) fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Look up a context by name, creating it when `create_if_missing`.
    pub async fn get(&self, name: &str, create_if_missing: bool) -> ContextResult {
        match self.api.get_context(name, create_if_missing).await {
            Ok(response) => match response.data {
                Some(context) if !context.id.is_empty() => {
                    info!(name, context_id = %context.id, "resolved context");
                    ContextResult {
                        request_id: response.request_id,
                        success: true,
                        error_message: String::new(),
                        context: Some(context),
                    }
                }
                _ => ContextResult {
                    request_id: response.request_id,
                    success: false,
                    error_message: format!("context '{name}' response carried no context id"),
                    context: None,
                },
            },
            Err(err) => ContextResult {
                request_id: err.request_id().to_owned(),
                success: false,
                error_message: err.to_string(),
                context: None,
            },
        }
    }

    /// Fetch one page of contexts.
    ///
    /// The server only exposes forward cursors, so page `N` walks `N`
    /// RPCs from the start.
    pub async fn list(&self, params: ContextListParams) -> ContextListResult {
        let page = params.page.max(1);
        let mut next_token: Option<String> = None;

        for current in 1..=page {
            let request = ListContextsRequest {
                max_results: params.limit,
                next_token: next_token.take(),
            };
            let response = match self.api.list_contexts(&request).await {
                Ok(response) => response,
                Err(err) => {
                    return ContextListResult {
                        request_id: err.request_id().to_owned(),
                        success: false,
                        error_message: err.to_string(),
                        ..ContextListResult::default()
                    };
                }
            };
            let data = response.data.unwrap_or_default();

            if current == page {
                return ContextListResult {
                    request_id: response.request_id,
                    success: true,
                    error_message: String::new(),
                    contexts: data.data,
                    next_token: data.next_token,
                    total_count: data.total_count,
                };
            }

            if data.next_token.is_empty() {
                return ContextListResult {
                    request_id: response.request_id,
                    success: false,
                    error_message: format!(
                        "page {page} is out of range; results end at page {current}"
                    ),
                    ..ContextListResult::default()
                };
            }
            next_token = Some(data.next_token);
        }

        // Unreachable: the loop always returns on its last iteration.
        ContextListResult::default()
    }

    /// Persist a context rename.
    pub async fn update(&self, context: &Context) -> OperationResult {
        match self.api.modify_context(&context.id, &context.name).await {
            Ok(response) => OperationResult::ok(response.request_id),
            Err(err) => OperationResult::from_error(&err),
        }
    }

    /// Delete a context.
    pub async fn delete(&self, context: &Context) -> OperationResult {
        match self.api.delete_context(&context.id).await {
            Ok(response) => {
                info!(context_id = %context.id, "deleted context");
                OperationResult::ok(response.request_id)
            }
            Err(err) => {
                warn!(context_id = %context.id, %err, "context delete failed");
                OperationResult::from_error(&err)
            }
        }
    }

    /// Mint a presigned upload URL for `(context, path)`.
    pub async fn get_file_upload_url(&self, context_id: &str, path: &str) -> UrlResult {
        Self::url_result(self.api.get_file_upload_url(context_id, path).await)
    }

    /// Mint a presigned download URL for `(context, path)`.
    pub async fn get_file_download_url(&self, context_id: &str, path: &str) -> UrlResult {
        Self::url_result(self.api.get_file_download_url(context_id, path).await)
    }

    /// Fetch one page of files under `path` in a context.
    pub async fn list_files(
        &self,
        context_id: &str,
        path: &str,
        page: u32,
        limit: u32,
    ) -> ContextFileListResult {
        let page = page.max(1);
        let mut next_token: Option<String> = None;

        for current in 1..=page {
            let request = ListContextFilesRequest {
                context_id: context_id.to_owned(),
                parent_folder_path: path.to_owned(),
                max_results: limit,
                next_token: next_token.take(),
            };
            let response = match self.api.list_context_files(&request).await {
                Ok(response) => response,
                Err(err) => {
                    return ContextFileListResult {
                        request_id: err.request_id().to_owned(),
                        success: false,
                        error_message: err.to_string(),
                        entries: Vec::new(),
                    };
                }
            };
            let data = response.data.unwrap_or_default();

            if current == page {
                return ContextFileListResult {
                    request_id: response.request_id,
                    success: true,
                    error_message: String::new(),
                    entries: data.entries,
                };
            }

            if data.next_token.is_empty() {
                return ContextFileListResult {
                    request_id: response.request_id,
                    success: false,
                    error_message: format!(
                        "page {page} is out of range; results end at page {current}"
                    ),
                    entries: Vec::new(),
                };
            }
            next_token = Some(data.next_token);
        }

        ContextFileListResult::default()
    }

    /// Delete one file stored in a context.
    pub async fn delete_file(&self, context_id: &str, path: &str) -> OperationResult {
        match self.api.delete_context_file(context_id, path).await {
            Ok(response) => OperationResult::ok(response.request_id),
            Err(err) => OperationResult::from_error(&err),
        }
    }

    fn url_result(
        outcome: crate::Result<crate::api::types::ApiResponse<crate::api::types::UrlData>>,
    ) -> UrlResult {
        match outcome {
            Ok(response) => {
                let data = response.data.unwrap_or_default();
                match data.url {
                    Some(url) if !url.is_empty() => UrlResult {
                        request_id: response.request_id,
                        success: true,
                        error_message: String::new(),
                        url,
                        expire_timestamp: data.expire_time,
                    },
                    _ => UrlResult {
                        request_id: response.request_id,
                        success: false,
                        error_message: "response carried no presigned url".into(),
                        url: String::new(),
                        expire_timestamp: None,
                    },
                }
            }
            Err(err) => UrlResult {
                request_id: err.request_id().to_owned(),
                success: false,
                error_message: err.to_string(),
                url: String::new(),
                expire_timestamp: None,
            },
        }
    }
}
