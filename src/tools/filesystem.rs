//! Sandbox filesystem operations.
//!
//! Directory listings come back as `[DIR]`/`[FILE]` prefixed lines and
//! file info as `key: value` lines; both are parsed here into typed rows.
//! Reads and writes beyond the per-call payload ceiling are chunked over
//! the offset/length variants of the underlying tools.

use serde_json::json;

use crate::models::tool::ToolResult;
use crate::session::Session;

/// Chunk size for large-file reads and writes.
const CHUNK_SIZE: usize = 50 * 1024;

/// Result of an operation returning no payload.
#[derive(Debug, Clone, Default)]
pub struct FsResult {
    /// Request identifier from the underlying tool call.
    pub request_id: String,
    /// Whether the operation succeeded.
    pub success: bool,
    /// Failure detail; empty on success.
    pub error_message: String,
}

impl FsResult {
    fn from_tool(result: ToolResult) -> Self {
        Self {
            request_id: result.request_id,
            success: result.success,
            error_message: result.error_message,
        }
    }
}

/// Result of a file read.
#[derive(Debug, Clone, Default)]
pub struct FileContentResult {
    /// Request identifier from the underlying tool call.
    pub request_id: String,
    /// Whether the read succeeded.
    pub success: bool,
    /// Failure detail; empty on success.
    pub error_message: String,
    /// File content.
    pub content: String,
}

/// One directory entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirEntry {
    /// Entry name.
    pub name: String,
    /// Whether the entry is a directory.
    pub is_dir: bool,
}

/// Result of a directory listing.
#[derive(Debug, Clone, Default)]
pub struct DirListResult {
    /// Request identifier from the underlying tool call.
    pub request_id: String,
    /// Whether the listing succeeded.
    pub success: bool,
    /// Failure detail; empty on success.
    pub error_message: String,
    /// Entries in server order.
    pub entries: Vec<DirEntry>,
}

/// Parsed file metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileInfo {
    /// Size in bytes.
    pub size: i64,
    /// Whether the path is a directory.
    pub is_directory: bool,
    /// Last-modified timestamp, as the server formats it.
    pub mod_time: String,
    /// Permission string.
    pub mode: String,
}

/// Result of a file-info query.
#[derive(Debug, Clone, Default)]
pub struct FileInfoResult {
    /// Request identifier from the underlying tool call.
    pub request_id: String,
    /// Whether the query succeeded.
    pub success: bool,
    /// Failure detail; empty on success.
    pub error_message: String,
    /// Parsed metadata, on success.
    pub info: Option<FileInfo>,
}

/// Result of a file search.
#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    /// Request identifier from the underlying tool call.
    pub request_id: String,
    /// Whether the search succeeded.
    pub success: bool,
    /// Failure detail; empty on success.
    pub error_message: String,
    /// Matching paths.
    pub matches: Vec<String>,
}

/// Sandbox filesystem wrapper.
#[derive(Debug, Clone, Copy)]
pub struct FileSystem<'a> {
    session: &'a Session,
}

impl<'a> FileSystem<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Read a file.
    pub async fn read_file(&self, path: &str) -> FileContentResult {
        let result = self.session.call_tool("read_file", json!({ "path": path })).await;
        FileContentResult {
            request_id: result.request_id,
            success: result.success,
            error_message: result.error_message,
            content: result.data,
        }
    }

    /// Read a file of any size, chunking over offset/length reads.
    pub async fn read_large_file(&self, path: &str) -> FileContentResult {
        let mut content = String::new();
        let mut offset = 0usize;
        loop {
            let result = self
                .session
                .call_tool(
                    "read_file",
                    json!({ "path": path, "offset": offset, "length": CHUNK_SIZE }),
                )
                .await;
            if !result.success {
                return FileContentResult {
                    request_id: result.request_id,
                    success: false,
                    error_message: result.error_message,
                    content,
                };
            }
            let chunk_len = result.data.len();
            content.push_str(&result.data);
            offset += chunk_len;
            if chunk_len < CHUNK_SIZE {
                return FileContentResult {
                    request_id: result.request_id,
                    success: true,
                    error_message: String::new(),
                    content,
                };
            }
        }
    }

    /// Write `content` to a file. `mode` is `overwrite` (default) or
    /// `append`.
    pub async fn write_file(&self, path: &str, content: &str, mode: Option<&str>) -> FsResult {
        let args = json!({
            "path": path,
            "content": content,
            "mode": mode.unwrap_or("overwrite"),
        });
        FsResult::from_tool(self.session.call_tool("write_file", args).await)
    }

    /// Write content of any size, chunking into append writes.
    pub async fn write_large_file(&self, path: &str, content: &str) -> FsResult {
        if content.len() <= CHUNK_SIZE {
            return self.write_file(path, content, Some("overwrite")).await;
        }

        let mut start = 0usize;
        let mut first = true;
        while start < content.len() {
            // Chunk on a char boundary so no write splits a code point.
            let mut end = (start + CHUNK_SIZE).min(content.len());
            while !content.is_char_boundary(end) {
                end -= 1;
            }
            let mode = if first { "overwrite" } else { "append" };
            let result = self
                .write_file(path, &content[start..end], Some(mode))
                .await;
            if !result.success {
                return result;
            }
            first = false;
            start = end;
        }
        FsResult {
            request_id: String::new(),
            success: true,
            error_message: String::new(),
        }
    }

    /// Create a directory, including missing parents.
    pub async fn create_directory(&self, path: &str) -> FsResult {
        FsResult::from_tool(
            self.session
                .call_tool("create_directory", json!({ "path": path }))
                .await,
        )
    }

    /// List a directory.
    pub async fn list_directory(&self, path: &str) -> DirListResult {
        let result = self
            .session
            .call_tool("list_directory", json!({ "path": path }))
            .await;
        if !result.success {
            return DirListResult {
                request_id: result.request_id,
                success: false,
                error_message: result.error_message,
                entries: Vec::new(),
            };
        }
        DirListResult {
            request_id: result.request_id,
            success: true,
            error_message: String::new(),
            entries: parse_directory_listing(&result.data),
        }
    }

    /// Move or rename a file.
    pub async fn move_file(&self, source: &str, destination: &str) -> FsResult {
        let args = json!({ "source": source, "destination": destination });
        FsResult::from_tool(self.session.call_tool("move_file", args).await)
    }

    /// Delete a file.
    pub async fn delete_file(&self, path: &str) -> FsResult {
        FsResult::from_tool(
            self.session
                .call_tool("delete_file", json!({ "path": path }))
                .await,
        )
    }

    /// Fetch metadata for a path.
    pub async fn get_file_info(&self, path: &str) -> FileInfoResult {
        let result = self
            .session
            .call_tool("get_file_info", json!({ "path": path }))
            .await;
        if !result.success {
            return FileInfoResult {
                request_id: result.request_id,
                success: false,
                error_message: result.error_message,
                info: None,
            };
        }
        FileInfoResult {
            request_id: result.request_id,
            success: true,
            error_message: String::new(),
            info: Some(parse_file_info(&result.data)),
        }
    }

    /// Search `path` recursively for names matching `pattern`.
    pub async fn search_files(&self, path: &str, pattern: &str) -> SearchResult {
        let args = json!({ "path": path, "pattern": pattern });
        let result = self.session.call_tool("search_files", args).await;
        if !result.success {
            return SearchResult {
                request_id: result.request_id,
                success: false,
                error_message: result.error_message,
                matches: Vec::new(),
            };
        }
        let matches = result
            .data
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && *line != "No matches found")
            .map(str::to_owned)
            .collect();
        SearchResult {
            request_id: result.request_id,
            success: true,
            error_message: String::new(),
            matches,
        }
    }
}

fn parse_directory_listing(data: &str) -> Vec<DirEntry> {
    data.lines()
        .filter_map(|line| {
            let line = line.trim();
            if let Some(name) = line.strip_prefix("[DIR]") {
                Some(DirEntry {
                    name: name.trim().to_owned(),
                    is_dir: true,
                })
            } else if let Some(name) = line.strip_prefix("[FILE]") {
                Some(DirEntry {
                    name: name.trim().to_owned(),
                    is_dir: false,
                })
            } else {
                None
            }
        })
        .collect()
}

fn parse_file_info(data: &str) -> FileInfo {
    let mut info = FileInfo::default();
    for line in data.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "size" => info.size = value.parse().unwrap_or_default(),
            "isDirectory" => info.is_directory = value.eq_ignore_ascii_case("true"),
            "modTime" => info.mod_time = value.to_owned(),
            "mode" => info.mode = value.to_owned(),
            _ => {}
        }
    }
    info
}
