//! Filesystem operations inside a session.
//!
//! Tool payloads are capped, so reads and writes above [`CHUNK_SIZE`] are
//! transparently split into chunked tool calls. Bulk transfer in and out of
//! a mounted context goes through presigned URLs plus a follow-up sync; the
//! control plane never carries file bytes.

use std::collections::HashMap;

use serde_json::json;
use serde_json::Value;

use crate::response::BoolResult;
use crate::session::Session;

/// Chunk size for oversized reads and writes (60 KB).
pub const CHUNK_SIZE: u64 = 60 * 1024;

const SEPARATOR: &str = "---";

/// Result of reading one file.
#[derive(Debug, Clone, Default)]
pub struct FileContentResult {
    pub request_id: String,
    pub success: bool,
    pub content: String,
    pub error_message: String,
}

/// Parsed attributes of a file or directory.
#[derive(Debug, Clone, Default)]
pub struct FileInfo {
    pub name: String,
    pub path: String,
    pub size: u64,
    pub is_file: bool,
    pub is_directory: bool,
    pub permissions: String,
    pub modified: String,
}

/// Result of a file-info query.
#[derive(Debug, Clone, Default)]
pub struct FileInfoResult {
    pub request_id: String,
    pub success: bool,
    pub file_info: FileInfo,
    pub error_message: String,
}

/// One directory entry.
#[derive(Debug, Clone, Default)]
pub struct DirectoryEntry {
    pub name: String,
    pub is_file: bool,
    pub is_directory: bool,
    pub size: u64,
}

/// Result of a directory listing.
#[derive(Debug, Clone, Default)]
pub struct DirectoryListResult {
    pub request_id: String,
    pub success: bool,
    pub entries: Vec<DirectoryEntry>,
    pub error_message: String,
}

/// Result of a file search.
#[derive(Debug, Clone, Default)]
pub struct SearchFilesResult {
    pub request_id: String,
    pub success: bool,
    pub matches: Vec<String>,
    pub error_message: String,
}

/// Result of reading several files at once.
#[derive(Debug, Clone, Default)]
pub struct MultipleFileContentResult {
    pub request_id: String,
    pub success: bool,
    pub contents: HashMap<String, String>,
    pub error_message: String,
}

/// Result of a bulk upload into a mounted context.
#[derive(Debug, Clone, Default)]
pub struct UploadResult {
    pub success: bool,
    pub request_id_upload_url: String,
    pub request_id_sync: String,
    pub http_status: Option<u16>,
    pub etag: Option<String>,
    pub bytes_sent: u64,
    pub path: String,
    pub error: Option<String>,
}

/// Result of a bulk download out of a mounted context.
#[derive(Debug, Clone, Default)]
pub struct DownloadResult {
    pub success: bool,
    pub request_id_download_url: String,
    pub request_id_sync: String,
    pub http_status: Option<u16>,
    pub bytes_received: u64,
    pub path: String,
    pub content: Vec<u8>,
    pub error: Option<String>,
}

/// Filesystem operations bound to one session.
#[derive(Debug, Clone, Copy)]
pub struct FileSystem<'a> {
    session: &'a Session,
}

impl<'a> FileSystem<'a> {
    pub(crate) fn new(session: &'a Session) -> Self {
        Self { session }
    }

    /// Read a file, chunking transparently when it exceeds [`CHUNK_SIZE`].
    pub async fn read_file(&self, path: &str) -> FileContentResult {
        let info = self.get_file_info(path).await;
        if !info.success {
            return FileContentResult {
                request_id: info.request_id,
                success: false,
                content: String::new(),
                error_message: info.error_message,
            };
        }

        let size = info.file_info.size;
        if size <= CHUNK_SIZE {
            return self.read_file_chunk(path, None, None).await;
        }

        let mut content = String::new();
        let mut request_id = String::new();
        let mut offset = 0;
        while offset < size {
            let length = CHUNK_SIZE.min(size - offset);
            let chunk = self.read_file_chunk(path, Some(offset), Some(length)).await;
            if !chunk.success {
                return chunk;
            }
            content.push_str(&chunk.content);
            request_id = chunk.request_id;
            offset += length;
        }

        FileContentResult {
            request_id,
            success: true,
            content,
            error_message: String::new(),
        }
    }

    async fn read_file_chunk(
        &self,
        path: &str,
        offset: Option<u64>,
        length: Option<u64>,
    ) -> FileContentResult {
        let mut args = json!({ "path": path });
        if let Some(offset) = offset {
            args["offset"] = json!(offset);
        }
        if let Some(length) = length {
            args["length"] = json!(length);
        }

        let result = self.session.call_mcp_tool("read_file", args).await;
        FileContentResult {
            request_id: result.request_id,
            success: result.success,
            content: result.data,
            error_message: result.error_message,
        }
    }

    /// Write a file; contents above [`CHUNK_SIZE`] are appended chunk by
    /// chunk.
    ///
    /// `mode` is `overwrite` or `append`.
    pub async fn write_file(&self, path: &str, content: &str, mode: &str) -> BoolResult {
        if mode != "overwrite" && mode != "append" {
            return BoolResult::failure(
                "",
                format!("Invalid mode: {mode}. Must be 'overwrite' or 'append'."),
            );
        }

        let bytes = content.as_bytes();
        if bytes.len() as u64 <= CHUNK_SIZE {
            return self.write_file_chunk(path, content, mode).await;
        }

        let chunk_size = CHUNK_SIZE as usize;
        let mut written = 0;
        let mut first = true;
        let mut request_id = String::new();
        while written < content.len() {
            // Chunk on char boundaries so each tool call carries valid text.
            let mut end = (written + chunk_size).min(content.len());
            while end < content.len() && !content.is_char_boundary(end) {
                end += 1;
            }
            let chunk_mode = if first { mode } else { "append" };
            let result = self
                .write_file_chunk(path, &content[written..end], chunk_mode)
                .await;
            if !result.success {
                return result;
            }
            request_id = result.request_id;
            written = end;
            first = false;
        }

        BoolResult::success(request_id)
    }

    async fn write_file_chunk(&self, path: &str, content: &str, mode: &str) -> BoolResult {
        let result = self
            .session
            .call_mcp_tool(
                "write_file",
                json!({
                    "path": path,
                    "content": content,
                    "mode": mode,
                }),
            )
            .await;
        bool_result(result)
    }

    /// Create a directory (and parents).
    pub async fn create_directory(&self, path: &str) -> BoolResult {
        let result = self
            .session
            .call_mcp_tool("create_directory", json!({ "path": path }))
            .await;
        bool_result(result)
    }

    /// List a directory.
    pub async fn list_directory(&self, path: &str) -> DirectoryListResult {
        let result = self
            .session
            .call_mcp_tool("list_directory", json!({ "path": path }))
            .await;

        if !result.success {
            return DirectoryListResult {
                request_id: result.request_id,
                success: false,
                entries: Vec::new(),
                error_message: result.error_message,
            };
        }

        DirectoryListResult {
            request_id: result.request_id,
            success: true,
            entries: parse_directory_listing(&result.data),
            error_message: String::new(),
        }
    }

    /// Get attributes of a file or directory.
    pub async fn get_file_info(&self, path: &str) -> FileInfoResult {
        let result = self
            .session
            .call_mcp_tool("get_file_info", json!({ "path": path }))
            .await;

        if !result.success {
            return FileInfoResult {
                request_id: result.request_id,
                success: false,
                file_info: FileInfo::default(),
                error_message: result.error_message,
            };
        }

        FileInfoResult {
            request_id: result.request_id,
            success: true,
            file_info: parse_file_info(&result.data),
            error_message: String::new(),
        }
    }

    /// Search for files matching a pattern under a directory.
    pub async fn search_files(&self, path: &str, pattern: &str) -> SearchFilesResult {
        let result = self
            .session
            .call_mcp_tool(
                "search_files",
                json!({
                    "path": path,
                    "pattern": pattern,
                }),
            )
            .await;

        if !result.success {
            return SearchFilesResult {
                request_id: result.request_id,
                success: false,
                matches: Vec::new(),
                error_message: result.error_message,
            };
        }

        let matches = if result.data.trim() == "No matches found" {
            Vec::new()
        } else {
            result
                .data
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()
        };

        SearchFilesResult {
            request_id: result.request_id,
            success: true,
            matches,
            error_message: String::new(),
        }
    }

    /// Read several files in one call.
    pub async fn read_multiple_files(&self, paths: &[&str]) -> MultipleFileContentResult {
        let result = self
            .session
            .call_mcp_tool("read_multiple_files", json!({ "paths": paths }))
            .await;

        if !result.success {
            return MultipleFileContentResult {
                request_id: result.request_id,
                success: false,
                contents: HashMap::new(),
                error_message: result.error_message,
            };
        }

        MultipleFileContentResult {
            request_id: result.request_id,
            success: true,
            contents: parse_multiple_files(&result.data),
            error_message: String::new(),
        }
    }

    /// Push bytes into a mounted context and sync them down into the
    /// session.
    pub async fn upload_file(
        &self,
        context_id: &str,
        context_path: &str,
        data: Vec<u8>,
    ) -> UploadResult {
        let context = crate::context::ContextService::new(self.session.core_arc());
        let url_result = context.get_file_upload_url(context_id, context_path).await;
        if !url_result.success {
            return UploadResult {
                request_id_upload_url: url_result.request_id,
                path: context_path.to_string(),
                error: Some(url_result.error_message),
                ..Default::default()
            };
        }

        let bytes_sent = data.len() as u64;
        let response = self
            .session
            .core()
            .http
            .put(&url_result.url)
            .body(data)
            .send()
            .await;

        let response = match response {
            Ok(response) => response,
            Err(e) => {
                return UploadResult {
                    request_id_upload_url: url_result.request_id,
                    path: context_path.to_string(),
                    error: Some(format!("Upload failed: {e}")),
                    ..Default::default()
                };
            }
        };

        let http_status = response.status().as_u16();
        let etag = response
            .headers()
            .get("etag")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        if !response.status().is_success() {
            return UploadResult {
                request_id_upload_url: url_result.request_id,
                http_status: Some(http_status),
                path: context_path.to_string(),
                error: Some(format!("Upload failed: http status {http_status}")),
                ..Default::default()
            };
        }

        // Pull the object down into the session mount.
        let sync = self
            .session
            .context()
            .sync(Some(context_id), Some(context_path), Some("download"))
            .await;

        UploadResult {
            success: sync.success,
            request_id_upload_url: url_result.request_id,
            request_id_sync: sync.request_id,
            http_status: Some(http_status),
            etag,
            bytes_sent,
            path: context_path.to_string(),
            error: (!sync.success).then(|| "Context sync failed after upload".to_string()),
        }
    }

    /// Sync a file out of the session mount and fetch its bytes.
    pub async fn download_file(&self, context_id: &str, context_path: &str) -> DownloadResult {
        let sync = self
            .session
            .context()
            .sync(Some(context_id), Some(context_path), Some("upload"))
            .await;
        if !sync.success {
            return DownloadResult {
                request_id_sync: sync.request_id,
                path: context_path.to_string(),
                error: Some("Context sync failed before download".to_string()),
                ..Default::default()
            };
        }

        let context = crate::context::ContextService::new(self.session.core_arc());
        let url_result = context
            .get_file_download_url(context_id, context_path)
            .await;
        if !url_result.success {
            return DownloadResult {
                request_id_download_url: url_result.request_id,
                request_id_sync: sync.request_id,
                path: context_path.to_string(),
                error: Some(url_result.error_message),
                ..Default::default()
            };
        }

        let response = match self.session.core().http.get(&url_result.url).send().await {
            Ok(response) => response,
            Err(e) => {
                return DownloadResult {
                    request_id_download_url: url_result.request_id,
                    request_id_sync: sync.request_id,
                    path: context_path.to_string(),
                    error: Some(format!("Download failed: {e}")),
                    ..Default::default()
                };
            }
        };

        let http_status = response.status().as_u16();
        if !response.status().is_success() {
            return DownloadResult {
                request_id_download_url: url_result.request_id,
                request_id_sync: sync.request_id,
                http_status: Some(http_status),
                path: context_path.to_string(),
                error: Some(format!("Download failed: http status {http_status}")),
                ..Default::default()
            };
        }

        match response.bytes().await {
            Ok(bytes) => DownloadResult {
                success: true,
                request_id_download_url: url_result.request_id,
                request_id_sync: sync.request_id,
                http_status: Some(http_status),
                bytes_received: bytes.len() as u64,
                path: context_path.to_string(),
                content: bytes.to_vec(),
                error: None,
            },
            Err(e) => DownloadResult {
                request_id_download_url: url_result.request_id,
                request_id_sync: sync.request_id,
                http_status: Some(http_status),
                path: context_path.to_string(),
                error: Some(format!("Download failed: {e}")),
                ..Default::default()
            },
        }
    }
}

fn bool_result(result: crate::response::McpToolResult) -> BoolResult {
    if result.success {
        BoolResult::success(result.request_id)
    } else {
        BoolResult::failure(result.request_id, result.error_message)
    }
}

/// Parse `[DIR] name` / `[FILE] name` listing lines; JSON arrays are
/// accepted too for newer tool versions.
fn parse_directory_listing(text: &str) -> Vec<DirectoryEntry> {
    if let Ok(Value::Array(items)) = serde_json::from_str::<Value>(text) {
        return items
            .iter()
            .map(|item| DirectoryEntry {
                name: item
                    .get("name")
                    .and_then(Value::as_str)
                    .unwrap_or_default()
                    .to_string(),
                is_file: item
                    .get("isFile")
                    .or_else(|| item.get("is_file"))
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
                is_directory: item
                    .get("isDirectory")
                    .or_else(|| item.get("is_directory"))
                    .and_then(Value::as_bool)
                    .unwrap_or(false),
                size: item.get("size").and_then(Value::as_u64).unwrap_or(0),
            })
            .collect();
    }

    text.lines()
        .filter_map(|line| {
            let line = line.trim();
            if let Some(name) = line.strip_prefix("[DIR]") {
                Some(DirectoryEntry {
                    name: name.trim().to_string(),
                    is_directory: true,
                    ..Default::default()
                })
            } else if let Some(name) = line.strip_prefix("[FILE]") {
                Some(DirectoryEntry {
                    name: name.trim().to_string(),
                    is_file: true,
                    ..Default::default()
                })
            } else {
                None
            }
        })
        .collect()
}

/// Parse `key: value` lines from `get_file_info`.
fn parse_file_info(text: &str) -> FileInfo {
    let mut info = FileInfo::default();
    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "name" => info.name = value.to_string(),
            "path" => info.path = value.to_string(),
            "size" => info.size = value.parse().unwrap_or(0),
            "isFile" | "is_file" => info.is_file = value == "true",
            "isDirectory" | "is_directory" => info.is_directory = value == "true",
            "permissions" => info.permissions = value.to_string(),
            "modified" => info.modified = value.to_string(),
            _ => {}
        }
    }
    info
}

/// Parse the `path:\ncontent` records of `read_multiple_files`, separated
/// by `---` lines.
fn parse_multiple_files(text: &str) -> HashMap<String, String> {
    let mut contents = HashMap::new();
    for block in text.split(&format!("\n{SEPARATOR}\n")) {
        let block = block.trim_matches('\n');
        if block.is_empty() || block == SEPARATOR {
            continue;
        }
        let Some((header, rest)) = block.split_once('\n') else {
            if let Some(path) = block.strip_suffix(':') {
                contents.insert(path.trim().to_string(), String::new());
            }
            continue;
        };
        let path = header.trim().trim_end_matches(':').trim();
        if path.is_empty() {
            continue;
        }
        contents.insert(path.to_string(), rest.to_string());
    }
    contents
}

#[cfg(test)]
#[path = "filesystem.test.rs"]
mod tests;
