//! Context synchronization policies.
//!
//! A [`ContextSync`] binds a persistent context to a mount path inside a
//! session, governed by a [`SyncPolicy`] tree. Policies serialize to the
//! camelCase JSON the control plane expects inside
//! `CreateMcpSessionRequest.PersistenceDataList[].Policy`.
//!
//! Paths in [`RecyclePolicy`] and [`WhiteList`] must be literal: the
//! wildcard characters `*`, `?`, `[`, `]` are rejected at construction.
//! An empty string means "all paths".

use serde::Deserialize;
use serde::Serialize;

use crate::error::AgentBayError;
use crate::error::Result;

/// Upload strategy for context synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadStrategy {
    UploadBeforeResourceRelease,
}

/// Download strategy for context synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownloadStrategy {
    DownloadAsync,
}

/// Upload mode for context synchronization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UploadMode {
    File,
    Archive,
}

/// Retention period applied by a [`RecyclePolicy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Lifecycle {
    #[serde(rename = "Lifecycle_1Day")]
    OneDay,
    #[serde(rename = "Lifecycle_3Days")]
    ThreeDays,
    #[serde(rename = "Lifecycle_5Days")]
    FiveDays,
    #[serde(rename = "Lifecycle_10Days")]
    TenDays,
    #[serde(rename = "Lifecycle_15Days")]
    FifteenDays,
    #[serde(rename = "Lifecycle_30Days")]
    ThirtyDays,
    #[serde(rename = "Lifecycle_90Days")]
    NinetyDays,
    #[serde(rename = "Lifecycle_180Days")]
    OneHundredEightyDays,
    #[serde(rename = "Lifecycle_360Days")]
    ThreeHundredSixtyDays,
    #[serde(rename = "Lifecycle_Forever")]
    Forever,
}

/// Upload behavior for a synchronized context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadPolicy {
    #[serde(rename = "autoUpload")]
    pub auto_upload: bool,
    #[serde(rename = "uploadStrategy")]
    pub upload_strategy: UploadStrategy,
    #[serde(rename = "uploadMode")]
    pub upload_mode: UploadMode,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            auto_upload: true,
            upload_strategy: UploadStrategy::UploadBeforeResourceRelease,
            upload_mode: UploadMode::File,
        }
    }
}

/// Download behavior for a synchronized context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadPolicy {
    #[serde(rename = "autoDownload")]
    pub auto_download: bool,
    #[serde(rename = "downloadStrategy")]
    pub download_strategy: DownloadStrategy,
}

impl Default for DownloadPolicy {
    fn default() -> Self {
        Self {
            auto_download: true,
            download_strategy: DownloadStrategy::DownloadAsync,
        }
    }
}

/// Deletion propagation behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeletePolicy {
    #[serde(rename = "syncLocalFile")]
    pub sync_local_file: bool,
}

impl Default for DeletePolicy {
    fn default() -> Self {
        Self {
            sync_local_file: true,
        }
    }
}

/// Archive extraction behavior.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractPolicy {
    pub extract: bool,
    #[serde(rename = "deleteSrcFile")]
    pub delete_src_file: bool,
    #[serde(rename = "extractToCurrentFolder")]
    pub extract_to_current_folder: bool,
}

impl Default for ExtractPolicy {
    fn default() -> Self {
        Self {
            extract: true,
            delete_src_file: true,
            extract_to_current_folder: false,
        }
    }
}

/// Retention policy over a set of literal paths.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecyclePolicy {
    pub lifecycle: Lifecycle,
    pub paths: Vec<String>,
}

impl RecyclePolicy {
    /// Create a recycle policy; every path must be literal.
    pub fn new(lifecycle: Lifecycle, paths: Vec<String>) -> Result<Self> {
        for path in &paths {
            reject_wildcards(path, "recycle policy paths")?;
        }
        Ok(Self { lifecycle, paths })
    }
}

impl Default for RecyclePolicy {
    fn default() -> Self {
        Self {
            lifecycle: Lifecycle::Forever,
            paths: vec![String::new()],
        }
    }
}

/// One white-list entry: an included path with optional exclusions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhiteList {
    pub path: String,
    #[serde(rename = "excludePaths")]
    pub exclude_paths: Vec<String>,
}

impl WhiteList {
    /// Create a white-list entry; all paths must be literal.
    pub fn new(path: impl Into<String>, exclude_paths: Vec<String>) -> Result<Self> {
        let path = path.into();
        reject_wildcards(&path, "path")?;
        for exclude in &exclude_paths {
            reject_wildcards(exclude, "exclude_paths")?;
        }
        Ok(Self {
            path,
            exclude_paths,
        })
    }
}

/// Black/white list configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BWList {
    #[serde(rename = "whiteLists")]
    pub white_lists: Vec<WhiteList>,
}

/// Cross-OS path remap.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingPolicy {
    pub path: String,
}

/// The full synchronization policy tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPolicy {
    #[serde(rename = "uploadPolicy", skip_serializing_if = "Option::is_none")]
    pub upload_policy: Option<UploadPolicy>,
    #[serde(rename = "downloadPolicy", skip_serializing_if = "Option::is_none")]
    pub download_policy: Option<DownloadPolicy>,
    #[serde(rename = "deletePolicy", skip_serializing_if = "Option::is_none")]
    pub delete_policy: Option<DeletePolicy>,
    #[serde(rename = "extractPolicy", skip_serializing_if = "Option::is_none")]
    pub extract_policy: Option<ExtractPolicy>,
    #[serde(rename = "recyclePolicy", skip_serializing_if = "Option::is_none")]
    pub recycle_policy: Option<RecyclePolicy>,
    #[serde(rename = "bwList", skip_serializing_if = "Option::is_none")]
    pub bw_list: Option<BWList>,
    #[serde(rename = "mappingPolicy", skip_serializing_if = "Option::is_none")]
    pub mapping_policy: Option<MappingPolicy>,
}

impl Default for SyncPolicy {
    fn default() -> Self {
        Self {
            upload_policy: Some(UploadPolicy::default()),
            download_policy: Some(DownloadPolicy::default()),
            delete_policy: Some(DeletePolicy::default()),
            extract_policy: Some(ExtractPolicy::default()),
            recycle_policy: Some(RecyclePolicy::default()),
            bw_list: Some(BWList {
                white_lists: vec![WhiteList::default()],
            }),
            mapping_policy: None,
        }
    }
}

impl SyncPolicy {
    /// Serialize the policy to the JSON string embedded in an RPC.
    pub fn to_json_string(&self) -> Result<String> {
        serde_json::to_string(self).map_err(Into::into)
    }
}

/// Binding of a context to a mount path inside a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextSync {
    pub context_id: String,
    pub path: String,
    pub policy: Option<SyncPolicy>,
}

impl ContextSync {
    /// Create a binding without a policy (server defaults apply).
    pub fn new(context_id: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            context_id: context_id.into(),
            path: path.into(),
            policy: None,
        }
    }

    /// Attach a policy.
    pub fn with_policy(mut self, policy: SyncPolicy) -> Self {
        self.policy = Some(policy);
        self
    }
}

fn reject_wildcards(path: &str, what: &str) -> Result<()> {
    if path.chars().any(|c| matches!(c, '*' | '?' | '[' | ']')) {
        return Err(AgentBayError::Validation(format!(
            "Wildcard patterns are not supported in {what}. Got: {path}. \
             Please use exact directory paths instead."
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "context_sync.test.rs"]
mod tests;
