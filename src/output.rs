//! Input and result types of the pipeline operations.
//!
//! Serialisable results use camelCase field names: they are the JSON bodies
//! the HTTP front end returns.

use crate::storage::ArtifactReader;
use serde::{Deserialize, Serialize};

/// One uploaded file. Lives for a single request only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    /// Name the client uploaded the file under. May contain directory
    /// segments; only the final component is ever used.
    pub name: String,
    /// Raw content.
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Result of a conversion batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConvertOutput {
    /// Written artifact names, in upload order.
    pub converted_files: Vec<String>,
}

/// Result of merging raw uploads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedLog {
    pub merged_file_name: String,
    /// The merged text as written, returned so the caller need not download it.
    pub merged_content: String,
}

/// Result of merging stored text artifacts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MergedText {
    pub merged_file_name: String,
}

/// Result of a cache reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClearReport {
    pub message: String,
    /// Artifacts deleted by this sweep.
    pub removed: usize,
}

/// An artifact ready to be sent as an attachment.
pub struct Download {
    /// Suggested file name for the attachment.
    pub file_name: String,
    pub content_type: &'static str,
    pub len: u64,
    pub reader: ArtifactReader,
}

impl std::fmt::Debug for Download {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Download")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

/// Content type for an artifact, chosen by extension.
pub fn content_type_for(name: &str) -> &'static str {
    if name.ends_with(".zip") {
        "application/zip"
    } else {
        "text/plain; charset=utf-8"
    }
}
