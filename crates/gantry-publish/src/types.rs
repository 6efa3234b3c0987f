//! Common types for uploads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use gantry_core::Arch;

/// One file to upload to one destination
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadTask {
    /// Path of the artifact
    pub file: String,
    /// Architecture, `None` for architecture-independent files
    pub arch: Option<Arch>,
}

impl UploadTask {
    pub fn new(file: impl Into<String>, arch: Option<Arch>) -> Self {
        Self {
            file: file.into(),
            arch,
        }
    }
}

impl std::fmt::Display for UploadTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.arch {
            Some(arch) => write!(f, "{} ({})", self.file, arch),
            None => write!(f, "{}", self.file),
        }
    }
}

/// A completed upload
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRecord {
    /// Uploaded file
    pub file: String,
    /// Provider that handled the upload
    pub provider: String,
    /// Where the file ended up (path, URL, or provider-specific identifier)
    pub destination: String,
    /// Completion timestamp
    pub completed_at: DateTime<Utc>,
}

impl UploadRecord {
    pub fn new(
        file: impl Into<String>,
        provider: impl Into<String>,
        destination: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            provider: provider.into(),
            destination: destination.into(),
            completed_at: Utc::now(),
        }
    }
}

/// Outcome of one scheduled upload
#[derive(Debug, Clone)]
pub enum UploadOutcome {
    /// Upload finished
    Completed(UploadRecord),
    /// Upload failed with a message
    Failed { file: String, provider: String, message: String },
    /// Upload stopped because the scheduler was cancelled
    Cancelled { file: String, provider: String },
}

impl UploadOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }

    pub fn file(&self) -> &str {
        match self {
            Self::Completed(record) => &record.file,
            Self::Failed { file, .. } | Self::Cancelled { file, .. } => file,
        }
    }
}
