/// File storage data models
use crate::error::{WorkError, WorkResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Where an uploaded file is headed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UploadSlot {
    MainContent,
    AdditionalImage,
    TargetFile,
    VideoFile,
}

impl UploadSlot {
    /// Subdirectory under the storage root
    pub fn directory(&self, mime_type: &str) -> &'static str {
        match self {
            UploadSlot::MainContent if mime_type.starts_with("video/") => "videos",
            UploadSlot::MainContent => "images",
            UploadSlot::AdditionalImage => "additional_images",
            UploadSlot::TargetFile => "targets",
            UploadSlot::VideoFile => "videos",
        }
    }

    /// File name prefix
    pub fn prefix(&self, mime_type: &str) -> &'static str {
        match self {
            UploadSlot::MainContent if mime_type.starts_with("video/") => "video_",
            UploadSlot::MainContent => "image_",
            UploadSlot::AdditionalImage => "additional_",
            UploadSlot::TargetFile => "target_",
            UploadSlot::VideoFile => "video_",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadSlot::MainContent => "mainContent",
            UploadSlot::AdditionalImage => "additionalImages",
            UploadSlot::TargetFile => "targetFile",
            UploadSlot::VideoFile => "videoFiles",
        }
    }
}

/// A file received from the caller, not yet written
#[derive(Debug, Clone)]
pub struct Upload {
    pub slot: UploadSlot,
    pub original_name: String,
    pub mime_type: String,
    pub data: Vec<u8>,
}

impl Upload {
    pub fn new(
        slot: UploadSlot,
        original_name: impl Into<String>,
        mime_type: impl Into<String>,
        data: Vec<u8>,
    ) -> Self {
        Self {
            slot,
            original_name: original_name.into(),
            mime_type: mime_type.into(),
            data,
        }
    }

    /// Lowercased extension of the original name, if any
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.original_name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
    }

    /// Check the upload against its slot's accepted file kinds
    pub fn check_kind(&self) -> WorkResult<()> {
        let accepted = match self.slot {
            UploadSlot::MainContent => {
                self.mime_type.starts_with("image/") || self.mime_type.starts_with("video/")
            }
            UploadSlot::AdditionalImage => self.mime_type.starts_with("image/"),
            UploadSlot::VideoFile => self.mime_type.starts_with("video/"),
            UploadSlot::TargetFile => self.extension().as_deref() == Some("mind"),
        };

        if accepted {
            return Ok(());
        }

        let expected = match self.slot {
            UploadSlot::MainContent => "an image or video",
            UploadSlot::AdditionalImage => "an image",
            UploadSlot::VideoFile => "a video",
            UploadSlot::TargetFile => "a .mind file",
        };
        Err(WorkError::Validation(format!(
            "{} upload '{}' must be {}",
            self.slot.as_str(),
            self.original_name,
            expected
        )))
    }
}

/// A file present in the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Path relative to the storage root
    pub relative_path: String,
    pub size: u64,
    pub modified_at: DateTime<Utc>,
}
