/// Work database models
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Kind of the primary media file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum ContentType {
    Image,
    Video,
}

impl ContentType {
    /// Derive the content type from an upload's MIME type
    pub fn from_mime(mime_type: &str) -> Self {
        if mime_type.starts_with("video/") {
            ContentType::Video
        } else {
            ContentType::Image
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContentType::Image => "image",
            ContentType::Video => "video",
        }
    }
}

/// Publication status of a work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum WorkStatus {
    /// Visible through its share token
    Active,
    Inactive,
    Archived,
}

impl WorkStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkStatus::Active => "active",
            WorkStatus::Inactive => "inactive",
            WorkStatus::Archived => "archived",
        }
    }
}

/// Video flavour: uploaded file or external link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum VideoType {
    File,
    Link,
}

impl VideoType {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoType::File => "file",
            VideoType::Link => "link",
        }
    }
}

/// Work record (aggregate root)
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Work {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category_id: Option<i64>,
    pub owner_id: i64,
    pub main_content_url: Option<String>,
    pub main_content_type: ContentType,
    pub target_file_url: Option<String>,
    pub status: WorkStatus,
    pub share_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Secondary image attached to a work
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct AdditionalImage {
    pub id: i64,
    pub work_id: i64,
    pub image_url: String,
}

/// Video attached to a work
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Video {
    pub id: i64,
    pub work_id: i64,
    pub video_url: String,
    pub video_type: VideoType,
}

/// External link attached to a work
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Link {
    pub id: i64,
    pub work_id: i64,
    pub link_url: String,
}

/// Social media handle attached to a work
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct SocialMediaEntry {
    pub id: i64,
    pub work_id: i64,
    pub platform: String,
    pub handle_or_url: String,
}
