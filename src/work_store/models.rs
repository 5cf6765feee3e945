/// Work store request and response models
use crate::db::{AdditionalImage, Link, SocialMediaEntry, Video, Work, WorkStatus};
use crate::file_store::Upload;
use serde::{Deserialize, Serialize};

/// Social media entry supplied by the caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocialEntryInput {
    pub platform: String,
    pub handle_or_url: String,
}

impl SocialEntryInput {
    pub fn new(platform: impl Into<String>, handle_or_url: impl Into<String>) -> Self {
        Self {
            platform: platform.into(),
            handle_or_url: handle_or_url.into(),
        }
    }
}

/// Scalar fields and replace-semantics collections shared by create and update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkFields {
    pub title: String,
    pub description: String,
    pub category_id: Option<i64>,
    pub tag_ids: Vec<i64>,
    pub links: Vec<String>,
    pub social_entries: Vec<SocialEntryInput>,
}

/// Input for creating a work
///
/// Both mandatory files are optional here so a missing one can be reported as
/// a structural violation instead of a type error at the request layer.
#[derive(Debug, Clone)]
pub struct CreateWorkRequest {
    pub fields: WorkFields,
    pub main_content: Option<Upload>,
    pub target_file: Option<Upload>,
}

/// Items explicitly marked for removal in an update
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Deletions {
    /// Additional image ids
    pub additional_images: Vec<i64>,
    /// Video ids of either kind
    pub video_ids: Vec<i64>,
    /// Main content removal; only valid together with a replacement upload
    pub main_content: bool,
    /// Target file removal; only valid together with a replacement upload
    pub target_file: bool,
}

/// Files received with an update
#[derive(Debug, Clone, Default)]
pub struct UpdateUploads {
    pub main_content: Option<Upload>,
    pub target_file: Option<Upload>,
    pub additional_images: Vec<Upload>,
    pub video_files: Vec<Upload>,
}

impl UpdateUploads {
    pub fn count(&self) -> usize {
        self.main_content.iter().count()
            + self.target_file.iter().count()
            + self.additional_images.len()
            + self.video_files.len()
    }
}

/// Input for updating a work
#[derive(Debug, Clone)]
pub struct UpdateWorkRequest {
    pub fields: WorkFields,
    pub status: WorkStatus,
    /// Full replacement list of link-type videos
    pub video_links: Vec<String>,
    pub deletions: Deletions,
    pub uploads: UpdateUploads,
}

/// A work together with every dependent row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkDetails {
    pub work: Work,
    pub tag_ids: Vec<i64>,
    pub additional_images: Vec<AdditionalImage>,
    pub videos: Vec<Video>,
    pub links: Vec<Link>,
    pub social_entries: Vec<SocialMediaEntry>,
}

impl WorkDetails {
    /// Every file-store path this work references
    pub fn file_paths(&self) -> Vec<String> {
        let mut paths: Vec<String> = self
            .work
            .main_content_url
            .iter()
            .chain(self.work.target_file_url.iter())
            .cloned()
            .collect();
        paths.extend(self.additional_images.iter().map(|i| i.image_url.clone()));
        paths.extend(
            self.videos
                .iter()
                .filter(|v| v.video_type == crate::db::VideoType::File)
                .map(|v| v.video_url.clone()),
        );
        paths
    }
}
