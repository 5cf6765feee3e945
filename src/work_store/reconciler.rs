/// Collection Reconciler
///
/// Applies collection changes inside the caller's transaction. Tags, links
/// and social entries are replaced wholesale. Additional images and videos are
/// reconciled by explicit per-id removal followed by appending new items;
/// anything not mentioned stays as it is.
use crate::db::VideoType;
use crate::error::{WorkError, WorkResult};
use crate::work_store::models::SocialEntryInput;
use sqlx::{Row, Sqlite, Transaction};
use std::collections::HashSet;
use tracing::{debug, warn};

/// Replace-semantics collection with its new contents
#[derive(Debug, Clone)]
pub enum ReplaceSet {
    Tags(Vec<i64>),
    Links(Vec<String>),
    SocialEntries(Vec<SocialEntryInput>),
}

impl ReplaceSet {
    fn kind(&self) -> &'static str {
        match self {
            ReplaceSet::Tags(_) => "tags",
            ReplaceSet::Links(_) => "links",
            ReplaceSet::SocialEntries(_) => "social entries",
        }
    }
}

/// Mark-and-append collection change
#[derive(Debug, Clone)]
pub enum MarkAndAppend {
    AdditionalImages {
        delete_ids: Vec<i64>,
        /// Stored paths of freshly written images
        new_paths: Vec<String>,
    },
    Videos {
        delete_ids: Vec<i64>,
        /// Stored paths of freshly written video files
        new_file_paths: Vec<String>,
        /// Full replacement list for link-type videos
        link_urls: Vec<String>,
    },
}

/// What a mark-and-append pass did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MarkAndAppendOutcome {
    pub removed_ids: Vec<i64>,
    /// Deletion requests that failed the ownership check
    pub skipped_ids: Vec<i64>,
    pub inserted_ids: Vec<i64>,
    /// Files owned by removed rows, to delete once the transaction commits
    pub files_to_delete: Vec<String>,
}

/// Trimmed, non-blank, first-occurrence-only entries
fn clean_urls(urls: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    urls.iter()
        .map(|u| u.trim())
        .filter(|u| !u.is_empty())
        .filter(|u| seen.insert(u.to_string()))
        .map(str::to_string)
        .collect()
}

fn unique_ids(ids: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::new();
    ids.iter().copied().filter(|id| seen.insert(*id)).collect()
}

/// Delete every row of a collection and insert the new set
pub async fn replace_set(
    tx: &mut Transaction<'_, Sqlite>,
    work_id: i64,
    set: ReplaceSet,
) -> WorkResult<usize> {
    let kind = set.kind();
    let inserted = match set {
        ReplaceSet::Tags(tag_ids) => {
            sqlx::query("DELETE FROM work_tags WHERE work_id = ?")
                .bind(work_id)
                .execute(&mut **tx)
                .await?;

            let tag_ids = unique_ids(&tag_ids);
            for tag_id in &tag_ids {
                sqlx::query("INSERT INTO work_tags (work_id, tag_id) VALUES (?, ?)")
                    .bind(work_id)
                    .bind(tag_id)
                    .execute(&mut **tx)
                    .await
                    .map_err(|e| WorkError::from_constraint(e, "tag"))?;
            }
            tag_ids.len()
        }
        ReplaceSet::Links(links) => {
            sqlx::query("DELETE FROM links WHERE work_id = ?")
                .bind(work_id)
                .execute(&mut **tx)
                .await?;

            let links = clean_urls(&links);
            for link in &links {
                sqlx::query("INSERT INTO links (work_id, link_url) VALUES (?, ?)")
                    .bind(work_id)
                    .bind(link)
                    .execute(&mut **tx)
                    .await?;
            }
            links.len()
        }
        ReplaceSet::SocialEntries(entries) => {
            sqlx::query("DELETE FROM social_media WHERE work_id = ?")
                .bind(work_id)
                .execute(&mut **tx)
                .await?;

            let mut count = 0;
            for entry in &entries {
                let platform = entry.platform.trim();
                let handle = entry.handle_or_url.trim();
                if platform.is_empty() || handle.is_empty() {
                    continue;
                }

                sqlx::query(
                    "INSERT INTO social_media (work_id, platform, handle_or_url) VALUES (?, ?, ?)",
                )
                .bind(work_id)
                .bind(platform)
                .bind(handle)
                .execute(&mut **tx)
                .await?;
                count += 1;
            }
            count
        }
    };

    debug!("Replaced {} of work {} with {} item(s)", kind, work_id, inserted);
    Ok(inserted)
}

/// Remove ownership-checked items by id, then append new ones
pub async fn apply_mark_and_append(
    tx: &mut Transaction<'_, Sqlite>,
    work_id: i64,
    owner_id: i64,
    change: MarkAndAppend,
) -> WorkResult<MarkAndAppendOutcome> {
    match change {
        MarkAndAppend::AdditionalImages {
            delete_ids,
            new_paths,
        } => reconcile_images(tx, work_id, owner_id, &delete_ids, &new_paths).await,
        MarkAndAppend::Videos {
            delete_ids,
            new_file_paths,
            link_urls,
        } => {
            reconcile_videos(tx, work_id, owner_id, &delete_ids, &new_file_paths, &link_urls).await
        }
    }
}

async fn reconcile_images(
    tx: &mut Transaction<'_, Sqlite>,
    work_id: i64,
    owner_id: i64,
    delete_ids: &[i64],
    new_paths: &[String],
) -> WorkResult<MarkAndAppendOutcome> {
    let mut outcome = MarkAndAppendOutcome::default();

    for image_id in unique_ids(delete_ids) {
        let row = sqlx::query(
            r#"
            SELECT ai.image_url
            FROM additional_images ai
            JOIN works w ON ai.work_id = w.id
            WHERE ai.id = ? AND ai.work_id = ? AND w.owner_id = ?
            "#,
        )
        .bind(image_id)
        .bind(work_id)
        .bind(owner_id)
        .fetch_optional(&mut **tx)
        .await?;

        let Some(row) = row else {
            warn!(
                "Additional image {} not found on work {} for owner {}, skipping",
                image_id, work_id, owner_id
            );
            outcome.skipped_ids.push(image_id);
            continue;
        };

        sqlx::query("DELETE FROM additional_images WHERE id = ?")
            .bind(image_id)
            .execute(&mut **tx)
            .await?;

        outcome.removed_ids.push(image_id);
        outcome.files_to_delete.push(row.try_get("image_url")?);
    }

    for path in new_paths {
        let result = sqlx::query("INSERT INTO additional_images (work_id, image_url) VALUES (?, ?)")
            .bind(work_id)
            .bind(path)
            .execute(&mut **tx)
            .await?;
        outcome.inserted_ids.push(result.last_insert_rowid());
    }

    debug!(
        "Work {} additional images: {} removed, {} skipped, {} added",
        work_id,
        outcome.removed_ids.len(),
        outcome.skipped_ids.len(),
        outcome.inserted_ids.len()
    );

    Ok(outcome)
}

async fn reconcile_videos(
    tx: &mut Transaction<'_, Sqlite>,
    work_id: i64,
    owner_id: i64,
    delete_ids: &[i64],
    new_file_paths: &[String],
    link_urls: &[String],
) -> WorkResult<MarkAndAppendOutcome> {
    let mut outcome = MarkAndAppendOutcome::default();
    let mut deleted_urls = HashSet::new();

    for video_id in unique_ids(delete_ids) {
        let row = sqlx::query(
            r#"
            SELECT v.video_url, v.video_type
            FROM videos v
            JOIN works w ON v.work_id = w.id
            WHERE v.id = ? AND v.work_id = ? AND w.owner_id = ?
            "#,
        )
        .bind(video_id)
        .bind(work_id)
        .bind(owner_id)
        .fetch_optional(&mut **tx)
        .await?;

        let Some(row) = row else {
            warn!(
                "Video {} not found on work {} for owner {}, skipping",
                video_id, work_id, owner_id
            );
            outcome.skipped_ids.push(video_id);
            continue;
        };

        let url: String = row.try_get("video_url")?;
        let video_type: VideoType = row.try_get("video_type")?;

        sqlx::query("DELETE FROM videos WHERE id = ?")
            .bind(video_id)
            .execute(&mut **tx)
            .await?;

        outcome.removed_ids.push(video_id);
        if video_type == VideoType::File {
            outcome.files_to_delete.push(url.clone());
        }
        deleted_urls.insert(url.trim().to_string());
    }

    // Link videos are replaced wholesale, minus anything removed just above
    sqlx::query("DELETE FROM videos WHERE work_id = ? AND video_type = ?")
        .bind(work_id)
        .bind(VideoType::Link)
        .execute(&mut **tx)
        .await?;

    for url in clean_urls(link_urls) {
        if deleted_urls.contains(&url) {
            debug!("Not re-adding video link {} removed in this request", url);
            continue;
        }

        let result =
            sqlx::query("INSERT INTO videos (work_id, video_url, video_type) VALUES (?, ?, ?)")
                .bind(work_id)
                .bind(&url)
                .bind(VideoType::Link)
                .execute(&mut **tx)
                .await?;
        outcome.inserted_ids.push(result.last_insert_rowid());
    }

    for path in new_file_paths {
        let result =
            sqlx::query("INSERT INTO videos (work_id, video_url, video_type) VALUES (?, ?, ?)")
                .bind(work_id)
                .bind(path)
                .bind(VideoType::File)
                .execute(&mut **tx)
                .await?;
        outcome.inserted_ids.push(result.last_insert_rowid());
    }

    debug!(
        "Work {} videos: {} removed, {} skipped, {} added",
        work_id,
        outcome.removed_ids.len(),
        outcome.skipped_ids.len(),
        outcome.inserted_ids.len()
    );

    Ok(outcome)
}
