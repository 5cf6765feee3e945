/// Background task implementations
use crate::{
    context::AppContext,
    db::VideoType,
    error::WorkResult,
    file_store::{paths, FileLifecycle},
};
use chrono::{Duration, Utc};
use sqlx::SqlitePool;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Health check - verify the database answers
pub async fn health_check(ctx: &AppContext) -> WorkResult<()> {
    sqlx::query("SELECT 1").fetch_one(&ctx.db).await?;
    Ok(())
}

/// Sweep files no row references, using the configured grace period
pub async fn sweep_orphaned_files(ctx: &AppContext) -> WorkResult<u64> {
    let grace = Duration::seconds(ctx.config.jobs.orphan_grace_secs);
    sweep_orphans(&ctx.db, &ctx.files, grace).await
}

/// Every stored path referenced by a row, normalized relative to the root
async fn referenced_paths(db: &SqlitePool) -> WorkResult<HashSet<String>> {
    let mut stored: Vec<Option<String>> =
        sqlx::query_scalar("SELECT main_content_url FROM works")
            .fetch_all(db)
            .await?;
    stored.extend(
        sqlx::query_scalar::<_, Option<String>>("SELECT target_file_url FROM works")
            .fetch_all(db)
            .await?,
    );
    stored.extend(
        sqlx::query_scalar::<_, String>("SELECT image_url FROM additional_images")
            .fetch_all(db)
            .await?
            .into_iter()
            .map(Some),
    );
    stored.extend(
        sqlx::query_scalar::<_, String>("SELECT video_url FROM videos WHERE video_type = ?")
            .bind(VideoType::File)
            .fetch_all(db)
            .await?
            .into_iter()
            .map(Some),
    );

    Ok(stored
        .into_iter()
        .flatten()
        .filter_map(|path| paths::normalize(&path).ok())
        .collect())
}

/// Delete unreferenced files older than `grace`
///
/// Younger files may belong to a request whose transaction has not
/// finished yet, so they are left alone.
pub async fn sweep_orphans(
    db: &SqlitePool,
    files: &FileLifecycle,
    grace: Duration,
) -> WorkResult<u64> {
    let referenced = referenced_paths(db).await?;
    let cutoff = Utc::now() - grace;
    let mut removed = 0;

    for object in files.list_objects().await? {
        let relative = paths::normalize(&object.relative_path)?;
        if referenced.contains(&relative) {
            continue;
        }

        if object.modified_at > cutoff {
            debug!("Unreferenced file {} is within the grace period", object.relative_path);
            continue;
        }

        match files.delete_by_path(&object.relative_path).await {
            Ok(()) => removed += 1,
            Err(e) => warn!("Failed to remove orphan {}: {}", object.relative_path, e),
        }
    }

    Ok(removed)
}
