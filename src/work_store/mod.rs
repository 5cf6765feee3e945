/// Work Store - aggregate synchronization between the relational store and the file store
///
/// The orchestrator drives every mutation of a work as one SQLite
/// transaction, delegating collection changes to the reconciler and
/// structural checks to the validator. Physical files are written before the
/// transaction and deleted after its outcome is known.

pub mod models;
pub mod orchestrator;
pub mod reconciler;
pub mod share;
pub mod validator;

pub use models::*;
pub use orchestrator::WorkOrchestrator;
pub use reconciler::{MarkAndAppend, MarkAndAppendOutcome, ReplaceSet};
pub use share::ShareTokenIssuer;
pub use validator::Violation;

use crate::db::{AdditionalImage, Link, SocialMediaEntry, Video, Work};
use crate::error::WorkResult;
use sqlx::{Sqlite, SqlitePool, Transaction};

/// Build a `SELECT` over every [`Work`] column with the given tail
macro_rules! work_select {
    ($tail:literal) => {
        concat!(
            "SELECT id, title, description, category_id, owner_id, main_content_url, ",
            "main_content_type, target_file_url, status, share_token, created_at, updated_at ",
            "FROM works ",
            $tail
        )
    };
}
pub(crate) use work_select;

/// Open a transaction that holds the write lock from its first statement
///
/// A deferred transaction that reads before writing cannot wait for the
/// lock in WAL mode: SQLite fails the upgrade at once with `SQLITE_BUSY`.
/// `BEGIN IMMEDIATE` waits on the busy timeout instead.
pub(crate) async fn begin_write(db: &SqlitePool) -> WorkResult<Transaction<'static, Sqlite>> {
    Ok(db.begin_with("BEGIN IMMEDIATE").await?)
}

/// Fetch a work row by id
pub(crate) async fn fetch_work<'e, E>(executor: E, work_id: i64) -> WorkResult<Option<Work>>
where
    E: sqlx::Executor<'e, Database = Sqlite>,
{
    let work = sqlx::query_as::<_, Work>(work_select!("WHERE id = ?"))
        .bind(work_id)
        .fetch_optional(executor)
        .await?;

    Ok(work)
}

/// Load every dependent row of a work
pub(crate) async fn load_details(db: &SqlitePool, work: Work) -> WorkResult<WorkDetails> {
    let (tag_ids, additional_images, videos, links, social_entries) = tokio::try_join!(
        sqlx::query_scalar::<_, i64>("SELECT tag_id FROM work_tags WHERE work_id = ? ORDER BY tag_id")
            .bind(work.id)
            .fetch_all(db),
        sqlx::query_as::<_, AdditionalImage>(
            "SELECT id, work_id, image_url FROM additional_images WHERE work_id = ? ORDER BY id",
        )
        .bind(work.id)
        .fetch_all(db),
        sqlx::query_as::<_, Video>(
            "SELECT id, work_id, video_url, video_type FROM videos WHERE work_id = ? ORDER BY id",
        )
        .bind(work.id)
        .fetch_all(db),
        sqlx::query_as::<_, Link>("SELECT id, work_id, link_url FROM links WHERE work_id = ? ORDER BY id")
            .bind(work.id)
            .fetch_all(db),
        sqlx::query_as::<_, SocialMediaEntry>(
            "SELECT id, work_id, platform, handle_or_url FROM social_media WHERE work_id = ? ORDER BY id",
        )
        .bind(work.id)
        .fetch_all(db),
    )?;

    Ok(WorkDetails {
        work,
        tag_ids,
        additional_images,
        videos,
        links,
        social_entries,
    })
}
