/// Aggregate Update Orchestrator
///
/// Every mutation of a work runs as one SQLite transaction. Uploads are
/// written before the transaction opens; replaced or removed files are only
/// deleted once the commit succeeded, and uploads of a failed request are
/// compensated.
use crate::db::{ContentType, VideoType, Work, WorkStatus};
use crate::error::{WorkError, WorkResult};
use crate::file_store::{FileLifecycle, Upload, UploadSlot};
use crate::work_store::models::{CreateWorkRequest, UpdateUploads, UpdateWorkRequest, WorkDetails};
use crate::work_store::reconciler::{apply_mark_and_append, replace_set, MarkAndAppend, ReplaceSet};
use crate::work_store::share::ShareTokenIssuer;
use crate::work_store::validator::{self, Violation};
use crate::work_store::{begin_write, fetch_work, load_details, work_select, WorkFields};
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::{debug, info, warn};

/// Paths of the files written for one update request
#[derive(Debug, Default)]
struct WrittenUploads {
    main_content: Option<(String, ContentType)>,
    target_file: Option<String>,
    additional_images: Vec<String>,
    video_files: Vec<String>,
}

/// Aggregate orchestrator for works
#[derive(Clone)]
pub struct WorkOrchestrator {
    db: SqlitePool,
    files: FileLifecycle,
    shares: ShareTokenIssuer,
}

impl WorkOrchestrator {
    pub fn new(db: SqlitePool, files: FileLifecycle) -> Self {
        let shares = ShareTokenIssuer::new(db.clone());
        Self { db, files, shares }
    }

    pub fn files(&self) -> &FileLifecycle {
        &self.files
    }

    pub fn shares(&self) -> &ShareTokenIssuer {
        &self.shares
    }

    /// Create a work with both mandatory files
    pub async fn create_work(&self, owner_id: i64, request: CreateWorkRequest) -> WorkResult<i64> {
        let CreateWorkRequest {
            fields,
            main_content,
            target_file,
        } = request;

        validator::validate_fields(&fields).map_err(validator::into_work_error)?;

        let main_content = main_content.ok_or(Violation::MissingMainContent)?;
        let target_file = target_file.ok_or(Violation::MissingTargetFile)?;
        self.check_upload(&main_content, UploadSlot::MainContent)?;
        self.check_upload(&target_file, UploadSlot::TargetFile)?;

        let mut written = Vec::new();
        match self
            .create_inner(owner_id, &fields, &main_content, &target_file, &mut written)
            .await
        {
            Ok(work_id) => {
                info!("Created work {} for owner {}", work_id, owner_id);
                Ok(work_id)
            }
            Err(e) => {
                warn!("Creating work for owner {} failed: {}", owner_id, e);
                self.files.compensate(&written).await;
                Err(e)
            }
        }
    }

    async fn create_inner(
        &self,
        owner_id: i64,
        fields: &WorkFields,
        main_content: &Upload,
        target_file: &Upload,
        written: &mut Vec<String>,
    ) -> WorkResult<i64> {
        let main_path = self.files.write_upload(main_content).await?;
        written.push(main_path.clone());
        let target_path = self.files.write_upload(target_file).await?;
        written.push(target_path.clone());

        let now = Utc::now();
        let mut tx = begin_write(&self.db).await?;

        let result = sqlx::query(
            r#"
            INSERT INTO works (title, description, category_id, owner_id, main_content_url,
                               main_content_type, target_file_url, status, share_token,
                               created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(fields.title.trim())
        .bind(&fields.description)
        .bind(fields.category_id)
        .bind(owner_id)
        .bind(&main_path)
        .bind(ContentType::from_mime(&main_content.mime_type))
        .bind(&target_path)
        .bind(WorkStatus::Active)
        .bind(ShareTokenIssuer::generate_token())
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await
        .map_err(|e| WorkError::from_constraint(e, "category"))?;

        let work_id = result.last_insert_rowid();
        Self::replace_collections(&mut tx, work_id, fields).await?;

        let work = fetch_work(&mut *tx, work_id)
            .await?
            .ok_or_else(|| WorkError::Internal(format!("Work {} vanished during creation", work_id)))?;
        validator::validate(&work)?;

        tx.commit().await?;
        Ok(work_id)
    }

    /// Update scalars, collections and file slots of a work
    pub async fn update_work(
        &self,
        work_id: i64,
        owner_id: i64,
        request: UpdateWorkRequest,
    ) -> WorkResult<()> {
        validator::validate_fields(&request.fields).map_err(validator::into_work_error)?;
        self.check_update_uploads(&request.uploads)?;
        let upload_count = request.uploads.count();

        let mut written = Vec::new();
        let scheduled = match self.update_inner(work_id, owner_id, request, &mut written).await {
            Ok(scheduled) => scheduled,
            Err(e) => {
                warn!("Update of work {} rolled back: {}", work_id, e);
                self.files.compensate(&written).await;
                return Err(e);
            }
        };

        info!(
            "Updated work {} ({} upload(s), {} file(s) released)",
            work_id,
            upload_count,
            scheduled.len()
        );
        self.files.compensate(&scheduled).await;

        Ok(())
    }

    /// Returns the files released by the committed update
    async fn update_inner(
        &self,
        work_id: i64,
        owner_id: i64,
        request: UpdateWorkRequest,
        written: &mut Vec<String>,
    ) -> WorkResult<Vec<String>> {
        let UpdateWorkRequest {
            fields,
            status,
            video_links,
            deletions,
            uploads,
        } = request;

        let new_files = self.write_update_uploads(&uploads, written).await?;

        let mut tx = begin_write(&self.db).await?;
        let work = Self::owned_work(&mut tx, work_id, owner_id).await?;

        sqlx::query(
            r#"
            UPDATE works
            SET title = ?, description = ?, category_id = ?, status = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(fields.title.trim())
        .bind(&fields.description)
        .bind(fields.category_id)
        .bind(status)
        .bind(Utc::now())
        .bind(work_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| WorkError::from_constraint(e, "category"))?;

        Self::replace_collections(&mut tx, work_id, &fields).await?;

        let mut scheduled = Vec::new();

        let images = apply_mark_and_append(
            &mut tx,
            work_id,
            owner_id,
            MarkAndAppend::AdditionalImages {
                delete_ids: deletions.additional_images,
                new_paths: new_files.additional_images,
            },
        )
        .await?;
        scheduled.extend(images.files_to_delete);

        let videos = apply_mark_and_append(
            &mut tx,
            work_id,
            owner_id,
            MarkAndAppend::Videos {
                delete_ids: deletions.video_ids,
                new_file_paths: new_files.video_files,
                link_urls: video_links,
            },
        )
        .await?;
        scheduled.extend(videos.files_to_delete);

        // Mandatory slots are flipped only after every collection succeeded
        match new_files.main_content {
            Some((path, content_type)) => {
                sqlx::query("UPDATE works SET main_content_url = ?, main_content_type = ? WHERE id = ?")
                    .bind(&path)
                    .bind(content_type)
                    .bind(work_id)
                    .execute(&mut *tx)
                    .await?;
                scheduled.extend(replaced_file(work.main_content_url.as_deref(), &path));
            }
            None if deletions.main_content => {
                return Err(WorkError::StructuralViolation(
                    "Main content cannot be deleted without uploading a replacement".to_string(),
                ));
            }
            None => {}
        }

        match new_files.target_file {
            Some(path) => {
                sqlx::query("UPDATE works SET target_file_url = ? WHERE id = ?")
                    .bind(&path)
                    .bind(work_id)
                    .execute(&mut *tx)
                    .await?;
                scheduled.extend(replaced_file(work.target_file_url.as_deref(), &path));
            }
            None if deletions.target_file => {
                return Err(WorkError::StructuralViolation(
                    "Target file cannot be deleted without uploading a replacement".to_string(),
                ));
            }
            None => {}
        }

        let updated = fetch_work(&mut *tx, work_id)
            .await?
            .ok_or_else(|| WorkError::NotFound(format!("Work {} not found", work_id)))?;
        validator::validate(&updated)?;

        tx.commit().await?;
        Ok(scheduled)
    }

    /// Delete a work, its dependent rows and afterwards its files
    pub async fn delete_work(&self, work_id: i64, owner_id: i64) -> WorkResult<()> {
        let mut tx = begin_write(&self.db).await?;
        let work = Self::owned_work(&mut tx, work_id, owner_id).await?;

        let mut paths: Vec<String> = work
            .main_content_url
            .into_iter()
            .chain(work.target_file_url)
            .collect();

        let images: Vec<String> =
            sqlx::query_scalar("SELECT image_url FROM additional_images WHERE work_id = ?")
                .bind(work_id)
                .fetch_all(&mut *tx)
                .await?;
        paths.extend(images);

        let videos: Vec<String> =
            sqlx::query_scalar("SELECT video_url FROM videos WHERE work_id = ? AND video_type = 'file'")
                .bind(work_id)
                .fetch_all(&mut *tx)
                .await?;
        paths.extend(videos);

        for table in [
            "additional_images",
            "videos",
            "links",
            "social_media",
            "work_tags",
        ] {
            let result = sqlx::query(&format!("DELETE FROM {} WHERE work_id = ?", table))
                .bind(work_id)
                .execute(&mut *tx)
                .await?;
            debug!("Removed {} row(s) from {} for work {}", result.rows_affected(), table, work_id);
        }

        sqlx::query("DELETE FROM works WHERE id = ?")
            .bind(work_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        info!("Deleted work {} ({} file(s) referenced)", work_id, paths.len());

        self.files.compensate(&paths).await;
        Ok(())
    }

    /// Remove one additional image and afterwards its file
    pub async fn delete_additional_image(&self, image_id: i64, owner_id: i64) -> WorkResult<()> {
        let mut tx = begin_write(&self.db).await?;

        let image_url: Option<String> = sqlx::query_scalar(
            r#"
            SELECT ai.image_url
            FROM additional_images ai
            JOIN works w ON ai.work_id = w.id
            WHERE ai.id = ? AND w.owner_id = ?
            "#,
        )
        .bind(image_id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(image_url) = image_url else {
            return Err(Self::missing_item(&mut tx, "additional_images", "Additional image", image_id, owner_id).await);
        };

        sqlx::query("DELETE FROM additional_images WHERE id = ?")
            .bind(image_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!("Deleted additional image {} for owner {}", image_id, owner_id);
        self.files.compensate(&[image_url]).await;
        Ok(())
    }

    /// Remove one video; file videos also lose their file after the commit
    pub async fn delete_video(&self, video_id: i64, owner_id: i64) -> WorkResult<()> {
        let mut tx = begin_write(&self.db).await?;

        let video: Option<(String, VideoType)> = sqlx::query_as(
            r#"
            SELECT v.video_url, v.video_type
            FROM videos v
            JOIN works w ON v.work_id = w.id
            WHERE v.id = ? AND w.owner_id = ?
            "#,
        )
        .bind(video_id)
        .bind(owner_id)
        .fetch_optional(&mut *tx)
        .await?;

        let Some((video_url, video_type)) = video else {
            return Err(Self::missing_item(&mut tx, "videos", "Video", video_id, owner_id).await);
        };

        sqlx::query("DELETE FROM videos WHERE id = ?")
            .bind(video_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        info!(
            "Deleted {} video {} for owner {}",
            video_type.as_str(),
            video_id,
            owner_id
        );
        if video_type == VideoType::File {
            self.files.compensate(&[video_url]).await;
        }
        Ok(())
    }

    /// NotFound for an absent item, OwnershipViolation for someone else's
    async fn missing_item(
        tx: &mut Transaction<'_, Sqlite>,
        table: &str,
        label: &str,
        item_id: i64,
        owner_id: i64,
    ) -> WorkError {
        let exists = sqlx::query_scalar::<_, i64>(&format!("SELECT COUNT(*) FROM {} WHERE id = ?", table))
            .bind(item_id)
            .fetch_one(&mut **tx)
            .await;

        match exists {
            Ok(0) => WorkError::NotFound(format!("{} {} not found", label, item_id)),
            Ok(_) => {
                warn!("Owner {} tried to delete {} {} of another owner", owner_id, label, item_id);
                WorkError::OwnershipViolation(format!(
                    "{} {} does not belong to owner {}",
                    label, item_id, owner_id
                ))
            }
            Err(e) => WorkError::Storage(e),
        }
    }

    /// Owner view of a work; issues the share token if it has none yet
    pub async fn get_work(&self, work_id: i64, owner_id: i64) -> WorkResult<WorkDetails> {
        let mut work = fetch_work(&self.db, work_id)
            .await?
            .ok_or_else(|| WorkError::NotFound(format!("Work {} not found", work_id)))?;

        if work.owner_id != owner_id {
            return Err(WorkError::OwnershipViolation(format!(
                "Work {} does not belong to owner {}",
                work_id, owner_id
            )));
        }

        if work.share_token.is_none() {
            work.share_token = Some(self.shares.get_or_create_token(work_id).await?);
        }

        load_details(&self.db, work).await
    }

    /// Works of an owner, newest first
    pub async fn list_works(&self, owner_id: i64) -> WorkResult<Vec<Work>> {
        let works =
            sqlx::query_as::<_, Work>(work_select!("WHERE owner_id = ? ORDER BY created_at DESC, id DESC"))
                .bind(owner_id)
                .fetch_all(&self.db)
                .await?;

        Ok(works)
    }

    /// Every active work, newest first (the public gallery)
    pub async fn list_active_works(&self) -> WorkResult<Vec<Work>> {
        let works =
            sqlx::query_as::<_, Work>(work_select!("WHERE status = ? ORDER BY created_at DESC, id DESC"))
                .bind(WorkStatus::Active)
                .fetch_all(&self.db)
                .await?;

        Ok(works)
    }

    /// Public view of an active work by its share token
    pub async fn get_shared_work(&self, token: &str) -> WorkResult<WorkDetails> {
        self.shares.shared_details(token).await
    }

    /// Administrative status change
    pub async fn set_status(&self, work_id: i64, status: WorkStatus) -> WorkResult<()> {
        let result = sqlx::query("UPDATE works SET status = ?, updated_at = ? WHERE id = ?")
            .bind(status)
            .bind(Utc::now())
            .bind(work_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(WorkError::NotFound(format!("Work {} not found", work_id)));
        }

        info!("Work {} status set to {}", work_id, status.as_str());
        Ok(())
    }

    async fn owned_work(
        tx: &mut Transaction<'_, Sqlite>,
        work_id: i64,
        owner_id: i64,
    ) -> WorkResult<Work> {
        let work = fetch_work(&mut **tx, work_id)
            .await?
            .ok_or_else(|| WorkError::NotFound(format!("Work {} not found", work_id)))?;

        if work.owner_id != owner_id {
            return Err(WorkError::OwnershipViolation(format!(
                "Work {} does not belong to owner {}",
                work_id, owner_id
            )));
        }

        Ok(work)
    }

    async fn replace_collections(
        tx: &mut Transaction<'_, Sqlite>,
        work_id: i64,
        fields: &WorkFields,
    ) -> WorkResult<()> {
        replace_set(tx, work_id, ReplaceSet::Tags(fields.tag_ids.clone())).await?;
        replace_set(tx, work_id, ReplaceSet::Links(fields.links.clone())).await?;
        replace_set(
            tx,
            work_id,
            ReplaceSet::SocialEntries(fields.social_entries.clone()),
        )
        .await?;
        Ok(())
    }

    fn check_upload(&self, upload: &Upload, slot: UploadSlot) -> WorkResult<()> {
        if upload.slot != slot {
            return Err(WorkError::Validation(format!(
                "Upload '{}' was sent as {} but is expected as {}",
                upload.original_name,
                upload.slot.as_str(),
                slot.as_str()
            )));
        }

        self.files.validate_upload(upload)
    }

    /// Reject a bad update before any file is written
    fn check_update_uploads(&self, uploads: &UpdateUploads) -> WorkResult<()> {
        let limits = self.files.limits();

        if uploads.additional_images.len() > limits.max_additional_images {
            return Err(WorkError::Validation(format!(
                "At most {} additional images can be uploaded at once",
                limits.max_additional_images
            )));
        }

        if uploads.video_files.len() > limits.max_video_files {
            return Err(WorkError::Validation(format!(
                "At most {} video files can be uploaded at once",
                limits.max_video_files
            )));
        }

        if let Some(upload) = &uploads.main_content {
            self.check_upload(upload, UploadSlot::MainContent)?;
        }
        if let Some(upload) = &uploads.target_file {
            self.check_upload(upload, UploadSlot::TargetFile)?;
        }
        for upload in &uploads.additional_images {
            self.check_upload(upload, UploadSlot::AdditionalImage)?;
        }
        for upload in &uploads.video_files {
            self.check_upload(upload, UploadSlot::VideoFile)?;
        }

        Ok(())
    }

    async fn write_update_uploads(
        &self,
        uploads: &UpdateUploads,
        written: &mut Vec<String>,
    ) -> WorkResult<WrittenUploads> {
        let mut files = WrittenUploads::default();

        if let Some(upload) = &uploads.main_content {
            let path = self.files.write_upload(upload).await?;
            written.push(path.clone());
            files.main_content = Some((path, ContentType::from_mime(&upload.mime_type)));
        }

        if let Some(upload) = &uploads.target_file {
            let path = self.files.write_upload(upload).await?;
            written.push(path.clone());
            files.target_file = Some(path);
        }

        for upload in &uploads.additional_images {
            let path = self.files.write_upload(upload).await?;
            written.push(path.clone());
            files.additional_images.push(path);
        }

        for upload in &uploads.video_files {
            let path = self.files.write_upload(upload).await?;
            written.push(path.clone());
            files.video_files.push(path);
        }

        Ok(files)
    }
}

/// Old file to release when a slot moves to `new_path`
fn replaced_file(old: Option<&str>, new_path: &str) -> Option<String> {
    old.map(str::trim)
        .filter(|old| !old.is_empty() && *old != new_path)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UploadConfig;
    use crate::work_store::models::Deletions;
    use crate::work_store::test_support::{seed_tags, TestDb};
    use crate::work_store::SocialEntryInput;

    fn create_test_orchestrator(db: &TestDb) -> WorkOrchestrator {
        let files = FileLifecycle::disk(db.dir.path().join("uploads"), UploadConfig::default());
        WorkOrchestrator::new(db.pool.clone(), files)
    }

    fn fields(title: &str) -> WorkFields {
        WorkFields {
            title: title.to_string(),
            ..WorkFields::default()
        }
    }

    fn create_request(title: &str) -> CreateWorkRequest {
        CreateWorkRequest {
            fields: fields(title),
            main_content: Some(Upload::new(
                UploadSlot::MainContent,
                "mural.png",
                "image/png",
                vec![1, 2, 3],
            )),
            target_file: Some(Upload::new(
                UploadSlot::TargetFile,
                "mural.mind",
                "application/octet-stream",
                vec![4, 5, 6],
            )),
        }
    }

    fn update_request(title: &str) -> UpdateWorkRequest {
        UpdateWorkRequest {
            fields: fields(title),
            status: WorkStatus::Active,
            video_links: Vec::new(),
            deletions: Deletions::default(),
            uploads: UpdateUploads::default(),
        }
    }

    #[tokio::test]
    async fn test_create_work_populates_everything() {
        let db = TestDb::new().await;
        let orchestrator = create_test_orchestrator(&db);
        let tags = seed_tags(&db.pool, &["mural", "street"]).await;

        let mut request = create_request("Harbour mural");
        request.fields.tag_ids = vec![tags[1], tags[0], tags[1]];
        request.fields.links = vec!["https://example.com".to_string()];
        request.fields.social_entries = vec![SocialEntryInput::new("instagram", "@artist")];

        let work_id = orchestrator.create_work(7, request).await.unwrap();
        let details = orchestrator.get_work(work_id, 7).await.unwrap();

        assert_eq!(details.work.title, "Harbour mural");
        assert_eq!(details.work.main_content_type, ContentType::Image);
        assert!(details.work.share_token.is_some());
        assert_eq!(details.tag_ids, vec![tags[0], tags[1]]);
        assert_eq!(details.links.len(), 1);
        assert_eq!(details.social_entries.len(), 1);

        for path in details.file_paths() {
            assert!(orchestrator.files().exists(&path).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_create_without_target_writes_nothing() {
        let db = TestDb::new().await;
        let orchestrator = create_test_orchestrator(&db);

        let mut request = create_request("No target");
        request.target_file = None;

        let err = orchestrator.create_work(1, request).await.unwrap_err();
        assert!(matches!(err, WorkError::StructuralViolation(_)));
        assert!(orchestrator.files().list_objects().await.unwrap().is_empty());
        assert!(orchestrator.list_works(1).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_with_unknown_category_compensates() {
        let db = TestDb::new().await;
        let orchestrator = create_test_orchestrator(&db);

        let mut request = create_request("Lost category");
        request.fields.category_id = Some(404);

        let err = orchestrator.create_work(1, request).await.unwrap_err();
        assert!(matches!(err, WorkError::Validation(_)));
        assert!(orchestrator.files().list_objects().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_replacing_main_content_releases_old_file() {
        let db = TestDb::new().await;
        let orchestrator = create_test_orchestrator(&db);
        let work_id = orchestrator.create_work(1, create_request("Swap")).await.unwrap();
        let before = orchestrator.get_work(work_id, 1).await.unwrap().work;

        let mut request = update_request("Swap");
        request.deletions.main_content = true;
        request.uploads.main_content = Some(Upload::new(
            UploadSlot::MainContent,
            "clip.mp4",
            "video/mp4",
            vec![7, 7],
        ));
        orchestrator.update_work(work_id, 1, request).await.unwrap();

        let after = orchestrator.get_work(work_id, 1).await.unwrap().work;
        assert_eq!(after.main_content_type, ContentType::Video);
        assert_ne!(after.main_content_url, before.main_content_url);

        let old = before.main_content_url.unwrap();
        let new = after.main_content_url.unwrap();
        assert!(!orchestrator.files().exists(&old).await.unwrap());
        assert!(orchestrator.files().exists(&new).await.unwrap());
        assert_eq!(after.share_token, before.share_token);
    }

    #[tokio::test]
    async fn test_main_content_delete_without_replacement_rejected() {
        let db = TestDb::new().await;
        let orchestrator = create_test_orchestrator(&db);
        let work_id = orchestrator.create_work(1, create_request("Keep")).await.unwrap();

        let mut request = update_request("Renamed");
        request.deletions.main_content = true;

        let err = orchestrator.update_work(work_id, 1, request).await.unwrap_err();
        assert!(matches!(err, WorkError::StructuralViolation(_)));
        assert_eq!(orchestrator.get_work(work_id, 1).await.unwrap().work.title, "Keep");
    }

    #[tokio::test]
    async fn test_update_by_other_owner_rejected() {
        let db = TestDb::new().await;
        let orchestrator = create_test_orchestrator(&db);
        let work_id = orchestrator.create_work(1, create_request("Mine")).await.unwrap();

        let mut request = update_request("Stolen");
        request.uploads.additional_images =
            vec![Upload::new(UploadSlot::AdditionalImage, "x.png", "image/png", vec![1])];

        let err = orchestrator.update_work(work_id, 2, request).await.unwrap_err();
        assert!(matches!(err, WorkError::OwnershipViolation(_)));
        // Only the two files written at creation remain
        assert_eq!(orchestrator.files().list_objects().await.unwrap().len(), 2);

        let err = orchestrator.delete_work(work_id, 2).await.unwrap_err();
        assert!(matches!(err, WorkError::OwnershipViolation(_)));
        let err = orchestrator.get_work(work_id, 2).await.unwrap_err();
        assert!(matches!(err, WorkError::OwnershipViolation(_)));
    }

    #[tokio::test]
    async fn test_upload_limits_enforced_before_writing() {
        let db = TestDb::new().await;
        let orchestrator = create_test_orchestrator(&db);
        let work_id = orchestrator.create_work(1, create_request("Limits")).await.unwrap();
        let limit = orchestrator.files().limits().max_additional_images;

        let mut request = update_request("Limits");
        request.uploads.additional_images = (0..=limit)
            .map(|i| Upload::new(UploadSlot::AdditionalImage, format!("{}.png", i), "image/png", vec![1]))
            .collect();

        let err = orchestrator.update_work(work_id, 1, request).await.unwrap_err();
        assert!(matches!(err, WorkError::Validation(_)));
        assert_eq!(orchestrator.files().list_objects().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_wrong_slot_rejected() {
        let db = TestDb::new().await;
        let orchestrator = create_test_orchestrator(&db);
        let work_id = orchestrator.create_work(1, create_request("Slots")).await.unwrap();

        let mut request = update_request("Slots");
        request.uploads.video_files =
            vec![Upload::new(UploadSlot::AdditionalImage, "v.mp4", "video/mp4", vec![1])];

        let err = orchestrator.update_work(work_id, 1, request).await.unwrap_err();
        assert!(matches!(err, WorkError::Validation(_)));
    }

    #[tokio::test]
    async fn test_list_and_status() {
        let db = TestDb::new().await;
        let orchestrator = create_test_orchestrator(&db);
        let first = orchestrator.create_work(1, create_request("First")).await.unwrap();
        let second = orchestrator.create_work(1, create_request("Second")).await.unwrap();
        orchestrator.create_work(2, create_request("Other")).await.unwrap();

        let ids: Vec<i64> = orchestrator
            .list_works(1)
            .await
            .unwrap()
            .iter()
            .map(|w| w.id)
            .collect();
        assert_eq!(ids, vec![second, first]);

        let token = orchestrator
            .get_work(first, 1)
            .await
            .unwrap()
            .work
            .share_token
            .unwrap();
        assert_eq!(orchestrator.get_shared_work(&token).await.unwrap().work.id, first);

        orchestrator.set_status(first, WorkStatus::Archived).await.unwrap();
        assert!(matches!(
            orchestrator.get_shared_work(&token).await.unwrap_err(),
            WorkError::NotFound(_)
        ));

        assert!(matches!(
            orchestrator.set_status(999, WorkStatus::Active).await.unwrap_err(),
            WorkError::NotFound(_)
        ));
    }

    #[tokio::test]
    async fn test_delete_single_items() {
        let db = TestDb::new().await;
        let orchestrator = create_test_orchestrator(&db);
        let work_id = orchestrator.create_work(1, create_request("Items")).await.unwrap();

        let mut request = update_request("Items");
        request.video_links = vec!["https://video.example/a".to_string()];
        request.uploads.additional_images =
            vec![Upload::new(UploadSlot::AdditionalImage, "x.png", "image/png", vec![1])];
        request.uploads.video_files =
            vec![Upload::new(UploadSlot::VideoFile, "v.mp4", "video/mp4", vec![2])];
        orchestrator.update_work(work_id, 1, request).await.unwrap();

        let details = orchestrator.get_work(work_id, 1).await.unwrap();
        let image = details.additional_images[0].clone();
        let file_video = details
            .videos
            .iter()
            .find(|v| v.video_type == VideoType::File)
            .cloned()
            .unwrap();
        let link_video = details
            .videos
            .iter()
            .find(|v| v.video_type == VideoType::Link)
            .cloned()
            .unwrap();

        let err = orchestrator.delete_additional_image(image.id, 2).await.unwrap_err();
        assert!(matches!(err, WorkError::OwnershipViolation(_)));
        let err = orchestrator.delete_video(file_video.id, 2).await.unwrap_err();
        assert!(matches!(err, WorkError::OwnershipViolation(_)));
        assert!(orchestrator.files().exists(&image.image_url).await.unwrap());

        orchestrator.delete_additional_image(image.id, 1).await.unwrap();
        orchestrator.delete_video(file_video.id, 1).await.unwrap();
        orchestrator.delete_video(link_video.id, 1).await.unwrap();

        let details = orchestrator.get_work(work_id, 1).await.unwrap();
        assert!(details.additional_images.is_empty());
        assert!(details.videos.is_empty());
        assert!(!orchestrator.files().exists(&image.image_url).await.unwrap());
        assert!(!orchestrator.files().exists(&file_video.video_url).await.unwrap());

        let err = orchestrator.delete_additional_image(image.id, 1).await.unwrap_err();
        assert!(matches!(err, WorkError::NotFound(_)));
        let err = orchestrator.delete_video(file_video.id, 1).await.unwrap_err();
        assert!(matches!(err, WorkError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_gallery_lists_only_active_works() {
        let db = TestDb::new().await;
        let orchestrator = create_test_orchestrator(&db);
        let first = orchestrator.create_work(1, create_request("First")).await.unwrap();
        let hidden = orchestrator.create_work(2, create_request("Hidden")).await.unwrap();
        let archived = orchestrator.create_work(3, create_request("Archived")).await.unwrap();
        let last = orchestrator.create_work(2, create_request("Last")).await.unwrap();

        orchestrator.set_status(hidden, WorkStatus::Inactive).await.unwrap();
        orchestrator.set_status(archived, WorkStatus::Archived).await.unwrap();

        let ids: Vec<i64> = orchestrator
            .list_active_works()
            .await
            .unwrap()
            .iter()
            .map(|w| w.id)
            .collect();
        assert_eq!(ids, vec![last, first]);
    }

    #[test]
    fn test_replaced_file() {
        assert_eq!(replaced_file(Some("/uploads/a.png"), "/uploads/b.png"), Some("/uploads/a.png".to_string()));
        assert_eq!(replaced_file(Some("/uploads/a.png"), "/uploads/a.png"), None);
        assert_eq!(replaced_file(Some("  "), "/uploads/b.png"), None);
        assert_eq!(replaced_file(None, "/uploads/b.png"), None);
    }
}
