/// Application context and dependency injection
use crate::{
    config::AppConfig,
    db,
    error::{WorkError, WorkResult},
    file_store::FileLifecycle,
    work_store::{ShareTokenIssuer, WorkOrchestrator},
};
use sqlx::SqlitePool;
use std::sync::Arc;

/// Application context holding all shared services
#[derive(Clone)]
pub struct AppContext {
    pub config: Arc<AppConfig>,
    pub db: SqlitePool,
    pub files: FileLifecycle,
    pub orchestrator: Arc<WorkOrchestrator>,
    pub shares: ShareTokenIssuer,
}

impl AppContext {
    /// Create a new application context from configuration
    pub async fn new(config: AppConfig) -> WorkResult<Self> {
        config.validate()?;

        Self::ensure_directories(&config).await?;

        let db = db::create_pool(
            &config.database.location,
            db::DatabaseOptions::from(&config.database),
        )
        .await?;
        db::run_migrations(&db).await?;
        db::test_connection(&db).await?;

        let files = FileLifecycle::disk(
            config.storage.uploads_directory.clone(),
            config.uploads.clone(),
        );
        let orchestrator = Arc::new(WorkOrchestrator::new(db.clone(), files.clone()));
        let shares = orchestrator.shares().clone();

        Ok(Self {
            config: Arc::new(config),
            db,
            files,
            orchestrator,
            shares,
        })
    }

    /// Ensure required directories exist
    async fn ensure_directories(config: &AppConfig) -> WorkResult<()> {
        let dirs = [
            &config.storage.data_directory,
            &config.storage.uploads_directory,
        ];

        for dir in dirs {
            if !dir.exists() {
                tokio::fs::create_dir_all(dir).await.map_err(|e| {
                    WorkError::Internal(format!("Failed to create directory {:?}: {}", dir, e))
                })?;
            }
        }

        Ok(())
    }
}
