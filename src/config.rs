/// Configuration management for AR Works
use crate::error::{WorkError, WorkResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Name every stored path must be rooted at
pub const STORAGE_ROOT_SEGMENT: &str = "uploads";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub database: DatabaseConfig,
    pub uploads: UploadConfig,
    pub jobs: JobsConfig,
    pub logging: LoggingConfig,
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub data_directory: PathBuf,
    /// Storage root on disk; its final segment is `uploads`
    pub uploads_directory: PathBuf,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub location: PathBuf,
    pub max_connections: u32,
    pub enable_wal: bool,
}

/// Upload limits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadConfig {
    /// Maximum size of a single uploaded file in bytes
    pub max_file_size: usize,
    pub max_additional_images: usize,
    pub max_video_files: usize,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_size: 100 * 1024 * 1024, // 100MB
            max_additional_images: 6,
            max_video_files: 6,
        }
    }
}

/// Background job configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobsConfig {
    pub orphan_sweep_enabled: bool,
    pub orphan_sweep_interval_secs: u64,
    /// Files younger than this are never swept
    pub orphan_grace_secs: i64,
}

/// Filter used when `RUST_LOG` is unset or unparsable
pub const DEFAULT_LOG_FILTER: &str = "ar_works=debug";

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `tracing` filter directives, e.g. `ar_works=debug,sqlx=warn`
    pub level: String,
}

impl LoggingConfig {
    /// Build the subscriber filter, falling back to the default directives
    pub fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_new(&self.level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
    }
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> WorkResult<Self> {
        dotenv::dotenv().ok();

        let data_directory: PathBuf = env::var("ARW_DATA_DIRECTORY")
            .unwrap_or_else(|_| "./data".to_string())
            .into();
        let uploads_directory = env::var("ARW_UPLOADS_DIRECTORY")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join(STORAGE_ROOT_SEGMENT));

        let location = env::var("ARW_DATABASE_LOCATION")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_directory.join("works.sqlite"));
        let max_connections = env::var("ARW_DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| WorkError::Config("Invalid database pool size".to_string()))?;
        let enable_wal = env::var("ARW_DATABASE_WAL")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);

        let defaults = UploadConfig::default();
        let max_file_size = env::var("ARW_UPLOAD_LIMIT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_file_size);
        let max_additional_images = env::var("ARW_MAX_ADDITIONAL_IMAGES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_additional_images);
        let max_video_files = env::var("ARW_MAX_VIDEO_FILES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_video_files);

        let orphan_sweep_enabled = env::var("ARW_ORPHAN_SWEEP_ENABLED")
            .unwrap_or_else(|_| "true".to_string())
            .parse()
            .unwrap_or(true);
        let orphan_sweep_interval_secs = env::var("ARW_ORPHAN_SWEEP_INTERVAL_SECS")
            .unwrap_or_else(|_| "21600".to_string())
            .parse()
            .unwrap_or(21600);
        let orphan_grace_secs = env::var("ARW_ORPHAN_GRACE_SECS")
            .unwrap_or_else(|_| "3600".to_string())
            .parse()
            .unwrap_or(3600);

        let level = env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LOG_FILTER.to_string());

        Ok(AppConfig {
            storage: StorageConfig {
                data_directory,
                uploads_directory,
            },
            database: DatabaseConfig {
                location,
                max_connections,
                enable_wal,
            },
            uploads: UploadConfig {
                max_file_size,
                max_additional_images,
                max_video_files,
            },
            jobs: JobsConfig {
                orphan_sweep_enabled,
                orphan_sweep_interval_secs,
                orphan_grace_secs,
            },
            logging: LoggingConfig { level },
        })
    }

    /// Validate configuration
    pub fn validate(&self) -> WorkResult<()> {
        if self.database.max_connections == 0 {
            return Err(WorkError::Config(
                "Database pool needs at least one connection".to_string(),
            ));
        }

        if self.uploads.max_file_size == 0 {
            return Err(WorkError::Config("Upload limit cannot be zero".to_string()));
        }

        let root_name = self
            .storage
            .uploads_directory
            .file_name()
            .and_then(|n| n.to_str());
        if root_name != Some(STORAGE_ROOT_SEGMENT) {
            return Err(WorkError::Config(format!(
                "Uploads directory must end in '{}': {:?}",
                STORAGE_ROOT_SEGMENT, self.storage.uploads_directory
            )));
        }

        if self.jobs.orphan_grace_secs < 0 {
            return Err(WorkError::Config(
                "Orphan grace period cannot be negative".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config(uploads: &str) -> AppConfig {
        AppConfig {
            storage: StorageConfig {
                data_directory: PathBuf::from("./data"),
                uploads_directory: PathBuf::from(uploads),
            },
            database: DatabaseConfig {
                location: PathBuf::from("./data/works.sqlite"),
                max_connections: 4,
                enable_wal: true,
            },
            uploads: UploadConfig::default(),
            jobs: JobsConfig {
                orphan_sweep_enabled: false,
                orphan_sweep_interval_secs: 60,
                orphan_grace_secs: 60,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
            },
        }
    }

    #[test]
    fn test_valid_config() {
        assert!(sample_config("./data/uploads").validate().is_ok());
    }

    #[test]
    fn test_uploads_directory_must_be_storage_root() {
        let err = sample_config("./data/files").validate().unwrap_err();
        assert!(err.to_string().contains("uploads"));
    }

    #[test]
    fn test_zero_upload_limit_rejected() {
        let mut config = sample_config("./data/uploads");
        config.uploads.max_file_size = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_log_filter_from_level() {
        let logging = LoggingConfig {
            level: "ar_works=trace".to_string(),
        };
        assert_eq!(logging.env_filter().to_string(), "ar_works=trace");

        let logging = LoggingConfig {
            level: "ar_works=loudest".to_string(),
        };
        assert_eq!(logging.env_filter().to_string(), DEFAULT_LOG_FILTER);
    }
}
