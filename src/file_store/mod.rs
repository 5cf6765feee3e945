/// File Storage System
///
/// Holds the physical media files referenced by work rows. The relational
/// store is authoritative; everything in here is a side effect driven by the
/// outcome of a database transaction.

pub mod disk;
pub mod lifecycle;
pub mod models;
pub mod paths;

pub use lifecycle::{CompensationReport, FileLifecycle};
pub use models::*;

use crate::error::WorkResult;
use async_trait::async_trait;

/// File storage backend trait
///
/// Paths handed to a backend are already normalized and relative to the
/// storage root (e.g. `images/image_1700000000000_ab12.png`).
#[async_trait]
pub trait FileBackend: Send + Sync {
    /// Store bytes at a relative path
    async fn write(&self, relative_path: &str, data: Vec<u8>) -> WorkResult<()>;

    /// Delete a file, returning whether something was removed
    ///
    /// Deleting an absent file is not an error.
    async fn delete(&self, relative_path: &str) -> WorkResult<bool>;

    /// Check if a file exists
    async fn exists(&self, relative_path: &str) -> WorkResult<bool>;

    /// Enumerate every stored file
    async fn list(&self) -> WorkResult<Vec<StoredObject>>;
}
