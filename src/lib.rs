/// AR Works - augmented-reality work storage
///
/// Keeps a work's relational rows and its physical media files consistent
/// across create, update and delete.

pub mod config;
pub mod context;
pub mod db;
pub mod error;
pub mod file_store;
pub mod jobs;
pub mod work_store;

pub use error::{WorkError, WorkResult};
