pub mod models;
pub mod repository;
pub mod resources;
pub mod error;

// Re-exports
pub use models::{DateInterval, StorageRecordRow};
pub use repository::Database;
pub use resources::{FsResourceStore, ResourceStore};
pub use error::{Error, Result};
