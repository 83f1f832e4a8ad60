pub mod record;
pub mod labels;
pub mod pagination;
pub mod export;
pub mod error;

// Re-exports
pub use record::{
    validate_identifier, Properties, PropertyValue, ResourceRef, StorageRecord,
    MAX_IDENTIFIER_LENGTH, UNDEFINED_IDENTIFIER,
};
pub use labels::{FieldLabelResolver, FormField, IgnoreRules};
pub use pagination::{PageLink, Pagination};
pub use export::{
    build_grid, format_timestamp, DocumentProperties, ExportFormat, Grid, DATE_TIME_LABEL,
};
pub use error::{Error, Result};
