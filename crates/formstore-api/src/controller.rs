//! Listing, deletion and export of stored submissions.
//!
//! Each function handles one request end to end; collaborators are passed in
//! explicitly.

use chrono::{DateTime, Utc};
use formstore_core::{
    build_grid, format_timestamp, ExportFormat, FieldLabelResolver, PageLink, Pagination,
};
use formstore_db::{Database, DateInterval};
use formstore_export::WriterRegistry;
use indexmap::IndexMap;
use serde::Serialize;

use crate::config::StorageSettings;
use crate::error::ApiError;

#[derive(Debug, Clone, Serialize)]
pub struct EntryView {
    pub id: String,
    pub date_time: String,
    pub timestamp: DateTime<Utc>,
    pub values: IndexMap<String, String>,
}

/// One page of an identifier's submissions.
#[derive(Debug, Clone, Serialize)]
pub struct ShowView {
    pub identifier: String,
    pub titles: Vec<String>,
    pub entries: Vec<EntryView>,
    pub datetime_format: String,
    pub total_entries_count: u64,
    pub current_page: u32,
    pub items_per_page: u32,
    pub number_of_pages: u32,
    pub pages: Vec<PageLink>,
}

#[derive(Debug, Clone)]
pub enum ShowOutcome {
    Page(ShowView),
    /// The requested page holds no entries; the caller goes back to the index.
    RedirectToIndex,
}

/// A rendered export, ready to be sent as a download.
#[derive(Debug, Clone)]
pub struct ExportFile {
    pub format: ExportFormat,
    pub file_name: String,
    pub mime_type: &'static str,
    pub bytes: Vec<u8>,
}

pub async fn list_identifiers(db: &Database) -> Result<Vec<String>, ApiError> {
    Ok(db.list_distinct_identifiers().await?)
}

pub async fn show(
    db: &Database,
    settings: &StorageSettings,
    identifier: &str,
    page: u32,
) -> Result<ShowOutcome, ApiError> {
    let items_per_page = settings.items_per_page.max(1);
    let current_page = page.max(1);
    let offset = Pagination::offset(current_page, items_per_page);

    let total_entries_count = db.count_by_identifier(identifier).await?;
    let records = db
        .find_page(identifier, u64::from(items_per_page), offset)
        .await?;

    if records.is_empty() {
        tracing::debug!(
            "Page {} of '{}' is empty, redirecting to index",
            current_page,
            identifier
        );
        return Ok(ShowOutcome::RedirectToIndex);
    }

    let resolver = FieldLabelResolver::new(&settings.ignored_fields);
    let titles = resolver.resolve_labels(&records);

    let entries = records
        .iter()
        .map(|record| EntryView {
            id: record.id.clone(),
            date_time: format_timestamp(&record.timestamp, &settings.datetime_format),
            timestamp: record.timestamp,
            values: titles
                .iter()
                .map(|title| (title.clone(), resolver.value_of(record, title)))
                .collect(),
        })
        .collect();

    let pagination = Pagination::new(total_entries_count, current_page, items_per_page);

    Ok(ShowOutcome::Page(ShowView {
        identifier: identifier.to_string(),
        titles,
        entries,
        datetime_format: settings.datetime_format.clone(),
        total_entries_count,
        current_page: pagination.current_page,
        items_per_page: pagination.items_per_page,
        number_of_pages: pagination.number_of_pages,
        pages: pagination.pages,
    }))
}

/// Export every entry of `identifier`.
///
/// The format is checked before the store is touched.
pub async fn export(
    db: &Database,
    settings: &StorageSettings,
    writers: &WriterRegistry,
    identifier: &str,
    format: &str,
    include_date_time: bool,
) -> Result<ExportFile, ApiError> {
    let format: ExportFormat = format.parse()?;
    let writer = writers.get(format)?;

    let records = db.find_all(identifier).await?;

    let resolver = FieldLabelResolver::new(&settings.ignored_fields);
    let date_time_format = include_date_time.then_some(settings.datetime_format.as_str());
    let grid = build_grid(&records, &resolver, date_time_format);

    let bytes = writer.write(&grid, &settings.document_properties())?;

    tracing::info!(
        "Exported {} entries of '{}' as {} ({} bytes)",
        records.len(),
        identifier,
        format,
        bytes.len()
    );

    Ok(ExportFile {
        format,
        file_name: format.file_name(identifier),
        mime_type: format.mime_type(),
        bytes,
    })
}

/// Delete one entry. Returns its identifier so the caller can go back to it.
pub async fn delete_one(
    db: &Database,
    id: &str,
    remove_attached_resources: bool,
) -> Result<String, ApiError> {
    let record = db
        .find_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("record {}", id)))?;

    db.delete_one(&record, remove_attached_resources).await?;

    Ok(record.identifier)
}

pub async fn delete_all(
    db: &Database,
    identifier: &str,
    interval: Option<DateInterval>,
    remove_attached_resources: bool,
) -> Result<u64, ApiError> {
    Ok(db
        .delete_by_identifier(identifier, interval, remove_attached_resources)
        .await?)
}
