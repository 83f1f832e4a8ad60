//! Writes completed form submissions into the storage.

use std::collections::HashSet;

use formstore_core::{
    validate_identifier, FormField, IgnoreRules, Properties, PropertyValue, ResourceRef,
    StorageRecord, UNDEFINED_IDENTIFIER,
};
use formstore_db::Database;
use indexmap::IndexMap;

use crate::error::ApiError;

/// A file received with the submission, not yet stored.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub filename: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone)]
pub enum FormValue {
    Value(serde_json::Value),
    Upload(UploadedFile),
    Resource(ResourceRef),
}

impl From<serde_json::Value> for FormValue {
    fn from(value: serde_json::Value) -> Self {
        FormValue::Value(value)
    }
}

/// The values of a finished form plus its declared fields.
#[derive(Debug, Clone, Default)]
pub struct FormSubmission {
    pub storage_identifier: Option<String>,
    pub values: IndexMap<String, FormValue>,
    pub fields: Vec<FormField>,
}

impl FormSubmission {
    pub fn new(storage_identifier: Option<String>) -> Self {
        Self {
            storage_identifier,
            ..Self::default()
        }
    }

    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<FormValue>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn with_fields(mut self, fields: Vec<FormField>) -> Self {
        self.fields = fields;
        self
    }
}

/// Persists one submission per call. Built per request from its collaborators.
pub struct SubmissionWriter<'a> {
    db: &'a Database,
    rules: &'a IgnoreRules,
}

impl<'a> SubmissionWriter<'a> {
    pub fn new(db: &'a Database, rules: &'a IgnoreRules) -> Self {
        Self { db, rules }
    }

    /// Store the submission and return the new record. Its `id` is what the
    /// form runtime exposes as `databaseStorageIdentifier`.
    pub async fn write(&self, submission: FormSubmission) -> Result<StorageRecord, ApiError> {
        let identifier = submission
            .storage_identifier
            .filter(|identifier| !identifier.is_empty())
            .unwrap_or_else(|| UNDEFINED_IDENTIFIER.to_string());
        // Reject before any upload hits the resource store
        validate_identifier(&identifier)?;

        let ignored_fields: HashSet<&str> = submission
            .fields
            .iter()
            .filter(|field| self.rules.is_ignored_field(field))
            .map(|field| field.identifier.as_str())
            .collect();

        let mut properties = Properties::new();
        let mut stored_resources = Vec::new();

        for (key, value) in submission.values {
            if self.rules.is_ignored(&key) || ignored_fields.contains(key.as_str()) {
                tracing::debug!("Skipping ignored field '{}'", key);
                continue;
            }

            let property = match value {
                FormValue::Value(value) => PropertyValue::Value(value),
                FormValue::Resource(resource) => PropertyValue::resource(resource),
                FormValue::Upload(file) => {
                    let stored = self
                        .db
                        .resources()
                        .store(&file.filename, &file.media_type, &file.bytes)
                        .await;
                    match stored {
                        Ok(resource) => {
                            stored_resources.push(resource.clone());
                            PropertyValue::resource(resource)
                        }
                        Err(e) => {
                            self.discard(&stored_resources).await;
                            return Err(e.into());
                        }
                    }
                }
            };
            properties.insert(key, property);
        }

        let record = StorageRecord::new(identifier, properties)?;
        if let Err(e) = self.db.add(&record).await {
            self.discard(&stored_resources).await;
            return Err(e.into());
        }

        Ok(record)
    }

    /// Remove uploads of a submission that could not be stored.
    async fn discard(&self, resources: &[ResourceRef]) {
        for resource in resources {
            if let Err(e) = self.db.resources().delete(resource).await {
                tracing::warn!("Failed to discard resource {}: {}", resource.id, e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formstore_db::FsResourceStore;
    use serde_json::json;
    use std::sync::Arc;

    async fn test_db(dir: &tempfile::TempDir) -> Database {
        let resources = Arc::new(FsResourceStore::new(dir.path()));
        let db = Database::new("sqlite::memory:", resources).await.unwrap();
        db.init_schema().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_write_strips_ignored_fields() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_db(&dir).await;
        let rules = IgnoreRules::default();

        let submission = FormSubmission::new(Some("contact".to_string()))
            .with_value("__csrfToken", json!("secret"))
            .with_value("name", json!("Jo"))
            .with_value("intro", json!("Welcome"))
            .with_value("email", json!("jo@example.com"))
            .with_fields(vec![
                FormField::new("intro").with_element_type("StaticText"),
                FormField::new("name"),
                FormField::new("email"),
            ]);

        let record = SubmissionWriter::new(&db, &rules)
            .write(submission)
            .await
            .unwrap();

        let stored = db.find_by_id(&record.id).await.unwrap().unwrap();
        let keys: Vec<&str> = stored.properties.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["name", "email"]);
    }

    #[tokio::test]
    async fn test_missing_identifier_falls_back_to_undefined() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_db(&dir).await;
        let rules = IgnoreRules::default();

        let record = SubmissionWriter::new(&db, &rules)
            .write(FormSubmission::new(None).with_value("a", json!(1)))
            .await
            .unwrap();

        assert_eq!(record.identifier, UNDEFINED_IDENTIFIER);
        assert_eq!(
            db.list_distinct_identifiers().await.unwrap(),
            vec![UNDEFINED_IDENTIFIER]
        );
    }

    #[tokio::test]
    async fn test_upload_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_db(&dir).await;
        let rules = IgnoreRules::default();

        let submission = FormSubmission::new(Some("applications".to_string()))
            .with_value("name", json!("Jo"))
            .with_value(
                "file",
                FormValue::Upload(UploadedFile {
                    filename: "cv.pdf".to_string(),
                    media_type: "application/pdf".to_string(),
                    bytes: b"%PDF-1.4".to_vec(),
                }),
            );

        let record = SubmissionWriter::new(&db, &rules)
            .write(submission)
            .await
            .unwrap();

        let page = db.find_page("applications", 10, 0).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].identifier, "applications");
        assert_eq!(page[0].properties, record.properties);
        assert_eq!(page[0].get("file").unwrap().display_value(), "cv.pdf");

        let resource = page[0].get("file").and_then(PropertyValue::as_resource).unwrap();
        assert!(db.resources().exists(resource).await.unwrap());
    }

    #[tokio::test]
    async fn test_too_long_identifier_is_rejected_before_upload() {
        let dir = tempfile::tempdir().unwrap();
        let db = test_db(&dir).await;
        let rules = IgnoreRules::default();

        let submission = FormSubmission::new(Some("x".repeat(300))).with_value(
            "file",
            FormValue::Upload(UploadedFile {
                filename: "a.txt".to_string(),
                media_type: "text/plain".to_string(),
                bytes: b"a".to_vec(),
            }),
        );

        let err = SubmissionWriter::new(&db, &rules)
            .write(submission)
            .await
            .unwrap_err();

        assert!(matches!(err, ApiError::Validation(_)));
        let mut entries = tokio::fs::read_dir(dir.path()).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());
    }
}
