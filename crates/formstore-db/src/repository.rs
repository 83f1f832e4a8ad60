use std::str::FromStr;
use std::sync::Arc;

use crate::{
    models::{DateInterval, StorageRecordRow},
    resources::ResourceStore,
    Error, Result,
};
use formstore_core::{validate_identifier, StorageRecord};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};

const DEFAULT_MAX_CONNECTIONS: u32 = 5;

#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
    resources: Arc<dyn ResourceStore>,
}

impl Database {
    /// Create new database connection
    pub async fn new(database_url: &str, resources: Arc<dyn ResourceStore>) -> Result<Self> {
        Self::with_max_connections(database_url, DEFAULT_MAX_CONNECTIONS, resources).await
    }

    pub async fn with_max_connections(
        database_url: &str,
        max_connections: u32,
        resources: Arc<dyn ResourceStore>,
    ) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(|e| Error::Connection(format!("{}: {}", database_url, e)))?
            .create_if_missing(true);

        // Every connection to an in-memory database opens a fresh, empty one
        let pool = if database_url.contains(":memory:") {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
                .connect_with(options)
                .await?
        } else {
            SqlitePoolOptions::new()
                .max_connections(max_connections.max(1))
                .connect_with(options)
                .await?
        };

        tracing::debug!("Connected to {}", database_url);

        Ok(Self { pool, resources })
    }

    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    pub fn resources(&self) -> &Arc<dyn ResourceStore> {
        &self.resources
    }

    /// Initialize database schema
    pub async fn init_schema(&self) -> Result<()> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS storage_records (
                id VARCHAR(36) PRIMARY KEY,
                storage_identifier VARCHAR(256) NOT NULL,
                properties TEXT NOT NULL,
                created_at INTEGER NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS idx_storage_records_identifier_created_at \
             ON storage_records(storage_identifier, created_at DESC)",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Persist a new record
    pub async fn add(&self, record: &StorageRecord) -> Result<()> {
        validate_identifier(&record.identifier)?;
        let row = StorageRecordRow::from_record(record)?;

        sqlx::query(
            r#"
            INSERT INTO storage_records (id, storage_identifier, properties, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&row.id)
        .bind(&row.storage_identifier)
        .bind(&row.properties)
        .bind(row.created_at)
        .execute(&self.pool)
        .await?;

        tracing::info!(
            "Stored record {} for '{}' with {} properties",
            record.id,
            record.identifier,
            record.properties.len()
        );

        Ok(())
    }

    /// Delete a single record, and its attachments when `cascade_resources` is set
    pub async fn delete_one(&self, record: &StorageRecord, cascade_resources: bool) -> Result<()> {
        let result = sqlx::query("DELETE FROM storage_records WHERE id = ?")
            .bind(&record.id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::RecordNotFound(record.id.clone()));
        }

        if cascade_resources {
            for resource in record.resources() {
                self.resources.delete(resource).await?;
            }
        }

        tracing::info!("Deleted record {} from '{}'", record.id, record.identifier);

        Ok(())
    }

    /// Delete every record of `identifier`, optionally only those inside
    /// `interval`. Returns the number of records removed.
    ///
    /// With `cascade_resources` the records are removed one by one; a failure
    /// midway leaves the already removed ones deleted.
    pub async fn delete_by_identifier(
        &self,
        identifier: &str,
        interval: Option<DateInterval>,
        cascade_resources: bool,
    ) -> Result<u64> {
        if cascade_resources {
            let records = self.find_matching(identifier, interval).await?;
            let mut removed = 0;
            for record in &records {
                self.delete_one(record, true).await?;
                removed += 1;
            }

            tracing::info!(
                "Deleted {} records (with resources) from '{}'",
                removed,
                identifier
            );
            return Ok(removed);
        }

        let result = match interval {
            Some(interval) => {
                sqlx::query(
                    "DELETE FROM storage_records \
                     WHERE storage_identifier = ? AND created_at BETWEEN ? AND ?",
                )
                .bind(identifier)
                .bind(interval.from.timestamp_micros())
                .bind(interval.to.timestamp_micros())
                .execute(&self.pool)
                .await?
            }
            None => {
                sqlx::query("DELETE FROM storage_records WHERE storage_identifier = ?")
                    .bind(identifier)
                    .execute(&self.pool)
                    .await?
            }
        };

        tracing::info!(
            "Deleted {} records from '{}'",
            result.rows_affected(),
            identifier
        );

        Ok(result.rows_affected())
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Get record by ID
    pub async fn find_by_id(&self, id: &str) -> Result<Option<StorageRecord>> {
        let row = sqlx::query_as::<_, StorageRecordRow>(
            "SELECT * FROM storage_records WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(StorageRecord::try_from).transpose()
    }

    /// All identifiers currently in use, sorted
    pub async fn list_distinct_identifiers(&self) -> Result<Vec<String>> {
        let identifiers = sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT storage_identifier FROM storage_records ORDER BY storage_identifier",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(identifiers)
    }

    pub async fn count_by_identifier(&self, identifier: &str) -> Result<u64> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM storage_records WHERE storage_identifier = ?",
        )
        .bind(identifier)
        .fetch_one(&self.pool)
        .await?;

        Ok(count.max(0) as u64)
    }

    /// One page of records, most recent first
    pub async fn find_page(
        &self,
        identifier: &str,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<StorageRecord>> {
        let rows = sqlx::query_as::<_, StorageRecordRow>(
            r#"
            SELECT * FROM storage_records
            WHERE storage_identifier = ?
            ORDER BY created_at DESC, rowid DESC
            LIMIT ? OFFSET ?
            "#,
        )
        .bind(identifier)
        .bind(to_sql_int(limit))
        .bind(to_sql_int(offset))
        .fetch_all(&self.pool)
        .await?;

        tracing::debug!(
            "Fetched {} records for '{}' (limit {}, offset {})",
            rows.len(),
            identifier,
            limit,
            offset
        );

        rows.into_iter().map(StorageRecord::try_from).collect()
    }

    /// Every record of `identifier`, most recent first.
    ///
    /// Loads the whole set into memory.
    pub async fn find_all(&self, identifier: &str) -> Result<Vec<StorageRecord>> {
        self.find_matching(identifier, None).await
    }

    async fn find_matching(
        &self,
        identifier: &str,
        interval: Option<DateInterval>,
    ) -> Result<Vec<StorageRecord>> {
        let rows = match interval {
            Some(interval) => {
                sqlx::query_as::<_, StorageRecordRow>(
                    r#"
                    SELECT * FROM storage_records
                    WHERE storage_identifier = ? AND created_at BETWEEN ? AND ?
                    ORDER BY created_at DESC, rowid DESC
                    "#,
                )
                .bind(identifier)
                .bind(interval.from.timestamp_micros())
                .bind(interval.to.timestamp_micros())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query_as::<_, StorageRecordRow>(
                    r#"
                    SELECT * FROM storage_records
                    WHERE storage_identifier = ?
                    ORDER BY created_at DESC, rowid DESC
                    "#,
                )
                .bind(identifier)
                .fetch_all(&self.pool)
                .await?
            }
        };

        rows.into_iter().map(StorageRecord::try_from).collect()
    }
}

fn to_sql_int(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}
