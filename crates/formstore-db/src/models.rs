use chrono::{DateTime, Utc};
use formstore_core::{Properties, StorageRecord};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::Error;

/// Raw row of the `storage_records` table.
///
/// `created_at` holds microseconds since the Unix epoch so that ordering and
/// range filters compare integers.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StorageRecordRow {
    pub id: String,
    pub storage_identifier: String,
    pub properties: String,
    pub created_at: i64,
}

impl StorageRecordRow {
    pub fn from_record(record: &StorageRecord) -> Result<Self, Error> {
        Ok(Self {
            id: record.id.clone(),
            storage_identifier: record.identifier.clone(),
            properties: serde_json::to_string(&record.properties)?,
            created_at: record.timestamp.timestamp_micros(),
        })
    }
}

impl TryFrom<StorageRecordRow> for StorageRecord {
    type Error = Error;

    fn try_from(row: StorageRecordRow) -> Result<Self, Self::Error> {
        let properties: Properties =
            serde_json::from_str(&row.properties).map_err(|e| Error::CorruptRecord {
                id: row.id.clone(),
                reason: e.to_string(),
            })?;

        let timestamp =
            DateTime::<Utc>::from_timestamp_micros(row.created_at).ok_or_else(|| {
                Error::CorruptRecord {
                    id: row.id.clone(),
                    reason: format!("timestamp {} out of range", row.created_at),
                }
            })?;

        Ok(StorageRecord {
            id: row.id,
            identifier: row.storage_identifier,
            properties,
            timestamp,
        })
    }
}

/// Inclusive timestamp range used by bulk deletion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateInterval {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateInterval {
    pub fn new(from: DateTime<Utc>, to: DateTime<Utc>) -> Self {
        Self { from, to }
    }

    pub fn contains(&self, timestamp: &DateTime<Utc>) -> bool {
        self.from <= *timestamp && *timestamp <= self.to
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use formstore_core::PropertyValue;

    #[test]
    fn test_row_conversion_keeps_property_order() {
        let mut properties = Properties::new();
        properties.insert("zeta".to_string(), PropertyValue::from("last letter"));
        properties.insert("alpha".to_string(), PropertyValue::from("first letter"));
        let record = StorageRecord::new("ordering", properties).unwrap();

        let row = StorageRecordRow::from_record(&record).unwrap();
        let restored = StorageRecord::try_from(row).unwrap();

        let keys: Vec<&str> = restored.properties.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["zeta", "alpha"]);
        assert_eq!(
            restored.timestamp.timestamp_micros(),
            record.timestamp.timestamp_micros()
        );
    }

    #[test]
    fn test_corrupt_properties_are_reported() {
        let row = StorageRecordRow {
            id: "broken".to_string(),
            storage_identifier: "x".to_string(),
            properties: "not json".to_string(),
            created_at: 0,
        };

        let err = StorageRecord::try_from(row).unwrap_err();
        assert!(matches!(err, Error::CorruptRecord { ref id, .. } if id == "broken"));
    }

    #[test]
    fn test_interval_is_inclusive() {
        let from = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let to = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap();
        let interval = DateInterval::new(from, to);

        assert!(interval.contains(&from));
        assert!(interval.contains(&to));
        assert!(!interval.contains(&(to + chrono::Duration::seconds(1))));
    }
}
