use std::fmt::{self, Write as _};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{Error, FieldLabelResolver, StorageRecord};

/// Header of the optional timestamp column.
pub const DATE_TIME_LABEL: &str = "DateTime";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Xls,
    #[default]
    Xlsx,
    Ods,
    Csv,
    Html,
}

impl ExportFormat {
    pub const ALL: [ExportFormat; 5] = [
        ExportFormat::Xls,
        ExportFormat::Xlsx,
        ExportFormat::Ods,
        ExportFormat::Csv,
        ExportFormat::Html,
    ];

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xls => "xls",
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Ods => "ods",
            ExportFormat::Csv => "csv",
            ExportFormat::Html => "html",
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            ExportFormat::Xls => "application/vnd.ms-excel",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
            ExportFormat::Ods => "application/vnd.oasis.opendocument.spreadsheet",
            ExportFormat::Csv => "text/csv",
            ExportFormat::Html => "text/html",
        }
    }

    /// Download name, e.g. `Database-Storage-contact.xlsx`.
    pub fn file_name(&self, identifier: &str) -> String {
        format!("Database-Storage-{}.{}", identifier, self.extension())
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

impl FromStr for ExportFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ExportFormat::ALL
            .into_iter()
            .find(|format| format.extension().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| Error::UnsupportedFormat(s.to_string()))
    }
}

/// Metadata written into exported documents.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentProperties {
    pub creator: String,
    pub title: String,
    pub subject: String,
}

/// Header row plus one row per record, every row as wide as the header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Grid {
    pub fn width(&self) -> usize {
        self.header.len()
    }
}

/// Lay out `records` as a grid.
///
/// When `date_time_format` is set a trailing [`DATE_TIME_LABEL`] column holds
/// each record's timestamp in that strftime pattern.
pub fn build_grid(
    records: &[StorageRecord],
    resolver: &FieldLabelResolver<'_>,
    date_time_format: Option<&str>,
) -> Grid {
    let labels = resolver.resolve_labels(records);

    let rows = records
        .iter()
        .map(|record| {
            let mut row: Vec<String> = labels
                .iter()
                .map(|label| resolver.value_of(record, label))
                .collect();
            if let Some(pattern) = date_time_format {
                row.push(format_timestamp(&record.timestamp, pattern));
            }
            row
        })
        .collect();

    let mut header = labels;
    if date_time_format.is_some() {
        header.push(DATE_TIME_LABEL.to_string());
    }

    Grid { header, rows }
}

/// Format with a strftime pattern, falling back to RFC 3339 when the pattern
/// is invalid.
pub fn format_timestamp(timestamp: &DateTime<Utc>, pattern: &str) -> String {
    let mut formatted = String::new();
    match write!(formatted, "{}", timestamp.format(pattern)) {
        Ok(()) => formatted,
        Err(_) => {
            tracing::warn!("Invalid datetime format '{}', using RFC 3339", pattern);
            timestamp.to_rfc3339()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{IgnoreRules, Properties, PropertyValue};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn record(pairs: &[(&str, serde_json::Value)], hour: u32) -> StorageRecord {
        let properties: Properties = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), PropertyValue::from(v.clone())))
            .collect();
        StorageRecord::new("export-test", properties)
            .unwrap()
            .with_timestamp(Utc.with_ymd_and_hms(2024, 3, 1, hour, 30, 0).unwrap())
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("xlsx".parse::<ExportFormat>().unwrap(), ExportFormat::Xlsx);
        assert_eq!("Xlsx".parse::<ExportFormat>().unwrap(), ExportFormat::Xlsx);
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);

        let err = "bogus".parse::<ExportFormat>().unwrap_err();
        assert!(matches!(err, Error::UnsupportedFormat(ref f) if f == "bogus"));
    }

    #[test]
    fn test_file_name_and_mime_type() {
        assert_eq!(
            ExportFormat::Ods.file_name("contact"),
            "Database-Storage-contact.ods"
        );
        assert_eq!(ExportFormat::Csv.mime_type(), "text/csv");
        assert_eq!(ExportFormat::default(), ExportFormat::Xlsx);
    }

    #[test]
    fn test_grid_without_timestamp() {
        let rules = IgnoreRules::none();
        let resolver = FieldLabelResolver::new(&rules);
        let records = vec![
            record(&[("a", json!(1)), ("b", json!("two"))], 10),
            record(&[("c", json!(true))], 9),
        ];

        let grid = build_grid(&records, &resolver, None);

        assert_eq!(grid.header, vec!["a", "b", "c"]);
        assert_eq!(
            grid.rows,
            vec![
                vec!["1".to_string(), "two".to_string(), String::new()],
                vec![String::new(), String::new(), "true".to_string()],
            ]
        );
    }

    #[test]
    fn test_grid_with_timestamp_column() {
        let rules = IgnoreRules::none();
        let resolver = FieldLabelResolver::new(&rules);
        let records = vec![record(&[("a", json!("x"))], 10), record(&[], 8)];

        let grid = build_grid(&records, &resolver, Some("%d.%m.%Y %H:%M"));

        assert_eq!(grid.header, vec!["a", DATE_TIME_LABEL]);
        assert_eq!(grid.rows[0], vec!["x", "01.03.2024 10:30"]);
        assert_eq!(grid.rows[1], vec!["", "01.03.2024 08:30"]);
        assert!(grid.rows.iter().all(|row| row.len() == grid.width()));
    }
}
