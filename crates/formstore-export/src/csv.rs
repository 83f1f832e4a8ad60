use formstore_core::{DocumentProperties, ExportFormat, Grid};

use crate::{Result, TabularWriter};

/// Comma separated values, one line per row, header first.
#[derive(Debug, Clone, Copy, Default)]
pub struct CsvWriter;

impl TabularWriter for CsvWriter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Csv
    }

    fn write(&self, grid: &Grid, _properties: &DocumentProperties) -> Result<Vec<u8>> {
        let mut csv = String::new();

        for row in std::iter::once(&grid.header).chain(grid.rows.iter()) {
            let line: Vec<String> = row.iter().map(|cell| escape(cell)).collect();
            csv.push_str(&line.join(","));
            csv.push('\n');
        }

        Ok(csv.into_bytes())
    }
}

/// Quote a field containing separators, quotes or line breaks.
fn escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
