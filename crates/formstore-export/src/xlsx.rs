use formstore_core::{DocumentProperties, ExportFormat, Grid};
use rust_xlsxwriter::{DocProperties, Format, FormatAlign, Workbook};

use crate::{Error, Result, TabularWriter};

/// Excel names are limited to 31 characters.
const MAX_SHEET_NAME_LENGTH: usize = 31;
const FALLBACK_SHEET_NAME: &str = "Sheet1";

/// Office Open XML workbook with a single sheet named after the title.
#[derive(Debug, Clone, Copy, Default)]
pub struct XlsxWriter;

impl TabularWriter for XlsxWriter {
    fn format(&self) -> ExportFormat {
        ExportFormat::Xlsx
    }

    fn write(&self, grid: &Grid, properties: &DocumentProperties) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        workbook.set_properties(
            &DocProperties::new()
                .set_author(&properties.creator)
                .set_title(&properties.title)
                .set_subject(&properties.subject),
        );

        let header_format = Format::new()
            .set_bold()
            .set_align(FormatAlign::Center)
            .set_align(FormatAlign::VerticalCenter);

        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet_name(&properties.title))?;

        for (col, label) in grid.header.iter().enumerate() {
            worksheet.write_string_with_format(0, column_number(col)?, label, &header_format)?;
        }

        for (row_index, row) in grid.rows.iter().enumerate() {
            let row_number = row_number(row_index + 1)?;
            for (col, value) in row.iter().enumerate() {
                if !value.is_empty() {
                    worksheet.write_string(row_number, column_number(col)?, value)?;
                }
            }
        }

        tracing::debug!(
            "Wrote XLSX sheet with {} columns and {} rows",
            grid.width(),
            grid.rows.len()
        );

        Ok(workbook.save_to_buffer()?)
    }
}

fn column_number(col: usize) -> Result<u16> {
    u16::try_from(col).map_err(|_| Error::GridTooLarge(format!("column {}", col)))
}

fn row_number(row: usize) -> Result<u32> {
    u32::try_from(row).map_err(|_| Error::GridTooLarge(format!("row {}", row)))
}

/// Strip characters Excel forbids in sheet names and cut to length.
fn sheet_name(title: &str) -> String {
    let cleaned: String = title
        .chars()
        .filter(|c| !matches!(c, '[' | ']' | ':' | '*' | '?' | '/' | '\\'))
        .take(MAX_SHEET_NAME_LENGTH)
        .collect();
    let cleaned = cleaned.trim_matches('\'').trim();

    if cleaned.is_empty() {
        FALLBACK_SHEET_NAME.to_string()
    } else {
        cleaned.to_string()
    }
}
