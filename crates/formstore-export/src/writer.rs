use std::collections::HashMap;
use std::sync::Arc;

use formstore_core::{DocumentProperties, ExportFormat, Grid};

use crate::{CsvWriter, Error, HtmlWriter, Result, XlsxWriter};

/// Encodes a grid into one file format.
///
/// Row 0 of the output is the grid header, rendered bold and centered where
/// the format supports styling.
pub trait TabularWriter: Send + Sync {
    fn format(&self) -> ExportFormat;

    fn write(&self, grid: &Grid, properties: &DocumentProperties) -> Result<Vec<u8>>;
}

/// Writers by format.
#[derive(Clone, Default)]
pub struct WriterRegistry {
    writers: HashMap<ExportFormat, Arc<dyn TabularWriter>>,
}

impl WriterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// CSV, HTML and XLSX. Writers for `xls` and `ods` have to be registered
    /// by the embedding application.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(CsvWriter));
        registry.register(Arc::new(HtmlWriter));
        registry.register(Arc::new(XlsxWriter));
        registry
    }

    /// Register a writer, replacing any previous one for the same format.
    pub fn register(&mut self, writer: Arc<dyn TabularWriter>) {
        self.writers.insert(writer.format(), writer);
    }

    pub fn get(&self, format: ExportFormat) -> Result<Arc<dyn TabularWriter>> {
        self.writers
            .get(&format)
            .cloned()
            .ok_or(Error::WriterUnavailable(format))
    }

    pub fn supports(&self, format: ExportFormat) -> bool {
        self.writers.contains_key(&format)
    }

    pub fn formats(&self) -> Vec<ExportFormat> {
        ExportFormat::ALL
            .into_iter()
            .filter(|format| self.supports(*format))
            .collect()
    }
}
