//! Tabular writers turning an export [`Grid`](formstore_core::Grid) into the
//! bytes of a downloadable file.

pub mod writer;
pub mod csv;
pub mod html;
pub mod xlsx;
pub mod error;

// Re-exports
pub use writer::{TabularWriter, WriterRegistry};
pub use csv::CsvWriter;
pub use html::HtmlWriter;
pub use xlsx::XlsxWriter;
pub use error::{Error, Result};
