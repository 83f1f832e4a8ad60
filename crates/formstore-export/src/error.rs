use formstore_core::ExportFormat;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("No writer registered for format {0}")]
    WriterUnavailable(ExportFormat),

    #[error("Grid does not fit a worksheet: {0}")]
    GridTooLarge(String),

    #[error("XLSX writer error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
