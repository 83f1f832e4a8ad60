use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid storage identifier: {0}")]
    InvalidIdentifier(String),

    #[error("No writer available for type {0}")]
    UnsupportedFormat(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
