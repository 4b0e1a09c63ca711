use thiserror::Error;

pub type Result<T> = std::result::Result<T, IndexerError>;

#[derive(Error, Debug)]
pub enum IndexerError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Walk error: {0}")]
    WalkError(#[from] walkdir::Error),

    #[error("Unknown category: {0}")]
    UnknownCategory(String),

    #[error("Invalid name registry: {0}")]
    InvalidRegistry(#[from] serde_json::Error),

    #[error("Invalid path: {0}")]
    InvalidPath(String),
}
