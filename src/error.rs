use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO Error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Json Error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Invalid detection: {0}")]
    InvalidDetection(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid record at line {line}: {reason}")]
    InvalidRecord { line: usize, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
