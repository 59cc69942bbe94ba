use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading the payables table
#[derive(Debug, Error)]
pub enum PayablesError {
    #[error("payables file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("required column missing from payables file: {0}")]
    MissingColumn(&'static str),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("load task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}
