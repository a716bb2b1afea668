use thiserror::Error;

pub type LogResult<T> = Result<T, LogError>;

/// Failures of the shared log file. A missing file is never one of these
/// for reads or clears.
#[derive(Error, Debug)]
pub enum LogError {
    #[error("failed to read log file: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to open log file: {0}")]
    Open(#[source] std::io::Error),

    #[error("failed to write log file: {0}")]
    Write(#[source] std::io::Error),

    #[error("failed to truncate log file: {0}")]
    Truncate(#[source] std::io::Error),
}
