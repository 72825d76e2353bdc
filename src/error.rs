use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Configuration(String),
    #[error("backend error: {0}")]
    Backend(String),
    #[error("{0}")]
    Validation(String),
    #[error("{}", describe_failed(.failed))]
    PartialFailure { failed: Vec<String> },
    #[error("another request is still in progress")]
    Busy,
    #[error(transparent)]
    Io(#[from] io::Error),
}

pub type AppResult<T> = Result<T, AppError>;

fn describe_failed(failed: &[String]) -> String {
    if failed.is_empty() {
        "The backend rejected the ticket update.".to_string()
    } else {
        format!("Some tickets failed to update: {}", failed.join(", "))
    }
}
