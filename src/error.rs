use thiserror::Error;

#[derive(Error, Debug)]
pub enum WizardError {
    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("Payment service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Unknown event: {0}")]
    UnknownEvent(String),
}

pub type Result<T> = std::result::Result<T, WizardError>;
