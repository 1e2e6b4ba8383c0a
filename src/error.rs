use thiserror::Error;

#[derive(Error, Debug)]
pub enum PennyError {
    #[error("Database error: {0}")]
    Db(#[from] rusqlite::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid rule pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// Every login attempt failed; carries the last attempt's reason.
    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("Passcode not found: {0}")]
    PasscodeNotFound(String),

    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    #[error("Sheet not found: {0}")]
    StoreNotFound(String),

    #[error("Settings error: {0}")]
    Settings(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, PennyError>;
