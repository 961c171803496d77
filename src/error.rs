use std::path::PathBuf;

use hyper::StatusCode;
use thiserror::Error;

/// Type alias for Result with PrinterError
pub type Result<T> = std::result::Result<T, PrinterError>;

/// Every way a print run can fail
///
/// None of these are recovered from: the pipeline returns the first error it
/// meets and the binary exits with a non-zero status.
#[derive(Error, Debug)]
pub enum PrinterError {
    /// Configuration file missing, unparsable or invalid
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Credentials or token missing, invalid, or the code exchange failed
    #[error("Authentication failed: {0}")]
    AuthError(String),

    /// Gmail API returned an error not covered by a more specific variant
    #[error("Gmail API error: {0}")]
    ApiError(String),

    /// Resource not found (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request (400)
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden (403)
    #[error("Access forbidden: {0}")]
    Forbidden(String),

    /// Too many requests (429)
    #[error("Rate limited by Gmail API: {0}")]
    RateLimited(String),

    /// Server returned 5xx error
    #[error("Server error (HTTP {status}): {message}")]
    ServerError { status: u16, message: String },

    /// Connection-level failure
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Printed label could not be resolved or created
    #[error("Label error: {0}")]
    LabelError(String),

    /// API response missing fields we rely on
    #[error("Invalid message format: {0}")]
    InvalidMessageFormat(String),

    /// Attachment could not be fetched or spooled
    #[error("Attachment error: {0}")]
    AttachmentError(String),

    /// Print command could not be started or exited unsuccessfully
    #[error("Print command `{command}` failed for {path:?}: {status}")]
    PrintError {
        command: String,
        path: PathBuf,
        status: String,
    },

    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl PrinterError {
    /// Map a non-success HTTP status from the Gmail API to an error variant
    pub fn from_status(status: StatusCode) -> Self {
        let message = format!(
            "HTTP {}: {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown")
        );

        match status.as_u16() {
            404 => PrinterError::NotFound(message),
            400 => PrinterError::BadRequest(message),
            401 => PrinterError::AuthError(message),
            403 => PrinterError::Forbidden(message),
            429 => PrinterError::RateLimited(message),
            500..=599 => PrinterError::ServerError {
                status: status.as_u16(),
                message,
            },
            _ => PrinterError::ApiError(message),
        }
    }
}

impl From<google_gmail1::Error> for PrinterError {
    fn from(error: google_gmail1::Error) -> Self {
        match error {
            google_gmail1::Error::Failure(ref response) => Self::from_status(response.status()),
            google_gmail1::Error::BadRequest(ref err) => PrinterError::BadRequest(err.to_string()),
            google_gmail1::Error::HttpError(ref err) => {
                PrinterError::NetworkError(format!("Connection error: {}", err))
            }
            google_gmail1::Error::Io(err) => PrinterError::NetworkError(err.to_string()),
            google_gmail1::Error::MissingToken(ref err) => {
                PrinterError::AuthError(format!("No usable token: {}", err))
            }
            _ => PrinterError::ApiError(error.to_string()),
        }
    }
}
