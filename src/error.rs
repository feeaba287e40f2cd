use actix_web::http::StatusCode;
use std::fmt;

/// Custom error type for the email geolocation tracker
#[derive(Debug)]
pub enum AtlasError {
    /// Payload could not be decoded
    Parse(String),
    /// Server configuration error (e.g. missing API key)
    Config(String),
    /// Geolocation service returned a non-success response
    Upstream { status: u16, message: String },
    /// Network operation error
    Network(String),
    /// Database operation error
    Database(String),
}

impl AtlasError {
    /// HTTP status this error maps to. Upstream failures relay the
    /// upstream status code.
    pub fn http_status(&self) -> StatusCode {
        match self {
            AtlasError::Parse(_) => StatusCode::BAD_REQUEST,
            AtlasError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AtlasError::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            AtlasError::Network(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AtlasError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl fmt::Display for AtlasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AtlasError::Parse(msg) => write!(f, "Invalid webhook payload: {}", msg),
            AtlasError::Config(msg) => write!(f, "Server configuration error: {}", msg),
            AtlasError::Upstream { status, message } => {
                write!(f, "Geolocation API request failed: {} {}", status, message)
            }
            AtlasError::Network(msg) => write!(f, "Network error: {}", msg),
            AtlasError::Database(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for AtlasError {}

impl From<rusqlite::Error> for AtlasError {
    fn from(err: rusqlite::Error) -> Self {
        AtlasError::Database(err.to_string())
    }
}

impl From<reqwest::Error> for AtlasError {
    fn from(err: reqwest::Error) -> Self {
        AtlasError::Network(err.to_string())
    }
}

impl From<serde_json::Error> for AtlasError {
    fn from(err: serde_json::Error) -> Self {
        AtlasError::Parse(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AtlasError>;
