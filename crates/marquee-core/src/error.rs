//! Error types for Marquee Core

use thiserror::Error;

/// Result type alias for catalog and playback operations
pub type Result<T> = std::result::Result<T, Error>;

/// Marquee error types
#[derive(Error, Debug)]
pub enum Error {
    // Catalog errors
    #[error("Failed to fetch catalog data")]
    CatalogFetch,

    #[error("{0}")]
    Network(String),

    #[error("Media not found: {id}")]
    MediaNotFound { id: String },

    #[error("Invalid catalog: {0}")]
    InvalidCatalog(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Encoding errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a network error with the given message
    pub fn network(msg: impl Into<String>) -> Self {
        Error::Network(msg.into())
    }

    /// Returns true if remounting the failing view could succeed
    pub fn is_recoverable(&self) -> bool {
        matches!(self, Error::CatalogFetch | Error::Network(_))
    }

    /// Returns the error code for diagnostics
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::CatalogFetch => "CATALOG_FETCH",
            Error::Network(_) => "NETWORK",
            Error::MediaNotFound { .. } => "MEDIA_NOT_FOUND",
            Error::InvalidCatalog(_) => "INVALID_CATALOG",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Json(_) => "JSON",
            Error::Io(_) => "IO",
        }
    }
}
