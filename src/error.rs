//! Error types
//!
//! Library operations return [`BlogError`]; the CLI and command layer wrap it
//! in `anyhow` with extra context.

use thiserror::Error;

/// Errors raised while fetching, normalizing and rendering blog content
#[derive(Error, Debug)]
pub enum BlogError {
    /// A non-null timestamp that does not parse as a date
    #[error("Invalid timestamp: {value:?}")]
    Format { value: String },

    /// No document of the given type carries this uid
    #[error("No {document_type} document with uid {uid:?}")]
    NotFound { document_type: String, uid: String },

    /// Transport or HTTP failure talking to the content API
    #[error("Content API request failed: {0}")]
    Fetch(#[from] reqwest::Error),

    /// The content API answered, but not with something usable
    #[error("Content API error: {0}")]
    Api(String),

    /// A page cursor this client did not issue
    #[error("Invalid page cursor: {0:?}")]
    InvalidCursor(String),

    /// A response or fixture body did not match the expected shape
    #[error("Failed to decode content: {0}")]
    Decode(#[from] serde_json::Error),

    /// Invalid site configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Template rendering failed
    #[error("Template rendering failed: {0}")]
    Template(#[from] tera::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl BlogError {
    /// Create a format error for an unparseable timestamp
    pub fn format(value: impl Into<String>) -> Self {
        Self::Format {
            value: value.into(),
        }
    }

    /// Create a not-found error for a document lookup
    pub fn not_found(document_type: impl Into<String>, uid: impl Into<String>) -> Self {
        Self::NotFound {
            document_type: document_type.into(),
            uid: uid.into(),
        }
    }

    /// Create an API error with context
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }

    pub fn invalid_cursor(cursor: impl Into<String>) -> Self {
        Self::InvalidCursor(cursor.into())
    }

    /// Whether this is a fetch failure the user may retry by hand
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Fetch(_) | Self::Api(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, BlogError>;
