//! Error types for Gator.

use thiserror::Error;

/// Failure while talking to a feed server.
#[derive(Error, Debug)]
pub enum NetworkError {
    /// Connection, TLS, redirect or body read failure.
    #[error("request failed: {0}")]
    Request(String),

    /// The request did not complete within the configured timeout.
    #[error("request timed out")]
    Timeout,

    /// The server answered with a non-2xx status.
    #[error("HTTP status {0}")]
    Status(u16),

    /// The response body exceeded the configured maximum size.
    #[error("feed too large: {size} bytes (max {max} bytes)")]
    BodyTooLarge {
        /// Actual or announced size of the body.
        size: u64,
        /// Configured maximum.
        max: u64,
    },
}

impl From<reqwest::Error> for NetworkError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            NetworkError::Timeout
        } else if let Some(status) = e.status() {
            NetworkError::Status(status.as_u16())
        } else {
            NetworkError::Request(e.to_string())
        }
    }
}

/// Common error type for Gator.
#[derive(Error, Debug)]
pub enum GatorError {
    /// The rotation is empty: there is no feed to fetch.
    #[error("no feeds to fetch")]
    NoFeeds,

    /// Fetching a feed failed.
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// The fetched document is not a well-formed RSS feed.
    #[error("decode error: {0}")]
    Decode(String),

    /// An item carried a publication date in an unsupported format.
    #[error("date format error: could not parse {value:?}: {reason}")]
    DateFormat {
        /// The raw date string from the feed.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// Database error.
    ///
    /// Errors from sqlx are converted automatically.
    #[error("database error: {0}")]
    Database(String),

    /// The operation was cancelled by shutdown.
    #[error("operation cancelled")]
    Cancelled,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Validation error for user input.
    #[error("validation error: {0}")]
    Validation(String),

    /// Resource not found.
    #[error("{0} not found")]
    NotFound(String),

    /// The command needs a logged-in user.
    #[error("no user is logged in (use `login <name>` or `register <name>`)")]
    NotLoggedIn,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<sqlx::Error> for GatorError {
    fn from(e: sqlx::Error) -> Self {
        GatorError::Database(e.to_string())
    }
}

/// Result type alias for Gator operations.
pub type Result<T> = std::result::Result<T, GatorError>;
