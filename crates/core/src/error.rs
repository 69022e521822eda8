//! Unified error types for cachet.
//!
//! The cache layer adds no error taxonomy of its own beyond these: transport,
//! store and policy failures are surfaced to the caller unchanged.

use tokio_rusqlite::rusqlite;

/// Unified error type shared by the store, transport and cache layers.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., malformed header name).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Transport failure (connection refused, TLS, body read).
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A store backend could not encode, decode or persist an entry.
    #[error("STORE_ERROR: {0}")]
    Store(String),

    /// A stored policy could not be decoded by the policy evaluator.
    #[error("POLICY_DECODE: {0}")]
    PolicyDecode(String),

    /// A response body declared as JSON could not be decoded.
    #[error("BODY_DECODE: {0}")]
    BodyDecode(String),

    /// The detached cache write task did not complete.
    #[error("CACHE_WRITE: {0}")]
    CacheWrite(String),
}

impl Error {
    /// Stable, machine readable code for this error.
    pub fn code(&self) -> &'static str {
        match self {
            Error::InvalidInput(_) => "INVALID_INPUT",
            Error::InvalidUrl(_) => "INVALID_URL",
            Error::HttpError(_) => "HTTP_ERROR",
            Error::FetchTimeout(_) => "FETCH_TIMEOUT",
            Error::FetchTooLarge(_) => "FETCH_TOO_LARGE",
            Error::Database(_) | Error::MigrationFailed(_) => "CACHE_ERROR",
            Error::Store(_) => "STORE_ERROR",
            Error::PolicyDecode(_) => "POLICY_DECODE",
            Error::BodyDecode(_) => "BODY_DECODE",
            Error::CacheWrite(_) => "CACHE_WRITE",
        }
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}
