//! Fetch Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A fetch error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for fetch operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The configured base URL cannot be used to build resource URLs.
    #[display("invalid base URL: {_0}")]
    InvalidUrl(#[error(not(source))] String),
    /// Connection, TLS or body transfer failure for the given URL.
    #[display("network error requesting {_0}")]
    Network(#[error(not(source))] String),
    /// The server answered with a non-success status.
    #[display("HTTP status {_0}")]
    Status(#[error(not(source))] u16),
    /// The resource does not exist in a directory source.
    #[display("resource not found: {}", _0.display())]
    NotFound(#[error(not(source))] PathBuf),
    /// Reading a resource from a directory source failed.
    #[display("I/O error")]
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    ///
    /// Nothing in reel retries a fetch; this only informs log output.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(_) | Self::Io => true,
            Self::Status(status) => *status == 408 || *status == 429 || (500..=599).contains(status),
            Self::InvalidUrl(_) | Self::NotFound(_) => false,
        }
    }
}
