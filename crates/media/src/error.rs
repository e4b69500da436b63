//! Media Error Types
//!
//! Structured errors using `exn` for automatic location tracking and error
//! tree construction, the same shape as every other crate in the workspace.

use derive_more::{Display, Error};

/// A media error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for media operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The identifier is empty, too long, or contains characters that cannot
    /// be used in resource paths, element ids and storage keys.
    #[display("invalid video identifier: {_0:?}")]
    InvalidId(#[error(not(source))] String),
    /// Playback offsets must be finite and non-negative.
    #[display("invalid playback offset: {_0}")]
    InvalidOffset(#[error(not(source))] f64),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        false
    }
}
