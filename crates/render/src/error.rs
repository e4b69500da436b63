//! Render Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use reel_media::VideoId;

/// A render error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for render operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The page already has a player for this video.
    #[display("a player for {_0} is already mounted")]
    DuplicatePlayer(#[error(not(source))] VideoId),
    /// Asset was not loadable (embedded template, stylesheet or object URL).
    #[display("asset not found: {_0}")]
    AssetNotFound(#[error(not(source))] String),
    /// The page template failed to compile or render.
    #[display("page template error")]
    Template,
    Io,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io)
    }
}
