//! Cache Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use reel_media::VideoId;
use std::path::PathBuf;

/// A cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
/// [`Unavailable`](Self::Unavailable), [`Migration`](Self::Migration),
/// [`VersionConflict`](Self::VersionConflict) and
/// [`UnknownVersion`](Self::UnknownVersion) mean the store cannot be used at
/// all; everything else concerns a single record.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// The storage engine refused to open the database (missing permissions,
    /// read-only location, disk full, ...).
    #[display("store unavailable: {}", _0.display())]
    Unavailable(#[error(not(source))] PathBuf),
    /// A schema step failed to apply.
    #[display("schema setup failed for version {_0}")]
    Migration(#[error(not(source))] u32),
    /// The database on disk was created by a newer schema than requested.
    #[display("requested schema version {requested} is older than stored version {current}")]
    VersionConflict { requested: u32, current: u32 },
    /// No schema step exists for the requested version.
    #[display("unknown schema version {_0}")]
    UnknownVersion(#[error(not(source))] u32),
    #[display("database error")]
    Database,
    /// A record with this identifier is already stored; records are never
    /// overwritten.
    #[display("record already exists: {_0}")]
    AlreadyExists(#[error(not(source))] VideoId),
    #[display("failed to write record: {_0}")]
    Write(#[error(not(source))] VideoId),
    /// Serialization/deserialization error.
    #[display("invalid cache data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database | Self::Write(_))
    }

    /// Returns `true` if the whole store is unusable, as opposed to a single
    /// record operation having failed.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Self::Unavailable(_) | Self::Migration(_) | Self::VersionConflict { .. } | Self::UnknownVersion(_)
        )
    }
}
