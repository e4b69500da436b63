//! Loader Error Types
//!
//! Every kind names the video it concerns, so a failed item in the
//! [`load`](crate::Loader::load) stream can be attributed without context.

use derive_more::{Display, Error};
use reel_media::VideoId;

/// A loader error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for loader operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    /// At least one encoding could not be obtained from the video source.
    #[display("failed to fetch {_0}")]
    Fetch(#[error(not(source))] VideoId),
    /// The video was obtained but could not be put on the page.
    #[display("failed to render {_0}")]
    Render(#[error(not(source))] VideoId),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    ///
    /// A fetch may succeed on the next load; a render failure means the page
    /// already shows the video.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Fetch(_))
    }

    pub fn video(&self) -> &VideoId {
        match self {
            Self::Fetch(id) | Self::Render(id) => id,
        }
    }
}
