//! Fetcher trait and implementations.
//!
//! A [`Fetcher`] retrieves one encoding of one video from wherever the
//! videos are published. Every implementation resolves the same relative
//! [`resource_path`](crate::resource_path), so the source can be swapped
//! in configuration without touching the loader.

mod directory;
mod http;
#[cfg(feature = "mock")]
mod mock;

pub use self::directory::DirectoryFetcher;
pub use self::http::HttpFetcher;
#[cfg(feature = "mock")]
pub use self::mock::MockFetcher;
use crate::error::Result;
use async_trait::async_trait;
use reel_media::{Encoding, Payload, VideoId};

/// Unified interface for video sources.
///
/// # Examples
///
/// ```
/// use reel_fetch::{Fetcher, error::Result};
/// use reel_media::{Encoding, VideoId};
///
/// async fn total_size(fetcher: &dyn Fetcher, id: &VideoId) -> Result<usize> {
///     let mp4 = fetcher.fetch(id, Encoding::Mp4).await?;
///     let webm = fetcher.fetch(id, Encoding::Webm).await?;
///     Ok(mp4.len() + webm.len())
/// }
/// ```
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Short name of the source, used for logging only.
    fn name(&self) -> &str;

    /// Retrieve the complete body of `videos/<id>.<ext>`.
    ///
    /// A body is only ever returned whole; any failure part-way through a
    /// transfer is an error, never a truncated payload.
    async fn fetch(&self, id: &VideoId, encoding: Encoding) -> Result<Payload>;
}
