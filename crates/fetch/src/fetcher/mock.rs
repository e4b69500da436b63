//! In-memory video source for testing.

use crate::error::{ErrorKind, Result};
use crate::{Fetcher, resource_path};
use async_trait::async_trait;
use exn::OptionExt;
use reel_media::{Encoding, Payload, VideoId};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::RwLock;

/// In-memory video source for testing.
///
/// Every call to [`fetch()`](Fetcher::fetch) is counted, whether it succeeds
/// or not, so tests can assert that a warm cache never reaches the network.
///
/// # Examples
///
/// ```
/// use reel_fetch::{Fetcher, fetcher::MockFetcher};
/// use reel_media::{Encoding, VideoId};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let fetcher = MockFetcher::with_videos(["video1"]);
/// let id: VideoId = "video1".parse()?;
/// assert_eq!(fetcher.fetch(&id, Encoding::Mp4).await?.as_ref(), b"video1.mp4");
/// assert_eq!(fetcher.requests(), 1);
/// # Ok(())
/// # }
/// ```
pub struct MockFetcher {
    videos: HashMap<(VideoId, Encoding), Payload>,
    failing: RwLock<HashSet<VideoId>>,
    requests: AtomicUsize,
    latency: Option<Duration>,
}

impl MockFetcher {
    /// Create a mock source serving both encodings of each named video. The
    /// body of each resource is its file name, e.g. `b"video1.webm"`.
    ///
    /// Panics on an invalid identifier. If test setup is wrong, then the test
    /// should not pass.
    pub fn with_videos(ids: impl IntoIterator<Item = impl AsRef<str>>) -> Self {
        let mut videos = HashMap::new();
        for name in ids {
            let Ok(id) = name.as_ref().parse::<VideoId>() else {
                panic!("MockFetcher::with_videos: invalid identifier {:?}", name.as_ref());
            };
            for encoding in Encoding::ALL {
                let body = format!("{id}.{}", encoding.extension());
                videos.insert((id.clone(), encoding), Payload::from(body.into_bytes()));
            }
        }
        Self {
            videos,
            failing: RwLock::default(),
            requests: AtomicUsize::new(0),
            latency: None,
        }
    }

    /// Delay every response, so concurrent loads overlap.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Make every fetch for `id` fail with a 503.
    pub async fn fail(&self, id: VideoId) {
        self.failing.write().await.insert(id);
    }

    /// Number of fetches attempted so far.
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}
impl Default for MockFetcher {
    fn default() -> Self {
        let ids: [&str; 0] = [];
        Self::with_videos(ids)
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch(&self, id: &VideoId, encoding: Encoding) -> Result<Payload> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.failing.read().await.contains(id) {
            exn::bail!(ErrorKind::Status(503));
        }
        self.videos
            .get(&(id.clone(), encoding))
            .cloned()
            .ok_or_raise(|| ErrorKind::NotFound(resource_path(id, encoding).into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counts_every_request() {
        let fetcher = MockFetcher::with_videos(["video1"]);
        let id: VideoId = "video1".parse().unwrap();
        fetcher.fetch(&id, Encoding::Webm).await.unwrap();
        fetcher.fetch(&"video9".parse().unwrap(), Encoding::Mp4).await.unwrap_err();
        fetcher.fail(id.clone()).await;
        let err = fetcher.fetch(&id, Encoding::Mp4).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::Status(503)));
        assert_eq!(fetcher.requests(), 3);
    }
}
