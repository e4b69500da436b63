//! Local directory video source.

use crate::error::{ErrorKind, Result};
use crate::{Fetcher, resource_path};
use async_trait::async_trait;
use exn::ResultExt;
use reel_media::{Encoding, Payload, VideoId};
use std::io::ErrorKind as IoErrorKind;
use std::path::PathBuf;
use tracing::instrument;

/// Reads videos from a directory laid out the same way as the published
/// site, i.e. `<root>/videos/<id>.<ext>`.
#[derive(Debug, Clone)]
pub struct DirectoryFetcher {
    name: String,
    root: PathBuf,
}

impl DirectoryFetcher {
    pub fn new(name: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self { name: name.into(), root: root.into() }
    }
}

#[async_trait]
impl Fetcher for DirectoryFetcher {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self), fields(source = %self.name, video = %id, %encoding))]
    async fn fetch(&self, id: &VideoId, encoding: Encoding) -> Result<Payload> {
        let path = self.root.join(resource_path(id, encoding));
        match tokio::fs::read(&path).await {
            Ok(data) => Ok(Payload::from(data)),
            Err(e) if e.kind() == IoErrorKind::NotFound => exn::bail!(ErrorKind::NotFound(path)),
            Err(e) => Err(e).or_raise(|| ErrorKind::Io),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_reads_conventional_path() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("videos")).unwrap();
        std::fs::write(dir.path().join("videos/video2.webm"), b"webm bytes").unwrap();

        let fetcher = DirectoryFetcher::new("test", dir.path());
        let payload = fetcher.fetch(&"video2".parse().unwrap(), Encoding::Webm).await.unwrap();
        assert_eq!(payload.as_ref(), b"webm bytes");
    }

    #[tokio::test]
    async fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let fetcher = DirectoryFetcher::new("test", dir.path());
        let err = fetcher.fetch(&"video2".parse().unwrap(), Encoding::Mp4).await.unwrap_err();
        match &*err {
            ErrorKind::NotFound(path) => assert!(path.ends_with("videos/video2.mp4")),
            other => panic!("unexpected error: {other}"),
        }
    }
}
