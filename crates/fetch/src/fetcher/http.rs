//! HTTP(S) video source.

use crate::error::{ErrorKind, Result};
use crate::{Fetcher, resource_path};
use async_trait::async_trait;
use exn::ResultExt;
use reel_media::{Encoding, Payload, VideoId};
use reqwest::{Client, Url};
use tracing::instrument;

/// Fetches videos with plain `GET` requests relative to a base URL.
///
/// # Examples
///
/// ```no_run
/// use reel_fetch::fetcher::HttpFetcher;
///
/// # fn example() -> reel_fetch::error::Result<()> {
/// // Resolves to https://example.com/media/videos/<id>.<ext>
/// let fetcher = HttpFetcher::new("cdn", "https://example.com/media/")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    name: String,
    client: Client,
    base: Url,
}

impl HttpFetcher {
    /// Build a fetcher for the given base URL.
    ///
    /// A base without a trailing slash is treated as a directory anyway, so
    /// `https://host/media` and `https://host/media/` behave the same.
    pub fn new(name: impl Into<String>, base: impl AsRef<str>) -> Result<Self> {
        Self::with_client(name, Client::new(), base)
    }

    /// Same as [`new()`](Self::new) but reusing an existing client.
    pub fn with_client(name: impl Into<String>, client: Client, base: impl AsRef<str>) -> Result<Self> {
        let raw = base.as_ref();
        let mut base = Url::parse(raw).or_raise(|| ErrorKind::InvalidUrl(raw.to_string()))?;
        if base.cannot_be_a_base() || !matches!(base.scheme(), "http" | "https") {
            exn::bail!(ErrorKind::InvalidUrl(raw.to_string()));
        }
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        Ok(Self { name: name.into(), client, base })
    }

    fn url(&self, id: &VideoId, encoding: Encoding) -> Result<Url> {
        let relative = resource_path(id, encoding);
        self.base.join(&relative).or_raise(|| ErrorKind::InvalidUrl(relative.clone()))
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self), fields(source = %self.name, video = %id, %encoding))]
    async fn fetch(&self, id: &VideoId, encoding: Encoding) -> Result<Payload> {
        let url = self.url(id, encoding)?;
        tracing::debug!(%url, "requesting video");
        let response = self.client.get(url.clone()).send().await.or_raise(|| ErrorKind::Network(url.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            exn::bail!(ErrorKind::Status(status.as_u16()));
        }
        let body = response.bytes().await.or_raise(|| ErrorKind::Network(url.to_string()))?;
        tracing::debug!(bytes = body.len(), "video received");
        Ok(Payload::from(body))
    }
}
