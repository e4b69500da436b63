//! Wiring: turns a [`Config`] into open stores, a video source and loaders.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use reel_cache::error::ErrorKind as CacheErrorKind;
use reel_cache::{Database, LocalStorage, Positions, VideoStore};
use reel_config::{Config, PageOrder, SourceConfig};
use reel_fetch::FetcherHandle;
use reel_fetch::fetcher::{DirectoryFetcher, HttpFetcher};
use reel_loader::Loader;
use reel_render::{Attachment, Page, Renderer};
use std::sync::Arc;
use tracing::instrument;

pub struct App {
    pub config: Config,
    pub db: Database,
    pub positions: Positions,
    fetcher: FetcherHandle,
}

impl App {
    /// Open both stores and the video source. Any failure here is fatal:
    /// without the video database nothing is rendered at all.
    #[instrument(skip_all, fields(store = %config.store.path.display(), version = config.store.version))]
    pub async fn open(config: Config) -> Result<Self> {
        let db = match Database::open(&config.store.path, config.store.version).await {
            Ok(db) => db,
            Err(err) => {
                match &*err {
                    CacheErrorKind::Unavailable(path) => {
                        tracing::error!(path = %path.display(), "local store unavailable; nothing will be rendered")
                    },
                    CacheErrorKind::VersionConflict { requested, current } => {
                        tracing::error!(requested, current, "local store holds a newer schema; refusing to downgrade")
                    },
                    CacheErrorKind::UnknownVersion(version) => {
                        tracing::error!(version, "no schema is known for the requested store version")
                    },
                    CacheErrorKind::Migration(version) => {
                        tracing::error!(version, "local store schema setup failed")
                    },
                    other => tracing::error!(error = %other, "local store could not be opened"),
                }
                return Err(err).or_raise(|| ErrorKind::Store);
            },
        };
        let storage = LocalStorage::connect(&config.store.local_storage).await.or_raise(|| ErrorKind::Store)?;
        let fetcher: FetcherHandle = match &config.source {
            SourceConfig::Http { base_url } => Arc::new(HttpFetcher::new("http", base_url).or_raise(|| ErrorKind::Source)?),
            SourceConfig::Directory { root } => Arc::new(DirectoryFetcher::new("directory", root)),
        };
        tracing::debug!(source = fetcher.name(), "stores open");
        Ok(Self { config, db, positions: Positions::from(storage), fetcher })
    }

    pub fn store(&self) -> VideoStore {
        VideoStore::from(&self.db)
    }

    fn page(&self) -> Result<Page> {
        let page = Page::new(&self.config.page.title);
        Ok(match self.config.page.order {
            PageOrder::Completion => page,
            PageOrder::Declared => page.with_declared_order(self.config.video_ids().or_raise(|| ErrorKind::Config)?),
        })
    }

    /// A loader over a fresh page. With a settle delay configured, tracking
    /// is attached by the loader after the delay instead of per player.
    pub fn loader(&self) -> Result<Loader> {
        let delay = self.config.tracking.settle_delay();
        let attachment = if delay.is_some() { Attachment::Deferred } else { Attachment::Immediate };
        Ok(self.loader_with(attachment)?.with_settle_delay(delay))
    }

    /// A loader whose players are tracked as soon as they render.
    pub fn interactive_loader(&self) -> Result<Loader> {
        self.loader_with(Attachment::Immediate)
    }

    fn loader_with(&self, attachment: Attachment) -> Result<Loader> {
        let renderer = Renderer::new(Arc::new(self.page()?), self.positions.clone()).with_attachment(attachment);
        Ok(Loader::new(self.store(), self.fetcher.clone(), renderer))
    }

    pub async fn close(&self) {
        self.db.close().await;
        self.positions.storage().close().await;
    }
}
