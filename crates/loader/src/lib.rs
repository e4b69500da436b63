//! Cache-aside loading.
//!
//! For each requested video the [`Loader`] consults the local store first and
//! renders straight from it on a hit. On a miss it fetches both encodings,
//! renders them, and only then writes them to the store, so the store is
//! populated lazily by the very load that needed it.

pub mod error;
mod stream;

pub use crate::stream::{LoadEvent, Loaded, Origin, Persist};
use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use reel_cache::VideoStore;
use reel_cache::error::ErrorKind as CacheErrorKind;
use reel_fetch::FetcherHandle;
use reel_media::{CacheRecord, Encoding, VideoId};
use reel_render::Renderer;
use std::time::Duration;
use tracing::instrument;

pub struct Loader {
    store: VideoStore,
    fetcher: FetcherHandle,
    renderer: Renderer,
    settle_delay: Option<Duration>,
}

/// Outcome of getting one video onto the page, plus the record still to be
/// persisted when it came from the network.
type Resolved = (Result<Loaded>, Option<CacheRecord>);

impl Loader {
    /// Requires an open [`VideoStore`]: a loader cannot exist before the
    /// store is ready.
    pub fn new(store: VideoStore, fetcher: FetcherHandle, renderer: Renderer) -> Self {
        Self { store, fetcher, renderer, settle_delay: None }
    }

    /// Wait until `delay` after the start of a load before attaching position
    /// tracking to every mounted player. `None` (the default) leaves
    /// attachment entirely to the [`Renderer`].
    pub fn with_settle_delay(mut self, delay: impl Into<Option<Duration>>) -> Self {
        self.settle_delay = delay.into().filter(|d| !d.is_zero());
        self
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    pub fn store(&self) -> &VideoStore {
        &self.store
    }

    /// Load a single video, including persisting it when it came from the
    /// network. A persist failure is logged, never returned.
    pub async fn load_one(&self, id: &VideoId) -> Result<Loaded> {
        let (loaded, fetched) = self.resolve(id.clone()).await;
        if let Some(record) = fetched {
            self.persist(record).await;
        }
        loaded
    }

    #[instrument(skip(self), fields(video = %id))]
    async fn resolve(&self, id: VideoId) -> Resolved {
        match self.store.get(&id).await {
            Ok(Some(record)) => {
                tracing::debug!("cache hit");
                let rendered = self.renderer.render(&id, record.mp4, record.webm).await;
                let loaded = rendered
                    .map(|player| Loaded { id: id.clone(), origin: Origin::Cache, player })
                    .or_raise(|| ErrorKind::Render(id));
                (loaded, None)
            },
            Ok(None) => {
                tracing::debug!("cache miss");
                self.fetch_and_render(id).await
            },
            Err(err) => {
                tracing::warn!(error = ?err, "store read failed; loading from the network instead");
                self.fetch_and_render(id).await
            },
        }
    }

    async fn fetch_and_render(&self, id: VideoId) -> Resolved {
        let fetched = futures::try_join!(
            self.fetcher.fetch(&id, Encoding::Mp4),
            self.fetcher.fetch(&id, Encoding::Webm),
        );
        let (mp4, webm) = match fetched.or_raise(|| ErrorKind::Fetch(id.clone())) {
            Ok(payloads) => payloads,
            Err(err) => return (Err(err), None),
        };
        tracing::debug!(source = self.fetcher.name(), mp4 = mp4.len(), webm = webm.len(), "fetched from network");
        // Payloads are reference counted; the record shares them with the player.
        let record = CacheRecord::new(id.clone(), mp4.clone(), webm.clone());
        match self.renderer.render(&id, mp4, webm).await {
            Ok(player) => (Ok(Loaded { id, origin: Origin::Network, player }), Some(record)),
            Err(err) => (Err(err).or_raise(|| ErrorKind::Render(id)), None),
        }
    }

    #[instrument(skip_all, fields(video = %record.id))]
    async fn persist(&self, record: CacheRecord) -> Persist {
        match self.store.put(&record).await {
            Ok(()) => {
                tracing::debug!("stored in local cache");
                Persist::Stored
            },
            Err(err) if matches!(&*err, CacheErrorKind::AlreadyExists(_)) => {
                tracing::debug!("already cached by a concurrent load");
                Persist::AlreadyPresent
            },
            Err(err) => {
                tracing::warn!(error = ?err, "failed to store video; it will be fetched again next time");
                Persist::Failed
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::StreamExt;
    use reel_cache::{Database, LocalStorage, Positions, SCHEMA_VERSION};
    use reel_fetch::fetcher::MockFetcher;
    use reel_render::{Attachment, Page};
    use std::sync::Arc;

    const VIDEOS: [&str; 4] = ["video1", "video2", "video3", "video4"];

    struct Harness {
        db: Database,
        positions: Positions,
        fetcher: Arc<MockFetcher>,
    }

    impl Harness {
        async fn new() -> Self {
            Self {
                db: Database::open_in_memory(SCHEMA_VERSION).await.unwrap(),
                positions: Positions::from(LocalStorage::connect_in_memory().await.unwrap()),
                fetcher: Arc::new(MockFetcher::with_videos(VIDEOS)),
            }
        }

        /// A fresh page over the same stores, like reloading the browser tab.
        fn loader(&self, attachment: Attachment) -> Loader {
            self.loader_with(self.fetcher.clone(), attachment)
        }

        fn loader_with(&self, fetcher: Arc<MockFetcher>, attachment: Attachment) -> Loader {
            let renderer = Renderer::new(Arc::new(Page::new("t")), self.positions.clone()).with_attachment(attachment);
            Loader::new(VideoStore::from(&self.db), fetcher, renderer)
        }
    }

    fn ids(names: &[&str]) -> Vec<VideoId> {
        names.iter().map(|n| n.parse().unwrap()).collect()
    }

    async fn run(loader: &Loader, names: &[&str]) -> Vec<Result<LoadEvent>> {
        loader.load(ids(names)).collect().await
    }

    fn rendered(events: &[Result<LoadEvent>]) -> Vec<(String, Origin)> {
        let mut out: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                Ok(LoadEvent::Rendered(loaded)) => Some((loaded.id.to_string(), loaded.origin)),
                _ => None,
            })
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    fn persisted(events: &[Result<LoadEvent>]) -> Vec<(String, Persist)> {
        let mut out: Vec<_> = events
            .iter()
            .filter_map(|e| match e {
                Ok(LoadEvent::Persisted { id, outcome }) => Some((id.to_string(), *outcome)),
                _ => None,
            })
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    #[tokio::test]
    async fn test_cold_then_warm_load() {
        let harness = Harness::new().await;
        let events = run(&harness.loader(Attachment::Immediate), &VIDEOS).await;
        assert!(events.iter().all(Result::is_ok));
        assert_eq!(rendered(&events), VIDEOS.map(|n| (n.to_string(), Origin::Network)));
        assert_eq!(persisted(&events), VIDEOS.map(|n| (n.to_string(), Persist::Stored)));
        assert_eq!(harness.fetcher.requests(), 8);

        let events = run(&harness.loader(Attachment::Immediate), &VIDEOS).await;
        assert_eq!(rendered(&events), VIDEOS.map(|n| (n.to_string(), Origin::Cache)));
        assert!(persisted(&events).is_empty());
        assert_eq!(harness.fetcher.requests(), 8, "a warm cache must not reach the network");
    }

    #[tokio::test]
    async fn test_event_framing() {
        let harness = Harness::new().await;
        let events = run(&harness.loader(Attachment::Immediate), &["video1", "video2"]).await;
        assert!(matches!(events.first(), Some(Ok(LoadEvent::Started))));
        assert!(matches!(events.get(1), Some(Ok(LoadEvent::Queued(2)))));
        assert!(matches!(events.last(), Some(Ok(LoadEvent::Complete))));
        assert!(!events.iter().any(|e| matches!(e, Ok(LoadEvent::TrackingAttached(_)))));
        // Each video's persist follows its render.
        for name in ["video1", "video2"] {
            let position = |persist: bool| {
                events.iter().position(|e| match e {
                    Ok(LoadEvent::Rendered(loaded)) => !persist && loaded.id.as_str() == name,
                    Ok(LoadEvent::Persisted { id, .. }) => persist && id.as_str() == name,
                    _ => false,
                })
            };
            assert!(position(false).unwrap() < position(true).unwrap());
        }
    }

    #[tokio::test]
    async fn test_failed_fetch_is_isolated() {
        let harness = Harness::new().await;
        harness.fetcher.fail("video2".parse().unwrap()).await;
        let loader = harness.loader(Attachment::Immediate);
        let events = run(&loader, &VIDEOS).await;

        let failures: Vec<_> = events.iter().filter_map(|e| e.as_ref().err()).collect();
        assert_eq!(failures.len(), 1);
        assert!(matches!(&**failures[0], ErrorKind::Fetch(id) if id.as_str() == "video2"));
        assert_eq!(rendered(&events).len(), 3);
        assert!(matches!(events.last(), Some(Ok(LoadEvent::Complete))));
        assert_eq!(loader.renderer().page().len().await, 3);
        assert!(loader.store().get(&"video2".parse().unwrap()).await.unwrap().is_none());
        assert!(loader.store().get(&"video3".parse().unwrap()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_unknown_video_is_isolated() {
        let harness = Harness::new().await;
        let events = run(&harness.loader(Attachment::Immediate), &["video1", "missing"]).await;
        let failures: Vec<_> = events.iter().filter_map(|e| e.as_ref().err()).collect();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].video().as_str(), "missing");
        assert_eq!(rendered(&events), [("video1".to_string(), Origin::Network)]);
    }

    #[tokio::test]
    async fn test_repeated_identifiers_load_once() {
        let harness = Harness::new().await;
        let events = run(&harness.loader(Attachment::Immediate), &["video1", "video2", "video1"]).await;
        assert!(matches!(events.get(1), Some(Ok(LoadEvent::Queued(2)))));
        assert!(events.iter().all(Result::is_ok));
        assert_eq!(rendered(&events).len(), 2);
        assert_eq!(harness.fetcher.requests(), 4);
    }

    #[tokio::test]
    async fn test_pause_then_reload_resumes() {
        let harness = Harness::new().await;
        let loader = harness.loader(Attachment::Immediate);
        let loaded = loader.load_one(&"video1".parse().unwrap()).await.unwrap();
        assert_eq!(loaded.origin, Origin::Network);
        loaded.player.play().await;
        loaded.player.advance(12.5).await;
        loaded.player.pause().await;

        let loader = harness.loader(Attachment::Immediate);
        let loaded = loader.load_one(&"video1".parse().unwrap()).await.unwrap();
        assert_eq!(loaded.origin, Origin::Cache);
        assert_eq!(loaded.player.current_time().await, 12.5);
        let status = loader.renderer().page().find_status("video1-status").await.unwrap();
        assert_eq!(status.text().await, "resuming at: 12.5");
    }

    #[tokio::test]
    async fn test_settle_delay_attaches_tracking_before_complete() {
        let harness = Harness::new().await;
        let delay = Duration::from_millis(30);
        let loader = harness.loader(Attachment::Deferred).with_settle_delay(delay);
        let started = std::time::Instant::now();
        let events = run(&loader, &["video1", "video2"]).await;
        assert!(started.elapsed() >= delay);

        let n = events.len();
        assert!(matches!(events[n - 2], Ok(LoadEvent::TrackingAttached(2))));
        assert!(matches!(events[n - 1], Ok(LoadEvent::Complete)));
        for player in loader.renderer().page().players().await {
            assert_eq!(player.observer_count().await, 1);
        }
    }

    #[tokio::test]
    async fn test_settle_delay_does_not_wait_for_slow_videos() {
        let harness = Harness::new().await;
        let fetcher = Arc::new(MockFetcher::with_videos(VIDEOS).with_latency(Duration::from_millis(300)));
        let loader =
            harness.loader_with(fetcher, Attachment::Deferred).with_settle_delay(Duration::from_millis(20));
        let events = run(&loader, &["video1", "video2"]).await;

        let attached = events.iter().position(|e| matches!(e, Ok(LoadEvent::TrackingAttached(0)))).unwrap();
        let first_render = events.iter().position(|e| matches!(e, Ok(LoadEvent::Rendered(_)))).unwrap();
        assert!(attached < first_render, "tracking must not wait for the slowest video");
        assert!(matches!(events.last(), Some(Ok(LoadEvent::Complete))));
        // Rendered after the delay, so tracked as soon as they were mounted.
        let players = loader.renderer().page().players().await;
        assert_eq!(players.len(), 2);
        for player in players {
            assert_eq!(player.observer_count().await, 1);
        }
    }

    #[tokio::test]
    async fn test_racing_loads_store_video_once() {
        let harness = Harness::new().await;
        // Latency keeps both store reads ahead of either write.
        let fetcher = Arc::new(MockFetcher::with_videos(VIDEOS).with_latency(Duration::from_millis(50)));
        let first = harness.loader_with(fetcher.clone(), Attachment::Immediate);
        let second = harness.loader_with(fetcher.clone(), Attachment::Immediate);
        let (a, b) = futures::join!(run(&first, &["video1"]), run(&second, &["video1"]));

        assert!(a.iter().chain(&b).all(Result::is_ok));
        assert_eq!(rendered(&a), [("video1".to_string(), Origin::Network)]);
        assert_eq!(rendered(&b), [("video1".to_string(), Origin::Network)]);
        let outcomes: Vec<Persist> = persisted(&a).into_iter().chain(persisted(&b)).map(|(_, o)| o).collect();
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.contains(&Persist::Stored));
        assert!(outcomes.contains(&Persist::AlreadyPresent));
        assert_eq!(fetcher.requests(), 4);
        assert_eq!(first.store().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_settle_delay_is_disabled() {
        let harness = Harness::new().await;
        let loader = harness.loader(Attachment::Immediate).with_settle_delay(Duration::ZERO);
        let events = run(&loader, &["video1"]).await;
        assert!(!events.iter().any(|e| matches!(e, Ok(LoadEvent::TrackingAttached(_)))));
    }

    #[tokio::test]
    async fn test_unavailable_store_still_renders() {
        let harness = Harness::new().await;
        let loader = harness.loader(Attachment::Immediate);
        harness.db.close().await;
        let events = run(&loader, &["video1"]).await;
        assert_eq!(rendered(&events), [("video1".to_string(), Origin::Network)]);
        assert_eq!(persisted(&events), [("video1".to_string(), Persist::Failed)]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_videos_load_concurrently() {
        let harness = Harness::new().await;
        let latency = Duration::from_millis(100);
        let fetcher = Arc::new(MockFetcher::with_videos(VIDEOS).with_latency(latency));
        let loader = harness.loader_with(fetcher, Attachment::Immediate);

        let started = std::time::Instant::now();
        let events = run(&loader, &VIDEOS).await;
        assert_eq!(rendered(&events).len(), 4);
        // Eight sequential fetches would take at least 800ms.
        assert!(started.elapsed() < latency * 4, "took {:?}", started.elapsed());
    }
}
