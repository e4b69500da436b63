use crate::blob::BlobRegistry;
use crate::error::Result;
use crate::page::{Article, Page};
use crate::player::{Player, Source};
use crate::tracker::PositionTracker;
use reel_cache::Positions;
use reel_media::{Encoding, Payload, VideoId};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::instrument;

/// When the position tracker gets installed on a freshly rendered player.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Attachment {
    /// Right after the player is mounted.
    #[default]
    Immediate,
    /// Only once [`Renderer::attach_tracking()`] has been called. Players
    /// rendered after that are tracked right away.
    Deferred,
}

/// Turns a pair of payloads into a mounted, resumable player.
pub struct Renderer {
    page: Arc<Page>,
    blobs: Arc<BlobRegistry>,
    positions: Positions,
    tracker: Arc<PositionTracker>,
    attachment: Attachment,
    tracking: AtomicBool,
}

impl Renderer {
    pub fn new(page: Arc<Page>, positions: Positions) -> Self {
        let tracker = Arc::new(PositionTracker::new(page.clone(), positions.clone()));
        Self {
            page,
            blobs: Arc::default(),
            positions,
            tracker,
            attachment: Attachment::default(),
            tracking: AtomicBool::new(false),
        }
    }

    pub fn with_attachment(mut self, attachment: Attachment) -> Self {
        self.attachment = attachment;
        self
    }

    pub fn page(&self) -> &Arc<Page> {
        &self.page
    }

    pub fn blobs(&self) -> &Arc<BlobRegistry> {
        &self.blobs
    }

    /// Mount a player for `id` offering both payloads, then resume it from
    /// the stored position if there is one.
    ///
    /// Fails with [`DuplicatePlayer`](crate::error::ErrorKind::DuplicatePlayer)
    /// if the page already shows this video; nothing is mounted then.
    #[instrument(skip(self, mp4, webm), fields(video = %id))]
    pub async fn render(&self, id: &VideoId, mp4: Payload, webm: Payload) -> Result<Arc<Player>> {
        let mut sources = Vec::with_capacity(Encoding::ALL.len());
        for (encoding, payload) in [(Encoding::Mp4, mp4), (Encoding::Webm, webm)] {
            let url = self.blobs.create_object_url(encoding, payload).await;
            sources.push(Source { url, encoding });
        }
        let player = Arc::new(Player::new(id.clone(), sources));
        let article = Article::new(player.clone());
        let status = article.status.clone();
        if let Err(err) = self.page.mount(article).await {
            for source in player.sources() {
                self.blobs.revoke(&source.url).await;
            }
            return Err(err);
        }

        match self.positions.get(id).await {
            Ok(Some(offset)) => {
                player.seek(offset).await;
                status.set_text(format!("resuming at: {offset}")).await;
                tracing::debug!(offset, "resuming from stored position");
            },
            Ok(None) => {},
            Err(err) => tracing::warn!(error = ?err, "could not read stored position; starting from the beginning"),
        }

        if self.attachment == Attachment::Immediate || self.tracking.load(Ordering::SeqCst) {
            self.tracker.attach(std::slice::from_ref(&player)).await;
        }
        Ok(player)
    }

    /// Install the position tracker on every player currently on the page,
    /// returning how many players are now tracked. From here on every newly
    /// rendered player is tracked as soon as it is mounted.
    pub async fn attach_tracking(&self) -> usize {
        // Set before listing, so a player mounted in between is caught by one
        // side or the other. Attaching twice is a no-op.
        self.tracking.store(true, Ordering::SeqCst);
        let players = self.page.players().await;
        let newly = self.tracker.attach(&players).await;
        tracing::debug!(players = players.len(), newly, "position tracking attached");
        players.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use reel_cache::LocalStorage;
    use reel_media::PlaybackPosition;

    async fn renderer() -> Renderer {
        let positions = Positions::from(LocalStorage::connect_in_memory().await.unwrap());
        Renderer::new(Arc::new(Page::new("t")), positions)
    }

    fn payload(s: &'static str) -> Payload {
        Payload::from(s.as_bytes())
    }

    #[tokio::test]
    async fn test_render_mounts_player_with_both_sources() {
        let renderer = renderer().await;
        let id: VideoId = "video1".parse().unwrap();
        let player = renderer.render(&id, payload("mp4"), payload("webm")).await.unwrap();

        let encodings: Vec<_> = player.sources().iter().map(|s| s.encoding).collect();
        assert_eq!(encodings, Encoding::ALL);
        let webm = renderer.blobs().resolve(&player.sources()[1].url).await.unwrap();
        assert_eq!(webm.payload.as_ref(), b"webm");
        assert_eq!(player.current_time().await, 0.0);
        assert!(player.is_paused().await);
        assert_eq!(renderer.page().find_status("video1-status").await.unwrap().text().await, "");
        assert_eq!(player.observer_count().await, 1);
    }

    #[tokio::test]
    async fn test_render_resumes_stored_position() {
        let renderer = renderer().await;
        let id: VideoId = "video1".parse().unwrap();
        renderer.positions.set(&PlaybackPosition::new(id.clone(), 12.5).unwrap()).await.unwrap();

        let player = renderer.render(&id, payload("a"), payload("b")).await.unwrap();
        assert_eq!(player.current_time().await, 12.5);
        let status = renderer.page().find_status("video1-status").await.unwrap();
        assert_eq!(status.text().await, "resuming at: 12.5");
    }

    #[tokio::test]
    async fn test_duplicate_render_leaves_no_blobs_behind() {
        let renderer = renderer().await;
        let id: VideoId = "video1".parse().unwrap();
        renderer.render(&id, payload("a"), payload("b")).await.unwrap();
        let err = renderer.render(&id, payload("a"), payload("b")).await.unwrap_err();
        assert!(matches!(&*err, ErrorKind::DuplicatePlayer(_)));
        assert_eq!(renderer.blobs().len().await, 2);
        assert_eq!(renderer.page().len().await, 1);
    }

    #[tokio::test]
    async fn test_deferred_attachment() {
        let renderer = renderer().await.with_attachment(Attachment::Deferred);
        let first = renderer.render(&"video1".parse().unwrap(), payload("a"), payload("b")).await.unwrap();
        renderer.render(&"video2".parse().unwrap(), payload("c"), payload("d")).await.unwrap();
        assert_eq!(first.observer_count().await, 0);

        // Pausing before attachment is not recorded.
        first.play().await;
        first.advance(4.0).await;
        first.pause().await;
        assert_eq!(renderer.positions.get(first.id()).await.unwrap(), None);

        assert_eq!(renderer.attach_tracking().await, 2);
        assert_eq!(renderer.attach_tracking().await, 2);
        assert_eq!(first.observer_count().await, 1);
        first.play().await;
        first.pause().await;
        assert_eq!(renderer.positions.get(first.id()).await.unwrap(), Some(4.0));
    }

    #[tokio::test]
    async fn test_players_rendered_after_attachment_are_tracked() {
        let renderer = renderer().await.with_attachment(Attachment::Deferred);
        assert_eq!(renderer.attach_tracking().await, 0);
        let late = renderer.render(&"video3".parse().unwrap(), payload("e"), payload("f")).await.unwrap();
        assert_eq!(late.observer_count().await, 1);

        late.play().await;
        late.advance(2.5).await;
        late.pause().await;
        assert_eq!(renderer.positions.get(late.id()).await.unwrap(), Some(2.5));
        let status = renderer.page().find_status("video3-status").await.unwrap();
        assert_eq!(status.text().await, "Paused at: 2.5");
    }
}
