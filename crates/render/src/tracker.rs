//! Remembers where each video was paused.

use crate::page::{Page, StatusRegion};
use crate::player::{PlaybackObserver, Player};
use async_trait::async_trait;
use reel_cache::Positions;
use reel_media::{PlaybackPosition, VideoId};
use std::sync::Arc;
use tracing::instrument;

/// Observer that persists the offset on every pause and mirrors playback
/// state into the player's status region.
///
/// The status region is looked up on the page by element id for every
/// event; if it is missing the status update is skipped.
pub struct PositionTracker {
    page: Arc<Page>,
    positions: Positions,
}

impl PositionTracker {
    pub fn new(page: Arc<Page>, positions: Positions) -> Self {
        Self { page, positions }
    }

    /// Install this tracker on every given player, returning how many
    /// players did not have it yet.
    pub async fn attach(self: &Arc<Self>, players: &[Arc<Player>]) -> usize {
        let mut attached = 0;
        for player in players {
            if player.attach(self.clone()).await {
                attached += 1;
            }
        }
        attached
    }

    async fn show(&self, id: &VideoId, text: String) {
        match self.page.find_status(&StatusRegion::element_id_for(id)).await {
            Some(status) => status.set_text(text).await,
            None => tracing::trace!(video = %id, "no status region, skipping update"),
        }
    }
}

#[async_trait]
impl PlaybackObserver for PositionTracker {
    #[instrument(skip_all, fields(video = %player.id()))]
    async fn on_play(&self, player: &Player) {
        self.show(player.id(), "playing...".to_string()).await;
    }

    #[instrument(skip_all, fields(video = %player.id()))]
    async fn on_pause(&self, player: &Player) {
        let offset = player.current_time().await;
        match PlaybackPosition::new(player.id().clone(), offset) {
            Ok(position) => {
                if let Err(err) = self.positions.set(&position).await {
                    tracing::warn!(error = ?err, offset, "failed to save playback position");
                }
            },
            Err(err) => tracing::warn!(error = ?err, offset, "refusing to save playback position"),
        }
        self.show(player.id(), format!("Paused at: {offset}")).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::page::Article;
    use reel_cache::LocalStorage;

    async fn setup() -> (Arc<Page>, Positions, Arc<PositionTracker>) {
        let page = Arc::new(Page::new("t"));
        let positions = Positions::from(LocalStorage::connect_in_memory().await.unwrap());
        let tracker = Arc::new(PositionTracker::new(page.clone(), positions.clone()));
        (page, positions, tracker)
    }

    #[tokio::test]
    async fn test_pause_persists_and_updates_status() {
        let (page, positions, tracker) = setup().await;
        let player = Arc::new(Player::new("video1".parse().unwrap(), Vec::new()));
        page.mount(Article::new(player.clone())).await.unwrap();
        assert_eq!(tracker.attach(&[player.clone()]).await, 1);
        assert_eq!(tracker.attach(&[player.clone()]).await, 0);

        player.play().await;
        let status = page.find_status("video1-status").await.unwrap();
        assert_eq!(status.text().await, "playing...");
        assert_eq!(positions.get(player.id()).await.unwrap(), None);

        player.advance(12.5).await;
        player.pause().await;
        assert_eq!(status.text().await, "Paused at: 12.5");
        assert_eq!(positions.get(player.id()).await.unwrap(), Some(12.5));

        player.seek(3.0).await;
        player.play().await;
        player.pause().await;
        assert_eq!(positions.get(player.id()).await.unwrap(), Some(3.0));
        assert_eq!(status.text().await, "Paused at: 3");
    }

    #[tokio::test]
    async fn test_missing_status_region_is_skipped() {
        let (_page, positions, tracker) = setup().await;
        // Never mounted, so the page has no status region for it.
        let player = Arc::new(Player::new("video2".parse().unwrap(), Vec::new()));
        tracker.attach(&[player.clone()]).await;
        player.seek(7.0).await;
        player.play().await;
        player.pause().await;
        assert_eq!(positions.get(player.id()).await.unwrap(), Some(7.0));
    }
}
