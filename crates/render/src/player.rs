//! Video players and the observers notified when playback starts or stops.

use crate::blob::ObjectUrl;
use async_trait::async_trait;
use reel_media::{Encoding, VideoId};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Receives playback transitions of a [`Player`].
///
/// Observers are called after the transition took effect and without any
/// player lock held, so they are free to query the player.
#[async_trait]
pub trait PlaybackObserver: Send + Sync {
    async fn on_play(&self, player: &Player);
    async fn on_pause(&self, player: &Player);
}

pub type ObserverHandle = Arc<dyn PlaybackObserver + Send + Sync>;

/// One offered source of a player.
#[derive(Clone, Debug)]
pub struct Source {
    pub url: ObjectUrl,
    pub encoding: Encoding,
}

impl Source {
    /// Value of the `type` attribute, e.g. `video/webm`.
    pub fn mime(&self) -> &'static str {
        self.encoding.mime()
    }
}

#[derive(Debug)]
struct State {
    current_time: f64,
    paused: bool,
}

/// A playable video with its sources, playback state and observers.
///
/// A new player is paused at offset 0.
pub struct Player {
    id: VideoId,
    sources: Vec<Source>,
    state: Mutex<State>,
    observers: Mutex<Vec<ObserverHandle>>,
}

impl std::fmt::Debug for Player {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Player").field("id", &self.id).field("sources", &self.sources).finish_non_exhaustive()
    }
}

impl Player {
    pub fn new(id: VideoId, sources: Vec<Source>) -> Self {
        Self {
            id,
            sources,
            state: Mutex::new(State { current_time: 0.0, paused: true }),
            observers: Mutex::default(),
        }
    }

    pub fn id(&self) -> &VideoId {
        &self.id
    }

    /// Sources in the order they are offered.
    pub fn sources(&self) -> &[Source] {
        &self.sources
    }

    pub async fn current_time(&self) -> f64 {
        self.state.lock().await.current_time
    }

    pub async fn is_paused(&self) -> bool {
        self.state.lock().await.paused
    }

    /// Move the playhead. Negative offsets clamp to 0; NaN and infinities are
    /// ignored.
    pub async fn seek(&self, offset: f64) {
        if !offset.is_finite() {
            tracing::debug!(video = %self.id, offset, "ignoring seek to non-finite offset");
            return;
        }
        self.state.lock().await.current_time = offset.max(0.0);
    }

    /// Let `seconds` of playback elapse. Does nothing while paused.
    pub async fn advance(&self, seconds: f64) {
        if !seconds.is_finite() || seconds <= 0.0 {
            return;
        }
        let mut state = self.state.lock().await;
        if !state.paused {
            state.current_time += seconds;
        }
    }

    /// Start playback. Observers are only notified when the player was
    /// actually paused; returns whether that was the case.
    pub async fn play(&self) -> bool {
        if !self.transition(false).await {
            return false;
        }
        for observer in self.observers().await {
            observer.on_play(self).await;
        }
        true
    }

    /// Stop playback. Observers are only notified when the player was
    /// actually playing; returns whether that was the case.
    pub async fn pause(&self) -> bool {
        if !self.transition(true).await {
            return false;
        }
        for observer in self.observers().await {
            observer.on_pause(self).await;
        }
        true
    }

    /// Install an observer. Attaching the same observer twice has no effect;
    /// returns `false` in that case.
    pub async fn attach(&self, observer: ObserverHandle) -> bool {
        let mut observers = self.observers.lock().await;
        if observers.iter().any(|existing| std::ptr::addr_eq(Arc::as_ptr(existing), Arc::as_ptr(&observer))) {
            return false;
        }
        observers.push(observer);
        true
    }

    pub async fn observer_count(&self) -> usize {
        self.observers.lock().await.len()
    }

    async fn transition(&self, paused: bool) -> bool {
        let mut state = self.state.lock().await;
        let changed = state.paused != paused;
        state.paused = paused;
        changed
    }

    // Snapshot, so no lock is held while observers run.
    async fn observers(&self) -> Vec<ObserverHandle> {
        self.observers.lock().await.clone()
    }
}
