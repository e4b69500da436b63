use crate::Loader;
use crate::error::Result;
use async_stream::stream;
use futures::future::BoxFuture;
use futures::stream::FuturesUnordered;
use futures::{FutureExt, Stream, StreamExt};
use reel_media::VideoId;
use reel_render::Player;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::Instant;

/// Where a rendered video came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Origin {
    Cache,
    Network,
}

/// Result of writing a network-loaded video to the local store.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Persist {
    Stored,
    /// Another load stored the same video first. Not an error.
    AlreadyPresent,
    /// Logged; the video is simply fetched again on the next load.
    Failed,
}

/// A video that made it onto the page.
#[derive(Clone, Debug)]
pub struct Loaded {
    pub id: VideoId,
    pub origin: Origin,
    pub player: Arc<Player>,
}

/// Progress events emitted by [`Loader::load`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started) exactly once.
/// 2. [`Queued`](Self::Queued) exactly once, with the number of distinct
///    identifiers.
/// 3. [`Rendered`](Self::Rendered) and [`Persisted`](Self::Persisted)
///    interleaved, in whatever order the work completes. `Persisted` follows
///    the `Rendered` of the same video and only occurs for videos loaded from
///    the network.
/// 4. [`TrackingAttached`](Self::TrackingAttached) once, only with a settle
///    delay configured. It is emitted when the delay has elapsed since
///    `Started`, so it may fall among the events of step 3; slow videos do
///    not hold it back. Players rendered after it are tracked immediately.
/// 5. [`Complete`](Self::Complete) exactly once.
///
/// A video that fails yields an `Err` item in place of its `Rendered` event;
/// the stream carries on with the others.
#[derive(Clone, Debug)]
pub enum LoadEvent {
    Started,
    Queued(usize),
    Rendered(Loaded),
    Persisted { id: VideoId, outcome: Persist },
    TrackingAttached(usize),
    Complete,
}

enum Step {
    Resolved(crate::Resolved),
    Persisted(VideoId, Persist),
    Settled,
}

impl Loader {
    /// Stream [`LoadEvent`]s while loading every identifier concurrently.
    ///
    /// Repeated identifiers are loaded once. No identifier waits on another:
    /// a slow or failing video never holds up the rest.
    pub fn load(&self, ids: impl IntoIterator<Item = VideoId>) -> impl Stream<Item = Result<LoadEvent>> + '_ {
        self.load_distinct(distinct(ids))
    }

    fn load_distinct<'a>(&'a self, ids: Vec<VideoId>) -> impl Stream<Item = Result<LoadEvent>> + 'a {
        // `rustfmt` does not format macros that use braces. Wrap in parentheses!
        stream!({
            let started = Instant::now();
            yield Ok(LoadEvent::Started);
            yield Ok(LoadEvent::Queued(ids.len()));

            let mut pending: FuturesUnordered<BoxFuture<'a, Step>> =
                ids.into_iter().map(|id| self.resolve(id).map(Step::Resolved).boxed()).collect();
            if let Some(delay) = self.settle_delay {
                pending.push(tokio::time::sleep_until(started + delay).map(|()| Step::Settled).boxed());
            }
            while let Some(step) = pending.next().await {
                match step {
                    Step::Resolved((Ok(loaded), fetched)) => {
                        if let Some(record) = fetched {
                            let id = record.id.clone();
                            pending.push(self.persist(record).map(move |outcome| Step::Persisted(id, outcome)).boxed());
                        }
                        yield Ok(LoadEvent::Rendered(loaded));
                    },
                    Step::Resolved((Err(err), _)) => {
                        tracing::warn!(error = ?err, "video skipped");
                        yield Err(err);
                    },
                    Step::Persisted(id, outcome) => yield Ok(LoadEvent::Persisted { id, outcome }),
                    Step::Settled => yield Ok(LoadEvent::TrackingAttached(self.renderer.attach_tracking().await)),
                }
            }
            yield Ok(LoadEvent::Complete);
        })
    }
}

/// First occurrence of each identifier, in request order.
fn distinct(ids: impl IntoIterator<Item = VideoId>) -> Vec<VideoId> {
    let mut seen = HashSet::new();
    ids.into_iter()
        .filter(|id| {
            let first = seen.insert(id.clone());
            if !first {
                tracing::debug!(video = %id, "ignoring repeated identifier");
            }
            first
        })
        .collect()
}
