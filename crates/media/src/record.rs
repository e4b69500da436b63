use crate::error::{ErrorKind, Result};
use crate::{Payload, VideoId};

/// Both encodings of one video, as kept by the local store.
///
/// Created once after the first successful fetch, read on every later load,
/// never updated or deleted.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CacheRecord {
    pub id: VideoId,
    pub mp4: Payload,
    pub webm: Payload,
}

impl CacheRecord {
    pub fn new(id: VideoId, mp4: impl Into<Payload>, webm: impl Into<Payload>) -> Self {
        Self { id, mp4: mp4.into(), webm: webm.into() }
    }
}

/// Where playback of a video was last paused.
#[derive(Clone, Debug, PartialEq)]
pub struct PlaybackPosition {
    pub id: VideoId,
    offset: f64,
}

impl PlaybackPosition {
    /// Offsets are seconds from the start; they must be finite and not negative.
    pub fn new(id: VideoId, offset: f64) -> Result<Self> {
        if !offset.is_finite() || offset < 0.0 {
            exn::bail!(ErrorKind::InvalidOffset(offset));
        }
        Ok(Self { id, offset })
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }
}
