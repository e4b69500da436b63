use bytes::Bytes;
use derive_more::Display;

/// One of the two binary formats offered for every video.
///
/// The player is offered both and picks whichever it supports, so the order
/// of [`Encoding::ALL`] is also the order sources are offered in.
#[derive(Clone, Copy, Debug, Display, Eq, Hash, PartialEq)]
pub enum Encoding {
    #[display("mp4")]
    Mp4,
    #[display("webm")]
    Webm,
}

impl Encoding {
    pub const ALL: [Encoding; 2] = [Encoding::Mp4, Encoding::Webm];

    /// File extension used by the resource path convention.
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Mp4 => "mp4",
            Self::Webm => "webm",
        }
    }

    /// MIME type advertised on the player's `<source>` element.
    pub fn mime(&self) -> &'static str {
        match self {
            Self::Mp4 => "video/mp4",
            Self::Webm => "video/webm",
        }
    }
}

/// Binary content of one encoding of a video. Immutable once produced.
///
/// Backed by [`Bytes`], so handing the same payload to the renderer and to the
/// store does not copy the video.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Payload(Bytes);

impl Payload {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn bytes(&self) -> &Bytes {
        &self.0
    }

    /// BLAKE3 hex digest of the content.
    ///
    /// Only used to make stored records inspectable; nothing verifies payloads
    /// against it.
    pub fn digest(&self) -> String {
        blake3::hash(&self.0).to_hex().to_string()
    }
}

impl AsRef<[u8]> for Payload {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Payload {
    fn from(data: Vec<u8>) -> Self {
        Self(Bytes::from(data))
    }
}

impl From<Bytes> for Payload {
    fn from(data: Bytes) -> Self {
        Self(data)
    }
}

impl From<&'static [u8]> for Payload {
    fn from(data: &'static [u8]) -> Self {
        Self(Bytes::from_static(data))
    }
}
