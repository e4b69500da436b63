//! Resource path convention.

use reel_media::{Encoding, VideoId};

/// Folder, relative to the source root, that holds every video file.
pub(crate) const VIDEO_FOLDER: &str = "videos";

/// Deterministic relative path of one encoding of a video.
///
/// [`VideoId`] only admits path-safe characters, so the result never escapes
/// the source root.
///
/// ```
/// use reel_fetch::resource_path;
/// use reel_media::Encoding;
///
/// let id = "video1".parse().unwrap();
/// assert_eq!(resource_path(&id, Encoding::Mp4), "videos/video1.mp4");
/// assert_eq!(resource_path(&id, Encoding::Webm), "videos/video1.webm");
/// ```
pub fn resource_path(id: &VideoId, encoding: Encoding) -> String {
    format!("{VIDEO_FOLDER}/{id}.{}", encoding.extension())
}
