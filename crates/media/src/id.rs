use crate::error::{Error, ErrorKind};
use derive_more::Display;
use std::str::FromStr;

/// Longest identifier accepted; it ends up inside filenames and SQLite keys.
const MAX_LENGTH: usize = 64;

/// Stable name for one logical video.
///
/// Used as the cache key, the playback-position key, the label shown above
/// the player and the root of the resource paths the fetcher requests. Only
/// ASCII alphanumerics, `-` and `_` are accepted so that every one of those
/// derived names is valid without escaping.
///
/// ```
/// use reel_media::VideoId;
///
/// let id: VideoId = "video1".parse().unwrap();
/// assert_eq!(id.as_str(), "video1");
/// assert!("../video1".parse::<VideoId>().is_err());
/// ```
#[derive(Clone, Debug, Display, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct VideoId(String);

impl VideoId {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn is_valid(s: &str) -> bool {
        !s.is_empty()
            && s.len() <= MAX_LENGTH
            && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
    }
}

impl FromStr for VideoId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if !Self::is_valid(s) {
            exn::bail!(ErrorKind::InvalidId(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for VideoId {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if !Self::is_valid(&value) {
            exn::bail!(ErrorKind::InvalidId(value));
        }
        Ok(Self(value))
    }
}

impl AsRef<str> for VideoId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("video1")]
    #[case("intro_clip")]
    #[case("a-b-c")]
    #[case("X")]
    fn test_accepts_valid_identifiers(#[case] input: &str) {
        let id: VideoId = input.parse().unwrap();
        assert_eq!(id.to_string(), input);
    }

    #[rstest]
    #[case("")]
    #[case("video 1")]
    #[case("../escape")]
    #[case("video1.mp4")]
    #[case("vidéo")]
    #[case("a/b")]
    fn test_rejects_invalid_identifiers(#[case] input: &str) {
        let err = input.parse::<VideoId>().unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidId(s) if s == input));
    }

    #[test]
    fn test_rejects_overlong_identifier() {
        let long = "v".repeat(MAX_LENGTH + 1);
        assert!(long.parse::<VideoId>().is_err());
        assert!("v".repeat(MAX_LENGTH).parse::<VideoId>().is_ok());
    }

    #[test]
    fn test_try_from_string() {
        let id = VideoId::try_from("video4".to_string()).unwrap();
        assert_eq!(id.as_str(), "video4");
        assert!(VideoId::try_from(String::new()).is_err());
    }
}
