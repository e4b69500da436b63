use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use reel_media::{CacheRecord, Payload, VideoId};
use time::UtcDateTime;

#[derive(sqlx::FromRow)]
pub(crate) struct VideoRow {
    pub(crate) name: String,
    pub(crate) mp4: Vec<u8>,
    pub(crate) webm: Vec<u8>,
    pub(crate) mp4_hash: String,
    pub(crate) webm_hash: String,
    pub(crate) stored_at: i64,
}
impl VideoRow {
    pub(crate) fn from_record(record: &CacheRecord, stored_at: UtcDateTime) -> Self {
        Self {
            name: record.id.to_string(),
            mp4: record.mp4.as_ref().to_vec(),
            webm: record.webm.as_ref().to_vec(),
            mp4_hash: record.mp4.digest(),
            webm_hash: record.webm.digest(),
            stored_at: stored_at.unix_timestamp(),
        }
    }
}
impl TryFrom<VideoRow> for CacheRecord {
    type Error = Error;
    fn try_from(row: VideoRow) -> Result<Self, Self::Error> {
        let id = VideoId::try_from(row.name).or_raise(|| ErrorKind::InvalidData("video name"))?;
        Ok(CacheRecord::new(id, Payload::from(row.mp4), Payload::from(row.webm)))
    }
}

/// What is stored for one video, without the payloads themselves.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RecordSummary {
    pub id: VideoId,
    pub mp4_size: u64,
    pub webm_size: u64,
    pub mp4_digest: String,
    pub webm_digest: String,
    pub stored_at: UtcDateTime,
}

#[derive(sqlx::FromRow)]
pub(crate) struct SummaryRow {
    name: String,
    mp4_size: i64,
    webm_size: i64,
    mp4_hash: String,
    webm_hash: String,
    stored_at: i64,
}
impl TryFrom<SummaryRow> for RecordSummary {
    type Error = Error;
    fn try_from(row: SummaryRow) -> Result<Self, Self::Error> {
        Ok(Self {
            id: VideoId::try_from(row.name).or_raise(|| ErrorKind::InvalidData("video name"))?,
            mp4_size: u64::try_from(row.mp4_size).or_raise(|| ErrorKind::InvalidData("mp4 size"))?,
            webm_size: u64::try_from(row.webm_size).or_raise(|| ErrorKind::InvalidData("webm size"))?,
            mp4_digest: row.mp4_hash,
            webm_digest: row.webm_hash,
            stored_at: UtcDateTime::from_unix_timestamp(row.stored_at)
                .or_raise(|| ErrorKind::InvalidData("stored date"))?,
        })
    }
}
