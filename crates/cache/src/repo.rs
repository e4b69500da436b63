//! Repository for the video record collection.
//!
//! Records are keyed by video identifier and hold both encodings. They are
//! written once and then only ever read: there is no update, no delete and no
//! expiry.

use crate::Database;
use crate::error::{ErrorKind, Result};
use crate::models::{RecordSummary, SummaryRow, VideoRow};
use exn::ResultExt;
use reel_media::{CacheRecord, Encoding, VideoId};
use sqlx::SqlitePool;
use time::UtcDateTime;
use tracing::instrument;

/// Get/put access to stored videos.
///
/// Every call runs in its own implicit transaction, so concurrent calls for
/// different identifiers never conflict with each other.
#[derive(Debug, Clone)]
pub struct VideoStore {
    pool: SqlitePool,
}
impl From<&Database> for VideoStore {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}
impl VideoStore {
    /// Look up the record for `id`. A miss is `Ok(None)`, not an error.
    #[instrument(skip(self), fields(video = %id))]
    pub async fn get(&self, id: &VideoId) -> Result<Option<CacheRecord>> {
        let row: Option<VideoRow> = sqlx::query_as(include_str!("../queries/get_video.sql"))
            .bind(id.as_str())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        row.map(CacheRecord::try_from).transpose()
    }

    /// Store a record, failing if one already exists for the identifier.
    ///
    /// Returns [`AlreadyExists`](ErrorKind::AlreadyExists) for a duplicate key
    /// and [`Write`](ErrorKind::Write) for anything else the engine rejects.
    #[instrument(skip_all, fields(video = %record.id))]
    pub async fn put(&self, record: &CacheRecord) -> Result<()> {
        let row = VideoRow::from_record(record, UtcDateTime::now());
        let result = sqlx::query(include_str!("../queries/insert_video.sql"))
            .bind(row.name)
            .bind(row.mp4)
            .bind(row.webm)
            .bind(row.mp4_hash)
            .bind(row.webm_hash)
            .bind(row.stored_at)
            .execute(&self.pool)
            .await;
        match result {
            Ok(_) => Ok(()),
            Err(err) if err.as_database_error().is_some_and(|e| e.is_unique_violation()) => {
                Err(err).or_raise(|| ErrorKind::AlreadyExists(record.id.clone()))
            },
            Err(err) => Err(err).or_raise(|| ErrorKind::Write(record.id.clone())),
        }
    }

    /// Summaries of every stored record, ordered by identifier.
    pub async fn list(&self) -> Result<Vec<RecordSummary>> {
        let rows: Vec<SummaryRow> = sqlx::query_as(include_str!("../queries/list_videos.sql"))
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        rows.into_iter().map(RecordSummary::try_from).collect()
    }

    /// Identifiers whose payload for `encoding` has the given BLAKE3 digest.
    ///
    /// Served by the per-encoding digest indexes; meant for inspecting the
    /// store, not for the load path.
    pub async fn find_by_digest(&self, encoding: Encoding, digest: impl AsRef<str>) -> Result<Vec<VideoId>> {
        let query = match encoding {
            Encoding::Mp4 => "SELECT name FROM videos WHERE mp4_hash = $1 ORDER BY name",
            Encoding::Webm => "SELECT name FROM videos WHERE webm_hash = $1 ORDER BY name",
        };
        let names: Vec<String> = sqlx::query_scalar(query)
            .bind(digest.as_ref())
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        names
            .into_iter()
            .map(|name| VideoId::try_from(name).or_raise(|| ErrorKind::InvalidData("video name")))
            .collect()
    }
}
