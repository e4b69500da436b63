//! Flat key/string storage, kept apart from the video database.
//!
//! Mirrors what a page gets from the browser's `localStorage`: unversioned,
//! string keys mapped to string values, overwrite on set. Playback positions
//! live here rather than in the video database so that they survive the
//! video database being deleted or rebuilt.

use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use reel_media::{PlaybackPosition, VideoId};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::path::{Path, PathBuf};
use tracing::instrument;

const CREATE_TABLE: &str = "CREATE TABLE IF NOT EXISTS local_storage (key TEXT PRIMARY KEY NOT NULL, value TEXT NOT NULL)";
/// Suffix appended to the video identifier to form its position key.
const POSITION_SUFFIX: &str = "-timeStamp";

/// Key/string store backed by its own SQLite file.
#[derive(Debug, Clone)]
pub struct LocalStorage {
    pool: SqlitePool,
}

impl LocalStorage {
    async fn new(options: SqliteConnectOptions, max: u32, location: PathBuf) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(max)
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Unavailable(location.clone()))?;
        sqlx::query(CREATE_TABLE).execute(&pool).await.or_raise(|| ErrorKind::Unavailable(location))?;
        Ok(Self { pool })
    }

    /// Connect to the key/string store at the given path, creating it if needed.
    pub async fn connect(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).or_raise(|| ErrorKind::Unavailable(path.to_path_buf()))?;
        }
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .busy_timeout(std::time::Duration::from_millis(1500));
        Self::new(options, 2, path.to_path_buf()).await
    }

    /// Connect to an in-memory store (useful for testing).
    pub async fn connect_in_memory() -> Result<Self> {
        let options = SqliteConnectOptions::new().filename(":memory:");
        Self::new(options, 1, PathBuf::from(":memory:")).await
    }

    pub async fn get_item(&self, key: impl AsRef<str>) -> Result<Option<String>> {
        sqlx::query_scalar::<_, String>("SELECT value FROM local_storage WHERE key = $1")
            .bind(key.as_ref())
            .fetch_optional(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    /// Set `key` to `value`, replacing whatever was there.
    pub async fn set_item(&self, key: impl AsRef<str>, value: impl AsRef<str>) -> Result<()> {
        sqlx::query(include_str!("../queries/set_item.sql"))
            .bind(key.as_ref())
            .bind(value.as_ref())
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(())
    }

    /// Returns `true` if the key existed.
    pub async fn remove_item(&self, key: impl AsRef<str>) -> Result<bool> {
        let result = sqlx::query("DELETE FROM local_storage WHERE key = $1")
            .bind(key.as_ref())
            .execute(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn keys(&self) -> Result<Vec<String>> {
        sqlx::query_scalar::<_, String>("SELECT key FROM local_storage ORDER BY key")
            .fetch_all(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

/// Playback positions stored in [`LocalStorage`].
///
/// The key for a video is `"<identifier>-timeStamp"` and the value is the
/// offset in seconds, written with the shortest decimal form that reads back
/// to the same number (`12.5` is stored as `"12.5"`, `12.0` as `"12"`).
#[derive(Debug, Clone)]
pub struct Positions {
    storage: LocalStorage,
}
impl From<LocalStorage> for Positions {
    fn from(storage: LocalStorage) -> Self {
        Self { storage }
    }
}
impl Positions {
    pub fn key(id: &VideoId) -> String {
        format!("{id}{POSITION_SUFFIX}")
    }

    /// The last stored offset for `id`.
    ///
    /// A value that does not parse as a usable offset is logged and treated
    /// as absent, so a corrupted entry never blocks playback.
    #[instrument(skip(self), fields(video = %id))]
    pub async fn get(&self, id: &VideoId) -> Result<Option<f64>> {
        let Some(raw) = self.storage.get_item(Self::key(id)).await? else {
            return Ok(None);
        };
        match raw.trim().parse::<f64>() {
            Ok(offset) if offset.is_finite() && offset >= 0.0 => Ok(Some(offset)),
            _ => {
                tracing::warn!(value = %raw, "ignoring unreadable playback position");
                Ok(None)
            },
        }
    }

    /// Record a position, overwriting any previous one for the same video.
    #[instrument(skip_all, fields(video = %position.id, offset = position.offset()))]
    pub async fn set(&self, position: &PlaybackPosition) -> Result<()> {
        self.storage.set_item(Self::key(&position.id), Self::format(position.offset())).await
    }

    /// Every stored position, ordered by identifier.
    ///
    /// Keys that do not follow the position convention are skipped.
    pub async fn list(&self) -> Result<Vec<PlaybackPosition>> {
        let mut positions = Vec::new();
        for key in self.storage.keys().await? {
            let Some(id) = key.strip_suffix(POSITION_SUFFIX).and_then(|name| name.parse::<VideoId>().ok()) else {
                continue;
            };
            if let Some(offset) = self.get(&id).await?
                && let Ok(position) = PlaybackPosition::new(id, offset)
            {
                positions.push(position);
            }
        }
        Ok(positions)
    }

    fn format(offset: f64) -> String {
        offset.to_string()
    }

    pub fn storage(&self) -> &LocalStorage {
        &self.storage
    }
}
