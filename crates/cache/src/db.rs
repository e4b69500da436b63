//! Database connection, pool management and schema versioning.

use exn::ResultExt;
use sqlx::SqliteConnection;
use sqlx::pool::PoolConnectionMetadata;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteSynchronous};
use std::path::{Path, PathBuf};
use tracing::instrument;

use crate::error::{ErrorKind, Result};

/// Schema steps, applied in order. Step `n` takes a database from version
/// `n - 1` to version `n`.
const SCHEMA: &[(u32, &str)] = &[(1, include_str!("../migrations/0001_videos.sql"))];
/// The newest schema version this build knows how to create.
pub const SCHEMA_VERSION: u32 = 1;
// Concurrent loads are few (one per configured video) and mostly wait on the
// network, so a small pool is plenty.
const MAX_CONNECTIONS: u32 = 4;

/// Handle to the versioned local video database.
///
/// Opening is the only way to obtain one, and opening does not return until
/// the schema is at the requested version; holding a `Database` therefore
/// means the store is ready for reads and writes.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    async fn new(options: SqliteConnectOptions, max: Option<u32>, location: PathBuf, version: u32) -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            // Applies the query-based PRAGMAs to every pooled connection
            // rather than only the first one handed out.
            .after_connect(|conn, meta| Box::pin(async move { Self::apply_pragmas(conn, meta).await }))
            .max_connections(max.unwrap_or(MAX_CONNECTIONS))
            .connect_with(options)
            .await
            .or_raise(|| ErrorKind::Unavailable(location))?;
        let db = Self { pool };
        db.upgrade(version).await?;
        Ok(db)
    }

    /// Open (or create) the video database at the given path, bringing its
    /// schema up to `version`.
    ///
    /// Fails with [`Unavailable`](ErrorKind::Unavailable) if the file or its
    /// parent directory cannot be created or opened, and with
    /// [`VersionConflict`](ErrorKind::VersionConflict) if the file already
    /// holds a newer schema.
    pub async fn open(path: impl AsRef<Path>, version: u32) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            // Non-async on purpose: happens once per process, before any
            // other store operation.
            std::fs::create_dir_all(parent).or_raise(|| ErrorKind::Unavailable(path.to_path_buf()))?;
        }
        let options = Self::base_options().filename(path).create_if_missing(true);
        Self::new(options, None, path.to_path_buf(), version).await
    }

    /// Open an in-memory database (useful for testing).
    ///
    /// Note:
    /// - In-memory databases are destroyed when the connection closes.
    /// - Do NOT apply `#[cfg(test)]` so that other crates can also use this in their tests.
    pub async fn open_in_memory(version: u32) -> Result<Self> {
        let options = Self::base_options().filename(":memory:");
        // Every pooled connection to ":memory:" would see its own private
        // database, so the pool is limited to a single connection.
        Self::new(options, Some(1), PathBuf::from(":memory:"), version).await
    }

    fn base_options() -> SqliteConnectOptions {
        SqliteConnectOptions::new()
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            // Up to one writer per configured video competes for the lock
            // when a cold cache is populated.
            .busy_timeout(std::time::Duration::from_millis(1500))
    }

    async fn apply_pragmas(conn: &mut SqliteConnection, _meta: PoolConnectionMetadata) -> sqlx::Result<()> {
        sqlx::query(
            r#"
                PRAGMA locking_mode = NORMAL;
                PRAGMA cache_size = -8192;
                PRAGMA temp_store = MEMORY;
            "#,
        )
        .execute(conn)
        .await?;
        Ok(())
    }

    /// The schema version currently stored in the database file.
    pub async fn version(&self) -> Result<u32> {
        let version: i64 = sqlx::query_scalar("PRAGMA user_version")
            .fetch_one(&self.pool)
            .await
            .or_raise(|| ErrorKind::Database)?;
        u32::try_from(version).or_raise(|| ErrorKind::InvalidData("schema version"))
    }

    /// Bring the schema up to `requested`.
    ///
    /// Each missing step runs in its own transaction together with the
    /// `user_version` bump, so an interrupted upgrade resumes from the last
    /// completed step. Opening at the current version performs no DDL.
    #[instrument(skip(self))]
    async fn upgrade(&self, requested: u32) -> Result<()> {
        if requested == 0 || requested > SCHEMA_VERSION {
            exn::bail!(ErrorKind::UnknownVersion(requested));
        }
        let current = self.version().await?;
        if requested < current {
            exn::bail!(ErrorKind::VersionConflict { requested, current });
        }
        if requested == current {
            tracing::debug!(version = current, "database schema up to date");
            return Ok(());
        }
        for &(version, sql) in SCHEMA.iter().filter(|(v, _)| *v > current && *v <= requested) {
            let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Migration(version))?;
            sqlx::raw_sql(sql).execute(&mut *tx).await.or_raise(|| ErrorKind::Migration(version))?;
            // PRAGMA arguments cannot be bound as parameters.
            let bump = format!("PRAGMA user_version = {version}");
            sqlx::raw_sql(&bump).execute(&mut *tx).await.or_raise(|| ErrorKind::Migration(version))?;
            tx.commit().await.or_raise(|| ErrorKind::Migration(version))?;
            tracing::info!(from = current, to = version, "database setup complete");
        }
        Ok(())
    }

    /// Get a reference to the underlying connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    ///
    /// This waits for all connections to be returned to the pool and then
    /// closes them. After calling this, the Database instance should not
    /// be used.
    pub async fn close(&self) {
        _ = sqlx::query("PRAGMA optimize").execute(&self.pool).await;
        self.pool.close().await;
    }
}
