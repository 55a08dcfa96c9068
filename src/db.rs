//! SQLite connection handling, schema setup and transaction scopes.

use log::{info, warn};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions};
use sqlx::{Row, Sqlite, Transaction};
use std::future::Future;
use std::path::Path;
use std::time::Duration;
use tokio::runtime::Runtime;

use crate::constants::{EXPECTED_DB_VERSION, VERSION_KEY};
use crate::error::{Error, Result};
use crate::queries::{ddl, metadata};

/// Synchronous database wrapper that owns a runtime for blocking callers.
/// Every async operation in the crate can be driven through [`SyncDb::block_on`].
pub struct SyncDb {
    pool: SqlitePool,
    runtime: Runtime,
}

impl SyncDb {
    /// Open (creating if needed) the database at `path` and make sure the schema exists
    pub fn connect(path: &Path) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| Error::Config(format!("failed to start runtime: {}", e)))?;
        let pool = runtime.block_on(async {
            let pool = open_database(path).await?;
            init_database_schema(&pool).await?;
            Ok::<_, Error>(pool)
        })?;
        Ok(Self { pool, runtime })
    }

    /// Block on an async future using the embedded runtime
    pub fn block_on<F: Future>(&self, fut: F) -> F::Output {
        self.runtime.block_on(fut)
    }

    /// Get a reference to the underlying pool
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

/// Open a file-based connection pool.
/// Enables WAL mode and foreign keys.
pub async fn open_database(path: &Path) -> Result<SqlitePool> {
    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(options)
        .await?;

    info!("SQLite database: {}", path.display());
    Ok(pool)
}

/// Create a database inside a fresh temporary directory.
/// Keep the returned guard alive for as long as the pool is used.
pub async fn create_test_connection_in_temporary_file() -> Result<(SqlitePool, tempfile::TempDir)> {
    let dir = tempfile::tempdir()
        .map_err(|e| Error::Config(format!("failed to create temporary directory: {}", e)))?;
    let pool = open_database(&dir.path().join("test.sqlite")).await?;
    Ok((pool, dir))
}

/// Initialize database schema.
/// Creates tables and indexes, then records or checks the schema version.
pub async fn init_database_schema(pool: &SqlitePool) -> Result<()> {
    for statement in ddl::schema() {
        sqlx::query(&statement).execute(pool).await?;
    }

    let existing = sqlx::query(&metadata::select_by_key(VERSION_KEY))
        .fetch_optional(pool)
        .await?
        .map(|row| row.try_get::<String, _>(0))
        .transpose()?;

    match existing {
        None => {
            sqlx::query(&metadata::insert(VERSION_KEY, EXPECTED_DB_VERSION))
                .execute(pool)
                .await?;
        }
        Some(found) if found != EXPECTED_DB_VERSION => {
            return Err(Error::SchemaVersion {
                expected: EXPECTED_DB_VERSION.to_string(),
                found,
            });
        }
        Some(_) => {}
    }

    Ok(())
}

/// Begin a transaction holding the write lock from its first statement.
/// Other writers wait on the busy timeout instead of invalidating its reads.
pub async fn begin_write(pool: &SqlitePool) -> Result<Transaction<'static, Sqlite>> {
    Ok(pool.begin_with("BEGIN IMMEDIATE").await?)
}

/// Commit the transaction if `result` is Ok, roll it back otherwise.
pub async fn finish_transaction<T>(tx: Transaction<'_, Sqlite>, result: Result<T>) -> Result<T> {
    match result {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(err) => {
            if let Err(rollback_err) = tx.rollback().await {
                warn!("Failed to roll back transaction: {}", rollback_err);
            }
            Err(err)
        }
    }
}
