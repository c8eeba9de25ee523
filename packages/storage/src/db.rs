// ABOUTME: Database connection management and schema initialization
// ABOUTME: Opens the pool, applies pragmas, and runs version-gated migrations

use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use tracing::{debug, info};

use crate::{StorageConfig, StorageError, StorageResult};

/// Open (creating if necessary) the database described by `config`, apply
/// connection pragmas, and bring the schema up to the current version.
///
/// Safe to call against an existing database: migrations are additive and
/// already-applied steps are skipped.
pub async fn connect(config: &StorageConfig) -> StorageResult<SqlitePool> {
    if let Some(parent) = config.path.parent() {
        std::fs::create_dir_all(parent).map_err(StorageError::Io)?;
    }

    let database_url = format!("sqlite:{}", config.path.display());

    if !sqlx::Sqlite::database_exists(&database_url)
        .await
        .map_err(|e| StorageError::Unavailable(e.to_string()))?
    {
        debug!("Creating database at: {}", database_url);
        sqlx::Sqlite::create_database(&database_url)
            .await
            .map_err(|e| StorageError::Unavailable(e.to_string()))?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(config.busy_timeout_seconds))
        .connect(&database_url)
        .await
        .map_err(|e| StorageError::Unavailable(e.to_string()))?;

    if config.enable_wal {
        sqlx::query("PRAGMA journal_mode = WAL")
            .execute(&pool)
            .await
            .map_err(StorageError::Sqlx)?;
    }

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .map_err(StorageError::Sqlx)?;

    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await
        .map_err(StorageError::Sqlx)?;

    info!("Database connection established");

    run_migrations(&pool).await?;

    Ok(pool)
}

/// In-memory database for tests. The pool is pinned to a single connection
/// because each SQLite in-memory connection is its own database.
pub async fn connect_in_memory() -> StorageResult<SqlitePool> {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .map_err(|e| StorageError::Unavailable(e.to_string()))?;

    run_migrations(&pool).await?;

    Ok(pool)
}

async fn run_migrations(pool: &SqlitePool) -> StorageResult<()> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(StorageError::Migration)?;

    debug!("Database migrations completed");
    Ok(())
}
