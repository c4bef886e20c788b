// ABOUTME: SQLite persistence layer for Taskhive entities
// ABOUTME: Pool bootstrap, shared error type, and per-entity storage modules

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

pub mod filter;
pub mod pagination;
pub mod positions;
pub mod projects;
pub mod sessions;
pub mod stats;
mod tags;
pub mod task_types;
pub mod tasks;
pub mod teams;
pub mod types;
pub mod validator;
pub mod workers;

pub use filter::{NameFilter, ProjectFilter, TaskFilter};
pub use pagination::{Page, PaginationMeta, PaginationParams, PAGE_SIZE};
pub use positions::PositionStorage;
pub use projects::ProjectStorage;
pub use sessions::SessionStorage;
pub use stats::DashboardCounts;
pub use task_types::TaskTypeStorage;
pub use tasks::TaskStorage;
pub use teams::TeamStorage;
pub use types::*;
pub use validator::{validate_deadline, ValidationError};
pub use workers::WorkerStorage;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Database error: {0}")]
    Database(String),
    #[error("Duplicate name: {0}")]
    DuplicateName(String),
    #[error("Not found")]
    NotFound,
}

pub type StorageResult<T> = Result<T, StorageError>;

/// True when `err` is a SQLite unique-constraint violation.
///
/// SQLITE_CONSTRAINT_UNIQUE surfaces as extended code 2067 (plain UNIQUE) or
/// 1555 (primary key).
pub(crate) fn is_unique_violation(err: &sqlx::Error) -> bool {
    if let sqlx::Error::Database(db_err) = err {
        if let Some(code) = db_err.code() {
            return code == "2067" || code == "1555";
        }
    }
    false
}

/// Open (creating if necessary) the SQLite database at `path` and run
/// migrations.
pub async fn connect(path: &Path) -> StorageResult<SqlitePool> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(StorageError::Io)?;
    }

    debug!("Connecting to database: {}", path.display());

    let options = SqliteConnectOptions::new()
        .filename(path)
        .create_if_missing(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect_with(options)
        .await
        .map_err(StorageError::Sqlx)?;

    sqlx::query("PRAGMA journal_mode = WAL")
        .execute(&pool)
        .await
        .map_err(StorageError::Sqlx)?;

    sqlx::query("PRAGMA foreign_keys = ON")
        .execute(&pool)
        .await
        .map_err(StorageError::Sqlx)?;

    sqlx::query("PRAGMA synchronous = NORMAL")
        .execute(&pool)
        .await
        .map_err(StorageError::Sqlx)?;

    info!("Database connection established");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(StorageError::Migration)?;

    debug!("Database migrations completed");

    Ok(pool)
}
