// ABOUTME: Position storage layer using SQLite
// ABOUTME: Positions are job titles referenced by worker profiles

use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::filter::NameFilter;
use crate::pagination::{Page, PaginationParams};
use crate::types::Position;
use crate::{is_unique_violation, StorageError, StorageResult};

pub struct PositionStorage {
    pool: SqlitePool,
}

impl PositionStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new position
    pub async fn create(&self, name: &str) -> StorageResult<Position> {
        let id = taskhive_core::entity_id("position");

        debug!("Creating position: {} (name: {})", id, name);

        let result = sqlx::query("INSERT INTO positions (id, name) VALUES (?, ?)")
            .bind(&id)
            .bind(name)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => self.get(&id).await,
            Err(e) if is_unique_violation(&e) => {
                Err(StorageError::DuplicateName(name.to_string()))
            }
            Err(e) => Err(StorageError::Sqlx(e)),
        }
    }

    /// Get a single position by ID
    pub async fn get(&self, id: &str) -> StorageResult<Position> {
        let row = sqlx::query("SELECT * FROM positions WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or(StorageError::NotFound)?;

        row_to_position(&row)
    }

    /// List positions with optional name search, paginated in name order
    pub async fn list(
        &self,
        filter: &NameFilter,
        params: &PaginationParams,
    ) -> StorageResult<Page<Position>> {
        let pattern = filter.name.as_ref().map(|n| format!("%{}%", n));

        let count: i64 = match &pattern {
            Some(p) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM positions WHERE name LIKE ?")
                    .bind(p)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM positions")
                    .fetch_one(&self.pool)
                    .await?
            }
        };

        let rows = match &pattern {
            Some(p) => {
                sqlx::query("SELECT * FROM positions WHERE name LIKE ? ORDER BY name LIMIT ? OFFSET ?")
                    .bind(p)
                    .bind(params.limit())
                    .bind(params.offset())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT * FROM positions ORDER BY name LIMIT ? OFFSET ?")
                    .bind(params.limit())
                    .bind(params.offset())
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        let positions = rows
            .iter()
            .map(row_to_position)
            .collect::<StorageResult<Vec<_>>>()?;

        Ok(Page::new(positions, params, count))
    }
}

fn row_to_position(row: &sqlx::sqlite::SqliteRow) -> StorageResult<Position> {
    Ok(Position {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
    })
}
