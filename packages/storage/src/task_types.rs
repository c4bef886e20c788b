// ABOUTME: Task type storage layer using SQLite
// ABOUTME: Task types categorize tasks and are referenced by the task filter

use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::types::TaskType;
use crate::{is_unique_violation, StorageError, StorageResult};

pub struct TaskTypeStorage {
    pool: SqlitePool,
}

impl TaskTypeStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new task type
    pub async fn create(&self, name: &str) -> StorageResult<TaskType> {
        let id = taskhive_core::entity_id("task-type");

        debug!("Creating task type: {} (name: {})", id, name);

        let result = sqlx::query("INSERT INTO task_types (id, name) VALUES (?, ?)")
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

    /// Get a single task type by ID
    pub async fn get(&self, id: &str) -> StorageResult<TaskType> {
        let row = sqlx::query("SELECT * FROM task_types WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or(StorageError::NotFound)?;

        row_to_task_type(&row)
    }

    /// All task types in name order, for populating the filter form.
    pub async fn list_all(&self) -> StorageResult<Vec<TaskType>> {
        let rows = sqlx::query("SELECT * FROM task_types ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_task_type).collect()
    }
}

fn row_to_task_type(row: &sqlx::sqlite::SqliteRow) -> StorageResult<TaskType> {
    Ok(TaskType {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_pool;

    #[tokio::test]
    async fn test_create_and_list_ordered_by_name() {
        let storage = TaskTypeStorage::new(test_pool().await);

        storage.create("Refactoring").await.unwrap();
        storage.create("Bug").await.unwrap();

        let types = storage.list_all().await.unwrap();
        let names: Vec<&str> = types.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["Bug", "Refactoring"]);
    }

    #[tokio::test]
    async fn test_duplicate_name_is_rejected() {
        let storage = TaskTypeStorage::new(test_pool().await);

        storage.create("Bug").await.unwrap();
        let err = storage.create("Bug").await.unwrap_err();

        assert!(matches!(err, StorageError::DuplicateName(name) if name == "Bug"));
        assert_eq!(storage.list_all().await.unwrap().len(), 1);
    }
}
