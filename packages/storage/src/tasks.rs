// ABOUTME: Task storage layer using SQLite
// ABOUTME: Task CRUD, filtered list queries, and the status-update replace semantics

use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::filter::TaskFilter;
use crate::pagination::{Page, PaginationParams};
use crate::tags::replace_tags;
use crate::types::{Priority, Task, TaskInput};
use crate::{is_unique_violation, StorageError, StorageResult};

pub struct TaskStorage {
    pool: SqlitePool,
}

impl TaskStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new task owned by `owner_id`
    pub async fn create(&self, owner_id: &str, input: TaskInput) -> StorageResult<Task> {
        let id = taskhive_core::entity_id("task");
        let priority = input.priority.unwrap_or_default();

        debug!("Creating task: {} (name: {})", id, input.name);

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let result = sqlx::query(
            r#"
            INSERT INTO tasks (id, name, description, deadline, is_completed, priority, task_type_id, project_id, owner_id)
            VALUES (?, ?, ?, ?, 0, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.deadline)
        .bind(priority.as_str())
        .bind(&input.task_type_id)
        .bind(&input.project_id)
        .bind(owner_id)
        .execute(&mut *tx)
        .await;

        if let Err(e) = result {
            return if is_unique_violation(&e) {
                Err(StorageError::DuplicateName(input.name))
            } else {
                Err(StorageError::Sqlx(e))
            };
        }

        for worker_id in &input.assignee_ids {
            sqlx::query("INSERT OR IGNORE INTO task_assignees (task_id, worker_id) VALUES (?, ?)")
                .bind(&id)
                .bind(worker_id)
                .execute(&mut *tx)
                .await
                .map_err(StorageError::Sqlx)?;
        }

        replace_tags(&mut *tx, "task_tags", "task_id", &id, &input.tags).await?;

        tx.commit().await.map_err(StorageError::Sqlx)?;

        self.get(&id).await
    }

    /// Get a single task by ID, including assignee ids and tag names
    pub async fn get(&self, id: &str) -> StorageResult<Task> {
        let row = sqlx::query("SELECT * FROM tasks WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or(StorageError::NotFound)?;

        self.hydrate(&row).await
    }

    /// List tasks matching `filter`, paginated in name order
    pub async fn list(
        &self,
        filter: &TaskFilter,
        params: &PaginationParams,
    ) -> StorageResult<Page<Task>> {
        let (where_clause, binds) = build_where(filter);

        let count_query = format!("SELECT COUNT(*) FROM tasks{}", where_clause);
        let mut count = sqlx::query_scalar(&count_query);
        for bind in &binds {
            count = count.bind(bind);
        }
        let total: i64 = count.fetch_one(&self.pool).await?;

        let list_query = format!(
            "SELECT * FROM tasks{} ORDER BY name LIMIT ? OFFSET ?",
            where_clause
        );
        let mut query = sqlx::query(&list_query);
        for bind in &binds {
            query = query.bind(bind);
        }
        let rows = query
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(&self.pool)
            .await?;

        let mut tasks = Vec::with_capacity(rows.len());
        for row in &rows {
            tasks.push(self.hydrate(row).await?);
        }

        Ok(Page::new(tasks, params, total))
    }

    /// Fully update a task. The submitted field set replaces the stored one;
    /// assignees and tags are replaced set-wise, not merged.
    pub async fn update(&self, id: &str, input: TaskInput) -> StorageResult<Task> {
        let priority = input.priority.unwrap_or_default();

        debug!("Updating task: {}", id);

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET name = ?, description = ?, deadline = ?, priority = ?,
                task_type_id = ?, project_id = ?
            WHERE id = ?
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.deadline)
        .bind(priority.as_str())
        .bind(&input.task_type_id)
        .bind(&input.project_id)
        .bind(id)
        .execute(&mut *tx)
        .await;

        match result {
            Ok(r) if r.rows_affected() == 0 => return Err(StorageError::NotFound),
            Ok(_) => {}
            Err(e) if is_unique_violation(&e) => {
                return Err(StorageError::DuplicateName(input.name))
            }
            Err(e) => return Err(StorageError::Sqlx(e)),
        }

        sqlx::query("DELETE FROM task_assignees WHERE task_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        for worker_id in &input.assignee_ids {
            sqlx::query("INSERT OR IGNORE INTO task_assignees (task_id, worker_id) VALUES (?, ?)")
                .bind(id)
                .bind(worker_id)
                .execute(&mut *tx)
                .await
                .map_err(StorageError::Sqlx)?;
        }

        replace_tags(&mut *tx, "task_tags", "task_id", id, &input.tags).await?;

        tx.commit().await.map_err(StorageError::Sqlx)?;

        self.get(id).await
    }

    /// Apply a status submission: assignees are cleared then set to exactly
    /// the submitted set, and the completion flag is written as given.
    /// Applying the same payload twice yields the same end state.
    pub async fn set_status(
        &self,
        id: &str,
        assignee_ids: &[String],
        is_completed: bool,
    ) -> StorageResult<Task> {
        debug!(
            "Updating status of task {} (completed: {}, assignees: {})",
            id,
            is_completed,
            assignee_ids.len()
        );

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let result = sqlx::query("UPDATE tasks SET is_completed = ? WHERE id = ?")
            .bind(is_completed)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        sqlx::query("DELETE FROM task_assignees WHERE task_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        for worker_id in assignee_ids {
            sqlx::query("INSERT OR IGNORE INTO task_assignees (task_id, worker_id) VALUES (?, ?)")
                .bind(id)
                .bind(worker_id)
                .execute(&mut *tx)
                .await
                .map_err(StorageError::Sqlx)?;
        }

        tx.commit().await.map_err(StorageError::Sqlx)?;

        self.get(id).await
    }

    /// Delete a task; assignee and tag joins cascade
    pub async fn delete(&self, id: &str) -> StorageResult<()> {
        debug!("Deleting task: {}", id);

        let result = sqlx::query("DELETE FROM tasks WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    async fn hydrate(&self, row: &sqlx::sqlite::SqliteRow) -> StorageResult<Task> {
        let id: String = row.try_get("id")?;

        let assignee_ids: Vec<String> = sqlx::query_scalar(
            "SELECT worker_id FROM task_assignees ta JOIN workers w ON w.id = ta.worker_id WHERE ta.task_id = ? ORDER BY w.username",
        )
        .bind(&id)
        .fetch_all(&self.pool)
        .await?;

        let tags: Vec<String> = sqlx::query_scalar(
            "SELECT g.name FROM task_tags tt JOIN tags g ON g.id = tt.tag_id WHERE tt.task_id = ? ORDER BY g.name",
        )
        .bind(&id)
        .fetch_all(&self.pool)
        .await?;

        let priority: String = row.try_get("priority")?;

        Ok(Task {
            id,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            deadline: row.try_get("deadline")?,
            is_completed: row.try_get("is_completed")?,
            priority: priority
                .parse::<Priority>()
                .map_err(StorageError::Database)?,
            task_type_id: row.try_get("task_type_id")?,
            project_id: row.try_get("project_id")?,
            owner_id: row.try_get("owner_id")?,
            assignee_ids,
            tags,
        })
    }
}

/// Compose the WHERE clause for a task list query. Returns the clause and
/// the bind values in placeholder order.
fn build_where(filter: &TaskFilter) -> (String, Vec<String>) {
    let mut conditions = Vec::new();
    let mut binds = Vec::new();

    if let Some(name) = &filter.name {
        conditions.push("name LIKE ?".to_string());
        binds.push(format!("%{}%", name));
    }

    if let Some(task_type_id) = &filter.task_type_id {
        conditions.push("task_type_id = ?".to_string());
        binds.push(task_type_id.clone());
    }

    if let Some(project_id) = &filter.project_id {
        conditions.push("project_id = ?".to_string());
        binds.push(project_id.clone());
    }

    if let Some(is_completed) = filter.is_completed {
        conditions.push("is_completed = ?".to_string());
        binds.push(if is_completed { "1" } else { "0" }.to_string());
    }

    if !filter.tags.is_empty() {
        let placeholders = vec!["?"; filter.tags.len()].join(", ");
        conditions.push(format!(
            "id IN (SELECT tt.task_id FROM task_tags tt JOIN tags g ON g.id = tt.tag_id WHERE g.name IN ({}))",
            placeholders
        ));
        binds.extend(filter.tags.iter().cloned());
    }

    if conditions.is_empty() {
        (String::new(), binds)
    } else {
        (format!(" WHERE {}", conditions.join(" AND ")), binds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::task_types::TaskTypeStorage;
    use crate::test_support::test_pool;
    use crate::types::WorkerCreateInput;
    use crate::workers::WorkerStorage;
    use pretty_assertions::assert_eq;

    struct Fixture {
        pool: SqlitePool,
        tasks: TaskStorage,
        owner_id: String,
        type_id: String,
    }

    async fn fixture() -> Fixture {
        let pool = test_pool().await;

        let owner_id = WorkerStorage::new(pool.clone())
            .create(WorkerCreateInput {
                username: "owner".to_string(),
                password: "test1234".to_string(),
                first_name: String::new(),
                last_name: String::new(),
                email: String::new(),
                position_id: None,
            })
            .await
            .unwrap()
            .id;

        let type_id = TaskTypeStorage::new(pool.clone())
            .create("MainType")
            .await
            .unwrap()
            .id;

        Fixture {
            tasks: TaskStorage::new(pool.clone()),
            pool,
            owner_id,
            type_id,
        }
    }

    fn task_input(name: &str, type_id: &str) -> TaskInput {
        TaskInput {
            name: name.to_string(),
            description: None,
            deadline: taskhive_core::today(),
            priority: None,
            task_type_id: type_id.to_string(),
            project_id: None,
            assignee_ids: vec![],
            tags: vec![],
        }
    }

    async fn seed_worker(pool: &SqlitePool, username: &str) -> String {
        WorkerStorage::new(pool.clone())
            .create(WorkerCreateInput {
                username: username.to_string(),
                password: "test1234".to_string(),
                first_name: String::new(),
                last_name: String::new(),
                email: String::new(),
                position_id: None,
            })
            .await
            .unwrap()
            .id
    }

    #[tokio::test]
    async fn test_create_attaches_tags_and_assignees() {
        let fx = fixture().await;

        let mut input = task_input("task_1", &fx.type_id);
        input.tags = vec!["backend".to_string(), "urgent".to_string()];
        input.assignee_ids = vec![fx.owner_id.clone()];

        let task = fx.tasks.create(&fx.owner_id, input).await.unwrap();

        assert_eq!(task.tags, vec!["backend", "urgent"]);
        assert_eq!(task.assignee_ids, vec![fx.owner_id.clone()]);
        assert!(!task.is_completed);
        assert_eq!(task.priority, Priority::Medium);
    }

    #[tokio::test]
    async fn test_filter_by_name_and_type() {
        let fx = fixture().await;
        let searched_type = TaskTypeStorage::new(fx.pool.clone())
            .create("searched")
            .await
            .unwrap();

        fx.tasks
            .create(&fx.owner_id, task_input("test_1", &fx.type_id))
            .await
            .unwrap();
        fx.tasks
            .create(&fx.owner_id, task_input("Searched", &searched_type.id))
            .await
            .unwrap();

        let by_name = fx
            .tasks
            .list(
                &TaskFilter {
                    name: Some("Searched".to_string()),
                    ..Default::default()
                },
                &PaginationParams::default(),
            )
            .await
            .unwrap();
        assert_eq!(by_name.data.len(), 1);
        assert_eq!(by_name.data[0].name, "Searched");

        let by_type = fx
            .tasks
            .list(
                &TaskFilter {
                    task_type_id: Some(searched_type.id.clone()),
                    ..Default::default()
                },
                &PaginationParams::default(),
            )
            .await
            .unwrap();
        assert_eq!(by_type.data.len(), 1);
        assert_eq!(by_type.data[0].name, "Searched");
    }

    #[tokio::test]
    async fn test_filter_by_completion_and_tags() {
        let fx = fixture().await;

        let mut tagged = task_input("tagged", &fx.type_id);
        tagged.tags = vec!["frontend".to_string()];
        let tagged = fx.tasks.create(&fx.owner_id, tagged).await.unwrap();
        fx.tasks
            .create(&fx.owner_id, task_input("plain", &fx.type_id))
            .await
            .unwrap();

        fx.tasks.set_status(&tagged.id, &[], true).await.unwrap();

        let completed = fx
            .tasks
            .list(
                &TaskFilter {
                    is_completed: Some(true),
                    ..Default::default()
                },
                &PaginationParams::default(),
            )
            .await
            .unwrap();
        assert_eq!(completed.data.len(), 1);
        assert_eq!(completed.data[0].name, "tagged");

        let by_tag = fx
            .tasks
            .list(
                &TaskFilter {
                    tags: vec!["frontend".to_string()],
                    ..Default::default()
                },
                &PaginationParams::default(),
            )
            .await
            .unwrap();
        assert_eq!(by_tag.data.len(), 1);

        let unfiltered = fx
            .tasks
            .list(&TaskFilter::default(), &PaginationParams::default())
            .await
            .unwrap();
        assert_eq!(unfiltered.data.len(), 2);
    }

    #[tokio::test]
    async fn test_six_tasks_page_one_has_five() {
        let fx = fixture().await;

        for i in 0..6 {
            fx.tasks
                .create(&fx.owner_id, task_input(&format!("task_{}", i), &fx.type_id))
                .await
                .unwrap();
        }

        let page = fx
            .tasks
            .list(&TaskFilter::default(), &PaginationParams::new(1))
            .await
            .unwrap();

        assert_eq!(page.data.len(), 5);
        assert_eq!(page.pagination.total_items, 6);
        assert_eq!(page.pagination.total_pages, 2);
    }

    #[tokio::test]
    async fn test_status_update_is_idempotent() {
        let fx = fixture().await;
        let u2 = seed_worker(&fx.pool, "user_2").await;

        let task = fx
            .tasks
            .create(&fx.owner_id, task_input("task_1", &fx.type_id))
            .await
            .unwrap();

        let payload = vec![fx.owner_id.clone(), u2.clone()];

        let first = fx.tasks.set_status(&task.id, &payload, true).await.unwrap();
        let second = fx.tasks.set_status(&task.id, &payload, true).await.unwrap();

        assert_eq!(first.assignee_ids, second.assignee_ids);
        assert!(second.is_completed);
        assert_eq!(second.assignee_ids.len(), 2);
    }

    #[tokio::test]
    async fn test_status_update_replaces_assignees() {
        let fx = fixture().await;
        let u2 = seed_worker(&fx.pool, "user_2").await;
        let u3 = seed_worker(&fx.pool, "user_3").await;

        let mut input = task_input("task_1", &fx.type_id);
        input.assignee_ids = vec![fx.owner_id.clone(), u2];
        let task = fx.tasks.create(&fx.owner_id, input).await.unwrap();
        assert_eq!(task.assignee_ids.len(), 2);

        let updated = fx
            .tasks
            .set_status(&task.id, std::slice::from_ref(&u3), false)
            .await
            .unwrap();

        assert_eq!(updated.assignee_ids, vec![u3]);
        assert!(!updated.is_completed);
    }

    #[tokio::test]
    async fn test_completion_toggles_both_directions() {
        let fx = fixture().await;

        let task = fx
            .tasks
            .create(&fx.owner_id, task_input("task_1", &fx.type_id))
            .await
            .unwrap();

        let done = fx.tasks.set_status(&task.id, &[], true).await.unwrap();
        assert!(done.is_completed);

        let reopened = fx.tasks.set_status(&task.id, &[], false).await.unwrap();
        assert!(!reopened.is_completed);
    }

    #[tokio::test]
    async fn test_duplicate_task_name_rejected_and_nothing_written() {
        let fx = fixture().await;

        fx.tasks
            .create(&fx.owner_id, task_input("task_1", &fx.type_id))
            .await
            .unwrap();
        let err = fx
            .tasks
            .create(&fx.owner_id, task_input("task_1", &fx.type_id))
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::DuplicateName(_)));

        let all = fx
            .tasks
            .list(&TaskFilter::default(), &PaginationParams::default())
            .await
            .unwrap();
        assert_eq!(all.pagination.total_items, 1);
    }
}
