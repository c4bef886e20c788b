// ABOUTME: Project storage layer using SQLite
// ABOUTME: Project CRUD with team associations, tags, and filtered list queries

use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::filter::ProjectFilter;
use crate::pagination::{Page, PaginationParams};
use crate::tags::replace_tags;
use crate::types::{Priority, Project, ProjectInput};
use crate::{is_unique_violation, StorageError, StorageResult};

pub struct ProjectStorage {
    pool: SqlitePool,
}

impl ProjectStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new project owned by `owner_id`
    pub async fn create(&self, owner_id: &str, input: ProjectInput) -> StorageResult<Project> {
        let id = taskhive_core::entity_id("project");
        let priority = input.priority.unwrap_or_default();

        debug!("Creating project: {} (name: {})", id, input.name);

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let result = sqlx::query(
            r#"
            INSERT INTO projects (id, name, description, deadline, is_completed, priority, owner_id)
            VALUES (?, ?, ?, ?, 0, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.deadline)
        .bind(priority.as_str())
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

        for team_id in &input.team_ids {
            sqlx::query("INSERT OR IGNORE INTO project_teams (project_id, team_id) VALUES (?, ?)")
                .bind(&id)
                .bind(team_id)
                .execute(&mut *tx)
                .await
                .map_err(StorageError::Sqlx)?;
        }

        replace_tags(&mut *tx, "project_tags", "project_id", &id, &input.tags).await?;

        tx.commit().await.map_err(StorageError::Sqlx)?;

        self.get(&id).await
    }

    /// Get a single project by ID, including team ids and tag names
    pub async fn get(&self, id: &str) -> StorageResult<Project> {
        let row = sqlx::query("SELECT * FROM projects WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or(StorageError::NotFound)?;

        self.hydrate(&row).await
    }

    /// List projects matching `filter`, paginated in name order
    pub async fn list(
        &self,
        filter: &ProjectFilter,
        params: &PaginationParams,
    ) -> StorageResult<Page<Project>> {
        let (where_clause, binds) = build_where(filter);

        let count_query = format!("SELECT COUNT(*) FROM projects{}", where_clause);
        let mut count = sqlx::query_scalar(&count_query);
        for bind in &binds {
            count = count.bind(bind);
        }
        let total: i64 = count.fetch_one(&self.pool).await?;

        let list_query = format!(
            "SELECT * FROM projects{} ORDER BY name LIMIT ? OFFSET ?",
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

        let mut projects = Vec::with_capacity(rows.len());
        for row in &rows {
            projects.push(self.hydrate(row).await?);
        }

        Ok(Page::new(projects, params, total))
    }

    /// Fully update a project; team and tag sets are replaced, not merged
    pub async fn update(&self, id: &str, input: ProjectInput) -> StorageResult<Project> {
        let priority = input.priority.unwrap_or_default();

        debug!("Updating project: {}", id);

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        let result = sqlx::query(
            r#"
            UPDATE projects
            SET name = ?, description = ?, deadline = ?, priority = ?
            WHERE id = ?
            "#,
        )
        .bind(&input.name)
        .bind(&input.description)
        .bind(input.deadline)
        .bind(priority.as_str())
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

        sqlx::query("DELETE FROM project_teams WHERE project_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        for team_id in &input.team_ids {
            sqlx::query("INSERT OR IGNORE INTO project_teams (project_id, team_id) VALUES (?, ?)")
                .bind(id)
                .bind(team_id)
                .execute(&mut *tx)
                .await
                .map_err(StorageError::Sqlx)?;
        }

        replace_tags(&mut *tx, "project_tags", "project_id", id, &input.tags).await?;

        tx.commit().await.map_err(StorageError::Sqlx)?;

        self.get(id).await
    }

    /// Toggle the completion flag; both directions are permitted
    pub async fn set_completed(&self, id: &str, is_completed: bool) -> StorageResult<Project> {
        debug!("Setting project {} completed = {}", id, is_completed);

        let result = sqlx::query("UPDATE projects SET is_completed = ? WHERE id = ?")
            .bind(is_completed)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        self.get(id).await
    }

    /// Delete a project; its tasks and join rows cascade
    pub async fn delete(&self, id: &str) -> StorageResult<()> {
        debug!("Deleting project: {}", id);

        let result = sqlx::query("DELETE FROM projects WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    async fn hydrate(&self, row: &sqlx::sqlite::SqliteRow) -> StorageResult<Project> {
        let id: String = row.try_get("id")?;

        let team_ids: Vec<String> = sqlx::query_scalar(
            "SELECT team_id FROM project_teams pt JOIN teams t ON t.id = pt.team_id WHERE pt.project_id = ? ORDER BY t.name",
        )
        .bind(&id)
        .fetch_all(&self.pool)
        .await?;

        let tags: Vec<String> = sqlx::query_scalar(
            "SELECT g.name FROM project_tags pt JOIN tags g ON g.id = pt.tag_id WHERE pt.project_id = ? ORDER BY g.name",
        )
        .bind(&id)
        .fetch_all(&self.pool)
        .await?;

        let priority: String = row.try_get("priority")?;

        Ok(Project {
            id,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            deadline: row.try_get("deadline")?,
            is_completed: row.try_get("is_completed")?,
            priority: priority
                .parse::<Priority>()
                .map_err(StorageError::Database)?,
            owner_id: row.try_get("owner_id")?,
            team_ids,
            tags,
        })
    }
}

fn build_where(filter: &ProjectFilter) -> (String, Vec<String>) {
    let mut conditions = Vec::new();
    let mut binds = Vec::new();

    if let Some(name) = &filter.name {
        conditions.push("name LIKE ?".to_string());
        binds.push(format!("%{}%", name));
    }

    if let Some(team_id) = &filter.team_id {
        conditions.push(
            "id IN (SELECT project_id FROM project_teams WHERE team_id = ?)".to_string(),
        );
        binds.push(team_id.clone());
    }

    if let Some(is_completed) = filter.is_completed {
        conditions.push("is_completed = ?".to_string());
        binds.push(if is_completed { "1" } else { "0" }.to_string());
    }

    if !filter.tags.is_empty() {
        let placeholders = vec!["?"; filter.tags.len()].join(", ");
        conditions.push(format!(
            "id IN (SELECT pt.project_id FROM project_tags pt JOIN tags g ON g.id = pt.tag_id WHERE g.name IN ({}))",
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
    use crate::teams::TeamStorage;
    use crate::test_support::test_pool;
    use crate::types::{TeamInput, WorkerCreateInput};
    use crate::workers::WorkerStorage;

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

    fn project_input(name: &str) -> ProjectInput {
        ProjectInput {
            name: name.to_string(),
            description: None,
            deadline: taskhive_core::today(),
            priority: None,
            team_ids: vec![],
            tags: vec![],
        }
    }

    #[tokio::test]
    async fn test_create_with_teams_and_tags() {
        let pool = test_pool().await;
        let storage = ProjectStorage::new(pool.clone());
        let owner = seed_worker(&pool, "owner").await;

        let team = TeamStorage::new(pool.clone())
            .create(
                &owner,
                TeamInput {
                    name: "Backend".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap();

        let mut input = project_input("Website");
        input.team_ids = vec![team.id.clone()];
        input.tags = vec!["q3".to_string()];

        let project = storage.create(&owner, input).await.unwrap();

        assert_eq!(project.team_ids, vec![team.id]);
        assert_eq!(project.tags, vec!["q3"]);
        assert!(!project.is_completed);
    }

    #[tokio::test]
    async fn test_filter_by_team() {
        let pool = test_pool().await;
        let storage = ProjectStorage::new(pool.clone());
        let owner = seed_worker(&pool, "owner").await;

        let team = TeamStorage::new(pool.clone())
            .create(
                &owner,
                TeamInput {
                    name: "Backend".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap();

        let mut with_team = project_input("with_team");
        with_team.team_ids = vec![team.id.clone()];
        storage.create(&owner, with_team).await.unwrap();
        storage.create(&owner, project_input("without_team")).await.unwrap();

        let page = storage
            .list(
                &ProjectFilter {
                    team_id: Some(team.id),
                    ..Default::default()
                },
                &PaginationParams::default(),
            )
            .await
            .unwrap();

        assert_eq!(page.data.len(), 1);
        assert_eq!(page.data[0].name, "with_team");
    }

    #[tokio::test]
    async fn test_update_replaces_team_set() {
        let pool = test_pool().await;
        let storage = ProjectStorage::new(pool.clone());
        let owner = seed_worker(&pool, "owner").await;
        let teams = TeamStorage::new(pool.clone());

        let team_a = teams
            .create(
                &owner,
                TeamInput {
                    name: "A".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap();
        let team_b = teams
            .create(
                &owner,
                TeamInput {
                    name: "B".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap();

        let mut input = project_input("Website");
        input.team_ids = vec![team_a.id.clone()];
        let project = storage.create(&owner, input).await.unwrap();

        let mut update = project_input("Website");
        update.team_ids = vec![team_b.id.clone()];
        let updated = storage.update(&project.id, update).await.unwrap();

        assert_eq!(updated.team_ids, vec![team_b.id]);
    }

    #[tokio::test]
    async fn test_duplicate_project_name_rejected() {
        let pool = test_pool().await;
        let storage = ProjectStorage::new(pool.clone());
        let owner = seed_worker(&pool, "owner").await;

        storage.create(&owner, project_input("Website")).await.unwrap();
        let err = storage
            .create(&owner, project_input("Website"))
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::DuplicateName(_)));
    }
}
