// ABOUTME: Team storage layer using SQLite
// ABOUTME: Team CRUD plus membership toggles and project association replacement

use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::filter::NameFilter;
use crate::pagination::{Page, PaginationParams};
use crate::types::{Team, TeamInput};
use crate::{is_unique_violation, StorageError, StorageResult};

pub struct TeamStorage {
    pool: SqlitePool,
}

impl TeamStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Create a new team owned by `owner_id`
    pub async fn create(&self, owner_id: &str, input: TeamInput) -> StorageResult<Team> {
        let id = taskhive_core::entity_id("team");

        debug!("Creating team: {} (name: {})", id, input.name);

        let result = sqlx::query("INSERT INTO teams (id, name, description, owner_id) VALUES (?, ?, ?, ?)")
            .bind(&id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(owner_id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => self.get(&id).await,
            Err(e) if is_unique_violation(&e) => Err(StorageError::DuplicateName(input.name)),
            Err(e) => Err(StorageError::Sqlx(e)),
        }
    }

    /// Get a single team by ID, including member and project id sets
    pub async fn get(&self, id: &str) -> StorageResult<Team> {
        let row = sqlx::query("SELECT * FROM teams WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or(StorageError::NotFound)?;

        self.hydrate(&row).await
    }

    /// List teams with optional name search, paginated in name order
    pub async fn list(
        &self,
        filter: &NameFilter,
        params: &PaginationParams,
    ) -> StorageResult<Page<Team>> {
        let pattern = filter.name.as_ref().map(|n| format!("%{}%", n));

        let count: i64 = match &pattern {
            Some(p) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM teams WHERE name LIKE ?")
                    .bind(p)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM teams")
                    .fetch_one(&self.pool)
                    .await?
            }
        };

        let rows = match &pattern {
            Some(p) => {
                sqlx::query("SELECT * FROM teams WHERE name LIKE ? ORDER BY name LIMIT ? OFFSET ?")
                    .bind(p)
                    .bind(params.limit())
                    .bind(params.offset())
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                sqlx::query("SELECT * FROM teams ORDER BY name LIMIT ? OFFSET ?")
                    .bind(params.limit())
                    .bind(params.offset())
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        let mut teams = Vec::with_capacity(rows.len());
        for row in &rows {
            teams.push(self.hydrate(row).await?);
        }

        Ok(Page::new(teams, params, count))
    }

    /// Rename a team or change its description
    pub async fn update(&self, id: &str, input: TeamInput) -> StorageResult<Team> {
        debug!("Updating team: {}", id);

        let result = sqlx::query("UPDATE teams SET name = ?, description = ? WHERE id = ?")
            .bind(&input.name)
            .bind(&input.description)
            .bind(id)
            .execute(&self.pool)
            .await;

        match result {
            Ok(r) if r.rows_affected() == 0 => Err(StorageError::NotFound),
            Ok(_) => self.get(id).await,
            Err(e) if is_unique_violation(&e) => Err(StorageError::DuplicateName(input.name)),
            Err(e) => Err(StorageError::Sqlx(e)),
        }
    }

    /// Delete a team; membership and project associations cascade
    pub async fn delete(&self, id: &str) -> StorageResult<()> {
        debug!("Deleting team: {}", id);

        let result = sqlx::query("DELETE FROM teams WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    /// Add a worker to the team's member set. Adding an existing member is a
    /// no-op, not an error.
    pub async fn add_member(&self, team_id: &str, worker_id: &str) -> StorageResult<()> {
        debug!("Adding member {} to team {}", worker_id, team_id);

        sqlx::query("INSERT OR IGNORE INTO team_members (team_id, worker_id) VALUES (?, ?)")
            .bind(team_id)
            .bind(worker_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(())
    }

    /// Remove a worker from the team's member set. Removing an absent or
    /// unknown member is a no-op.
    pub async fn remove_member(&self, team_id: &str, worker_id: &str) -> StorageResult<()> {
        debug!("Removing member {} from team {}", worker_id, team_id);

        sqlx::query("DELETE FROM team_members WHERE team_id = ? AND worker_id = ?")
            .bind(team_id)
            .bind(worker_id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(())
    }

    /// Replace the team's associated projects with exactly `project_ids`
    /// (set semantics, not a merge).
    pub async fn set_projects(&self, team_id: &str, project_ids: &[String]) -> StorageResult<Team> {
        debug!("Setting {} projects on team {}", project_ids.len(), team_id);

        let mut tx = self.pool.begin().await.map_err(StorageError::Sqlx)?;

        sqlx::query("DELETE FROM project_teams WHERE team_id = ?")
            .bind(team_id)
            .execute(&mut *tx)
            .await
            .map_err(StorageError::Sqlx)?;

        for project_id in project_ids {
            sqlx::query("INSERT OR IGNORE INTO project_teams (project_id, team_id) VALUES (?, ?)")
                .bind(project_id)
                .bind(team_id)
                .execute(&mut *tx)
                .await
                .map_err(StorageError::Sqlx)?;
        }

        tx.commit().await.map_err(StorageError::Sqlx)?;

        self.get(team_id).await
    }

    async fn hydrate(&self, row: &sqlx::sqlite::SqliteRow) -> StorageResult<Team> {
        let id: String = row.try_get("id")?;

        let member_ids: Vec<String> = sqlx::query_scalar(
            "SELECT worker_id FROM team_members tm JOIN workers w ON w.id = tm.worker_id WHERE tm.team_id = ? ORDER BY w.username",
        )
        .bind(&id)
        .fetch_all(&self.pool)
        .await?;

        let project_ids: Vec<String> = sqlx::query_scalar(
            "SELECT project_id FROM project_teams pt JOIN projects p ON p.id = pt.project_id WHERE pt.team_id = ? ORDER BY p.name",
        )
        .bind(&id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Team {
            id,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            owner_id: row.try_get("owner_id")?,
            member_ids,
            project_ids,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_pool;
    use crate::types::WorkerCreateInput;
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

    fn team_input(name: &str) -> TeamInput {
        TeamInput {
            name: name.to_string(),
            description: None,
        }
    }

    #[tokio::test]
    async fn test_join_twice_is_idempotent() {
        let pool = test_pool().await;
        let storage = TeamStorage::new(pool.clone());
        let owner = seed_worker(&pool, "owner").await;

        let team = storage.create(&owner, team_input("NewTeam")).await.unwrap();

        storage.add_member(&team.id, &owner).await.unwrap();
        storage.add_member(&team.id, &owner).await.unwrap();

        let team = storage.get(&team.id).await.unwrap();
        assert_eq!(team.member_ids, vec![owner]);
    }

    #[tokio::test]
    async fn test_leave_when_absent_is_a_noop() {
        let pool = test_pool().await;
        let storage = TeamStorage::new(pool.clone());
        let owner = seed_worker(&pool, "owner").await;
        let other = seed_worker(&pool, "other").await;

        let team = storage.create(&owner, team_input("NewTeam")).await.unwrap();

        // Never joined, and an id that matches no worker at all.
        storage.remove_member(&team.id, &other).await.unwrap();
        storage.remove_member(&team.id, "worker-missing").await.unwrap();

        assert!(storage.get(&team.id).await.unwrap().member_ids.is_empty());
    }

    #[tokio::test]
    async fn test_set_projects_replaces_not_merges() {
        let pool = test_pool().await;
        let storage = TeamStorage::new(pool.clone());
        let owner = seed_worker(&pool, "owner").await;

        let team = storage.create(&owner, team_input("NewTeam")).await.unwrap();

        let deadline = taskhive_core::today();
        let projects = crate::projects::ProjectStorage::new(pool.clone());
        let mut ids = Vec::new();
        for name in ["proj_a", "proj_b", "proj_c"] {
            let project = projects
                .create(
                    &owner,
                    crate::types::ProjectInput {
                        name: name.to_string(),
                        description: None,
                        deadline,
                        priority: None,
                        team_ids: vec![],
                        tags: vec![],
                    },
                )
                .await
                .unwrap();
            ids.push(project.id);
        }

        let team = storage
            .set_projects(&team.id, &ids[..2].to_vec())
            .await
            .unwrap();
        assert_eq!(team.project_ids.len(), 2);

        let team = storage
            .set_projects(&team.id, std::slice::from_ref(&ids[2]))
            .await
            .unwrap();
        assert_eq!(team.project_ids, vec![ids[2].clone()]);
    }

    #[tokio::test]
    async fn test_duplicate_team_name_rejected() {
        let pool = test_pool().await;
        let storage = TeamStorage::new(pool.clone());
        let owner = seed_worker(&pool, "owner").await;

        storage.create(&owner, team_input("NewTeam")).await.unwrap();
        let err = storage
            .create(&owner, team_input("NewTeam"))
            .await
            .unwrap_err();

        assert!(matches!(err, StorageError::DuplicateName(_)));
    }
}
