// ABOUTME: Worker account storage layer using SQLite
// ABOUTME: Credential hashing, profile CRUD, and the assignable-worker resolver

use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use sqlx::{Row, SqlitePool};
use tracing::debug;

use crate::filter::NameFilter;
use crate::pagination::{Page, PaginationParams};
use crate::types::{Worker, WorkerCreateInput, WorkerUpdateInput};
use crate::{is_unique_violation, StorageError, StorageResult};

pub struct WorkerStorage {
    pool: SqlitePool,
}

impl WorkerStorage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Register a new worker. The password is argon2-hashed before storage.
    pub async fn create(&self, input: WorkerCreateInput) -> StorageResult<Worker> {
        let id = taskhive_core::entity_id("worker");
        let password_hash = hash_password(&input.password)?;
        let now = Utc::now();

        debug!("Creating worker: {} (username: {})", id, input.username);

        let result = sqlx::query(
            r#"
            INSERT INTO workers (id, username, password_hash, first_name, last_name, email, position_id, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&id)
        .bind(&input.username)
        .bind(&password_hash)
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.email)
        .bind(&input.position_id)
        .bind(now)
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => self.get(&id).await,
            Err(e) if is_unique_violation(&e) => Err(StorageError::DuplicateName(input.username)),
            Err(e) => Err(StorageError::Sqlx(e)),
        }
    }

    /// Get a single worker by ID
    pub async fn get(&self, id: &str) -> StorageResult<Worker> {
        let row = sqlx::query("SELECT * FROM workers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?
            .ok_or(StorageError::NotFound)?;

        row_to_worker(&row)
    }

    /// Check a username/password pair, returning the worker on success.
    pub async fn verify_credentials(
        &self,
        username: &str,
        password: &str,
    ) -> StorageResult<Option<Worker>> {
        let row = sqlx::query("SELECT * FROM workers WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        let row = match row {
            Some(r) => r,
            None => return Ok(None),
        };

        let stored: String = row.try_get("password_hash")?;
        let parsed = PasswordHash::new(&stored)
            .map_err(|e| StorageError::Database(format!("corrupt password hash: {}", e)))?;

        if Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_err()
        {
            return Ok(None);
        }

        Ok(Some(row_to_worker(&row)?))
    }

    /// List workers with optional username search, paginated in username order
    pub async fn list(
        &self,
        filter: &NameFilter,
        params: &PaginationParams,
    ) -> StorageResult<Page<Worker>> {
        let pattern = filter.name.as_ref().map(|n| format!("%{}%", n));

        let count: i64 = match &pattern {
            Some(p) => {
                sqlx::query_scalar("SELECT COUNT(*) FROM workers WHERE username LIKE ?")
                    .bind(p)
                    .fetch_one(&self.pool)
                    .await?
            }
            None => {
                sqlx::query_scalar("SELECT COUNT(*) FROM workers")
                    .fetch_one(&self.pool)
                    .await?
            }
        };

        let rows = match &pattern {
            Some(p) => {
                sqlx::query(
                    "SELECT * FROM workers WHERE username LIKE ? ORDER BY username LIMIT ? OFFSET ?",
                )
                .bind(p)
                .bind(params.limit())
                .bind(params.offset())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query("SELECT * FROM workers ORDER BY username LIMIT ? OFFSET ?")
                    .bind(params.limit())
                    .bind(params.offset())
                    .fetch_all(&self.pool)
                    .await?
            }
        };

        let workers = rows
            .iter()
            .map(row_to_worker)
            .collect::<StorageResult<Vec<_>>>()?;

        Ok(Page::new(workers, params, count))
    }

    /// Update a worker profile; rehashes the password when one is submitted
    pub async fn update(&self, id: &str, input: WorkerUpdateInput) -> StorageResult<Worker> {
        debug!("Updating worker: {}", id);

        let password_hash = match &input.password {
            Some(password) => Some(hash_password(password)?),
            None => None,
        };

        let result = sqlx::query(
            r#"
            UPDATE workers
            SET first_name = ?,
                last_name = ?,
                email = ?,
                position_id = ?,
                password_hash = COALESCE(?, password_hash)
            WHERE id = ?
            "#,
        )
        .bind(&input.first_name)
        .bind(&input.last_name)
        .bind(&input.email)
        .bind(&input.position_id)
        .bind(&password_hash)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        self.get(id).await
    }

    /// Delete a worker account
    pub async fn delete(&self, id: &str) -> StorageResult<()> {
        debug!("Deleting worker: {}", id);

        let result = sqlx::query("DELETE FROM workers WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(StorageError::Sqlx)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }

        Ok(())
    }

    /// Workers eligible as task assignees for `worker_id`: the union of
    /// members of every team the requester belongs to. A worker sharing no
    /// team with the requester never appears, regardless of existing
    /// elsewhere.
    pub async fn assignable_for(&self, worker_id: &str) -> StorageResult<Vec<Worker>> {
        let rows = sqlx::query(
            r#"
            SELECT DISTINCT w.*
            FROM workers w
            JOIN team_members tm ON tm.worker_id = w.id
            WHERE tm.team_id IN (
                SELECT team_id FROM team_members WHERE worker_id = ?
            )
            ORDER BY w.username
            "#,
        )
        .bind(worker_id)
        .fetch_all(&self.pool)
        .await
        .map_err(StorageError::Sqlx)?;

        rows.iter().map(row_to_worker).collect()
    }
}

fn hash_password(password: &str) -> StorageResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StorageError::Database(format!("password hashing failed: {}", e)))
}

fn row_to_worker(row: &sqlx::sqlite::SqliteRow) -> StorageResult<Worker> {
    Ok(Worker {
        id: row.try_get("id")?,
        username: row.try_get("username")?,
        first_name: row.try_get("first_name")?,
        last_name: row.try_get("last_name")?,
        email: row.try_get("email")?,
        position_id: row.try_get("position_id")?,
        created_at: row.try_get("created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::teams::TeamStorage;
    use crate::test_support::test_pool;
    use crate::types::TeamInput;

    fn worker_input(username: &str) -> WorkerCreateInput {
        WorkerCreateInput {
            username: username.to_string(),
            password: "test1234".to_string(),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            position_id: None,
        }
    }

    #[tokio::test]
    async fn test_password_is_hashed_and_verifiable() {
        let storage = WorkerStorage::new(test_pool().await);

        let worker = storage.create(worker_input("alice")).await.unwrap();

        let verified = storage
            .verify_credentials("alice", "test1234")
            .await
            .unwrap();
        assert_eq!(verified.unwrap().id, worker.id);

        let rejected = storage
            .verify_credentials("alice", "wrong-password")
            .await
            .unwrap();
        assert!(rejected.is_none());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_rejected() {
        let storage = WorkerStorage::new(test_pool().await);

        storage.create(worker_input("alice")).await.unwrap();
        let err = storage.create(worker_input("alice")).await.unwrap_err();

        assert!(matches!(err, StorageError::DuplicateName(name) if name == "alice"));
    }

    #[tokio::test]
    async fn test_assignable_set_is_union_of_shared_teams() {
        let pool = test_pool().await;
        let workers = WorkerStorage::new(pool.clone());
        let teams = TeamStorage::new(pool);

        let requester = workers.create(worker_input("requester")).await.unwrap();
        let u2 = workers.create(worker_input("user_2")).await.unwrap();
        let u3 = workers.create(worker_input("user_3")).await.unwrap();
        let outsider = workers.create(worker_input("user_4")).await.unwrap();

        let team = teams
            .create(
                &requester.id,
                TeamInput {
                    name: "NewTeam".to_string(),
                    description: None,
                },
            )
            .await
            .unwrap();

        for member in [&requester, &u2, &u3] {
            teams.add_member(&team.id, &member.id).await.unwrap();
        }

        let eligible = workers.assignable_for(&requester.id).await.unwrap();
        let usernames: Vec<&str> = eligible.iter().map(|w| w.username.as_str()).collect();

        assert_eq!(usernames, vec!["requester", "user_2", "user_3"]);
        assert!(!eligible.iter().any(|w| w.id == outsider.id));
    }

    #[tokio::test]
    async fn test_worker_with_no_team_has_empty_assignable_set() {
        let storage = WorkerStorage::new(test_pool().await);

        let loner = storage.create(worker_input("loner")).await.unwrap();
        assert!(storage.assignable_for(&loner.id).await.unwrap().is_empty());
    }
}
