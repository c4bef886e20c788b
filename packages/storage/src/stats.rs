// ABOUTME: Dashboard aggregate counts over the whole database
// ABOUTME: Single query module backing the landing-page summary

use serde::Serialize;
use sqlx::SqlitePool;

use crate::{StorageError, StorageResult};

/// Counts shown on the dashboard landing page.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardCounts {
    #[serde(rename = "completedProjects")]
    pub completed_projects: i64,
    #[serde(rename = "completedTasks")]
    pub completed_tasks: i64,
    pub teams: i64,
    pub workers: i64,
}

impl DashboardCounts {
    pub async fn load(pool: &SqlitePool) -> StorageResult<Self> {
        let completed_projects =
            sqlx::query_scalar("SELECT COUNT(*) FROM projects WHERE is_completed = 1")
                .fetch_one(pool)
                .await
                .map_err(StorageError::Sqlx)?;

        let completed_tasks =
            sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE is_completed = 1")
                .fetch_one(pool)
                .await
                .map_err(StorageError::Sqlx)?;

        let teams = sqlx::query_scalar("SELECT COUNT(*) FROM teams")
            .fetch_one(pool)
            .await
            .map_err(StorageError::Sqlx)?;

        let workers = sqlx::query_scalar("SELECT COUNT(*) FROM workers")
            .fetch_one(pool)
            .await
            .map_err(StorageError::Sqlx)?;

        Ok(Self {
            completed_projects,
            completed_tasks,
            teams,
            workers,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::projects::ProjectStorage;
    use crate::test_support::test_pool;
    use crate::types::{ProjectInput, WorkerCreateInput};
    use crate::workers::WorkerStorage;
    use pretty_assertions::assert_eq;

    #[tokio::test]
    async fn test_counts_reflect_completion() {
        let pool = test_pool().await;

        let worker = WorkerStorage::new(pool.clone())
            .create(WorkerCreateInput {
                username: "counter".to_string(),
                password: "test1234".to_string(),
                first_name: String::new(),
                last_name: String::new(),
                email: String::new(),
                position_id: None,
            })
            .await
            .unwrap();

        let projects = ProjectStorage::new(pool.clone());
        let done = projects
            .create(
                &worker.id,
                ProjectInput {
                    name: "done".to_string(),
                    description: None,
                    deadline: taskhive_core::today(),
                    priority: None,
                    team_ids: vec![],
                    tags: vec![],
                },
            )
            .await
            .unwrap();
        projects.set_completed(&done.id, true).await.unwrap();
        projects
            .create(
                &worker.id,
                ProjectInput {
                    name: "open".to_string(),
                    description: None,
                    deadline: taskhive_core::today(),
                    priority: None,
                    team_ids: vec![],
                    tags: vec![],
                },
            )
            .await
            .unwrap();

        let counts = DashboardCounts::load(&pool).await.unwrap();

        assert_eq!(counts.completed_projects, 1);
        assert_eq!(counts.completed_tasks, 0);
        assert_eq!(counts.teams, 0);
        assert_eq!(counts.workers, 1);
    }
}
