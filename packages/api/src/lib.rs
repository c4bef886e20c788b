// ABOUTME: HTTP API layer for Taskhive providing REST endpoints and routing
// ABOUTME: Integration layer wiring the storage structs into axum routers

use std::sync::Arc;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::SqlitePool;

use taskhive_storage::{
    PositionStorage, ProjectStorage, SessionStorage, TaskStorage, TaskTypeStorage, TeamStorage,
    WorkerStorage,
};

pub mod auth;
pub mod misc_handlers;
pub mod projects_handlers;
pub mod response;
pub mod tasks_handlers;
pub mod teams_handlers;
pub mod workers_handlers;

/// Shared application state: one storage struct per entity over a common pool
#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub tasks: Arc<TaskStorage>,
    pub projects: Arc<ProjectStorage>,
    pub teams: Arc<TeamStorage>,
    pub workers: Arc<WorkerStorage>,
    pub task_types: Arc<TaskTypeStorage>,
    pub positions: Arc<PositionStorage>,
    pub sessions: Arc<SessionStorage>,
}

impl AppState {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            tasks: Arc::new(TaskStorage::new(pool.clone())),
            projects: Arc::new(ProjectStorage::new(pool.clone())),
            teams: Arc::new(TeamStorage::new(pool.clone())),
            workers: Arc::new(WorkerStorage::new(pool.clone())),
            task_types: Arc::new(TaskTypeStorage::new(pool.clone())),
            positions: Arc::new(PositionStorage::new(pool.clone())),
            sessions: Arc::new(SessionStorage::new(pool.clone())),
            pool,
        }
    }
}

/// Creates the full application router with the session middleware applied
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(misc_handlers::health_check))
        .route("/dashboard", get(misc_handlers::dashboard))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/task-types", get(misc_handlers::list_task_types))
        .route("/task-types", post(misc_handlers::create_task_type))
        .route("/positions", get(misc_handlers::list_positions))
        .merge(tasks_router())
        .merge(projects_router())
        .merge(workers_router())
        .merge(teams_router())
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_session,
        ))
        .with_state(state)
}

fn tasks_router() -> Router<AppState> {
    Router::new()
        .route("/tasks", get(tasks_handlers::list_tasks))
        .route("/tasks", post(tasks_handlers::create_task))
        .route("/tasks/filter", get(tasks_handlers::get_task_filter))
        .route("/tasks/{task_id}", get(tasks_handlers::get_task))
        .route("/tasks/{task_id}", put(tasks_handlers::update_task))
        .route("/tasks/{task_id}", delete(tasks_handlers::delete_task))
        .route(
            "/tasks/{task_id}/status",
            post(tasks_handlers::set_task_status),
        )
}

fn projects_router() -> Router<AppState> {
    Router::new()
        .route("/projects", get(projects_handlers::list_projects))
        .route("/projects", post(projects_handlers::create_project))
        .route("/projects/{project_id}", get(projects_handlers::get_project))
        .route("/projects/{project_id}", put(projects_handlers::update_project))
        .route(
            "/projects/{project_id}",
            delete(projects_handlers::delete_project),
        )
}

fn workers_router() -> Router<AppState> {
    Router::new()
        .route("/workers", get(workers_handlers::list_workers))
        .route("/workers", post(workers_handlers::create_worker))
        .route("/workers/{worker_id}", get(workers_handlers::get_worker))
        .route("/workers/{worker_id}", put(workers_handlers::update_worker))
        .route(
            "/workers/{worker_id}",
            delete(workers_handlers::delete_worker),
        )
}

fn teams_router() -> Router<AppState> {
    Router::new()
        .route("/teams", get(teams_handlers::list_teams))
        .route("/teams", post(teams_handlers::create_team))
        .route("/teams/{team_id}", get(teams_handlers::get_team))
        .route("/teams/{team_id}", put(teams_handlers::update_team))
        .route("/teams/{team_id}", delete(teams_handlers::delete_team))
        .route(
            "/teams/{team_id}/membership",
            post(teams_handlers::update_membership),
        )
        .route(
            "/teams/{team_id}/projects",
            put(teams_handlers::set_team_projects),
        )
}
