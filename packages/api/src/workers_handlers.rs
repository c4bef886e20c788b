// ABOUTME: HTTP request handlers for worker accounts
// ABOUTME: Registration, profile CRUD, and the self-only update/delete rule

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::CurrentWorker;
use crate::response::{created_or_error, ok_or_error, validation_failure, ApiResponse};
use crate::AppState;
use taskhive_storage::validator::ValidationError;
use taskhive_storage::{
    NameFilter, PaginationParams, Worker, WorkerCreateInput, WorkerUpdateInput,
};

#[derive(Debug, Deserialize)]
pub struct WorkerListQuery {
    pub username: Option<String>,
    pub page: Option<i64>,
}

/// A worker as returned by the detail endpoint.
#[derive(Serialize)]
pub struct WorkerDetail {
    #[serde(flatten)]
    pub worker: Worker,
    #[serde(rename = "canEdit")]
    pub can_edit: bool,
}

fn forbidden(message: &str) -> axum::response::Response {
    (
        StatusCode::FORBIDDEN,
        ResponseJson(ApiResponse::<()>::error(message.to_string())),
    )
        .into_response()
}

/// List workers with optional username search
pub async fn list_workers(
    State(state): State<AppState>,
    Query(query): Query<WorkerListQuery>,
) -> impl IntoResponse {
    let pagination = query
        .page
        .map(PaginationParams::new)
        .unwrap_or_default();
    info!("Listing workers (page: {})", pagination.page());

    let filter = NameFilter::new(query.username);
    ok_or_error(state.workers.list(&filter, &pagination).await)
}

/// Get a single worker by ID
pub async fn get_worker(
    State(state): State<AppState>,
    current: CurrentWorker,
    Path(worker_id): Path<String>,
) -> impl IntoResponse {
    info!("Getting worker: {}", worker_id);

    let result = state.workers.get(&worker_id).await.map(|worker| {
        let can_edit = worker.id == current.id;
        WorkerDetail { worker, can_edit }
    });

    ok_or_error(result)
}

/// Register a new worker account
pub async fn create_worker(
    State(state): State<AppState>,
    Json(input): Json<WorkerCreateInput>,
) -> impl IntoResponse {
    info!("Registering worker '{}'", input.username);

    let mut errors = Vec::new();
    if input.username.trim().is_empty() {
        errors.push(ValidationError::new("username", "Username is required"));
    }
    if input.password.len() < 8 {
        errors.push(ValidationError::new(
            "password",
            "Password must be at least 8 characters",
        ));
    }
    if !errors.is_empty() {
        return validation_failure(errors);
    }

    created_or_error(state.workers.create(input).await)
}

/// Update a worker profile. Workers may only update their own.
pub async fn update_worker(
    State(state): State<AppState>,
    current: CurrentWorker,
    Path(worker_id): Path<String>,
    Json(input): Json<WorkerUpdateInput>,
) -> impl IntoResponse {
    info!("Updating worker: {}", worker_id);

    if worker_id != current.id {
        return forbidden("Workers may only update their own profile");
    }

    ok_or_error(state.workers.update(&worker_id, input).await)
}

/// Delete a worker account. Workers may only delete their own.
pub async fn delete_worker(
    State(state): State<AppState>,
    current: CurrentWorker,
    Path(worker_id): Path<String>,
) -> impl IntoResponse {
    info!("Deleting worker: {}", worker_id);

    if worker_id != current.id {
        return forbidden("Workers may only delete their own account");
    }

    ok_or_error(
        state
            .workers
            .delete(&worker_id)
            .await
            .map(|_| "Worker deleted"),
    )
}
