// ABOUTME: Handlers outside the main entity CRUD surface
// ABOUTME: Health check, dashboard counts, task types, and position search

use axum::{
    extract::{Query, State},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::response::{created_or_error, ok_or_error, validation_failure};
use crate::AppState;
use taskhive_storage::validator::ValidationError;
use taskhive_storage::{DashboardCounts, NameFilter, PaginationParams};

/// Liveness check, open to unauthenticated requests
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Dashboard summary counts
pub async fn dashboard(State(state): State<AppState>) -> impl IntoResponse {
    ok_or_error(DashboardCounts::load(&state.pool).await)
}

/// List every task type
pub async fn list_task_types(State(state): State<AppState>) -> impl IntoResponse {
    ok_or_error(state.task_types.list_all().await)
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskTypeRequest {
    pub name: String,
}

/// Create a new task type
pub async fn create_task_type(
    State(state): State<AppState>,
    Json(request): Json<CreateTaskTypeRequest>,
) -> impl IntoResponse {
    info!("Creating task type '{}'", request.name);

    if request.name.trim().is_empty() {
        return validation_failure(vec![ValidationError::new(
            "name",
            "Task type name is required",
        )]);
    }

    created_or_error(state.task_types.create(&request.name).await)
}

#[derive(Debug, Deserialize)]
pub struct PositionListQuery {
    pub name: Option<String>,
    pub page: Option<i64>,
}

/// List positions with optional name search
pub async fn list_positions(
    State(state): State<AppState>,
    Query(query): Query<PositionListQuery>,
) -> impl IntoResponse {
    let pagination = query
        .page
        .map(PaginationParams::new)
        .unwrap_or_default();
    info!("Listing positions (page: {})", pagination.page());

    let filter = NameFilter::new(query.name);
    ok_or_error(state.positions.list(&filter, &pagination).await)
}
