// ABOUTME: HTTP request handlers for team operations
// ABOUTME: Team CRUD, membership join/leave, and project association replacement

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson},
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::auth::CurrentWorker;
use crate::response::{created_or_error, ok_or_error, validation_failure, ApiResponse};
use crate::AppState;
use taskhive_storage::validator::ValidationError;
use taskhive_storage::{NameFilter, PaginationParams, StorageError, TeamInput};

#[derive(Debug, Deserialize)]
pub struct TeamListQuery {
    pub name: Option<String>,
    pub page: Option<i64>,
}

fn forbidden(message: &str) -> axum::response::Response {
    (
        StatusCode::FORBIDDEN,
        ResponseJson(ApiResponse::<()>::error(message.to_string())),
    )
        .into_response()
}

/// List teams with optional name search
pub async fn list_teams(
    State(state): State<AppState>,
    Query(query): Query<TeamListQuery>,
) -> impl IntoResponse {
    let pagination = query
        .page
        .map(PaginationParams::new)
        .unwrap_or_default();
    info!("Listing teams (page: {})", pagination.page());

    let filter = NameFilter::new(query.name);
    ok_or_error(state.teams.list(&filter, &pagination).await)
}

/// Get a single team by ID
pub async fn get_team(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
) -> impl IntoResponse {
    info!("Getting team: {}", team_id);

    ok_or_error(state.teams.get(&team_id).await)
}

/// Create a new team owned by the requester
pub async fn create_team(
    State(state): State<AppState>,
    current: CurrentWorker,
    Json(input): Json<TeamInput>,
) -> impl IntoResponse {
    info!("Creating team '{}'", input.name);

    if input.name.trim().is_empty() {
        return validation_failure(vec![ValidationError::new("name", "Team name is required")]);
    }

    created_or_error(state.teams.create(&current.id, input).await)
}

/// Rename a team. Only the owner may update it.
pub async fn update_team(
    State(state): State<AppState>,
    current: CurrentWorker,
    Path(team_id): Path<String>,
    Json(input): Json<TeamInput>,
) -> impl IntoResponse {
    info!("Updating team: {}", team_id);

    match state.teams.get(&team_id).await {
        Ok(team) if team.owner_id != current.id => {
            return forbidden("Only the team owner may update the team");
        }
        Ok(_) => {}
        Err(e) => return ok_or_error::<()>(Err(e)),
    }

    ok_or_error(state.teams.update(&team_id, input).await)
}

/// Delete a team. Only the owner may delete it.
pub async fn delete_team(
    State(state): State<AppState>,
    current: CurrentWorker,
    Path(team_id): Path<String>,
) -> impl IntoResponse {
    info!("Deleting team: {}", team_id);

    match state.teams.get(&team_id).await {
        Ok(team) if team.owner_id != current.id => {
            return forbidden("Only the team owner may delete the team");
        }
        Ok(_) => {}
        Err(e) => return ok_or_error::<()>(Err(e)),
    }

    ok_or_error(state.teams.delete(&team_id).await.map(|_| "Team deleted"))
}

/// Membership submission: at most one of `join` / `leave` is meaningful.
#[derive(Debug, Deserialize)]
pub struct MembershipRequest {
    pub join: Option<String>,
    pub leave: Option<String>,
}

/// Add or remove a worker from the team's member set. Joining an existing
/// member or leaving a non-member is a no-op.
pub async fn update_membership(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
    Json(request): Json<MembershipRequest>,
) -> impl IntoResponse {
    if let Some(worker_id) = &request.join {
        info!("Worker {} joining team {}", worker_id, team_id);

        // A join naming an unknown worker trips the foreign key.
        if let Err(StorageError::Sqlx(_)) = state.teams.add_member(&team_id, worker_id).await {
            return validation_failure(vec![ValidationError::new("join", "Unknown worker")]);
        }
    } else if let Some(worker_id) = &request.leave {
        info!("Worker {} leaving team {}", worker_id, team_id);

        if let Err(e) = state.teams.remove_member(&team_id, worker_id).await {
            return ok_or_error::<()>(Err(e));
        }
    }

    ok_or_error(state.teams.get(&team_id).await)
}

#[derive(Debug, Deserialize)]
pub struct TeamProjectsRequest {
    #[serde(rename = "projectIds", default)]
    pub project_ids: Vec<String>,
}

/// Replace the team's associated projects with exactly the submitted set
pub async fn set_team_projects(
    State(state): State<AppState>,
    Path(team_id): Path<String>,
    Json(request): Json<TeamProjectsRequest>,
) -> impl IntoResponse {
    info!(
        "Replacing projects of team {} ({} ids)",
        team_id,
        request.project_ids.len()
    );

    ok_or_error(
        state
            .teams
            .set_projects(&team_id, &request.project_ids)
            .await,
    )
}
