// ABOUTME: HTTP request handlers for project operations
// ABOUTME: Project CRUD with team associations and filtered list queries

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::CurrentWorker;
use crate::response::{created_or_error, ok_or_error, validation_failure};
use crate::AppState;
use taskhive_storage::filter::{completed_literal, split_tags, ProjectFilter};
use taskhive_storage::validator::validate_project_input;
use taskhive_storage::{PaginationParams, Project, ProjectInput};

/// Raw project list query parameters, resolved into a `ProjectFilter`.
#[derive(Debug, Deserialize)]
pub struct ProjectListQuery {
    pub name: Option<String>,
    pub team: Option<String>,
    pub tags: Option<String>,
    pub is_completed: Option<String>,
    pub page: Option<i64>,
}

impl ProjectListQuery {
    fn pagination(&self) -> PaginationParams {
        self.page.map(PaginationParams::new).unwrap_or_default()
    }

    fn filter(&self) -> ProjectFilter {
        ProjectFilter {
            name: self.name.clone().filter(|n| !n.trim().is_empty()),
            team_id: self.team.clone(),
            tags: self.tags.as_deref().map(split_tags).unwrap_or_default(),
            is_completed: self.is_completed.as_deref().and_then(completed_literal),
        }
    }
}

/// A project as returned by the detail endpoint, with presentation flags.
#[derive(Serialize)]
pub struct ProjectDetail {
    #[serde(flatten)]
    pub project: Project,
    #[serde(rename = "canEdit")]
    pub can_edit: bool,
    #[serde(rename = "isOverdue")]
    pub is_overdue: bool,
}

impl ProjectDetail {
    fn new(project: Project, current: &CurrentWorker) -> Self {
        let can_edit = project.owner_id == current.id;
        let is_overdue = project.deadline < taskhive_core::today();
        Self {
            project,
            can_edit,
            is_overdue,
        }
    }
}

/// List projects matching the query
pub async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ProjectListQuery>,
) -> impl IntoResponse {
    let pagination = query.pagination();
    info!("Listing projects (page: {})", pagination.page());

    ok_or_error(state.projects.list(&query.filter(), &pagination).await)
}

/// Get a single project by ID
pub async fn get_project(
    State(state): State<AppState>,
    current: CurrentWorker,
    Path(project_id): Path<String>,
) -> impl IntoResponse {
    info!("Getting project: {}", project_id);

    let result = state
        .projects
        .get(&project_id)
        .await
        .map(|project| ProjectDetail::new(project, &current));

    ok_or_error(result)
}

/// Create a new project owned by the requester
pub async fn create_project(
    State(state): State<AppState>,
    current: CurrentWorker,
    Json(input): Json<ProjectInput>,
) -> impl IntoResponse {
    info!("Creating project '{}'", input.name);

    let errors = validate_project_input(&input);
    if !errors.is_empty() {
        return validation_failure(errors);
    }

    created_or_error(state.projects.create(&current.id, input).await)
}

/// Full project update with an optional completion toggle.
#[derive(Debug, Deserialize)]
pub struct ProjectUpdateRequest {
    #[serde(flatten)]
    pub input: ProjectInput,
    #[serde(rename = "isCompleted")]
    pub is_completed: Option<bool>,
}

pub async fn update_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
    Json(request): Json<ProjectUpdateRequest>,
) -> impl IntoResponse {
    info!("Updating project: {}", project_id);

    let errors = validate_project_input(&request.input);
    if !errors.is_empty() {
        return validation_failure(errors);
    }

    let result = match state.projects.update(&project_id, request.input).await {
        Ok(project) => match request.is_completed {
            Some(flag) if flag != project.is_completed => {
                state.projects.set_completed(&project_id, flag).await
            }
            _ => Ok(project),
        },
        Err(e) => Err(e),
    };

    ok_or_error(result)
}

/// Delete a project
pub async fn delete_project(
    State(state): State<AppState>,
    Path(project_id): Path<String>,
) -> impl IntoResponse {
    info!("Deleting project: {}", project_id);

    ok_or_error(
        state
            .projects
            .delete(&project_id)
            .await
            .map(|_| "Project deleted"),
    )
}
