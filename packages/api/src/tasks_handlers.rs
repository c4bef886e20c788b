// ABOUTME: HTTP request handlers for task operations
// ABOUTME: Task CRUD, status submissions, and the remembered list filter

use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::auth::CurrentWorker;
use crate::response::{created_or_error, ok_or_error, validation_failure};
use taskhive_storage::filter::{completed_literal, split_tags, RememberedTaskFilter, TaskFilter};
use taskhive_storage::validator::{validate_task_input, ValidationError};
use taskhive_storage::{PaginationParams, Task, TaskInput};

use crate::AppState;

/// Session key holding the last-applied task list filter.
const TASK_FILTER_KEY: &str = "task_filter";

/// Raw task list query parameters, resolved into a `TaskFilter`.
#[derive(Debug, Deserialize)]
pub struct TaskListQuery {
    pub name: Option<String>,
    pub task_type: Option<String>,
    pub project: Option<String>,
    pub tags: Option<String>,
    pub is_completed: Option<String>,
    pub page: Option<i64>,
}

impl TaskListQuery {
    fn pagination(&self) -> PaginationParams {
        self.page.map(PaginationParams::new).unwrap_or_default()
    }

    fn filter(&self) -> TaskFilter {
        TaskFilter {
            name: self.name.clone().filter(|n| !n.trim().is_empty()),
            task_type_id: self.task_type.clone(),
            project_id: self.project.clone(),
            tags: self.tags.as_deref().map(split_tags).unwrap_or_default(),
            is_completed: self.is_completed.as_deref().and_then(completed_literal),
        }
    }

    fn remembered(&self) -> RememberedTaskFilter {
        RememberedTaskFilter {
            task_type_id: self.task_type.clone(),
            tags: self.tags.clone(),
            is_completed: self.is_completed.clone(),
        }
    }
}

/// A task as returned by the detail endpoint, with presentation flags.
#[derive(Serialize)]
pub struct TaskDetail {
    #[serde(flatten)]
    pub task: Task,
    #[serde(rename = "canEdit")]
    pub can_edit: bool,
    #[serde(rename = "isOverdue")]
    pub is_overdue: bool,
}

impl TaskDetail {
    fn new(task: Task, current: &CurrentWorker) -> Self {
        let can_edit = task.owner_id == current.id;
        let is_overdue = task.deadline < taskhive_core::today();
        Self {
            task,
            can_edit,
            is_overdue,
        }
    }
}

/// Reject assignee ids outside the requester's eligible set.
async fn check_assignees(
    state: &AppState,
    current: &CurrentWorker,
    assignee_ids: &[String],
) -> Result<(), Vec<ValidationError>> {
    if assignee_ids.is_empty() {
        return Ok(());
    }

    let eligible = state
        .workers
        .assignable_for(&current.id)
        .await
        .map_err(|_| {
            vec![ValidationError::new(
                "assigneeIds",
                "Could not resolve assignable workers",
            )]
        })?;

    let errors: Vec<ValidationError> = assignee_ids
        .iter()
        .filter(|id| !eligible.iter().any(|w| w.id == **id))
        .map(|id| {
            ValidationError::new(
                "assigneeIds",
                format!("Worker {} is not in any of your teams", id),
            )
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// List tasks matching the query, remembering the applied filter in the
/// session for redisplay.
pub async fn list_tasks(
    State(state): State<AppState>,
    current: CurrentWorker,
    Query(query): Query<TaskListQuery>,
) -> impl IntoResponse {
    let pagination = query.pagination();
    info!("Listing tasks (page: {})", pagination.page());

    let result = state.tasks.list(&query.filter(), &pagination).await;

    if result.is_ok() {
        let _ = state
            .sessions
            .set_value(&current.token, TASK_FILTER_KEY, &query.remembered())
            .await;
    }

    ok_or_error(result)
}

#[derive(Debug, Deserialize)]
pub struct FilterQuery {
    pub reset: Option<String>,
}

/// Return the remembered task list filter; a `reset` parameter clears it.
pub async fn get_task_filter(
    State(state): State<AppState>,
    current: CurrentWorker,
    Query(query): Query<FilterQuery>,
) -> impl IntoResponse {
    if query.reset.is_some() {
        let result = state
            .sessions
            .remove_value(&current.token, TASK_FILTER_KEY)
            .await;
        return ok_or_error(result.map(|_| RememberedTaskFilter::default()));
    }

    let result = state
        .sessions
        .get_value::<RememberedTaskFilter>(&current.token, TASK_FILTER_KEY)
        .await
        .map(Option::unwrap_or_default);

    ok_or_error(result)
}

/// Get a single task by ID
pub async fn get_task(
    State(state): State<AppState>,
    current: CurrentWorker,
    Path(task_id): Path<String>,
) -> impl IntoResponse {
    info!("Getting task: {}", task_id);

    let result = state
        .tasks
        .get(&task_id)
        .await
        .map(|task| TaskDetail::new(task, &current));

    ok_or_error(result)
}

/// Create a new task owned by the requester
pub async fn create_task(
    State(state): State<AppState>,
    current: CurrentWorker,
    Json(input): Json<TaskInput>,
) -> impl IntoResponse {
    info!("Creating task '{}'", input.name);

    let mut errors = validate_task_input(&input);
    if let Err(mut assignee_errors) = check_assignees(&state, &current, &input.assignee_ids).await {
        errors.append(&mut assignee_errors);
    }
    if !errors.is_empty() {
        return validation_failure(errors);
    }

    created_or_error(state.tasks.create(&current.id, input).await)
}

/// Fully update a task
pub async fn update_task(
    State(state): State<AppState>,
    current: CurrentWorker,
    Path(task_id): Path<String>,
    Json(input): Json<TaskInput>,
) -> impl IntoResponse {
    info!("Updating task: {}", task_id);

    let mut errors = validate_task_input(&input);
    if let Err(mut assignee_errors) = check_assignees(&state, &current, &input.assignee_ids).await {
        errors.append(&mut assignee_errors);
    }
    if !errors.is_empty() {
        return validation_failure(errors);
    }

    ok_or_error(state.tasks.update(&task_id, input).await)
}

/// Status submission: the assignee set is replaced with exactly the submitted
/// ids, and an omitted completion flag means explicit false.
#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    #[serde(default)]
    pub assignees: Vec<String>,
    #[serde(rename = "isCompleted", default)]
    pub is_completed: bool,
}

pub async fn set_task_status(
    State(state): State<AppState>,
    current: CurrentWorker,
    Path(task_id): Path<String>,
    Json(request): Json<StatusRequest>,
) -> impl IntoResponse {
    info!(
        "Status submission for task {} (completed: {})",
        task_id, request.is_completed
    );

    if let Err(errors) = check_assignees(&state, &current, &request.assignees).await {
        return validation_failure(errors);
    }

    ok_or_error(
        state
            .tasks
            .set_status(&task_id, &request.assignees, request.is_completed)
            .await,
    )
}

/// Delete a task
pub async fn delete_task(
    State(state): State<AppState>,
    Path(task_id): Path<String>,
) -> impl IntoResponse {
    info!("Deleting task: {}", task_id);

    ok_or_error(state.tasks.delete(&task_id).await.map(|_| "Task deleted"))
}
