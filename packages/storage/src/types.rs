use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub use taskhive_core::Priority;

/// A category of task (e.g. "Bug", "New feature")
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskType {
    pub id: String,
    pub name: String,
}

/// A job position referenced by workers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Position {
    pub id: String,
    pub name: String,
}

/// A worker account. The password hash never leaves the storage layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Worker {
    pub id: String,
    pub username: String,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    pub email: String,
    #[serde(rename = "positionId")]
    pub position_id: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

/// A named group of workers, associated with zero or more projects
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[serde(rename = "ownerId")]
    pub owner_id: String,
    #[serde(rename = "memberIds")]
    pub member_ids: Vec<String>,
    #[serde(rename = "projectIds")]
    pub project_ids: Vec<String>,
}

/// A task with a deadline, assignees, and free-form tags
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub deadline: NaiveDate,
    #[serde(rename = "isCompleted")]
    pub is_completed: bool,
    pub priority: Priority,
    #[serde(rename = "taskTypeId")]
    pub task_type_id: String,
    #[serde(rename = "projectId")]
    pub project_id: Option<String>,
    #[serde(rename = "ownerId")]
    pub owner_id: String,
    #[serde(rename = "assigneeIds")]
    pub assignee_ids: Vec<String>,
    pub tags: Vec<String>,
}

/// A project grouping tasks, worked on by teams
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub deadline: NaiveDate,
    #[serde(rename = "isCompleted")]
    pub is_completed: bool,
    pub priority: Priority,
    #[serde(rename = "ownerId")]
    pub owner_id: String,
    #[serde(rename = "teamIds")]
    pub team_ids: Vec<String>,
    pub tags: Vec<String>,
}

/// Input for creating a task. Updates submit the same full set of fields;
/// there is no partial patch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskInput {
    pub name: String,
    pub description: Option<String>,
    pub deadline: NaiveDate,
    pub priority: Option<Priority>,
    #[serde(rename = "taskTypeId")]
    pub task_type_id: String,
    #[serde(rename = "projectId")]
    pub project_id: Option<String>,
    #[serde(rename = "assigneeIds", default)]
    pub assignee_ids: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Input for creating or fully updating a project
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInput {
    pub name: String,
    pub description: Option<String>,
    pub deadline: NaiveDate,
    pub priority: Option<Priority>,
    #[serde(rename = "teamIds", default)]
    pub team_ids: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Input for registering a worker
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerCreateInput {
    pub username: String,
    pub password: String,
    #[serde(rename = "firstName", default)]
    pub first_name: String,
    #[serde(rename = "lastName", default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "positionId")]
    pub position_id: Option<String>,
}

/// Input for updating a worker profile
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerUpdateInput {
    #[serde(rename = "firstName", default)]
    pub first_name: String,
    #[serde(rename = "lastName", default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(rename = "positionId")]
    pub position_id: Option<String>,
    /// When present, the password is rehashed and replaced.
    pub password: Option<String>,
}

/// Input for creating or renaming a team
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamInput {
    pub name: String,
    pub description: Option<String>,
}
