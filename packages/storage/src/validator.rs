// ABOUTME: Domain validation for create/update submissions
// ABOUTME: Field-level checks that run before anything is persisted

use chrono::NaiveDate;
use serde::Serialize;

use crate::types::{ProjectInput, TaskInput};

/// A single failed field check, surfaced back to the submitter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        ValidationError {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Reject deadlines strictly before today; today itself is valid.
pub fn validate_deadline(deadline: NaiveDate) -> Result<NaiveDate, ValidationError> {
    if deadline < taskhive_core::today() {
        return Err(ValidationError::new(
            "deadline",
            "Deadline cannot be in the past!",
        ));
    }

    Ok(deadline)
}

/// Validates a task submission (create or full update)
pub fn validate_task_input(input: &TaskInput) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if input.name.trim().is_empty() {
        errors.push(ValidationError::new("name", "Task name is required"));
    }

    if input.task_type_id.trim().is_empty() {
        errors.push(ValidationError::new("taskTypeId", "Task type is required"));
    }

    if let Err(e) = validate_deadline(input.deadline) {
        errors.push(e);
    }

    errors
}

/// Validates a project submission (create or full update)
pub fn validate_project_input(input: &ProjectInput) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    if input.name.trim().is_empty() {
        errors.push(ValidationError::new("name", "Project name is required"));
    }

    if let Err(e) = validate_deadline(input.deadline) {
        errors.push(e);
    }

    errors
}
