// ABOUTME: Resolution of optional list-query parameters into storage filters
// ABOUTME: Tag-string splitting and the literal completion-flag comparison

use serde::{Deserialize, Serialize};

/// Substring search on name, shared by every list endpoint.
#[derive(Debug, Clone, Default)]
pub struct NameFilter {
    pub name: Option<String>,
}

impl NameFilter {
    pub fn new(name: Option<String>) -> Self {
        Self {
            name: name.filter(|n| !n.trim().is_empty()),
        }
    }
}

/// Composed filter for task list queries
#[derive(Debug, Clone, Default)]
pub struct TaskFilter {
    pub name: Option<String>,
    pub task_type_id: Option<String>,
    pub project_id: Option<String>,
    pub tags: Vec<String>,
    pub is_completed: Option<bool>,
}

/// Composed filter for project list queries
#[derive(Debug, Clone, Default)]
pub struct ProjectFilter {
    pub name: Option<String>,
    pub team_id: Option<String>,
    pub tags: Vec<String>,
    pub is_completed: Option<bool>,
}

/// The last-applied task filter selection, remembered per session so the
/// filter page can redisplay it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RememberedTaskFilter {
    #[serde(rename = "taskType")]
    pub task_type_id: Option<String>,
    pub tags: Option<String>,
    #[serde(rename = "isCompleted")]
    pub is_completed: Option<String>,
}

/// Interpret the completion query parameter.
///
/// The comparison is a literal two-value match: exactly "True" or exactly
/// "False". Any other representation ("true", "1", "yes") applies no filter
/// rather than raising an error, so near-misses are silently ignored.
pub fn completed_literal(raw: &str) -> Option<bool> {
    match raw {
        "True" => Some(true),
        "False" => Some(false),
        _ => None,
    }
}

/// Split a comma-separated tag string into trimmed, non-empty names.
///
/// Trailing separator characters (stray commas, whitespace) are stripped
/// before splitting so "urgent,backend," yields two names, not three.
pub fn split_tags(raw: &str) -> Vec<String> {
    raw.trim_end_matches([',', ' '])
        .split(',')
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}
