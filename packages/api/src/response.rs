// ABOUTME: Shared API response types and error handling
// ABOUTME: Provides consistent response format across all API endpoints

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json as ResponseJson, Response},
};
use serde::Serialize;

use taskhive_storage::{StorageError, ValidationError};

/// Standard API response wrapper
#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

/// Body for a failed validation: the envelope plus the per-field errors.
#[derive(Serialize)]
struct ValidationBody {
    success: bool,
    error: String,
    errors: Vec<ValidationError>,
}

/// 400 response listing the fields that failed validation.
pub fn validation_failure(errors: Vec<ValidationError>) -> Response {
    (
        StatusCode::BAD_REQUEST,
        ResponseJson(ValidationBody {
            success: false,
            error: "Validation failed".to_string(),
            errors,
        }),
    )
        .into_response()
}

/// Convert a storage result into a JSON response, mapping errors through
/// `StorageError`'s `IntoResponse`.
pub fn ok_or_error<T: Serialize>(result: Result<T, StorageError>) -> Response {
    match result {
        Ok(data) => ResponseJson(ApiResponse::success(data)).into_response(),
        Err(err) => storage_error_response(err),
    }
}

/// Same as `ok_or_error` but replies 201 on success.
pub fn created_or_error<T: Serialize>(result: Result<T, StorageError>) -> Response {
    match result {
        Ok(data) => (
            StatusCode::CREATED,
            ResponseJson(ApiResponse::success(data)),
        )
            .into_response(),
        Err(err) => storage_error_response(err),
    }
}

/// Convert storage errors to HTTP responses
pub fn storage_error_response(err: StorageError) -> Response {
    let (status, message) = match &err {
        StorageError::NotFound => (StatusCode::NOT_FOUND, err.to_string()),
        StorageError::DuplicateName(_) => (StatusCode::CONFLICT, err.to_string()),
        StorageError::Database(_) | StorageError::Sqlx(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Database error".to_string(),
        ),
        _ => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Internal server error".to_string(),
        ),
    };

    (status, ResponseJson(ApiResponse::<()>::error(message))).into_response()
}
