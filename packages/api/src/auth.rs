// ABOUTME: Session-cookie authentication for API requests
// ABOUTME: Login/logout handlers, the session middleware, and the CurrentWorker extractor

use axum::{
    extract::{FromRequestParts, Query, Request, State},
    http::{header, request::Parts, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::response::{ok_or_error, storage_error_response, ApiResponse};
use crate::AppState;

pub const SESSION_COOKIE: &str = "taskhive_session";

/// The worker a valid session cookie resolved to, inserted into request
/// extensions by the middleware.
#[derive(Debug, Clone)]
pub struct CurrentWorker {
    pub id: String,
    pub token: String,
}

impl<S> FromRequestParts<S> for CurrentWorker
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentWorker>()
            .cloned()
            .ok_or((StatusCode::UNAUTHORIZED, "No active session"))
    }
}

/// Pull the session token out of the Cookie header, if present.
fn session_token(request: &Request) -> Option<String> {
    let cookies = request.headers().get(header::COOKIE)?.to_str().ok()?;

    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        (name == SESSION_COOKIE).then(|| value.to_string())
    })
}

fn is_public(request: &Request) -> bool {
    let path = request.uri().path();

    path == "/health" || (path == "/auth/login" && request.method() == axum::http::Method::POST)
}

/// Require a valid session on every route except login and the health check.
/// Unauthenticated requests are redirected to the login page with the
/// original path carried in `next`.
pub async fn require_session(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Response {
    if is_public(&request) {
        return next.run(request).await;
    }

    if let Some(token) = session_token(&request) {
        if let Ok(worker_id) = state.sessions.worker_for(&token).await {
            request
                .extensions_mut()
                .insert(CurrentWorker {
                    id: worker_id,
                    token,
                });
            return next.run(request).await;
        }
    }

    let login = format!("/auth/login?next={}", request.uri().path());
    Redirect::to(&login).into_response()
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginQuery {
    pub next: Option<String>,
}

#[derive(Serialize)]
pub struct LoginResponse {
    #[serde(rename = "workerId")]
    pub worker_id: String,
    pub next: String,
}

/// Verify credentials, start a session, and set the session cookie.
pub async fn login(
    State(state): State<AppState>,
    Query(query): Query<LoginQuery>,
    Json(request): Json<LoginRequest>,
) -> Response {
    info!("Login attempt for username: {}", request.username);

    let worker = match state
        .workers
        .verify_credentials(&request.username, &request.password)
        .await
    {
        Ok(Some(worker)) => worker,
        Ok(None) => {
            return (
                StatusCode::UNAUTHORIZED,
                Json(ApiResponse::<()>::error(
                    "Invalid username or password".to_string(),
                )),
            )
                .into_response();
        }
        Err(err) => return storage_error_response(err),
    };

    let token = match state.sessions.create(&worker.id).await {
        Ok(token) => token,
        Err(err) => return storage_error_response(err),
    };

    let cookie = format!("{}={}; HttpOnly; SameSite=Lax; Path=/", SESSION_COOKIE, token);
    let body = LoginResponse {
        worker_id: worker.id,
        next: query.next.unwrap_or_else(|| "/".to_string()),
    };

    let mut response = Json(ApiResponse::success(body)).into_response();
    if let Ok(value) = HeaderValue::from_str(&cookie) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}

/// End the current session and clear the cookie.
pub async fn logout(State(state): State<AppState>, current: CurrentWorker) -> Response {
    info!("Logging out worker: {}", current.id);

    let result = state.sessions.delete(&current.token).await;

    let mut response = ok_or_error(result.map(|_| "Logged out"));
    let expired = format!("{}=; HttpOnly; Max-Age=0; Path=/", SESSION_COOKIE);
    if let Ok(value) = HeaderValue::from_str(&expired) {
        response.headers_mut().insert(header::SET_COOKIE, value);
    }
    response
}
