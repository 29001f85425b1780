//! Todo API endpoints
//!
//! REST API endpoints for todo management, all bearer-authenticated:
//! - GET /api/todos - List the caller's todos (search, sort, paging)
//! - POST /api/todos - Create a new todo
//! - GET /api/todos/:id - Get a todo by ID
//! - PUT /api/todos/:id - Update a todo
//! - DELETE /api/todos/:id - Delete a todo
//! - PATCH /api/todos/:id/complete - Toggle completion

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{delete, get, patch, post, put},
};
use std::sync::Arc;
use uuid::Uuid;

use crate::core::auth::api::{ApiError, extract_bearer_token};
use crate::core::auth::jwt::{JwtError, JwtService};
use crate::core::db::models::TodoResponse;
use crate::core::todos::service::{
    CreateTodoRequest, ListTodosQuery, TodoError, TodoService, UpdateTodoRequest,
};

/// Todo API state containing the todo service and JWT service
#[derive(Clone)]
pub struct TodoApiState {
    pub todo_service: TodoService,
    pub jwt_service: JwtService,
}

/// Todo API error types
#[derive(Debug, thiserror::Error)]
pub enum TodoApiError {
    #[error("Todo not found")]
    NotFound,

    #[error("{0}")]
    Validation(String),

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<TodoError> for TodoApiError {
    fn from(err: TodoError) -> Self {
        match err {
            TodoError::NotFound => TodoApiError::NotFound,
            TodoError::TitleRequired | TodoError::TitleTooLong | TodoError::DescriptionTooLong => {
                TodoApiError::Validation(err.to_string())
            }
            TodoError::InternalError(detail) => TodoApiError::InternalError(detail),
        }
    }
}

impl From<JwtError> for TodoApiError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => TodoApiError::TokenExpired,
            _ => TodoApiError::InvalidToken,
        }
    }
}

impl IntoResponse for TodoApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            TodoApiError::NotFound => (StatusCode::NOT_FOUND, "TODO_NOT_FOUND"),
            TodoApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_FAILED"),
            TodoApiError::InvalidToken => (StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            TodoApiError::TokenExpired => (StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED"),
            TodoApiError::InternalError(detail) => {
                tracing::error!("todo internal error: {detail}");
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        };

        let message = match &self {
            TodoApiError::InternalError(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        (status, Json(ApiError::new(message, code))).into_response()
    }
}

/// Create the todo API router
pub fn todo_api_router(state: TodoApiState) -> Router {
    let state = Arc::new(state);

    Router::new()
        .route("/api/todos", get(list_todos_handler))
        .route("/api/todos", post(create_todo_handler))
        .route("/api/todos/{id}", get(get_todo_handler))
        .route("/api/todos/{id}", put(update_todo_handler))
        .route("/api/todos/{id}", delete(delete_todo_handler))
        .route("/api/todos/{id}/complete", patch(toggle_todo_handler))
        .with_state(state)
}

/// GET /api/todos
async fn list_todos_handler(
    State(state): State<Arc<TodoApiState>>,
    headers: HeaderMap,
    Query(query): Query<ListTodosQuery>,
) -> Result<Json<Vec<TodoResponse>>, TodoApiError> {
    let user_id = extract_user_id(&state.jwt_service, &headers)?;

    let todos = state.todo_service.list(user_id, &query).await?;

    Ok(Json(todos.into_iter().map(TodoResponse::from).collect()))
}

/// GET /api/todos/{id}
async fn get_todo_handler(
    State(state): State<Arc<TodoApiState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<TodoResponse>, TodoApiError> {
    let user_id = extract_user_id(&state.jwt_service, &headers)?;

    let todo = state
        .todo_service
        .get_by_id(id, user_id)
        .await?
        .ok_or(TodoApiError::NotFound)?;

    Ok(Json(todo.into()))
}

/// POST /api/todos
async fn create_todo_handler(
    State(state): State<Arc<TodoApiState>>,
    headers: HeaderMap,
    Json(request): Json<CreateTodoRequest>,
) -> Result<(StatusCode, Json<TodoResponse>), TodoApiError> {
    let user_id = extract_user_id(&state.jwt_service, &headers)?;

    let todo = state.todo_service.create(user_id, request).await?;

    Ok((StatusCode::CREATED, Json(todo.into())))
}

/// PUT /api/todos/{id}
async fn update_todo_handler(
    State(state): State<Arc<TodoApiState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateTodoRequest>,
) -> Result<Json<TodoResponse>, TodoApiError> {
    let user_id = extract_user_id(&state.jwt_service, &headers)?;

    let todo = state.todo_service.update(id, user_id, request).await?;

    Ok(Json(todo.into()))
}

/// DELETE /api/todos/{id}
async fn delete_todo_handler(
    State(state): State<Arc<TodoApiState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, TodoApiError> {
    let user_id = extract_user_id(&state.jwt_service, &headers)?;

    state.todo_service.delete(id, user_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// PATCH /api/todos/{id}/complete
async fn toggle_todo_handler(
    State(state): State<Arc<TodoApiState>>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
) -> Result<Json<TodoResponse>, TodoApiError> {
    let user_id = extract_user_id(&state.jwt_service, &headers)?;

    let todo = state.todo_service.toggle_complete(id, user_id).await?;

    Ok(Json(todo.into()))
}

/// Resolve the caller's user id from the bearer token
fn extract_user_id(jwt_service: &JwtService, headers: &HeaderMap) -> Result<Uuid, TodoApiError> {
    let token = extract_bearer_token(headers).map_err(|_| TodoApiError::InvalidToken)?;
    let claims = jwt_service.validate_access_token(&token)?;
    Ok(claims.user_id()?)
}
