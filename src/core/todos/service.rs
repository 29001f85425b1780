//! Todo service
//!
//! Business logic for per-user todo management. Every operation takes the
//! authenticated user's id as a mandatory scoping parameter; ownership is
//! part of the store predicate itself, never a separate check, so an
//! unowned todo is reported as absent rather than forbidden.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::core::db::models::{CreateTodo, Todo, UpdateTodo};
use crate::core::db::repositories::{TodoRepository, TodoRepositoryError, TodoSort};

/// Maximum title length in characters
const MAX_TITLE_LEN: usize = 100;

/// Maximum description length in characters
const MAX_DESCRIPTION_LEN: usize = 500;

/// Todo service error types
#[derive(Debug, thiserror::Error)]
pub enum TodoError {
    #[error("Todo not found")]
    NotFound,

    #[error("Title is required")]
    TitleRequired,

    #[error("Title can't be longer than 100 characters")]
    TitleTooLong,

    #[error("Description can't exceed 500 characters")]
    DescriptionTooLong,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<TodoRepositoryError> for TodoError {
    fn from(err: TodoRepositoryError) -> Self {
        TodoError::InternalError(err.to_string())
    }
}

/// Request for creating a new todo
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTodoRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
}

/// Request for updating a todo. All fields are written as given; this is a
/// full overwrite of the mutable fields, not a patch.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTodoRequest {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_completed: bool,
}

/// Query parameters for listing todos
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListTodosQuery {
    /// Substring to match against titles (case-sensitive)
    pub search: Option<String>,
    /// Sort key: "title" or "dueDate" (case-insensitive); anything else is
    /// silently ignored
    pub sort_by: Option<String>,
    /// Sort descending instead of ascending
    #[serde(default)]
    pub is_desc: bool,
    /// 1-based page number
    #[serde(default = "default_page")]
    pub page: i64,
    /// Items per page
    #[serde(default = "default_page_size")]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    10
}

impl Default for ListTodosQuery {
    fn default() -> Self {
        Self {
            search: None,
            sort_by: None,
            is_desc: false,
            page: default_page(),
            page_size: default_page_size(),
        }
    }
}

/// Translate 1-based page parameters into a LIMIT/OFFSET window.
///
/// The parameters carry no validated lower bound on the wire; since the
/// store rejects negative windows outright, out-of-range values are clamped
/// to zero and produce an empty page instead of an error.
fn page_window(page: i64, page_size: i64) -> (i64, i64) {
    let limit = page_size.max(0);
    let offset = (page - 1).max(0) * limit;
    (limit, offset)
}

/// Todo service for ownership-scoped queries and mutations
#[derive(Clone)]
pub struct TodoService {
    todo_repo: TodoRepository,
}

impl TodoService {
    /// Create a new todo service
    pub fn new(todo_repo: TodoRepository) -> Self {
        Self { todo_repo }
    }

    fn validate_title(title: &str) -> Result<(), TodoError> {
        if title.is_empty() {
            return Err(TodoError::TitleRequired);
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(TodoError::TitleTooLong);
        }
        Ok(())
    }

    fn validate_description(description: Option<&str>) -> Result<(), TodoError> {
        if let Some(desc) = description
            && desc.chars().count() > MAX_DESCRIPTION_LEN
        {
            return Err(TodoError::DescriptionTooLong);
        }
        Ok(())
    }

    /// List the user's todos.
    ///
    /// `search` keeps todos whose title contains the given substring;
    /// matching is case-sensitive. An unrecognized `sort_by` leaves the
    /// default insertion order untouched rather than failing. Pagination is
    /// `(page - 1) * page_size` with out-of-range values clamped to an
    /// empty window.
    pub async fn list(&self, user_id: Uuid, query: &ListTodosQuery) -> Result<Vec<Todo>, TodoError> {
        let sort = query.sort_by.as_deref().and_then(TodoSort::parse);
        let (limit, offset) = page_window(query.page, query.page_size);

        let todos = self
            .todo_repo
            .list_by_owner(
                user_id,
                query.search.as_deref(),
                sort,
                query.is_desc,
                limit,
                offset,
            )
            .await?;

        Ok(todos)
    }

    /// Get a single owned todo. Absence and other-owner cases are identical.
    pub async fn get_by_id(&self, id: Uuid, user_id: Uuid) -> Result<Option<Todo>, TodoError> {
        Ok(self.todo_repo.find_owned(id, user_id).await?)
    }

    /// Create a todo for the user
    pub async fn create(
        &self,
        user_id: Uuid,
        request: CreateTodoRequest,
    ) -> Result<Todo, TodoError> {
        Self::validate_title(&request.title)?;
        Self::validate_description(request.description.as_deref())?;

        let todo = self
            .todo_repo
            .create(&CreateTodo {
                user_id,
                title: request.title,
                description: request.description,
                due_date: request.due_date,
            })
            .await?;

        tracing::debug!("Todo {} created for user {}", todo.id, user_id);

        Ok(todo)
    }

    /// Overwrite an owned todo's fields
    pub async fn update(
        &self,
        id: Uuid,
        user_id: Uuid,
        request: UpdateTodoRequest,
    ) -> Result<Todo, TodoError> {
        Self::validate_title(&request.title)?;
        Self::validate_description(request.description.as_deref())?;

        self.todo_repo
            .update_owned(
                id,
                user_id,
                &UpdateTodo {
                    title: request.title,
                    description: request.description,
                    due_date: request.due_date,
                    is_completed: request.is_completed,
                },
            )
            .await?
            .ok_or(TodoError::NotFound)
    }

    /// Permanently delete an owned todo
    pub async fn delete(&self, id: Uuid, user_id: Uuid) -> Result<(), TodoError> {
        if !self.todo_repo.delete_owned(id, user_id).await? {
            return Err(TodoError::NotFound);
        }

        tracing::debug!("Todo {} deleted for user {}", id, user_id);

        Ok(())
    }

    /// Flip an owned todo's completion flag
    pub async fn toggle_complete(&self, id: Uuid, user_id: Uuid) -> Result<Todo, TodoError> {
        self.todo_repo
            .toggle_owned(id, user_id)
            .await?
            .ok_or(TodoError::NotFound)
    }
}
