//! Todo repository for database operations
//!
//! Every query that touches an existing row carries the full
//! `(id AND user_id)` predicate in a single statement, so a todo belonging
//! to another user is indistinguishable from one that does not exist.

use sqlx::PgPool;
use uuid::Uuid;

use crate::core::db::models::{CreateTodo, Todo, UpdateTodo};

const TODO_COLUMNS: &str =
    "id, user_id, title, description, is_completed, created_at, due_date, updated_at";

/// Todo repository error types
#[derive(Debug, thiserror::Error)]
pub enum TodoRepositoryError {
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Recognized sort keys for listing todos.
///
/// Parsed case-insensitively from the `sortBy` query parameter; anything
/// else parses to `None` and leaves the default insertion order untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TodoSort {
    Title,
    DueDate,
}

impl TodoSort {
    /// Parse a sort key. Unrecognized values yield `None` (silent no-op).
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_lowercase().as_str() {
            "title" => Some(TodoSort::Title),
            "duedate" => Some(TodoSort::DueDate),
            _ => None,
        }
    }
}

/// Escape LIKE wildcards so a search term matches literally.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

/// Todo repository for database operations
#[derive(Clone)]
pub struct TodoRepository {
    pool: PgPool,
}

impl TodoRepository {
    /// Create a new todo repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create a new todo for its owner
    pub async fn create(&self, dto: &CreateTodo) -> Result<Todo, TodoRepositoryError> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            r#"
            INSERT INTO todos (user_id, title, description, due_date)
            VALUES ($1, $2, $3, $4)
            RETURNING {TODO_COLUMNS}
            "#,
        ))
        .bind(dto.user_id)
        .bind(&dto.title)
        .bind(&dto.description)
        .bind(dto.due_date)
        .fetch_one(&self.pool)
        .await?;

        Ok(todo)
    }

    /// Find a todo by id, scoped to its owner. Returns `None` both when the
    /// row is absent and when it belongs to someone else.
    pub async fn find_owned(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Todo>, TodoRepositoryError> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            r#"
            SELECT {TODO_COLUMNS}
            FROM todos
            WHERE id = $1 AND user_id = $2
            "#,
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(todo)
    }

    /// List a user's todos with optional title search, sorting and paging.
    ///
    /// The search is a case-sensitive substring match on the title (`LIKE`
    /// with escaped wildcards). Without a sort key, rows come back in
    /// insertion order.
    pub async fn list_by_owner(
        &self,
        user_id: Uuid,
        search: Option<&str>,
        sort: Option<TodoSort>,
        descending: bool,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Todo>, TodoRepositoryError> {
        let direction = if descending { "DESC" } else { "ASC" };
        let order_by = match sort {
            Some(TodoSort::Title) => format!("title {direction}"),
            Some(TodoSort::DueDate) => format!("due_date {direction}"),
            None => "created_at ASC".to_string(),
        };

        let todos = if let Some(term) = search {
            let pattern = format!("%{}%", escape_like(term));
            sqlx::query_as::<_, Todo>(&format!(
                r#"
                SELECT {TODO_COLUMNS}
                FROM todos
                WHERE user_id = $1 AND title LIKE $2
                ORDER BY {order_by}
                LIMIT $3 OFFSET $4
                "#,
            ))
            .bind(user_id)
            .bind(&pattern)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?
        } else {
            sqlx::query_as::<_, Todo>(&format!(
                r#"
                SELECT {TODO_COLUMNS}
                FROM todos
                WHERE user_id = $1
                ORDER BY {order_by}
                LIMIT $2 OFFSET $3
                "#,
            ))
            .bind(user_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(&self.pool)
            .await?
        };

        Ok(todos)
    }

    /// Overwrite an owned todo's fields and stamp `updated_at`, in one
    /// statement. Returns `None` when no owned row matches.
    pub async fn update_owned(
        &self,
        id: Uuid,
        user_id: Uuid,
        updates: &UpdateTodo,
    ) -> Result<Option<Todo>, TodoRepositoryError> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            r#"
            UPDATE todos
            SET title = $3,
                description = $4,
                due_date = $5,
                is_completed = $6,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {TODO_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(user_id)
        .bind(&updates.title)
        .bind(&updates.description)
        .bind(updates.due_date)
        .bind(updates.is_completed)
        .fetch_optional(&self.pool)
        .await?;

        Ok(todo)
    }

    /// Flip an owned todo's completion flag in a single statement.
    /// Returns `None` when no owned row matches.
    pub async fn toggle_owned(
        &self,
        id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Todo>, TodoRepositoryError> {
        let todo = sqlx::query_as::<_, Todo>(&format!(
            r#"
            UPDATE todos
            SET is_completed = NOT is_completed,
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING {TODO_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(todo)
    }

    /// Permanently delete an owned todo. Returns `false` when no owned row
    /// matched.
    pub async fn delete_owned(&self, id: Uuid, user_id: Uuid) -> Result<bool, TodoRepositoryError> {
        let result = sqlx::query(
            r#"
            DELETE FROM todos
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
