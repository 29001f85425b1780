//! Database models for todo-api
//!
//! Entity structs that map to the PostgreSQL tables, plus the wire-format
//! structs exposed by the API.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ============================================================================
// User Model
// ============================================================================

/// User entity representing a registered account.
///
/// `refresh_token` holds the SHA-256 hex digest of the single active refresh
/// token; the raw value only ever travels to the client.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing)]
    pub refresh_token: Option<String>,
    pub refresh_token_expires_at: Option<DateTime<Utc>>,
}

/// User without sensitive data (for API responses)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub last_login_at: Option<DateTime<Utc>>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
            last_login_at: user.last_login_at,
        }
    }
}

// ============================================================================
// Todo Model
// ============================================================================

/// Todo entity, owned by exactly one user
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Todo {
    pub id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
    pub created_at: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Todo data for creation
#[derive(Debug, Clone)]
pub struct CreateTodo {
    pub user_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Todo data for updates. Every field is written; this is a full overwrite,
/// not a patch.
#[derive(Debug, Clone)]
pub struct UpdateTodo {
    pub title: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub is_completed: bool,
}

/// Todo representation exposed by the API.
///
/// Field names follow the wire contract: `isCompleted`, `createdDate`,
/// `dueDate`. The owner id is deliberately absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TodoResponse {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub is_completed: bool,
    #[serde(rename = "createdDate")]
    pub created_at: DateTime<Utc>,
    pub due_date: Option<DateTime<Utc>>,
}

impl From<Todo> for TodoResponse {
    fn from(todo: Todo) -> Self {
        Self {
            id: todo.id,
            title: todo.title,
            description: todo.description,
            is_completed: todo.is_completed,
            created_at: todo.created_at,
            due_date: todo.due_date,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: Uuid::new_v4(),
            username: "testuser".to_string(),
            email: "test@example.com".to_string(),
            password_hash: "super_secret_hash".to_string(),
            created_at: Utc::now(),
            last_login_at: None,
            updated_at: Utc::now(),
            refresh_token: Some("deadbeef".repeat(8)),
            refresh_token_expires_at: Some(Utc::now() + chrono::Duration::days(7)),
        }
    }

    #[test]
    fn test_user_serialization_skips_secrets() {
        let user = sample_user();
        let json = serde_json::to_string(&user).unwrap();

        assert!(!json.contains("super_secret_hash"));
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("deadbeef"));
        assert!(json.contains("test@example.com"));
    }

    #[test]
    fn test_user_response_from_user() {
        let user = sample_user();
        let response: UserResponse = user.clone().into();

        assert_eq!(response.id, user.id);
        assert_eq!(response.username, user.username);
        assert_eq!(response.email, user.email);
        assert_eq!(response.created_at, user.created_at);
        assert!(response.last_login_at.is_none());
    }

    #[test]
    fn test_user_response_excludes_sensitive_fields() {
        let response: UserResponse = sample_user().into();
        let json = serde_json::to_string(&response).unwrap();

        assert!(!json.contains("password_hash"));
        assert!(!json.contains("refresh_token"));
    }

    #[test]
    fn test_todo_response_wire_field_names() {
        let todo = Todo {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Buy milk".to_string(),
            description: Some("2 liters".to_string()),
            is_completed: false,
            created_at: Utc::now(),
            due_date: Some(Utc::now() + chrono::Duration::days(1)),
            updated_at: None,
        };

        let response: TodoResponse = todo.clone().into();
        let json = serde_json::to_string(&response).unwrap();

        assert!(json.contains(r#""isCompleted":false"#));
        assert!(json.contains(r#""createdDate":"#));
        assert!(json.contains(r#""dueDate":"#));
        // The owner never appears on the wire
        assert!(!json.contains("user_id"));
        assert!(!json.contains("userId"));
    }

    #[test]
    fn test_todo_response_preserves_fields() {
        let todo = Todo {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "Write report".to_string(),
            description: None,
            is_completed: true,
            created_at: Utc::now(),
            due_date: None,
            updated_at: Some(Utc::now()),
        };

        let response: TodoResponse = todo.clone().into();

        assert_eq!(response.id, todo.id);
        assert_eq!(response.title, "Write report");
        assert!(response.description.is_none());
        assert!(response.is_completed);
        assert!(response.due_date.is_none());
    }

    #[test]
    fn test_todo_response_json_roundtrip() {
        let response = TodoResponse {
            id: Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap(),
            title: "Roundtrip".to_string(),
            description: Some("desc".to_string()),
            is_completed: false,
            created_at: Utc::now(),
            due_date: None,
        };

        let json = serde_json::to_string(&response).unwrap();
        let deserialized: TodoResponse = serde_json::from_str(&json).unwrap();

        assert_eq!(response.id, deserialized.id);
        assert_eq!(response.title, deserialized.title);
        assert_eq!(response.description, deserialized.description);
    }

    #[test]
    fn test_unicode_titles() {
        let todo = Todo {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            title: "买牛奶 🥛".to_string(),
            description: Some("пример".to_string()),
            is_completed: false,
            created_at: Utc::now(),
            due_date: None,
            updated_at: None,
        };

        let json = serde_json::to_string(&TodoResponse::from(todo)).unwrap();
        let back: TodoResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(back.title, "买牛奶 🥛");
    }
}
