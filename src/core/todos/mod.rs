//! Todo module for todo-api
//!
//! Ownership-scoped todo management: every operation is bound to the
//! authenticated user, and todos belonging to anyone else behave as if they
//! do not exist.

pub mod api;
pub mod service;

pub use api::{TodoApiState, todo_api_router};
pub use service::{
    CreateTodoRequest, ListTodosQuery, TodoError, TodoService, UpdateTodoRequest,
};
