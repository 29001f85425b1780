//! Database module for todo-api
//!
//! Provides database connectivity, models, and repositories for persistent
//! storage using PostgreSQL and SQLx.

pub mod models;
pub mod pool;
pub mod repositories;

pub use models::*;
pub use pool::{DbConfig, DbError, health_check, run_migrations};
pub use repositories::{
    TodoRepository, TodoRepositoryError, TodoSort, UserRepository, UserRepositoryError,
};

pub use sqlx::PgPool;
