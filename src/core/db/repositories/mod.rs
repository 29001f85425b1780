//! Database repositories for todo-api
//!
//! Repositories encapsulate data access logic and provide a clean API for
//! business logic to interact with the database.

pub mod todo;
pub mod user;

pub use todo::{TodoRepository, TodoRepositoryError, TodoSort};
pub use user::{UserRepository, UserRepositoryError};
