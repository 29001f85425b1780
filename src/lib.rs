//! todo-api — per-user todo list service with JWT authentication.
//!
//! An HTTP API where each registered user manages their own todo items,
//! isolated from everyone else's. Sessions are carried by short-lived
//! signed access tokens and renewed through opaque, server-tracked
//! refresh tokens.

pub mod core;
