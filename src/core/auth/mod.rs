//! Authentication module for todo-api
//!
//! This module provides authentication functionality including:
//! - JWT access token generation and validation
//! - Opaque refresh token issuance and rotation
//! - User registration and login
//! - REST API endpoints for auth operations

pub mod api;
pub mod jwt;
pub mod service;

pub use api::{AuthApiState, auth_api_router};
pub use jwt::{Claims, JwtConfig, JwtError, JwtService};
pub use service::{AuthError, AuthService, LoginRequest, RefreshRequest, RegisterRequest};
