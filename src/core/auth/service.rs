//! Authentication service
//!
//! Business logic for user registration, login, and refresh-token rotation.
//! Coordinates between the user repository and the JWT service.
//!
//! A session moves through three states: unauthenticated, authenticated
//! (access token valid), and expired (access token dead, refresh token
//! alive). `refresh` moves an expired session back to authenticated; an
//! expired or rotated-away refresh token drops it to unauthenticated.

use uuid::Uuid;

use crate::core::auth::jwt::{JwtError, JwtService};
use crate::core::db::models::User;
use crate::core::db::repositories::{UserRepository, UserRepositoryError};

/// Authentication service error types
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Unknown username and wrong password produce this same variant, so a
    /// caller cannot tell registered usernames apart from unknown ones.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid or expired refresh token")]
    InvalidRefreshToken,

    #[error("User not found")]
    UserNotFound,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Username already taken")]
    UsernameAlreadyExists,

    #[error("Invalid token")]
    InvalidToken,

    #[error("Token expired")]
    TokenExpired,

    #[error("Invalid email format")]
    InvalidEmail,

    #[error("Invalid username format")]
    InvalidUsername,

    #[error("Password must be at least 6 characters long")]
    PasswordTooShort,

    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<UserRepositoryError> for AuthError {
    fn from(err: UserRepositoryError) -> Self {
        match err {
            UserRepositoryError::NotFound => AuthError::UserNotFound,
            UserRepositoryError::EmailAlreadyExists => AuthError::EmailAlreadyExists,
            UserRepositoryError::UsernameAlreadyExists => AuthError::UsernameAlreadyExists,
            _ => AuthError::InternalError(err.to_string()),
        }
    }
}

impl From<JwtError> for AuthError {
    fn from(err: JwtError) -> Self {
        match err {
            JwtError::Expired => AuthError::TokenExpired,
            JwtError::InvalidToken => AuthError::InvalidToken,
            _ => AuthError::InternalError(err.to_string()),
        }
    }
}

/// Registration request data
#[derive(Debug, Clone, serde::Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

/// Login request data
#[derive(Debug, Clone, serde::Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Token refresh request: the user's email plus the opaque refresh token
#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub email: String,
    pub refresh_token: String,
}

/// Authentication service
#[derive(Clone)]
pub struct AuthService {
    user_repo: UserRepository,
    jwt_service: JwtService,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(user_repo: UserRepository, jwt_service: JwtService) -> Self {
        Self {
            user_repo,
            jwt_service,
        }
    }

    /// Validate email format: local@domain with a dotted, non-empty domain
    fn validate_email(email: &str) -> Result<(), AuthError> {
        let (local, domain) = email.split_once('@').ok_or(AuthError::InvalidEmail)?;

        if local.is_empty() || domain.is_empty() || domain.contains('@') {
            return Err(AuthError::InvalidEmail);
        }

        if !domain.contains('.') || domain.split('.').any(|part| part.is_empty()) {
            return Err(AuthError::InvalidEmail);
        }

        Ok(())
    }

    /// Validate username format: 3-50 chars, starts with a letter, then
    /// letters, digits, underscores or hyphens
    fn validate_username(username: &str) -> Result<(), AuthError> {
        if username.len() < 3 || username.len() > 50 {
            return Err(AuthError::InvalidUsername);
        }

        let mut chars = username.chars();
        if !chars.next().is_some_and(|c| c.is_alphabetic()) {
            return Err(AuthError::InvalidUsername);
        }

        if !username
            .chars()
            .all(|c| c.is_alphanumeric() || c == '_' || c == '-')
        {
            return Err(AuthError::InvalidUsername);
        }

        Ok(())
    }

    fn validate_password(password: &str) -> Result<(), AuthError> {
        if password.len() < 6 {
            return Err(AuthError::PasswordTooShort);
        }

        Ok(())
    }

    /// Register a new user.
    ///
    /// Fails when the email is already registered. The password is hashed
    /// with bcrypt (salted, adaptive) before it ever reaches the store.
    pub async fn register(&self, request: RegisterRequest) -> Result<User, AuthError> {
        Self::validate_username(&request.username)?;
        Self::validate_email(&request.email)?;
        Self::validate_password(&request.password)?;

        if self.user_repo.exists_by_email(&request.email).await? {
            return Err(AuthError::EmailAlreadyExists);
        }

        let password_hash = UserRepository::hash_password(&request.password)?;
        let user = self
            .user_repo
            .create(&request.username, &request.email, &password_hash)
            .await?;

        tracing::info!("User {} registered successfully", user.username);

        Ok(user)
    }

    /// Login an existing user.
    ///
    /// On success: stamps `last_login_at`, stores a fresh refresh token
    /// (7-day expiry, replacing any previous one) and issues an access
    /// token. Unknown username and wrong password fail identically.
    pub async fn login(
        &self,
        request: LoginRequest,
    ) -> Result<(User, String, String), AuthError> {
        let user = self
            .user_repo
            .find_by_username(&request.username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !UserRepository::verify_password(&request.password, &user.password_hash)? {
            return Err(AuthError::InvalidCredentials);
        }

        let refresh_token = self.jwt_service.generate_refresh_token();
        let expires_at = self.jwt_service.refresh_token_expiry();
        let user = self
            .user_repo
            .record_login(user.id, &refresh_token, expires_at)
            .await?;

        let (access_token, _) = self.jwt_service.generate_access_token(&user)?;

        tracing::info!("User {} logged in successfully", user.username);

        Ok((user, access_token, refresh_token))
    }

    /// Exchange a valid refresh token for a new token pair.
    ///
    /// The store rotates the single refresh slot atomically: the exact
    /// (email, token) pair must match with an unexpired slot, and the old
    /// token is unusable the moment the new one is written. No access token
    /// (valid or expired) is required on this path.
    pub async fn refresh(&self, request: RefreshRequest) -> Result<(String, String), AuthError> {
        let new_refresh_token = self.jwt_service.generate_refresh_token();
        let expires_at = self.jwt_service.refresh_token_expiry();

        let user = self
            .user_repo
            .rotate_refresh_token(
                &request.email,
                &request.refresh_token,
                &new_refresh_token,
                expires_at,
            )
            .await?
            .ok_or(AuthError::InvalidRefreshToken)?;

        let (access_token, _) = self.jwt_service.generate_access_token(&user)?;

        tracing::debug!("Refresh token rotated for user {}", user.username);

        Ok((access_token, new_refresh_token))
    }

    /// Resolve an access token to its user
    pub async fn current_user(&self, access_token: &str) -> Result<User, AuthError> {
        let claims = self.jwt_service.validate_access_token(access_token)?;
        let user_id = claims.user_id()?;

        self.user_repo
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }

    /// Validate an access token and return the user ID if valid
    pub fn validate_access_token(&self, token: &str) -> Result<Uuid, AuthError> {
        let claims = self.jwt_service.validate_access_token(token)?;
        Ok(claims.user_id()?)
    }
}
