//! User repository for database operations
//!
//! The credential store: user rows with bcrypt password hashes and the
//! single active refresh-token slot per user. Refresh tokens are stored as
//! SHA-256 hex digests; the repository hashes presented tokens before any
//! lookup, so matching is always an exact digest comparison.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use sqlx::PgPool;
use uuid::Uuid;

use crate::core::db::models::User;

/// Cost factor for bcrypt hashing (12 is recommended for production)
const BCRYPT_COST: u32 = 12;

const USER_COLUMNS: &str = "id, username, email, password_hash, created_at, last_login_at, \
     updated_at, refresh_token, refresh_token_expires_at";

/// User repository error types
#[derive(Debug, thiserror::Error)]
pub enum UserRepositoryError {
    #[error("User not found")]
    NotFound,

    #[error("Email already exists")]
    EmailAlreadyExists,

    #[error("Username already exists")]
    UsernameAlreadyExists,

    #[error("Password hashing failed: {0}")]
    HashingError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// User repository for database operations
#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    /// Create a new user repository
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Hash a password using bcrypt with automatic salt generation
    pub fn hash_password(password: &str) -> Result<String, UserRepositoryError> {
        bcrypt::hash(password, BCRYPT_COST)
            .map_err(|e| UserRepositoryError::HashingError(e.to_string()))
    }

    /// Verify a password against a bcrypt hash
    pub fn verify_password(password: &str, hash: &str) -> Result<bool, UserRepositoryError> {
        bcrypt::verify(password, hash).map_err(|e| UserRepositoryError::HashingError(e.to_string()))
    }

    /// Hash a refresh token using SHA-256
    pub fn hash_refresh_token(token: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(token.as_bytes());
        hex::encode(hasher.finalize())
    }

    /// Create a new user. `password_hash` must already be a bcrypt hash.
    ///
    /// Uniqueness is enforced by the database constraints, so concurrent
    /// registrations for the same email cannot both succeed; the violation
    /// is mapped back to the matching error variant.
    pub async fn create(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, UserRepositoryError> {
        let result = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash)
            VALUES ($1, $2, $3)
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(username)
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await;

        match result {
            Ok(user) => Ok(user),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                match db_err.constraint() {
                    Some("users_username_key") => Err(UserRepositoryError::UsernameAlreadyExists),
                    _ => Err(UserRepositoryError::EmailAlreadyExists),
                }
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Find a user by ID
    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, UserRepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE id = $1
            "#,
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by username
    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>, UserRepositoryError> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE username = $1
            "#,
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Find a user by the exact (email, refresh token) pair.
    ///
    /// The presented raw token is hashed and both columns are matched in a
    /// single query; no partial matching. Expiry is not checked here.
    pub async fn find_by_email_and_refresh_token(
        &self,
        email: &str,
        refresh_token: &str,
    ) -> Result<Option<User>, UserRepositoryError> {
        let token_hash = Self::hash_refresh_token(refresh_token);

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            SELECT {USER_COLUMNS}
            FROM users
            WHERE email = $1 AND refresh_token = $2
            "#,
        ))
        .bind(email)
        .bind(&token_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Check whether an email is already registered
    pub async fn exists_by_email(&self, email: &str) -> Result<bool, UserRepositoryError> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    /// Record a successful login: stamp `last_login_at` and store the new
    /// refresh-token slot, all in one statement.
    pub async fn record_login(
        &self,
        id: Uuid,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<User, UserRepositoryError> {
        let token_hash = Self::hash_refresh_token(refresh_token);

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET last_login_at = NOW(),
                refresh_token = $2,
                refresh_token_expires_at = $3,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(id)
        .bind(&token_hash)
        .bind(expires_at)
        .fetch_optional(&self.pool)
        .await?;

        user.ok_or(UserRepositoryError::NotFound)
    }

    /// Rotate the refresh-token slot as an atomic compare-and-overwrite.
    ///
    /// The WHERE clause matches the exact (email, old token digest) pair and
    /// requires the stored expiry to still be in the future; the SET writes
    /// the new digest and expiry. Two concurrent rotations with the same old
    /// token cannot both succeed — the second one finds no matching row.
    /// Returns `None` when the pair does not match or the slot has expired.
    pub async fn rotate_refresh_token(
        &self,
        email: &str,
        old_token: &str,
        new_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<Option<User>, UserRepositoryError> {
        let old_hash = Self::hash_refresh_token(old_token);
        let new_hash = Self::hash_refresh_token(new_token);

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET refresh_token = $3,
                refresh_token_expires_at = $4,
                updated_at = NOW()
            WHERE email = $1
              AND refresh_token = $2
              AND refresh_token_expires_at > NOW()
            RETURNING {USER_COLUMNS}
            "#,
        ))
        .bind(email)
        .bind(&old_hash)
        .bind(&new_hash)
        .bind(expires_at)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Count total users
    pub async fn count(&self) -> Result<i64, UserRepositoryError> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ========================================================================
    // Password Hashing Tests (don't require database)
    // ========================================================================

    #[test]
    fn test_hash_password_produces_valid_bcrypt_hash() {
        let hash = UserRepository::hash_password("my_secure_password123!").unwrap();

        assert!(hash.starts_with("$2b$") || hash.starts_with("$2a$") || hash.starts_with("$2y$"));
        assert_eq!(hash.len(), 60);
    }

    #[test]
    fn test_hash_password_salts_differ() {
        let hash1 = UserRepository::hash_password("same_password").unwrap();
        let hash2 = UserRepository::hash_password("same_password").unwrap();

        assert_ne!(hash1, hash2);
    }

    #[test]
    fn test_verify_password_correct() {
        let hash = UserRepository::hash_password("correct_password").unwrap();

        assert!(UserRepository::verify_password("correct_password", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_incorrect() {
        let hash = UserRepository::hash_password("correct_password").unwrap();

        assert!(!UserRepository::verify_password("wrong_password", &hash).unwrap());
    }

    #[test]
    fn test_verify_password_unicode() {
        let password = "пароль_密码_🔐";
        let hash = UserRepository::hash_password(password).unwrap();

        assert!(UserRepository::verify_password(password, &hash).unwrap());
    }

    #[test]
    fn test_verify_password_invalid_hash_format() {
        let result = UserRepository::verify_password("password", "not_a_valid_hash");
        assert!(result.is_err());
    }

    // ========================================================================
    // Refresh Token Hashing Tests
    // ========================================================================

    #[test]
    fn test_hash_refresh_token_consistent() {
        let token = "my_refresh_token_12345";

        assert_eq!(
            UserRepository::hash_refresh_token(token),
            UserRepository::hash_refresh_token(token)
        );
    }

    #[test]
    fn test_hash_refresh_token_differs_per_token() {
        assert_ne!(
            UserRepository::hash_refresh_token("token_one"),
            UserRepository::hash_refresh_token("token_two")
        );
    }

    #[test]
    fn test_hash_refresh_token_is_64_char_hex() {
        let hash = UserRepository::hash_refresh_token("any_token");

        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    // ========================================================================
    // Error Type Tests
    // ========================================================================

    #[test]
    fn test_user_repository_error_display() {
        assert_eq!(format!("{}", UserRepositoryError::NotFound), "User not found");
        assert_eq!(
            format!("{}", UserRepositoryError::EmailAlreadyExists),
            "Email already exists"
        );
        assert_eq!(
            format!("{}", UserRepositoryError::UsernameAlreadyExists),
            "Username already exists"
        );
        assert!(
            format!("{}", UserRepositoryError::HashingError("boom".to_string())).contains("boom")
        );
    }

    // ========================================================================
    // Integration Tests (require database)
    // ========================================================================

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_create_and_find_user() {
        let (repo, suffix) = test_repo().await;

        let hash = UserRepository::hash_password("Password123").unwrap();
        let user = repo
            .create(
                &format!("create_user_{suffix}"),
                &format!("create_{suffix}@example.com"),
                &hash,
            )
            .await
            .unwrap();

        assert_eq!(user.username, format!("create_user_{suffix}"));
        assert!(user.refresh_token.is_none());
        assert!(user.last_login_at.is_none());

        let found = repo
            .find_by_username(&format!("create_user_{suffix}"))
            .await
            .unwrap();
        assert_eq!(found.unwrap().id, user.id);

        assert!(repo.count().await.unwrap() >= 1);

        cleanup_user(&repo, user.id).await;
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_create_duplicate_email() {
        let (repo, suffix) = test_repo().await;
        let email = format!("dup_{suffix}@example.com");

        let hash = UserRepository::hash_password("Password123").unwrap();
        let user = repo
            .create(&format!("dup_user1_{suffix}"), &email, &hash)
            .await
            .unwrap();

        let result = repo
            .create(&format!("dup_user2_{suffix}"), &email, &hash)
            .await;
        assert!(matches!(
            result,
            Err(UserRepositoryError::EmailAlreadyExists)
        ));

        cleanup_user(&repo, user.id).await;
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_exists_by_email() {
        let (repo, suffix) = test_repo().await;
        let email = format!("exists_{suffix}@example.com");

        assert!(!repo.exists_by_email(&email).await.unwrap());

        let hash = UserRepository::hash_password("Password123").unwrap();
        let user = repo
            .create(&format!("exists_user_{suffix}"), &email, &hash)
            .await
            .unwrap();

        assert!(repo.exists_by_email(&email).await.unwrap());

        cleanup_user(&repo, user.id).await;
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_record_login_and_pair_lookup() {
        let (repo, suffix) = test_repo().await;
        let email = format!("login_{suffix}@example.com");

        let hash = UserRepository::hash_password("Password123").unwrap();
        let user = repo
            .create(&format!("login_user_{suffix}"), &email, &hash)
            .await
            .unwrap();

        let expires_at = Utc::now() + chrono::Duration::days(7);
        let updated = repo
            .record_login(user.id, "raw_refresh_token", expires_at)
            .await
            .unwrap();

        assert!(updated.last_login_at.is_some());
        assert_eq!(
            updated.refresh_token.as_deref(),
            Some(UserRepository::hash_refresh_token("raw_refresh_token").as_str())
        );

        let found = repo
            .find_by_email_and_refresh_token(&email, "raw_refresh_token")
            .await
            .unwrap();
        assert!(found.is_some());

        let miss = repo
            .find_by_email_and_refresh_token(&email, "some_other_token")
            .await
            .unwrap();
        assert!(miss.is_none());

        cleanup_user(&repo, user.id).await;
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_rotate_refresh_token_invalidates_old() {
        let (repo, suffix) = test_repo().await;
        let email = format!("rotate_{suffix}@example.com");

        let hash = UserRepository::hash_password("Password123").unwrap();
        let user = repo
            .create(&format!("rotate_user_{suffix}"), &email, &hash)
            .await
            .unwrap();

        let expires_at = Utc::now() + chrono::Duration::days(7);
        repo.record_login(user.id, "first_token", expires_at)
            .await
            .unwrap();

        let rotated = repo
            .rotate_refresh_token(&email, "first_token", "second_token", expires_at)
            .await
            .unwrap();
        assert!(rotated.is_some());

        // The old token is unusable the instant the new one is issued
        let again = repo
            .rotate_refresh_token(&email, "first_token", "third_token", expires_at)
            .await
            .unwrap();
        assert!(again.is_none());

        let found = repo
            .find_by_email_and_refresh_token(&email, "second_token")
            .await
            .unwrap();
        assert!(found.is_some());

        cleanup_user(&repo, user.id).await;
    }

    #[tokio::test]
    #[ignore = "requires running PostgreSQL database"]
    async fn test_rotate_expired_slot_fails() {
        let (repo, suffix) = test_repo().await;
        let email = format!("expired_{suffix}@example.com");

        let hash = UserRepository::hash_password("Password123").unwrap();
        let user = repo
            .create(&format!("expired_user_{suffix}"), &email, &hash)
            .await
            .unwrap();

        // Store a slot whose expiry is already in the past
        let expired = Utc::now() - chrono::Duration::hours(1);
        repo.record_login(user.id, "stale_token", expired)
            .await
            .unwrap();

        let result = repo
            .rotate_refresh_token(
                &email,
                "stale_token",
                "fresh_token",
                Utc::now() + chrono::Duration::days(7),
            )
            .await
            .unwrap();
        assert!(result.is_none());

        cleanup_user(&repo, user.id).await;
    }

    // Helper functions for integration tests

    async fn test_repo() -> (UserRepository, String) {
        use crate::core::db::pool::DbConfig;

        let config = DbConfig::from_env().expect("DATABASE_URL must be set for tests");
        let pool = config.connect().await.expect("Failed to create test pool");
        let suffix = Uuid::new_v4().to_string()[..8].to_string();

        (UserRepository::new(pool), suffix)
    }

    async fn cleanup_user(repo: &UserRepository, id: Uuid) {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&repo.pool)
            .await
            .expect("Failed to cleanup test user");
    }
}
