//! # User Repository
//!
//! Staff accounts. Passwords are stored as argon2 PHC strings and only ever
//! compared through [`verify_password`].

use chrono::Utc;
use sqlx::SqlitePool;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use farmasys_core::validation::{validate_password, validate_username};
use farmasys_core::{Role, User};

const SELECT_USER: &str = "SELECT id, username, password_hash, role, created_at FROM users";

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Creates an account.
    ///
    /// ## Returns
    /// * `Err(DbError::Validation)` - bad username or empty password
    /// * `Err(DbError::UniqueViolation)` - username taken
    pub async fn create(&self, username: &str, password: &str, role: Role) -> DbResult<User> {
        let username = username.trim();
        validate_username(username)?;
        validate_password(password)?;

        if self.find_by_username(username).await?.is_some() {
            return Err(DbError::duplicate("username", username));
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            username: username.to_string(),
            password_hash: hash_password(password)?,
            role,
            created_at: Utc::now(),
        };

        sqlx::query(
            "INSERT INTO users (id, username, password_hash, role, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { field, .. } => DbError::duplicate(field, username),
            other => other,
        })?;

        info!(username = %user.username, role = %user.role, "User created");
        Ok(user)
    }

    pub async fn find_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let sql = format!("{SELECT_USER} WHERE username = ?1");
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(username.trim())
            .fetch_optional(&self.pool)
            .await?;
        Ok(user)
    }

    /// Returns the user when the password matches, `None` otherwise.
    ///
    /// Unknown usernames and wrong passwords are indistinguishable.
    pub async fn verify_credentials(&self, username: &str, password: &str) -> DbResult<Option<User>> {
        let Some(user) = self.find_by_username(username).await? else {
            return Ok(None);
        };

        if verify_password(password, &user.password_hash) {
            Ok(Some(user))
        } else {
            warn!(username = %user.username, "Password mismatch");
            Ok(None)
        }
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Creates the first admin when the table is empty.
    ///
    /// Returns whether an account was created.
    pub async fn ensure_bootstrap_admin(&self, username: &str, password: &str) -> DbResult<bool> {
        if self.count().await? > 0 {
            return Ok(false);
        }

        self.create(username, password, Role::Admin).await?;
        info!(username = %username.trim(), "Bootstrap admin created");
        Ok(true)
    }
}

/// Hashes a password with argon2 and a random salt.
pub fn hash_password(password: &str) -> DbResult<String> {
    use argon2::{
        password_hash::{rand_core::OsRng, SaltString},
        Argon2, PasswordHasher,
    };

    let salt = SaltString::generate(&mut OsRng);

    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| DbError::PasswordHash(e.to_string()))?;

    Ok(hash.to_string())
}

/// Checks a password against a stored PHC string. Malformed hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};

    let parsed_hash = match PasswordHash::new(hash) {
        Ok(h) => h,
        Err(_) => return false,
    };

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok()
}

// =============================================================================
// Unit Tests
// =============================================================================
