use std::time::Duration;

use sqlx::PgPool;

use super::timed;
use crate::error::AppError;
use crate::models::{User, UserCredentials};

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
    timeout: Duration,
}

impl UserRepository {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool, AppError> {
        timed(
            self.timeout,
            sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool),
        )
        .await
    }

    /// Inserts a user. A concurrent registration of the same email surfaces
    /// as `AppError::Conflict` through the unique constraint.
    pub async fn create(&self, email: &str, hashed_password: &str) -> Result<User, AppError> {
        timed(
            self.timeout,
            sqlx::query_as::<_, User>(
                "INSERT INTO users (email, hashed_password) VALUES ($1, $2) \
                 RETURNING id, email, created_at",
            )
            .bind(email)
            .bind(hashed_password)
            .fetch_one(&self.pool),
        )
        .await
    }

    pub async fn find_credentials(&self, email: &str) -> Result<Option<UserCredentials>, AppError> {
        timed(
            self.timeout,
            sqlx::query_as::<_, UserCredentials>(
                "SELECT id, hashed_password FROM users WHERE email = $1",
            )
            .bind(email)
            .fetch_optional(&self.pool),
        )
        .await
    }
}
