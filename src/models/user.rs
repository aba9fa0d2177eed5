use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

/// Public view of a row in the `users` table.
#[derive(Debug, Serialize, FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

/// The columns a login needs. Never serialized.
#[derive(Debug, FromRow)]
pub struct UserCredentials {
    pub id: i32,
    pub hashed_password: String,
}
