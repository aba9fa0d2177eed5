pub mod cookie;
pub mod extractors;
pub mod middleware;
pub mod password;
pub mod session;
pub mod store;

use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::validation::{validate_email, validate_password};

// Re-export necessary items
pub use cookie::SESSION_COOKIE_NAME;
pub use middleware::{PublicRoutes, SessionGate};
pub use password::{hash_password, verify_password};
pub use session::{
    Authenticated, AuthenticatedIdentity, IssuedSession, Session, SessionError, SessionManager,
    SessionSettings,
};
pub use store::{MemorySessionStore, RedisSessionStore, SessionStore, StoreError};

/// Represents the payload for a user login request.
///
/// Only presence is checked here; the credential lookup decides the rest.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Represents the payload for a new user registration request.
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(custom = "validate_email")]
    pub email: String,
    #[validate(custom = "validate_password")]
    pub password: String,
}

/// Body returned by `/register` and `/login`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub user_id: i32,
}

/// Login behaviour not tied to the session store.
#[derive(Debug, Clone)]
pub struct AuthSettings {
    /// Added to the unknown-email path so it takes as long as a bcrypt check.
    pub login_failure_delay: Duration,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            login_failure_delay: Duration::from_secs(1),
        }
    }
}
