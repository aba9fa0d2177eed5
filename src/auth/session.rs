//! Server-side sessions with a sliding expiration window.
//!
//! A session id is an opaque random token handed to the client in the
//! `session_id` cookie. The record it points at lives only in the
//! [`SessionStore`]; this module never caches it beyond a single call.
//!
//! When a request arrives with less than `renew_threshold` of life left the
//! record's `expires_at` and its store TTL are pushed out to a full `ttl`
//! again, and the caller is told to re-send the cookie. The token itself
//! never changes.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use actix_web::cookie::Cookie;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use super::cookie;
use super::store::{SessionStore, StoreError};

pub const MAX_USER_AGENT_LEN: usize = 200;

const KEY_PREFIX: &str = "session:";

pub fn session_key(session_id: &str) -> String {
    format!("{KEY_PREFIX}{session_id}")
}

#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub ttl: Duration,
    pub renew_threshold: Duration,
    pub store_timeout: Duration,
    pub secure_cookies: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60 * 60),
            renew_threshold: Duration::from_secs(15 * 60),
            store_timeout: Duration::from_secs(1),
            secure_cookies: true,
        }
    }
}

/// The stored session record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: i32,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub client_ip: String,
    pub user_agent: String,
}

/// The caller identity established by a valid session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AuthenticatedIdentity {
    pub user_id: i32,
}

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("session is missing, expired or invalid")]
    Unauthorized,
    #[error("session not found")]
    NotFound,
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("failed to encode session: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedSession {
    pub session_id: String,
    pub max_age: Duration,
}

/// Outcome of a successful [`SessionManager::authenticate`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Authenticated {
    pub identity: AuthenticatedIdentity,
    /// `Some` when the session was renewed and the cookie must be re-sent
    /// with this `Max-Age`.
    pub refreshed_max_age: Option<Duration>,
}

pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    settings: SessionSettings,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, settings: SessionSettings) -> Self {
        Self { store, settings }
    }

    /// Creates a session for `user_id` and returns its token.
    pub async fn issue(
        &self,
        user_id: i32,
        client_ip: &str,
        user_agent: &str,
    ) -> Result<IssuedSession, SessionError> {
        let session_id = Uuid::new_v4().to_string();
        let issued_at = Utc::now();
        let session = Session {
            user_id,
            issued_at,
            expires_at: issued_at + chrono_duration(self.settings.ttl),
            client_ip: client_ip.to_owned(),
            user_agent: user_agent.chars().take(MAX_USER_AGENT_LEN).collect(),
        };
        let value = serde_json::to_vec(&session)?;

        let key = session_key(&session_id);
        self.bounded(self.store.put(&key, value, self.settings.ttl))
            .await?;
        log::debug!("Issued session for user {}", user_id);

        Ok(IssuedSession {
            session_id,
            max_age: self.settings.ttl,
        })
    }

    /// Resolves a token to its owner, renewing the session when it is close
    /// to expiry.
    ///
    /// A store failure is returned as [`SessionError::Store`], never as a
    /// successful identity.
    pub async fn authenticate(&self, session_id: &str) -> Result<Authenticated, SessionError> {
        if Uuid::parse_str(session_id).is_err() {
            return Err(SessionError::Unauthorized);
        }
        let key = session_key(session_id);

        let raw = self
            .bounded(self.store.get(&key))
            .await?
            .ok_or(SessionError::Unauthorized)?;
        let mut session: Session = serde_json::from_slice(&raw).map_err(|e| {
            log::warn!("Discarding malformed session record: {}", e);
            SessionError::Unauthorized
        })?;

        let now = Utc::now();
        let remaining = session.expires_at - now;
        if remaining <= chrono::Duration::zero() {
            return Err(SessionError::Unauthorized);
        }

        let identity = AuthenticatedIdentity {
            user_id: session.user_id,
        };
        if remaining >= chrono_duration(self.settings.renew_threshold) {
            return Ok(Authenticated {
                identity,
                refreshed_max_age: None,
            });
        }

        session.expires_at = now + chrono_duration(self.settings.ttl);
        let value = serde_json::to_vec(&session)?;
        let renewed = self
            .bounded(self.store.touch(&key, value, self.settings.ttl))
            .await?;
        if !renewed {
            // Revoked or expired between the read and the write.
            return Err(SessionError::Unauthorized);
        }
        log::debug!("Renewed session for user {}", session.user_id);

        Ok(Authenticated {
            identity,
            refreshed_max_age: Some(self.settings.ttl),
        })
    }

    /// Deletes the session and returns the user it belonged to.
    pub async fn revoke(&self, session_id: &str) -> Result<i32, SessionError> {
        if Uuid::parse_str(session_id).is_err() {
            return Err(SessionError::NotFound);
        }
        let raw = self
            .bounded(self.store.get_and_delete(&session_key(session_id)))
            .await?
            .ok_or(SessionError::NotFound)?;
        let session: Session =
            serde_json::from_slice(&raw).map_err(|_| SessionError::NotFound)?;
        Ok(session.user_id)
    }

    pub fn session_cookie(&self, session_id: &str, max_age: Duration) -> Cookie<'static> {
        cookie::session_cookie(session_id, max_age, self.settings.secure_cookies)
    }

    pub fn removal_cookie(&self) -> Cookie<'static> {
        cookie::removal_cookie(self.settings.secure_cookies)
    }

    async fn bounded<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let limit = self.settings.store_timeout;
        tokio::time::timeout(limit, op)
            .await
            .map_err(|_| StoreError::Timeout(limit))?
    }
}

fn chrono_duration(duration: Duration) -> chrono::Duration {
    chrono::Duration::seconds(duration.as_secs() as i64)
}
