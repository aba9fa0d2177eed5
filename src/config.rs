use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::auth::{AuthSettings, SessionSettings};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} has an invalid value: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    /// Falls back to an in-process session store when unset.
    pub redis_url: Option<String>,
    pub server_host: String,
    pub server_port: u16,
    pub db_max_connections: u32,
    pub db_timeout: Duration,
    pub cache_timeout: Duration,
    pub session_ttl: Duration,
    pub session_renew_threshold: Duration,
    pub cookie_secure: bool,
    pub login_failure_delay: Duration,
    pub cors_allowed_origin: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup. Empty values count as
    /// unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let config = Self {
            database_url: get("DATABASE_URL").ok_or(ConfigError::Missing("DATABASE_URL"))?,
            redis_url: get("REDIS_URL"),
            server_host: get("SERVER_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            server_port: parse_or(&get, "SERVER_PORT", 8080)?,
            db_max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", 10)?,
            db_timeout: Duration::from_millis(parse_or(&get, "DB_TIMEOUT_MS", 3000)?),
            cache_timeout: Duration::from_millis(parse_or(&get, "CACHE_TIMEOUT_MS", 1000)?),
            session_ttl: Duration::from_secs(parse_or(&get, "SESSION_TTL_SECS", 3600)?),
            session_renew_threshold: Duration::from_secs(parse_or(
                &get,
                "SESSION_RENEW_THRESHOLD_SECS",
                900,
            )?),
            cookie_secure: parse_or(&get, "COOKIE_SECURE", true)?,
            login_failure_delay: Duration::from_millis(parse_or(
                &get,
                "LOGIN_FAILURE_DELAY_MS",
                1000,
            )?),
            cors_allowed_origin: get("CORS_ALLOWED_ORIGIN"),
        };

        if config.session_ttl.is_zero() {
            return Err(ConfigError::Invalid {
                key: "SESSION_TTL_SECS",
                value: "0".into(),
            });
        }
        if config.session_renew_threshold >= config.session_ttl {
            return Err(ConfigError::Invalid {
                key: "SESSION_RENEW_THRESHOLD_SECS",
                value: config.session_renew_threshold.as_secs().to_string(),
            });
        }
        Ok(config)
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }

    pub fn session_settings(&self) -> SessionSettings {
        SessionSettings {
            ttl: self.session_ttl,
            renew_threshold: self.session_renew_threshold,
            store_timeout: self.cache_timeout,
            secure_cookies: self.cookie_secure,
        }
    }

    pub fn auth_settings(&self) -> AuthSettings {
        AuthSettings {
            login_failure_delay: self.login_failure_delay,
        }
    }
}

fn parse_or<T, G>(get: &G, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid { key, value: raw }),
    }
}
