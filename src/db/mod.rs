//! Postgres access. Every statement runs under the configured timeout so a
//! stalled database surfaces as a 503 instead of a hung request.

pub mod tasks;
pub mod users;

use std::future::Future;
use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::config::Config;
use crate::error::AppError;

pub use tasks::TaskRepository;
pub use users::UserRepository;

pub async fn connect(config: &Config) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .acquire_timeout(config.db_timeout)
        .connect(&config.database_url)
        .await
}

pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

pub(crate) async fn timed<T, F>(limit: Duration, op: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, sqlx::Error>>,
{
    match tokio::time::timeout(limit, op).await {
        Ok(result) => result.map_err(AppError::from),
        Err(_) => Err(AppError::DependencyError(format!(
            "database timed out after {:?}",
            limit
        ))),
    }
}
