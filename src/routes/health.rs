use actix_web::{get, web};
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: DateTime<Utc>,
}

/// Liveness probe. Public, and touches neither the database nor the
/// session store.
#[get("/health")]
pub async fn health() -> web::Json<HealthReport> {
    web::Json(HealthReport {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        timestamp: Utc::now(),
    })
}
