//!
//! # Error Handling
//!
//! `AppError` is the single error type returned by HTTP handlers. It
//! implements `actix_web::error::ResponseError`, so a handler can return
//! `Result<_, AppError>` and every failure becomes a JSON body of the form
//! `{"error": "<message>"}` with a matching status code.
//!
//! The lower layers (validation, query building, sessions, the session
//! store) have their own `thiserror` enums; the `From` impls below decide
//! how each of them surfaces over HTTP. Messages of server-side failures are
//! logged and replaced by a generic text before they reach the client.

use actix_web::error::{JsonPayloadError, ResponseError};
use actix_web::{http::StatusCode, HttpRequest, HttpResponse};
use serde_json::json;
use std::fmt;
use validator::ValidationErrors;

use crate::auth::{SessionError, StoreError};
use crate::query::PatchError;
use crate::validation::FieldError;

const UNIQUE_VIOLATION: &str = "23505";

#[derive(Debug)]
pub enum AppError {
    /// Missing, expired or invalid session, or bad credentials (401).
    Unauthorized(String),
    /// Malformed request (400).
    BadRequest(String),
    /// Entity absent or owned by someone else (404).
    NotFound(String),
    /// Uniqueness violation (409).
    Conflict(String),
    /// Unexpected server-side failure (500).
    InternalServerError(String),
    /// Failed database operation (500).
    DatabaseError(String),
    /// Input failed field validation (422).
    ValidationError(String),
    /// A backing store is unreachable or timed out (503).
    DependencyError(String),
    /// A patch document without any recognized field (400).
    EmptyPatch,
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) | AppError::EmptyPatch => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::ValidationError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::DependencyError(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    fn client_message(&self) -> String {
        match self {
            AppError::Unauthorized(msg)
            | AppError::BadRequest(msg)
            | AppError::NotFound(msg)
            | AppError::Conflict(msg)
            | AppError::ValidationError(msg) => msg.clone(),
            AppError::EmptyPatch => "No updatable fields were supplied".into(),
            AppError::InternalServerError(_) | AppError::DatabaseError(_) => {
                "An internal error occurred".into()
            }
            AppError::DependencyError(_) => "Service temporarily unavailable".into(),
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            AppError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            AppError::BadRequest(msg) => write!(f, "Bad Request: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            AppError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            AppError::InternalServerError(msg) => write!(f, "Internal Server Error: {}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database Error: {}", msg),
            AppError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            AppError::DependencyError(msg) => write!(f, "Dependency Error: {}", msg),
            AppError::EmptyPatch => write!(f, "Empty Patch"),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        AppError::status_code(self)
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            AppError::InternalServerError(_)
            | AppError::DatabaseError(_)
            | AppError::DependencyError(_) => log::error!("{}", self),
            _ => log::debug!("{}", self),
        }
        HttpResponse::build(self.status_code()).json(json!({
            "error": self.client_message()
        }))
    }
}

/// `RowNotFound` becomes `NotFound`, unique violations become `Conflict` and
/// pool exhaustion counts as an unavailable dependency.
impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> AppError {
        match error {
            sqlx::Error::RowNotFound => AppError::NotFound("Record not found".into()),
            sqlx::Error::PoolTimedOut => AppError::DependencyError(error.to_string()),
            sqlx::Error::Database(ref db_err)
                if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) =>
            {
                let constraint = db_err.constraint().unwrap_or("unknown").to_owned();
                AppError::Conflict(format!("Duplicate value violates {}", constraint))
            }
            _ => AppError::DatabaseError(error.to_string()),
        }
    }
}

impl From<ValidationErrors> for AppError {
    fn from(error: ValidationErrors) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

impl From<FieldError> for AppError {
    fn from(error: FieldError) -> AppError {
        AppError::ValidationError(error.to_string())
    }
}

impl From<PatchError> for AppError {
    fn from(error: PatchError) -> AppError {
        match error {
            PatchError::Empty => AppError::EmptyPatch,
            PatchError::Invalid(field) => field.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(error: StoreError) -> AppError {
        AppError::DependencyError(error.to_string())
    }
}

impl From<SessionError> for AppError {
    fn from(error: SessionError) -> AppError {
        match error {
            SessionError::Unauthorized => AppError::Unauthorized("Invalid or expired session".into()),
            SessionError::NotFound => AppError::NotFound("Session not found".into()),
            SessionError::Store(store) => store.into(),
            SessionError::Encode(e) => AppError::InternalServerError(e.to_string()),
        }
    }
}

impl From<bcrypt::BcryptError> for AppError {
    fn from(error: bcrypt::BcryptError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

impl From<actix_web::error::BlockingError> for AppError {
    fn from(error: actix_web::error::BlockingError) -> AppError {
        AppError::InternalServerError(error.to_string())
    }
}

/// Error handler for `web::JsonConfig`, so undecodable bodies get the same
/// JSON error shape as every other failure.
pub fn json_payload_error(error: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    AppError::BadRequest(error.to_string()).into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_responses() {
        let cases = [
            (AppError::Unauthorized("Invalid session".into()), 401),
            (AppError::BadRequest("Invalid input".into()), 400),
            (AppError::NotFound("Resource not found".into()), 404),
            (AppError::Conflict("Duplicate".into()), 409),
            (AppError::InternalServerError("Server error".into()), 500),
            (AppError::ValidationError("bad field".into()), 422),
            (AppError::DependencyError("redis down".into()), 503),
            (AppError::EmptyPatch, 400),
        ];
        for (error, status) in cases {
            assert_eq!(error.error_response().status(), status, "{}", error);
        }
    }

    #[actix_rt::test]
    async fn test_internal_details_stay_server_side() {
        let error = AppError::DatabaseError("relation \"tasks\" does not exist".into());
        let body = actix_web::body::to_bytes(error.error_response().into_body())
            .await
            .unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["error"], "An internal error occurred");
    }

    #[test]
    fn test_layer_errors_map_to_statuses() {
        let err: AppError = SessionError::Unauthorized.into();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);

        let err: AppError = SessionError::Store(StoreError::Timeout(Duration::from_secs(1))).into();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);

        let err: AppError = PatchError::Empty.into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let err: AppError = PatchError::Invalid(FieldError::new("title", "can't be empty")).into();
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(err.to_string().contains("title"));

        let err: AppError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);

        let err: AppError = sqlx::Error::PoolTimedOut.into();
        assert_eq!(err.status_code(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
