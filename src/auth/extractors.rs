use actix_web::dev::Payload;
use actix_web::{Error as ActixError, FromRequest, HttpMessage, HttpRequest};
use std::future::{ready, Ready};

use super::session::AuthenticatedIdentity;
use crate::error::AppError;

/// Pulls the identity the [`SessionGate`](super::SessionGate) stored for
/// this request. Handlers take it as an argument instead of reading the
/// session themselves.
impl FromRequest for AuthenticatedIdentity {
    type Error = ActixError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<AuthenticatedIdentity>().copied() {
            Some(identity) => ready(Ok(identity)),
            // Route is not behind the gate.
            None => ready(Err(AppError::Unauthorized("Missing session".into()).into())),
        }
    }
}
