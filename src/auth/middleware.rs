use std::collections::HashSet;
use std::rc::Rc;
use std::sync::Arc;

use actix_web::{
    body::EitherBody,
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::Method,
    Error, HttpMessage,
};
use futures::future::{ready, LocalBoxFuture, Ready};

use super::cookie::SESSION_COOKIE_NAME;
use super::session::SessionManager;
use crate::error::AppError;

/// `(method, path)` pairs that skip session authentication.
#[derive(Debug, Clone)]
pub struct PublicRoutes {
    routes: HashSet<(Method, String)>,
}

impl PublicRoutes {
    pub fn empty() -> Self {
        Self {
            routes: HashSet::new(),
        }
    }

    pub fn allow(mut self, method: Method, path: &str) -> Self {
        self.routes.insert((method, path.to_owned()));
        self
    }

    pub fn contains(&self, method: &Method, path: &str) -> bool {
        self.routes.contains(&(method.clone(), path.to_owned()))
    }
}

impl Default for PublicRoutes {
    fn default() -> Self {
        Self::empty()
            .allow(Method::GET, "/health")
            .allow(Method::POST, "/register")
            .allow(Method::POST, "/login")
            .allow(Method::POST, "/logout")
    }
}

/// Gate that resolves the `session_id` cookie into an
/// [`AuthenticatedIdentity`](super::AuthenticatedIdentity) for every
/// non-public route.
///
/// The identity is placed in the request extensions for the
/// [`FromRequest`](actix_web::FromRequest) extractor. When the session was
/// renewed the refreshed cookie is attached to the response.
#[derive(Clone)]
pub struct SessionGate {
    sessions: Arc<SessionManager>,
    public: Rc<PublicRoutes>,
}

impl SessionGate {
    pub fn new(sessions: Arc<SessionManager>) -> Self {
        Self::with_public_routes(sessions, PublicRoutes::default())
    }

    pub fn with_public_routes(sessions: Arc<SessionManager>, public: PublicRoutes) -> Self {
        Self {
            sessions,
            public: Rc::new(public),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Transform = SessionGateService<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionGateService {
            service: Rc::new(service),
            sessions: self.sessions.clone(),
            public: self.public.clone(),
        }))
    }
}

pub struct SessionGateService<S> {
    service: Rc<S>,
    sessions: Arc<SessionManager>,
    public: Rc<PublicRoutes>,
}

impl<S, B> Service<ServiceRequest> for SessionGateService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        if self.public.contains(req.method(), req.path()) {
            let fut = self.service.call(req);
            return Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) });
        }

        Box::pin(authorize(
            self.service.clone(),
            self.sessions.clone(),
            req,
        ))
    }
}

// Rejections are rendered here rather than returned as `Err` so the
// response still passes through the outer middleware.
async fn authorize<S, B>(
    service: Rc<S>,
    sessions: Arc<SessionManager>,
    req: ServiceRequest,
) -> Result<ServiceResponse<EitherBody<B>>, Error>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
{
    let session_id = match req.cookie(SESSION_COOKIE_NAME) {
        Some(cookie) if !cookie.value().is_empty() => cookie.value().to_owned(),
        _ => {
            log::warn!("Rejected {} {}: no session cookie", req.method(), req.path());
            let err = AppError::Unauthorized("Missing session".into());
            return Ok(req.error_response(err).map_into_right_body());
        }
    };

    let authenticated = match sessions.authenticate(&session_id).await {
        Ok(authenticated) => authenticated,
        Err(e) => {
            log::warn!("Rejected {} {}: {}", req.method(), req.path(), e);
            return Ok(req.error_response(AppError::from(e)).map_into_right_body());
        }
    };
    req.extensions_mut().insert(authenticated.identity);

    let mut res = service.call(req).await?;
    if let Some(max_age) = authenticated.refreshed_max_age {
        let cookie = sessions.session_cookie(&session_id, max_age);
        if let Err(e) = res.response_mut().add_cookie(&cookie) {
            log::error!("Failed to attach renewed session cookie: {}", e);
        }
    }
    Ok(res.map_into_left_body())
}
