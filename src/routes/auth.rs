use crate::{
    auth::{
        hash_password, verify_password, AuthResponse, AuthSettings, LoginRequest, RegisterRequest,
        SessionError, SessionManager, SESSION_COOKIE_NAME,
    },
    db::UserRepository,
    error::AppError,
};
use actix_web::http::header::{self, CacheControl, CacheDirective};
use actix_web::{post, web, HttpRequest, HttpResponse, Responder};
use validator::Validate;

/// Register a new user
///
/// Creates the account only; the client logs in separately.
#[post("/register")]
pub async fn register(
    users: web::Data<UserRepository>,
    register_data: web::Json<RegisterRequest>,
) -> Result<impl Responder, AppError> {
    register_data.validate()?;
    let RegisterRequest { email, password } = register_data.into_inner();

    if users.email_exists(&email).await? {
        return Err(AppError::Conflict("Email already registered".into()));
    }

    let password_hash = web::block(move || hash_password(&password)).await??;
    let user = users.create(&email, &password_hash).await?;
    log::info!("Registered user {}", user.id);

    Ok(HttpResponse::Created().json(AuthResponse { user_id: user.id }))
}

/// Login user
///
/// Verifies the credentials and starts a session carried by the
/// `session_id` cookie.
#[post("/login")]
pub async fn login(
    req: HttpRequest,
    users: web::Data<UserRepository>,
    sessions: web::Data<SessionManager>,
    settings: web::Data<AuthSettings>,
    login_data: web::Json<LoginRequest>,
) -> Result<impl Responder, AppError> {
    login_data.validate()?;
    let LoginRequest { email, password } = login_data.into_inner();

    let credentials = match users.find_credentials(&email).await? {
        Some(credentials) => credentials,
        None => {
            // Match the latency of a bcrypt comparison.
            tokio::time::sleep(settings.login_failure_delay).await;
            log::warn!("Failed login attempt");
            return Err(AppError::Unauthorized("Invalid credentials".into()));
        }
    };

    let hashed = credentials.hashed_password;
    if !web::block(move || verify_password(&password, &hashed)).await?? {
        log::warn!("Failed login attempt for user {}", credentials.id);
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    let client_ip = req
        .connection_info()
        .realip_remote_addr()
        .unwrap_or("unknown")
        .to_owned();
    let user_agent = req
        .headers()
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_owned();

    let issued = sessions
        .issue(credentials.id, &client_ip, &user_agent)
        .await?;
    log::info!("User {} logged in", credentials.id);

    Ok(HttpResponse::Ok()
        .insert_header(CacheControl(vec![CacheDirective::NoStore]))
        .cookie(sessions.session_cookie(&issued.session_id, issued.max_age))
        .json(AuthResponse {
            user_id: credentials.id,
        }))
}

/// Logout user
///
/// Always answers 204 with a clearing cookie, whether or not the session
/// still existed or the store could be reached.
#[post("/logout")]
pub async fn logout(req: HttpRequest, sessions: web::Data<SessionManager>) -> HttpResponse {
    if let Some(cookie) = req.cookie(SESSION_COOKIE_NAME) {
        match sessions.revoke(cookie.value()).await {
            Ok(user_id) => log::info!("User {} logged out", user_id),
            Err(SessionError::NotFound) => log::debug!("Logout for an unknown session"),
            Err(e) => log::error!("Failed to revoke session on logout: {}", e),
        }
    }

    HttpResponse::NoContent()
        .insert_header(CacheControl(vec![CacheDirective::NoStore]))
        .insert_header((header::VARY, "Cookie"))
        .cookie(sessions.removal_cookie())
        .finish()
}
