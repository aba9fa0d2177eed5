use std::time::Duration;

use actix_web::cookie::{time, Cookie, SameSite};

pub const SESSION_COOKIE_NAME: &str = "session_id";

/// `session_id` cookie carrying `session_id` for `max_age`.
pub fn session_cookie(session_id: &str, max_age: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build(SESSION_COOKIE_NAME, session_id.to_owned())
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age.as_secs() as i64))
        .finish()
}

/// Expired, empty `session_id` cookie with the same attributes.
pub fn removal_cookie(secure: bool) -> Cookie<'static> {
    let mut cookie = session_cookie("", Duration::ZERO, secure);
    cookie.make_removal();
    cookie
}
