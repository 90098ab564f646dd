//! The `auth_token` session cookie.
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::{Duration, OffsetDateTime};

use super::token::SESSION_TTL;

/// Cookie name for the session token
pub const AUTH_COOKIE_NAME: &str = "auth_token";

/// Cookie carrying a freshly issued session token.
pub fn session_cookie(token: String, secure: bool) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE_NAME, token))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::seconds(SESSION_TTL.as_secs() as i64))
        .build()
}

/// Empty, already-expired cookie that overwrites the client's session cookie.
pub fn expired_session_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((AUTH_COOKIE_NAME, ""))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(Duration::ZERO)
        .expires(OffsetDateTime::UNIX_EPOCH)
        .build()
}

/// The session token held by `jar`, if any. An empty value counts as none.
pub fn session_token(jar: &CookieJar) -> Option<&str> {
    jar.get(AUTH_COOKIE_NAME)
        .map(|c| c.value())
        .filter(|v| !v.is_empty())
}
