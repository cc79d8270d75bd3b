//! Refresh-token cookie transport.
//!
//! The refresh token never travels in a response body; it rides an
//! HttpOnly cookie scoped to the whole site, and logout clears it by
//! expiring the cookie client-side.

use axum::http::{header, HeaderMap};
use axum_extra::extract::cookie::{Cookie, SameSite};
use std::time::Duration;

/// Cookie name for the refresh token (long-lived).
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Build the HttpOnly cookie carrying the refresh token. `secure` is set
/// in production so the cookie only travels over TLS.
pub fn refresh_cookie(token: &str, max_age: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, token.to_owned()))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Strict)
        .secure(secure)
        .max_age(time::Duration::seconds(max_age.as_secs() as i64))
        .build()
}

/// Build the cookie that instructs the browser to drop the refresh token
/// immediately (`Max-Age=0`, empty value).
pub fn clear_refresh_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((REFRESH_COOKIE, ""))
        .http_only(true)
        .path("/")
        .same_site(SameSite::Strict)
        .secure(secure)
        .max_age(time::Duration::ZERO)
        .build()
}

/// Extract the refresh token from a raw `Cookie` header. Tolerates absent
/// headers, multiple `; `-joined cookies, and stray whitespace.
pub fn refresh_token_from_headers(headers: &HeaderMap) -> Option<String> {
    let cookie_header = headers.get(header::COOKIE)?.to_str().ok()?;
    for part in cookie_header.split(';') {
        let part = part.trim();
        if let Some((name, value)) = part.split_once('=') {
            if name.trim() == REFRESH_COOKIE {
                return Some(value.trim().to_owned());
            }
        }
    }
    None
}
