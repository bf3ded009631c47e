//! services/api/src/web/session.rs
//!
//! Session-token transport: an opaque UUID carried in a browser cookie.

use axum::http::{header, HeaderMap};
use uuid::Uuid;

/// Name of the session cookie.
pub const SESSION_COOKIE: &str = "sid";

/// Extracts the session token from the request's `Cookie` header, if one is
/// present and well-formed.
pub fn session_from_headers(headers: &HeaderMap) -> Option<Uuid> {
    let cookie_header = headers.get(header::COOKIE).and_then(|v| v.to_str().ok())?;

    cookie_header.split(';').find_map(|cookie| {
        let cookie = cookie.trim();
        let value = cookie.strip_prefix(SESSION_COOKIE)?.strip_prefix('=')?;
        Uuid::parse_str(value).ok()
    })
}

/// Builds the `Set-Cookie` value that hands `token` to the browser for the
/// lifetime of the browsing session.
pub fn session_cookie(token: Uuid) -> String {
    format!("{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/")
}
