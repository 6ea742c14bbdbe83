//! The `Authorization` session cookie.
//!
//! The browser holds the whole session: one cookie whose value is either
//! `Bearer <token>` or the `Failed` sentinel. The 30 second lifetime is a
//! re-login nudge only; the backend checks the token's real expiry on every
//! request.

use crate::api::AuthMode;
use crate::session::token::{Token, FAILED_SENTINEL};
use axum_extra::extract::cookie::{Cookie, CookieJar};
use reqwest::header::HeaderMap;

pub const SESSION_COOKIE: &str = "Authorization";
pub const COOKIE_MAX_AGE_SECS: i64 = 30;

/// What the browser's session cookie says.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Missing,
    Failed,
    Bearer(Token),
}

impl SessionState {
    pub fn from_jar(jar: &CookieJar) -> Self {
        match jar.get(SESSION_COOKIE).map(Cookie::value) {
            None => Self::Missing,
            Some(value) => match Token::from_bearer(value) {
                Some(token) => Self::Bearer(token),
                None => {
                    if value != FAILED_SENTINEL {
                        tracing::debug!("Unrecognised session cookie value; treating as failed");
                    }
                    Self::Failed
                }
            },
        }
    }

    pub fn token(&self) -> Option<&Token> {
        match self {
            Self::Bearer(token) => Some(token),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Missing => "none",
            Self::Failed => "failed",
            Self::Bearer(_) => "active",
        }
    }

    /// Headers to forward to the backend. Empty unless a bearer token is set.
    pub fn headers(&self) -> HeaderMap {
        self.token().map(Token::headers).unwrap_or_default()
    }
}

/// Build the session cookie for `value`, scoped to the backend host.
pub fn session_cookie(value: String, domain: String) -> Cookie<'static> {
    let max_age = time::Duration::seconds(COOKIE_MAX_AGE_SECS);
    Cookie::build((SESSION_COOKIE, value))
        .domain(domain)
        .path("/")
        .http_only(true)
        .max_age(max_age)
        .expires(time::OffsetDateTime::now_utc() + max_age)
        .build()
}

/// Page-access predicate.
///
/// Presence only: any cookie at all lets the request through when auth is
/// enforced. Use [`crate::session::validate`] when the token must actually
/// be checked.
pub fn is_authenticated(auth: AuthMode, jar: &CookieJar) -> bool {
    !auth.is_enforced() || jar.iter().next().is_some()
}
