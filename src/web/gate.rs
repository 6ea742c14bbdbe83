//! Access gate for admin pages.
//!
//! Composed onto the gated sub-router with
//! `middleware::from_fn_with_state(config, require_session)`. The decision
//! itself is [`is_authenticated`], a cookie presence check; it never calls
//! the backend.

use crate::config::ResolvedConfig;
use crate::session::is_authenticated;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::cookie::CookieJar;
use std::sync::Arc;
use tracing::debug;

/// Where unauthenticated visitors are sent.
pub const LOGIN_PATH: &str = "/admin";

/// Redirect to the login page when auth is enforced and the request has no
/// cookies; otherwise run the wrapped handler once.
///
/// The redirect is `303 See Other` so a gated form POST lands on the login
/// page as a GET.
pub async fn require_session(
    State(config): State<Arc<ResolvedConfig>>,
    jar: CookieJar,
    request: Request,
    next: Next,
) -> Response {
    if !is_authenticated(config.auth, &jar) {
        debug!(path = %request.uri().path(), "No session cookie, redirecting to login");
        return Redirect::to(LOGIN_PATH).into_response();
    }
    next.run(request).await
}
