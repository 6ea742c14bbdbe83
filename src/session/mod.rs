//! Admin session handling: password exchange, the session cookie, and the
//! two access predicates (cheap presence check and backend validation).

pub mod cookie;
pub mod token;

pub use cookie::{is_authenticated, session_cookie, SessionState, SESSION_COOKIE};
pub use token::{login, validate, Credentials, LoginOutcome, Token, TokenValidation, FAILED_SENTINEL};
