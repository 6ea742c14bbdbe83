//! Token acquisition and validation against `api/v1/token/`.

use crate::api::client::{ApiClient, RequestOptions};
use crate::error::AppResult;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Method, StatusCode};
use rstuf_webui_types::{Endpoint, TokenInfo, TokenResponse};
use serde_json::Value;
use std::fmt;
use tracing::{debug, info, warn};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Username the console logs in as.
pub const ADMIN_USERNAME: &str = "admin";

/// Scopes requested for the console's token.
pub const ADMIN_SCOPES: &str = "write:targets write:bootstrap read:bootstrap read:settings \
                                read:token read:tasks write:token";

/// Requested token lifetime, in hours.
pub const TOKEN_EXPIRES_HOURS: u32 = 8;

/// Cookie value stored after a failed login.
pub const FAILED_SENTINEL: &str = "Failed";

/// Login form sent to the token endpoint. Used once, wiped on drop.
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct Credentials {
    username: String,
    password: String,
    scope: String,
    expires_hours: u32,
}

impl Credentials {
    pub fn admin(password: impl Into<String>) -> Self {
        Self {
            username: ADMIN_USERNAME.to_string(),
            password: password.into(),
            scope: ADMIN_SCOPES.to_string(),
            expires_hours: TOKEN_EXPIRES_HOURS,
        }
    }

    pub fn expires_hours(&self) -> u32 {
        self.expires_hours
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("scope", &self.scope)
            .field("expires_hours", &self.expires_hours)
            .finish()
    }
}

/// Bearer token issued by the backend.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Parse an `Authorization` value of the form `Bearer <token>`.
    pub fn from_bearer(value: &str) -> Option<Self> {
        value
            .strip_prefix("Bearer ")
            .filter(|raw| !raw.is_empty())
            .map(Self::new)
    }

    pub fn raw(&self) -> &str {
        &self.0
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }

    /// Headers carrying this token for a backend request.
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        match HeaderValue::from_str(&self.bearer()) {
            Ok(mut value) => {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            }
            Err(_) => warn!("Session token is not a valid header value; sending without it"),
        }
        headers
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(<redacted>)")
    }
}

/// Outcome of a password exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    Authenticated(Token),
    Failed { status: StatusCode },
}

impl LoginOutcome {
    /// Value written to the session cookie: `Bearer <token>` or `Failed`.
    pub fn cookie_value(&self) -> String {
        match self {
            Self::Authenticated(token) => token.bearer(),
            Self::Failed { .. } => FAILED_SENTINEL.to_string(),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(_))
    }
}

/// Exchange the admin password for a token.
///
/// Only an exact 200 with an `access_token` counts as success. A rejected
/// login is an ordinary [`LoginOutcome::Failed`]; only transport problems are
/// errors.
pub async fn login(client: &ApiClient, password: &str) -> AppResult<LoginOutcome> {
    let credentials = Credentials::admin(password);
    let expires = credentials.expires_hours.to_string();
    let form = [
        ("username", credentials.username.as_str()),
        ("password", credentials.password.as_str()),
        ("scope", credentials.scope.as_str()),
        ("expires", expires.as_str()),
    ];

    let response = client
        .send(
            Endpoint::Token.path(),
            Method::POST,
            RequestOptions {
                form: Some(&form),
                ..RequestOptions::default()
            },
        )
        .await?;

    if response.status != StatusCode::OK {
        warn!(status = response.status.as_u16(), "Login rejected by backend");
        return Ok(LoginOutcome::Failed {
            status: response.status,
        });
    }

    match response.json::<TokenResponse>() {
        Ok(body) if !body.access_token.is_empty() => {
            info!("Login succeeded");
            Ok(LoginOutcome::Authenticated(Token::new(body.access_token)))
        }
        _ => {
            warn!("Login answered 200 without an access token");
            Ok(LoginOutcome::Failed {
                status: response.status,
            })
        }
    }
}

/// Result of asking the backend about a token.
#[derive(Debug, Clone, Default)]
pub struct TokenValidation {
    pub valid: bool,
    pub data: Option<Value>,
}

impl TokenValidation {
    fn invalid() -> Self {
        Self::default()
    }
}

/// Ask the backend whether `token` is still good.
///
/// Stricter than the cookie presence check used by the page gate: only a 200
/// whose `data.expired` is exactly `false` is valid.
pub async fn validate(client: &ApiClient, token: &Token) -> AppResult<TokenValidation> {
    let headers = token.headers();
    let query = [("token", token.raw())];
    let response = client
        .send(
            Endpoint::Token.path(),
            Method::GET,
            RequestOptions {
                query: Some(&query),
                headers: Some(&headers),
                ..RequestOptions::default()
            },
        )
        .await?;

    if response.status == StatusCode::UNAUTHORIZED || response.status == StatusCode::FORBIDDEN {
        debug!(status = response.status.as_u16(), "Token rejected");
        return Ok(TokenValidation::invalid());
    }
    if response.status != StatusCode::OK {
        debug!(status = response.status.as_u16(), "Token check inconclusive");
        return Ok(TokenValidation::invalid());
    }

    let data = response
        .json_value()
        .ok()
        .and_then(|body| body.get("data").cloned())
        .filter(|data| data.is_object());
    let Some(data) = data else {
        return Ok(TokenValidation::invalid());
    };

    let info: Option<TokenInfo> = serde_json::from_value(data.clone()).ok();
    if info.and_then(|info| info.expired) == Some(false) {
        Ok(TokenValidation {
            valid: true,
            data: Some(data),
        })
    } else {
        Ok(TokenValidation::invalid())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(mock: &MockServer) -> ApiClient {
        ApiClient::new(&mock.uri(), Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn bearer_round_trip() {
        let token = Token::new("abc");
        assert_eq!(token.bearer(), "Bearer abc");
        assert_eq!(Token::from_bearer("Bearer abc"), Some(token));
        assert_eq!(Token::from_bearer("Failed"), None);
        assert_eq!(Token::from_bearer("Bearer "), None);
    }

    #[test]
    fn debug_output_hides_secrets() {
        let creds = Credentials::admin("hunter2");
        assert!(!format!("{creds:?}").contains("hunter2"));
        assert!(!format!("{:?}", Token::new("abc")).contains("abc"));
    }

    #[test]
    fn token_headers_carry_bearer() {
        let headers = Token::new("abc").headers();
        assert_eq!(headers.get(AUTHORIZATION).unwrap(), "Bearer abc");
        // Control characters cannot go into a header.
        assert!(Token::new("a\nb").headers().is_empty());
    }

    #[tokio::test]
    async fn login_success_wraps_bearer() {
        let mock = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/token/"))
            .and(body_string_contains("username=admin"))
            .and(body_string_contains("password=s3cret"))
            .and(body_string_contains("expires=8"))
            .and(body_string_contains("read%3Atasks"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"access_token": "abc"})))
            .expect(1)
            .mount(&mock)
            .await;

        let outcome = login(&client_for(&mock), "s3cret").await.unwrap();
        assert_eq!(outcome, LoginOutcome::Authenticated(Token::new("abc")));
        assert_eq!(outcome.cookie_value(), "Bearer abc");
    }

    #[tokio::test]
    async fn login_non_200_yields_failed_sentinel() {
        for status in [201u16, 401, 403, 500] {
            let mock = MockServer::start().await;
            Mock::given(method("POST"))
                .and(path("/api/v1/token/"))
                .respond_with(
                    ResponseTemplate::new(status).set_body_json(json!({"access_token": "abc"})),
                )
                .mount(&mock)
                .await;

            let outcome = login(&client_for(&mock), "wrong").await.unwrap();
            assert!(!outcome.is_authenticated());
            assert_eq!(outcome.cookie_value(), FAILED_SENTINEL);
        }
    }

    #[tokio::test]
    async fn login_200_without_token_is_failed() {
        let mock = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/token/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"detail": "?"})))
            .mount(&mock)
            .await;

        let outcome = login(&client_for(&mock), "pw").await.unwrap();
        assert_eq!(outcome.cookie_value(), "Failed");
    }

    async fn validate_with(template: ResponseTemplate) -> TokenValidation {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/token/"))
            .and(query_param("token", "abc"))
            .and(header("Authorization", "Bearer abc"))
            .respond_with(template)
            .expect(1)
            .mount(&mock)
            .await;
        validate(&client_for(&mock), &Token::new("abc")).await.unwrap()
    }

    #[tokio::test]
    async fn validate_accepts_unexpired_token() {
        let result = validate_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"data": {"expired": false, "scope": "read:tasks"}})),
        )
        .await;
        assert!(result.valid);
        assert_eq!(result.data.unwrap()["scope"], json!("read:tasks"));
    }

    #[tokio::test]
    async fn validate_rejects_everything_else() {
        let cases = [
            ResponseTemplate::new(401),
            ResponseTemplate::new(403),
            ResponseTemplate::new(500),
            ResponseTemplate::new(200).set_body_json(json!({"data": {"expired": true}})),
            ResponseTemplate::new(200).set_body_json(json!({"data": {}})),
            ResponseTemplate::new(200).set_body_json(json!({"message": "no data"})),
            ResponseTemplate::new(200).set_body_string("not json"),
        ];
        for template in cases {
            let result = validate_with(template).await;
            assert!(!result.valid);
            assert!(result.data.is_none());
        }
    }
}
