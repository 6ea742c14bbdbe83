//! Startup probe deciding whether the backend enforces authentication.

use crate::api::client::{ApiClient, RequestOptions};
use crate::error::AppResult;
use reqwest::{Method, StatusCode};
use rstuf_webui_types::Endpoint;
use serde::Serialize;
use tracing::info;

/// Whether the backend requires a bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMode {
    Enforced,
    Disabled,
}

impl AuthMode {
    /// Only a missing token endpoint turns auth off. Any other answer means
    /// the endpoint exists, so a token is needed to use the API.
    pub fn from_probe_status(status: StatusCode) -> Self {
        if status == StatusCode::NOT_FOUND {
            Self::Disabled
        } else {
            Self::Enforced
        }
    }

    pub fn is_enforced(self) -> bool {
        self == Self::Enforced
    }
}

/// Send an unauthenticated GET to the token endpoint and classify the status.
/// The body is never read.
pub async fn resolve(client: &ApiClient) -> AppResult<AuthMode> {
    let response = client
        .send(Endpoint::Token.path(), Method::GET, RequestOptions::default())
        .await?;
    let mode = AuthMode::from_probe_status(response.status);
    info!(
        status = response.status.as_u16(),
        auth = ?mode,
        "Resolved backend auth mode"
    );
    Ok(mode)
}
