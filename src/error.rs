use crate::web::templates::ErrorPage;
use askama::Template;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Redirect, Response};
use thiserror::Error;

/// Application-wide error types
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid server URL {0}")]
    InvalidServerUrl(String),

    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Internal Error. Invalid HTTP/S method: {0}")]
    UnsupportedMethod(reqwest::Method),

    #[error("Unexpected response {status}: {body}")]
    UnexpectedResponse { status: StatusCode, body: String },

    #[error("Failed to trigger {action}. {status} {body}")]
    TriggerFailed {
        action: &'static str,
        status: StatusCode,
        body: String,
    },

    #[error("Malformed response from backend: {0}")]
    MalformedResponse(String),

    #[error("No data received {0}")]
    MissingData(String),

    #[error("No state in data received {0}")]
    MissingState(String),

    #[error("Failed: {0}")]
    TaskFailed(String),

    #[error("Invalid JSON payload: {0}")]
    InvalidPayload(#[from] serde_json::Error),

    #[error("Task {0} wait cancelled")]
    Cancelled(String),

    #[error("Task {0} did not finish in time")]
    Timeout(String),

    #[error("Template error: {0}")]
    Template(#[from] askama::Error),

    #[error("Page not found")]
    NotFound,
}

impl AppError {
    /// The backend refused the session token (401/403).
    pub fn is_session_rejected(&self) -> bool {
        match self {
            Self::UnexpectedResponse { status, .. } | Self::TriggerFailed { status, .. } => {
                *status == StatusCode::UNAUTHORIZED || *status == StatusCode::FORBIDDEN
            }
            _ => false,
        }
    }
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;

/// Convert AppError to HTTP status codes for web responses
impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidServerUrl(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Transport(_) => StatusCode::BAD_GATEWAY,
            Self::UnsupportedMethod(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::UnexpectedResponse { .. } => StatusCode::BAD_GATEWAY,
            Self::TriggerFailed { .. } => StatusCode::BAD_GATEWAY,
            Self::MalformedResponse(_) => StatusCode::BAD_GATEWAY,
            Self::MissingData(_) => StatusCode::BAD_GATEWAY,
            Self::MissingState(_) => StatusCode::BAD_GATEWAY,
            Self::TaskFailed(_) => StatusCode::BAD_GATEWAY,
            Self::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            Self::Cancelled(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
            Self::Template(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound => StatusCode::NOT_FOUND,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Cookie outlived the token; send the admin back to the login form.
        if self.is_session_rejected() {
            tracing::info!(error = %self, "backend rejected session token");
            return Redirect::to("/admin/").into_response();
        }

        let status = self.status_code();
        tracing::warn!(status = status.as_u16(), error = %self, "request failed");

        let page = ErrorPage {
            title: "Error",
            code: status.as_u16(),
            message: self.to_string(),
        };
        match page.render() {
            Ok(body) => (status, Html(body)).into_response(),
            Err(_) => (status, self.to_string()).into_response(),
        }
    }
}
