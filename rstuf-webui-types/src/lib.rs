//! Wire types for the Repository Service for TUF REST API.
//!
//! The backend wraps every answer in a `{"data": ..., "message": ...}`
//! envelope. The console only reads a handful of fields out of it, so the
//! types here stay narrow and leave everything else as raw JSON.

use serde::Deserialize;

/// Backend endpoints, relative to the configured server URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    /// Token issue (POST) and inspection (GET)
    Token,
    /// Bootstrap state of the repository
    Bootstrap,
    /// Task status, keyed by the `task_id` query parameter
    Task,
    /// Publish pending targets
    PublishTargets,
    /// Sign metadata with an offline key
    MetadataSign,
}

impl Endpoint {
    pub const fn path(self) -> &'static str {
        match self {
            Self::Token => "api/v1/token/",
            Self::Bootstrap => "api/v1/bootstrap/",
            Self::Task => "api/v1/task/",
            Self::PublishTargets => "api/v1/targets/publish/",
            Self::MetadataSign => "api/v1/metadata/sign/",
        }
    }
}

/// Terminal outcome of a backend task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Terminal {
    Success,
    Failure,
}

/// State label reported by the task endpoint.
///
/// Only `SUCCESS` and `FAILURE` end a task. Every other label (`PENDING`,
/// `RECEIVED`, `STARTED`, `RUNNING`, ...) is carried verbatim so it can be
/// logged as the backend reported it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskState {
    Terminal(Terminal),
    InProgress(String),
}

impl TaskState {
    pub const SUCCESS: &'static str = "SUCCESS";
    pub const FAILURE: &'static str = "FAILURE";

    pub fn from_label(label: &str) -> Self {
        match label {
            Self::SUCCESS => Self::Terminal(Terminal::Success),
            Self::FAILURE => Self::Terminal(Terminal::Failure),
            other => Self::InProgress(other.to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Terminal(Terminal::Success) => Self::SUCCESS,
            Self::Terminal(Terminal::Failure) => Self::FAILURE,
            Self::InProgress(label) => label,
        }
    }
}

/// Standard response envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Body of a successful `POST api/v1/token/`.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
}

/// `data` of an accepted trigger (publish, sign).
#[derive(Debug, Clone, Deserialize)]
pub struct TaskSubmitted {
    pub task_id: String,
}

/// `data` of `GET api/v1/bootstrap/`.
#[derive(Debug, Clone, Deserialize)]
pub struct BootstrapData {
    pub bootstrap: bool,
}

/// `data` of `GET api/v1/token/` for a presented token. Only the expiry flag
/// is read; the rest of the object is shown to the operator as raw JSON.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenInfo {
    #[serde(default)]
    pub expired: Option<bool>,
}
