use crate::api::{auth_mode, ApiClient, AuthMode};
use crate::error::{AppError, AppResult};
use config::{Config, ConfigError, Environment, File};
use reqwest::Url;
use serde::Deserialize;
use std::time::Duration;

/// Console web server configuration
#[derive(Debug, Deserialize, Clone)]
pub struct WebConfig {
    #[serde(default = "default_web_host")]
    pub host: String,
    #[serde(default = "default_web_port")]
    pub port: u16,
}

fn default_web_host() -> String {
    "0.0.0.0".to_string()
}

fn default_web_port() -> u16 {
    8080
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
        }
    }
}

/// HTTP client settings for the repository service
#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    /// Per-request timeout
    #[serde(default = "default_backend_timeout")]
    pub timeout_secs: u64,
}

fn default_backend_timeout() -> u64 {
    30
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_backend_timeout(),
        }
    }
}

/// Task waiting settings
#[derive(Debug, Deserialize, Clone)]
pub struct TasksConfig {
    /// Upper bound a page waits for a triggered task before giving up
    #[serde(default = "default_task_timeout")]
    pub timeout_secs: u64,
}

fn default_task_timeout() -> u64 {
    300
}

impl Default for TasksConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_task_timeout(),
        }
    }
}

/// Root application configuration, as loaded from disk and environment
#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    /// Repository service base URL, e.g. `http://api.dev.rstuf.org`
    pub server: String,
    #[serde(default)]
    pub web: WebConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub tasks: TasksConfig,
}

impl AppConfig {
    /// Load configuration from files and environment variables
    pub fn load() -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::with_name("settings").required(false))
            // Override with environment variables (prefix: RSTUF_)
            // e.g., RSTUF_SERVER, RSTUF_WEB__PORT
            .add_source(
                Environment::with_prefix("RSTUF")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }

    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.timeout_secs)
    }
}

/// Configuration after startup probing. Built once and shared read-only.
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub server: String,
    pub auth: AuthMode,
    pub task_timeout: Duration,
}

impl ResolvedConfig {
    /// Probe the backend for its auth mode and freeze the result.
    pub async fn resolve(config: &AppConfig, client: &ApiClient) -> AppResult<Self> {
        let auth = auth_mode::resolve(client).await?;
        Ok(Self::with_auth(config, auth))
    }

    pub fn with_auth(config: &AppConfig, auth: AuthMode) -> Self {
        Self {
            server: config.server.clone(),
            auth,
            task_timeout: Duration::from_secs(config.tasks.timeout_secs),
        }
    }

    /// Host part of the server URL, used as the session cookie domain.
    pub fn cookie_domain(&self) -> AppResult<String> {
        server_host(&self.server)
    }
}

/// Extract the bare host (no scheme, port, or path) from a server URL.
pub fn server_host(server: &str) -> AppResult<String> {
    let url = Url::parse(server).map_err(|_| AppError::InvalidServerUrl(server.to_string()))?;
    url.host_str()
        .map(str::to_string)
        .ok_or_else(|| AppError::InvalidServerUrl(server.to_string()))
}

/// Join the server URL and a relative path with exactly one slash
pub fn endpoint_url(server: &str, path: &str) -> String {
    let base = server.trim_end_matches('/');
    let path = path.trim_start_matches('/');
    format!("{}/{}", base, path)
}
