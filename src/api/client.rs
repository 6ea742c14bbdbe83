use crate::config::{endpoint_url, AppConfig};
use crate::error::{AppError, AppResult};
use reqwest::header::HeaderMap;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error};

/// Optional parts of a backend request
#[derive(Debug, Default, Clone, Copy)]
pub struct RequestOptions<'a> {
    pub json: Option<&'a Value>,
    pub form: Option<&'a [(&'a str, &'a str)]>,
    pub query: Option<&'a [(&'a str, &'a str)]>,
    pub headers: Option<&'a HeaderMap>,
}

impl<'a> RequestOptions<'a> {
    pub fn with_headers(headers: &'a HeaderMap) -> Self {
        Self {
            headers: Some(headers),
            ..Self::default()
        }
    }
}

/// Raw backend answer. Status interpretation is left to the caller.
#[derive(Debug, Clone)]
pub struct BackendResponse {
    pub status: StatusCode,
    pub body: String,
}

impl BackendResponse {
    /// Decode the body. A body that does not fit `T` is the backend's
    /// fault, never the operator's.
    pub fn json<T: DeserializeOwned>(&self) -> AppResult<T> {
        serde_json::from_str(&self.body).map_err(|e| {
            debug!(status = self.status.as_u16(), error = %e, "Undecodable backend body");
            AppError::MalformedResponse(self.body.clone())
        })
    }

    pub fn json_value(&self) -> AppResult<Value> {
        self.json()
    }
}

/// Client for the repository service REST API
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> AppResult<Self> {
        let http = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Create a new API client from config
    pub fn from_config(config: &AppConfig) -> AppResult<Self> {
        Self::new(&config.server, config.backend_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one request to the backend.
    ///
    /// Only GET and POST are accepted; anything else is rejected before a
    /// connection is opened. Network failures surface as
    /// [`AppError::Transport`]; every HTTP status, including 4xx/5xx, is
    /// returned as-is.
    pub async fn send(
        &self,
        path: &str,
        method: Method,
        options: RequestOptions<'_>,
    ) -> AppResult<BackendResponse> {
        if method != Method::GET && method != Method::POST {
            error!(%method, path, "refusing unsupported HTTP method");
            return Err(AppError::UnsupportedMethod(method));
        }

        let url = endpoint_url(&self.base_url, path);
        debug!(%method, %url, "Sending backend request");

        let mut request = self.http.request(method, &url);
        if let Some(query) = options.query {
            request = request.query(query);
        }
        if let Some(json) = options.json {
            request = request.json(json);
        }
        if let Some(form) = options.form {
            request = request.form(form);
        }
        if let Some(headers) = options.headers {
            request = request.headers(headers.clone());
        }

        let response = request.send().await.map_err(|e| {
            error!("Backend request to {} failed: {}", url, e);
            AppError::Transport(e)
        })?;

        let status = response.status();
        let body = response.text().await?;
        debug!(status = status.as_u16(), %url, "Backend responded");

        Ok(BackendResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_string_contains, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ApiClient {
        ApiClient::new(&server.uri(), Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn unsupported_methods_never_reach_the_network() {
        let mock = MockServer::start().await;
        Mock::given(wiremock::matchers::any())
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&mock)
            .await;

        let client = client_for(&mock);
        for m in [Method::PUT, Method::DELETE, Method::PATCH, Method::HEAD] {
            let err = client
                .send("api/v1/token/", m.clone(), RequestOptions::default())
                .await
                .unwrap_err();
            assert!(matches!(err, AppError::UnsupportedMethod(ref got) if *got == m));
        }
    }

    #[tokio::test]
    async fn unsupported_method_checked_before_transport() {
        // Nothing listens on port 1; a network attempt would yield Transport.
        let client = ApiClient::new("http://127.0.0.1:1", Duration::from_secs(1)).unwrap();
        let err = client
            .send("api/v1/token/", Method::PUT, RequestOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnsupportedMethod(_)));
    }

    #[tokio::test]
    async fn connection_failure_is_a_transport_error() {
        let client = ApiClient::new("http://127.0.0.1:1", Duration::from_secs(1)).unwrap();
        let err = client
            .send("api/v1/token/", Method::GET, RequestOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Transport(_)));
    }

    #[tokio::test]
    async fn non_success_status_is_returned_not_raised() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/bootstrap/"))
            .respond_with(ResponseTemplate::new(500).set_body_string("oops"))
            .mount(&mock)
            .await;

        let response = client_for(&mock)
            .send("api/v1/bootstrap/", Method::GET, RequestOptions::default())
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(response.body, "oops");
    }

    #[tokio::test]
    async fn joins_base_and_path_and_forwards_options() {
        let mock = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/v1/token/"))
            .and(query_param("a", "1"))
            .and(header("Authorization", "Bearer abc"))
            .and(body_string_contains("username=admin"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&mock)
            .await;

        // Trailing slash on the base must not double up.
        let client = ApiClient::new(&format!("{}/", mock.uri()), Duration::from_secs(5)).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", "Bearer abc".parse().unwrap());
        let form = [("username", "admin")];
        let query = [("a", "1")];

        let response = client
            .send(
                "/api/v1/token/",
                Method::POST,
                RequestOptions {
                    form: Some(&form),
                    query: Some(&query),
                    headers: Some(&headers),
                    ..RequestOptions::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(response.status, StatusCode::OK);
        assert_eq!(response.json_value().unwrap(), json!({"ok": true}));
    }
}
