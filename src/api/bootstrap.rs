use crate::api::client::{ApiClient, RequestOptions};
use crate::error::{AppError, AppResult};
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use rstuf_webui_types::{BootstrapData, Endpoint, Envelope};
use serde::Serialize;
use tracing::debug;

/// Bootstrap state as reported by the backend. Fetched per page view.
#[derive(Debug, Clone, Serialize)]
pub struct BootstrapStatus {
    pub is_bootstrapped: bool,
    pub message: String,
}

impl ApiClient {
    /// Fetch the repository bootstrap state.
    ///
    /// A 404 means the server has no bootstrap endpoint, which is reported
    /// as "not bootstrapped" rather than an error.
    pub async fn bootstrap_status(&self, headers: &HeaderMap) -> AppResult<BootstrapStatus> {
        let response = self
            .send(
                Endpoint::Bootstrap.path(),
                Method::GET,
                RequestOptions::with_headers(headers),
            )
            .await?;

        if response.status == StatusCode::NOT_FOUND {
            return Ok(BootstrapStatus {
                is_bootstrapped: false,
                message: format!("Server {} does not allow bootstrap", self.base_url()),
            });
        }

        if response.status != StatusCode::OK {
            return Err(AppError::UnexpectedResponse {
                status: response.status,
                body: response.body,
            });
        }

        let envelope: Envelope<BootstrapData> = response.json()?;
        let data = envelope
            .data
            .ok_or_else(|| AppError::MissingData(response.body.clone()))?;
        debug!(bootstrap = data.bootstrap, "Bootstrap status fetched");

        Ok(BootstrapStatus {
            is_bootstrapped: data.bootstrap,
            message: envelope.message.unwrap_or_default(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn serve(template: ResponseTemplate) -> (MockServer, ApiClient) {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/bootstrap/"))
            .respond_with(template)
            .mount(&mock)
            .await;
        let client = ApiClient::new(&mock.uri(), Duration::from_secs(5)).unwrap();
        (mock, client)
    }

    #[tokio::test]
    async fn reads_flag_and_message() {
        let (_mock, client) = serve(ResponseTemplate::new(200).set_body_json(json!({
            "data": {"bootstrap": true, "state": "finished"},
            "message": "System LOCKED for bootstrap."
        })))
        .await;

        let status = client.bootstrap_status(&HeaderMap::new()).await.unwrap();
        assert!(status.is_bootstrapped);
        assert_eq!(status.message, "System LOCKED for bootstrap.");
    }

    #[tokio::test]
    async fn not_found_means_bootstrap_unsupported() {
        let (mock, client) = serve(ResponseTemplate::new(404)).await;
        let status = client.bootstrap_status(&HeaderMap::new()).await.unwrap();
        assert!(!status.is_bootstrapped);
        assert_eq!(
            status.message,
            format!("Server {} does not allow bootstrap", mock.uri())
        );
    }

    #[tokio::test]
    async fn missing_data_is_an_error() {
        let (_mock, client) =
            serve(ResponseTemplate::new(200).set_body_json(json!({"message": "?"}))).await;
        let err = client.bootstrap_status(&HeaderMap::new()).await.unwrap_err();
        assert!(matches!(err, AppError::MissingData(_)));
    }

    #[tokio::test]
    async fn non_json_body_is_malformed_response() {
        let (_mock, client) =
            serve(ResponseTemplate::new(200).set_body_string("<html>gateway</html>")).await;
        let err = client.bootstrap_status(&HeaderMap::new()).await.unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse(_)));
        assert_eq!(err.status_code(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn unauthorized_surfaces_status() {
        let (_mock, client) = serve(ResponseTemplate::new(401)).await;
        let err = client.bootstrap_status(&HeaderMap::new()).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::UnexpectedResponse { status, .. } if status == StatusCode::UNAUTHORIZED
        ));
    }

    #[tokio::test]
    async fn forwards_session_header() {
        let mock = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v1/bootstrap/"))
            .and(header("Authorization", "Bearer abc"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": {"bootstrap": false},
                "message": "Bootstrap available"
            })))
            .expect(1)
            .mount(&mock)
            .await;

        let client = ApiClient::new(&mock.uri(), Duration::from_secs(5)).unwrap();
        let mut headers = HeaderMap::new();
        headers.insert("Authorization", "Bearer abc".parse().unwrap());
        let status = client.bootstrap_status(&headers).await.unwrap();
        assert!(!status.is_bootstrapped);
    }
}
