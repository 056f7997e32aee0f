//! Single-shot JSON client for the spreadsheet REST endpoints.

use anyhow::{Context, Result};
use log::debug;
use reqwest::{Client, Method, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::error::{ApiError, check_status};

/// HTTP client issuing one request per call.
///
/// Retrying is left to the caller (see [`crate::retry::with_retry`]), which
/// retries each remote call on its own.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Creates a new HTTP client wrapping the given reqwest Client.
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Returns a reference to the underlying reqwest Client.
    pub fn inner(&self) -> &Client {
        &self.client
    }

    /// Performs a GET request and deserializes the JSON response.
    #[tracing::instrument(skip(self))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!("GET JSON from {}...", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Failed to send request")?;

        decode_json(check_status(response).await?).await
    }

    /// Sends `body` as JSON with the given method and deserializes the JSON response.
    #[tracing::instrument(skip(self, body))]
    pub async fn send_json<T, B>(&self, method: Method, url: Url, body: &B) -> Result<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        debug!("{} JSON to {}...", method, url);

        let response = self
            .client
            .request(method, url)
            .json(body)
            .send()
            .await
            .context("Failed to send request")?;

        decode_json(check_status(response).await?).await
    }
}

/// Reads the whole body and decodes it, reporting undecodable bodies as
/// [`ApiError::MalformedResponse`].
async fn decode_json<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response
        .text()
        .await
        .map_err(|e| ApiError::MalformedResponse(e.to_string()))?;

    serde_json::from_str(&body).map_err(|e| ApiError::MalformedResponse(e.to_string()).into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn url(server: &mockito::ServerGuard, path: &str) -> Url {
        Url::parse(&format!("{}{}", server.url(), path)).unwrap()
    }

    #[tokio::test]
    async fn test_get_json_success() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"name": "test", "value": 42}"#)
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());

        #[derive(serde::Deserialize, Debug, PartialEq)]
        struct TestResponse {
            name: String,
            value: i32,
        }

        let result: TestResponse = client.get_json(url(&server, "/test")).await.unwrap();

        mock.assert_async().await;
        assert_eq!(result.name, "test");
        assert_eq!(result.value, 42);
    }

    #[tokio::test]
    async fn test_get_json_not_found() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/test")
            .with_status(404)
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());

        let result: Result<serde_json::Value> = client.get_json(url(&server, "/test")).await;

        mock.assert_async().await;
        let err = result.unwrap_err();
        let api_err = err.downcast_ref::<ApiError>().unwrap();
        assert_eq!(api_err.status(), Some(reqwest::StatusCode::NOT_FOUND));
    }

    #[tokio::test]
    async fn test_get_json_truncated_body_is_malformed() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("GET", "/test")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"values": [["a", "b"#)
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let result: Result<serde_json::Value> = client.get_json(url(&server, "/test")).await;

        mock.assert_async().await;
        let err = result.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_send_json_posts_body() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("POST", "/submit")
            .match_header("content-type", "application/json")
            .match_body(Matcher::Json(serde_json::json!({"ranges": ["'Data'!A1:B2"]})))
            .with_status(200)
            .with_body("{}")
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let body = serde_json::json!({"ranges": ["'Data'!A1:B2"]});
        let _: serde::de::IgnoredAny = client
            .send_json(Method::POST, url(&server, "/submit"), &body)
            .await
            .unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_json_service_error() {
        let mut server = mockito::Server::new_async().await;

        let mock = server
            .mock("PUT", "/submit")
            .with_status(503)
            .with_body(r#"{"error": {"code": 503, "message": "The service is currently unavailable.", "status": "UNAVAILABLE"}}"#)
            .create_async()
            .await;

        let client = HttpClient::new(Client::new());
        let result: Result<serde_json::Value> = client
            .send_json(Method::PUT, url(&server, "/submit"), &serde_json::json!({}))
            .await;

        mock.assert_async().await;
        let err = result.unwrap_err();
        let api_err = err.downcast_ref::<ApiError>().unwrap();
        assert_eq!(api_err.message(), "The service is currently unavailable.");
    }
}
