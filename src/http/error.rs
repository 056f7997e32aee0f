//! Typed failures produced by the HTTP layer.

use reqwest::{Response, StatusCode};
use serde::Deserialize;

/// A failed request against the spreadsheet service.
#[derive(Debug)]
pub enum ApiError {
    /// The service answered with a non-success status.
    Status { status: StatusCode, message: String },
    /// The response body could not be decoded as the expected JSON.
    MalformedResponse(String),
}

impl ApiError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::MalformedResponse(_) => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::Status { message, .. } => message,
            ApiError::MalformedResponse(message) => message,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Status { status, message } => {
                write!(f, "APIError [{}]: {}", status.as_u16(), message)
            }
            ApiError::MalformedResponse(msg) => {
                write!(f, "Malformed response: {}", msg)
            }
        }
    }
}

impl std::error::Error for ApiError {}

/// Google error envelope: `{"error": {"code": 429, "message": "...", "status": "..."}}`.
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Extracts the service message from an error body, falling back to the raw text.
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        return envelope.error.message;
    }

    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("Unknown error")
            .to_string()
    } else {
        body.to_string()
    }
}

/// Passes a successful response through, or converts it into an [`ApiError::Status`].
pub async fn check_status(response: Response) -> anyhow::Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(ApiError::Status {
        status,
        message: error_message(status, &body),
    }
    .into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Status {
            status: StatusCode::TOO_MANY_REQUESTS,
            message: "Quota exceeded".to_string(),
        };
        assert_eq!(err.to_string(), "APIError [429]: Quota exceeded");

        let err = ApiError::MalformedResponse("expected value at line 1".to_string());
        assert!(err.to_string().contains("Malformed response"));
    }

    #[test]
    fn test_api_error_accessors() {
        let err = ApiError::Status {
            status: StatusCode::BAD_GATEWAY,
            message: "Server Error".to_string(),
        };
        assert_eq!(err.status(), Some(StatusCode::BAD_GATEWAY));
        assert_eq!(err.message(), "Server Error");

        let err = ApiError::MalformedResponse("eof".to_string());
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_error_message_from_envelope() {
        let body = r#"{"error": {"code": 429, "message": "Quota exceeded for quota metric 'Read requests'", "status": "RESOURCE_EXHAUSTED"}}"#;
        assert_eq!(
            error_message(StatusCode::TOO_MANY_REQUESTS, body),
            "Quota exceeded for quota metric 'Read requests'"
        );
    }

    #[test]
    fn test_error_message_raw_body() {
        assert_eq!(
            error_message(StatusCode::BAD_GATEWAY, "<html>Server Error</html>\n"),
            "<html>Server Error</html>"
        );
    }

    #[test]
    fn test_error_message_empty_body() {
        assert_eq!(
            error_message(StatusCode::SERVICE_UNAVAILABLE, ""),
            "Service Unavailable"
        );
    }

    #[tokio::test]
    async fn test_check_status_success() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/")
            .with_status(200)
            .create_async()
            .await;

        let response = reqwest::get(server.url()).await.unwrap();
        assert!(check_status(response).await.is_ok());
    }

    #[tokio::test]
    async fn test_check_status_not_found() {
        let mut server = mockito::Server::new_async().await;
        let _m = server
            .mock("GET", "/")
            .with_status(404)
            .with_body(r#"{"error": {"code": 404, "message": "Requested entity was not found.", "status": "NOT_FOUND"}}"#)
            .create_async()
            .await;

        let response = reqwest::get(server.url()).await.unwrap();
        let err = check_status(response).await.unwrap_err();
        let api_err = err.downcast_ref::<ApiError>().unwrap();

        assert_eq!(api_err.status(), Some(StatusCode::NOT_FOUND));
        assert_eq!(api_err.message(), "Requested entity was not found.");
    }
}
