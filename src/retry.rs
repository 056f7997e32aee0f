//! Retry logic for spreadsheet operations with error classification.

use std::future::Future;
use std::time::Duration;

use anyhow::Result;
use log::{debug, warn};
use reqwest::StatusCode;

use crate::http::ApiError;

/// Default maximum number of attempts for a remote operation.
pub const MAX_ATTEMPTS: usize = 9;

/// Default delay between attempts.
pub const RETRY_DELAY: Duration = Duration::from_secs(30);

/// How many times an operation is attempted and how long to wait in between.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: usize,
    delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(MAX_ATTEMPTS, RETRY_DELAY)
    }
}

impl RetryPolicy {
    /// A budget of 0 is raised to 1; the operation always runs once.
    pub fn new(max_attempts: usize, delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            delay,
        }
    }

    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }
}

/// Outcome class of a failed remote operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Truncated or otherwise undecodable response body.
    MalformedResponse,
    /// Upstream returned 502/503 or reported itself unavailable.
    ServiceUnavailable,
    /// Quota or per-minute request limit exhausted.
    RateLimited,
    /// Anything else. Never retried.
    NonTransient,
}

impl ErrorKind {
    pub fn is_transient(self) -> bool {
        !matches!(self, ErrorKind::NonTransient)
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::MalformedResponse => write!(f, "malformed response"),
            ErrorKind::ServiceUnavailable => write!(f, "service unavailable"),
            ErrorKind::RateLimited => write!(f, "rate limit hit"),
            ErrorKind::NonTransient => write!(f, "non-transient error"),
        }
    }
}

/// Classifies an error by walking its cause chain.
pub fn classify(error: &anyhow::Error) -> ErrorKind {
    for cause in error.chain() {
        if let Some(api) = cause.downcast_ref::<ApiError>() {
            return classify_api_error(api);
        }
        if cause.downcast_ref::<serde_json::Error>().is_some() {
            return ErrorKind::MalformedResponse;
        }
        if cause
            .downcast_ref::<reqwest::Error>()
            .is_some_and(reqwest::Error::is_decode)
        {
            return ErrorKind::MalformedResponse;
        }
    }

    ErrorKind::NonTransient
}

fn classify_api_error(error: &ApiError) -> ErrorKind {
    let status = match error {
        ApiError::MalformedResponse(_) => return ErrorKind::MalformedResponse,
        ApiError::Status { status, .. } => *status,
    };
    let message = error.message();
    let lowered = message.to_lowercase();

    if status == StatusCode::TOO_MANY_REQUESTS
        || message.contains("Quota exceeded")
        || message.contains("Read requests per minute per user")
    {
        return ErrorKind::RateLimited;
    }

    if status == StatusCode::BAD_GATEWAY
        || status == StatusCode::SERVICE_UNAVAILABLE
        || lowered.contains("server error")
        || lowered.contains("the service is currently unavailable")
    {
        return ErrorKind::ServiceUnavailable;
    }

    ErrorKind::NonTransient
}

/// Runs `operation` until it succeeds, fails with a non-transient error, or
/// the attempt budget is spent. The last error is returned unchanged.
pub async fn with_retry<F, Fut, T>(
    policy: &RetryPolicy,
    operation_name: &str,
    mut operation: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let max_attempts = policy.max_attempts();
    let mut attempt = 1;

    loop {
        let error = match operation().await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        let kind = classify(&error);
        if !kind.is_transient() {
            debug!("{}: non-retryable error: {:#}", operation_name, error);
            return Err(error);
        }

        if attempt >= max_attempts {
            warn!(
                "{}: {} after {} attempt(s), giving up",
                operation_name, kind, attempt
            );
            return Err(error);
        }

        warn!(
            "{}: {}. Retrying ({}/{}) in {:?}...",
            operation_name, kind, attempt, max_attempts, policy.delay()
        );
        tokio::time::sleep(policy.delay()).await;
        attempt += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn status_error(status: u16, message: &str) -> anyhow::Error {
        anyhow::Error::from(ApiError::Status {
            status: StatusCode::from_u16(status).unwrap(),
            message: message.to_string(),
        })
    }

    fn instant(max_attempts: usize) -> RetryPolicy {
        RetryPolicy::new(max_attempts, Duration::ZERO)
    }

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_attempts(), 9);
        assert_eq!(policy.delay(), Duration::from_secs(30));
    }

    #[test]
    fn test_zero_attempts_is_raised_to_one() {
        assert_eq!(RetryPolicy::new(0, Duration::ZERO).max_attempts(), 1);
    }

    #[test]
    fn test_classify_rate_limited() {
        assert_eq!(classify(&status_error(429, "Too Many Requests")), ErrorKind::RateLimited);
        assert_eq!(
            classify(&status_error(
                403,
                "Quota exceeded for quota metric 'Read requests' and limit 'Read requests per minute per user'"
            )),
            ErrorKind::RateLimited
        );
    }

    #[test]
    fn test_classify_service_unavailable() {
        assert_eq!(classify(&status_error(502, "")), ErrorKind::ServiceUnavailable);
        assert_eq!(
            classify(&status_error(503, "The service is currently unavailable.")),
            ErrorKind::ServiceUnavailable
        );
        assert_eq!(
            classify(&status_error(500, "Internal Server Error")),
            ErrorKind::ServiceUnavailable
        );
    }

    #[test]
    fn test_classify_malformed_response() {
        let err = anyhow::Error::from(ApiError::MalformedResponse("EOF".to_string()));
        assert_eq!(classify(&err), ErrorKind::MalformedResponse);

        let json_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        assert_eq!(classify(&anyhow::Error::from(json_err)), ErrorKind::MalformedResponse);
    }

    #[test]
    fn test_classify_looks_through_context() {
        let err = status_error(429, "Too Many Requests").context("Reading 'Data'");
        assert_eq!(classify(&err), ErrorKind::RateLimited);
    }

    #[test]
    fn test_classify_non_transient() {
        assert_eq!(
            classify(&status_error(404, "Requested entity was not found.")),
            ErrorKind::NonTransient
        );
        assert_eq!(
            classify(&status_error(400, "Unable to parse range: Data!A")),
            ErrorKind::NonTransient
        );
        assert_eq!(classify(&anyhow::anyhow!("connection reset")), ErrorKind::NonTransient);
        assert!(!ErrorKind::NonTransient.is_transient());
        assert!(ErrorKind::RateLimited.is_transient());
    }

    #[tokio::test]
    async fn test_with_retry_success() {
        let result = with_retry(&instant(3), "test", || async { Ok::<_, anyhow::Error>(42) }).await;
        assert_eq!(result.unwrap(), 42);
    }

    #[test_log::test(tokio::test)]
    async fn test_with_retry_succeeds_on_third_attempt() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = Arc::clone(&attempts);

        let result = with_retry(&instant(3), "test", || {
            let attempts = Arc::clone(&attempts_clone);
            async move {
                let count = attempts.fetch_add(1, Ordering::SeqCst);
                if count < 2 {
                    Err(status_error(503, "The service is currently unavailable."))
                } else {
                    Ok("values")
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), "values");
        assert_eq!(attempts.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_with_retry_non_transient_runs_once() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = Arc::clone(&attempts);

        let result = with_retry(&instant(3), "test", || {
            let attempts = Arc::clone(&attempts_clone);
            async move {
                attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(status_error(404, "Requested entity was not found."))
            }
        })
        .await;

        assert!(result.is_err());
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[test_log::test(tokio::test)]
    async fn test_with_retry_exhausts_budget_for_every_transient_kind() {
        let failures: [fn() -> anyhow::Error; 3] = [
            || anyhow::Error::from(ApiError::MalformedResponse("EOF".to_string())),
            || status_error(502, "Bad Gateway"),
            || status_error(429, "Quota exceeded"),
        ];

        for make_error in failures {
            let attempts = Arc::new(AtomicUsize::new(0));
            let attempts_clone = Arc::clone(&attempts);

            let result = with_retry(&instant(4), "test", || {
                let attempts = Arc::clone(&attempts_clone);
                async move {
                    attempts.fetch_add(1, Ordering::SeqCst);
                    Err::<(), _>(make_error())
                }
            })
            .await;

            assert!(result.is_err());
            assert_eq!(attempts.load(Ordering::SeqCst), 4);
        }
    }

    #[tokio::test]
    async fn test_with_retry_returns_last_error_unchanged() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = Arc::clone(&attempts);

        let result = with_retry(&instant(2), "test", || {
            let attempts = Arc::clone(&attempts_clone);
            async move {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                Err::<(), _>(status_error(429, &format!("Quota exceeded #{}", n)))
            }
        })
        .await;

        let err = result.unwrap_err();
        assert_eq!(err.to_string(), "APIError [429]: Quota exceeded #1");
        assert!(err.downcast_ref::<ApiError>().is_some());
    }

    #[tokio::test]
    async fn test_with_retry_transient_then_non_transient() {
        let attempts = Arc::new(AtomicUsize::new(0));
        let attempts_clone = Arc::clone(&attempts);

        let result = with_retry(&instant(5), "test", || {
            let attempts = Arc::clone(&attempts_clone);
            async move {
                if attempts.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err::<(), _>(status_error(502, "Bad Gateway"))
                } else {
                    Err(status_error(403, "The caller does not have permission"))
                }
            }
        })
        .await;

        assert!(result.unwrap_err().to_string().contains("permission"));
        assert_eq!(attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_with_retry_waits_between_attempts() {
        let policy = RetryPolicy::new(2, Duration::from_millis(50));
        let start = std::time::Instant::now();

        let result = with_retry(&policy, "test", || async {
            Err::<(), _>(status_error(503, "Service Unavailable"))
        })
        .await;

        assert!(result.is_err());
        assert!(start.elapsed() >= Duration::from_millis(50));
    }
}
