use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::{Client, Method, Response, StatusCode, header::HeaderMap};
use serde_json::Value;
use tokio::time::sleep;

use super::http_client::build_model_client_with_timeout;
use super::scrub::{sanitize_upstream_body, scrub_secret_patterns};
use crate::config::ReliabilityConfig;
use crate::error::RequestError;

/// What to do with a failed attempt.
enum Failure {
    /// Retry after `wait` unless the budget is spent, then surface `error`.
    Retry { error: RequestError, wait: Duration },
    /// Surface immediately.
    Fatal(RequestError),
}

/// HTTP client for the model provider with per-attempt timeout, capped
/// exponential backoff and `retry-after` handling.
///
/// Retries: 429, 408, 5xx, connect failures and timeouts.
/// Never retried: 401/403 (surfaced as `Auth`) and every other 4xx.
pub struct ResilientClient {
    http: Client,
    timeout: Duration,
    max_retries: u32,
    base_backoff_ms: u64,
    max_backoff_ms: u64,
    max_retry_after: Duration,
}

impl ResilientClient {
    pub fn new(config: &ReliabilityConfig) -> Self {
        let timeout = Duration::from_millis(config.request_timeout_ms.max(1));
        Self {
            http: build_model_client_with_timeout(timeout),
            timeout,
            max_retries: config.max_retries,
            base_backoff_ms: config.base_backoff_ms,
            max_backoff_ms: config.max_backoff_ms.max(config.base_backoff_ms),
            max_retry_after: Duration::from_secs(config.max_retry_after_secs),
        }
    }

    #[must_use]
    pub fn with_backoff(mut self, base_ms: u64, max_ms: u64) -> Self {
        self.base_backoff_ms = base_ms;
        self.max_backoff_ms = max_ms.max(base_ms);
        self
    }

    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// POST a JSON body with bearer auth. Returns the first 2xx response.
    pub async fn post_json(
        &self,
        url: &str,
        api_key: &str,
        body: &Value,
    ) -> Result<Response, RequestError> {
        self.request(Method::POST, url, api_key, Some(body)).await
    }

    pub async fn request(
        &self,
        method: Method,
        url: &str,
        api_key: &str,
        body: Option<&Value>,
    ) -> Result<Response, RequestError> {
        let mut attempt: u32 = 0;
        loop {
            let mut builder = self.http.request(method.clone(), url).bearer_auth(api_key);
            if let Some(payload) = body {
                builder = builder.json(payload);
            }

            let failure = match builder.send().await {
                Ok(response) if response.status().is_success() => return Ok(response),
                Ok(response) => self.classify_status(response, attempt).await,
                Err(err) => self.classify_transport(&err, attempt),
            };

            let (error, wait) = match failure {
                Failure::Fatal(error) => return Err(error),
                Failure::Retry { error, wait } => (error, wait),
            };

            if attempt >= self.max_retries {
                tracing::warn!(
                    method = method.as_str(),
                    attempts = attempt + 1,
                    error = %error,
                    "model request failed, retries exhausted"
                );
                return Err(error);
            }

            tracing::warn!(
                method = method.as_str(),
                attempt = attempt + 1,
                max_retries = self.max_retries,
                wait_ms = u64::try_from(wait.as_millis()).unwrap_or(u64::MAX),
                error = %error,
                "model request failed, retrying"
            );
            sleep(wait).await;
            attempt += 1;
        }
    }

    async fn classify_status(&self, response: Response, attempt: u32) -> Failure {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = parse_retry_after(response.headers(), Utc::now());
            let wait = retry_after.map_or_else(
                || self.backoff_for(attempt),
                |after| after.min(self.max_retry_after),
            );
            return Failure::Retry {
                error: RequestError::RateLimited {
                    retry_after_secs: retry_after.map_or(0, |after| after.as_secs_f64().ceil() as u64),
                },
                wait,
            };
        }

        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Failure::Fatal(RequestError::Auth {
                status: status.as_u16(),
            });
        }

        let body = response
            .text()
            .await
            .unwrap_or_else(|error| format!("<failed to read response body: {error}>"));
        let error = RequestError::Upstream {
            status: status.as_u16(),
            body: sanitize_upstream_body(&body),
        };

        if status.is_server_error() || status == StatusCode::REQUEST_TIMEOUT {
            Failure::Retry {
                error,
                wait: self.backoff_for(attempt),
            }
        } else {
            Failure::Fatal(error)
        }
    }

    fn classify_transport(&self, err: &reqwest::Error, attempt: u32) -> Failure {
        let error = if err.is_timeout() {
            RequestError::Timeout {
                after_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            RequestError::Network(scrub_secret_patterns(&err.to_string()).into_owned())
        };
        Failure::Retry {
            error,
            wait: self.backoff_for(attempt),
        }
    }

    /// `base · 2^attempt`, capped at the configured maximum.
    fn backoff_for(&self, attempt: u32) -> Duration {
        let factor = 1_u64.checked_shl(attempt).unwrap_or(u64::MAX);
        Duration::from_millis(
            self.base_backoff_ms
                .saturating_mul(factor)
                .min(self.max_backoff_ms),
        )
    }
}

/// `Retry-After` as delta-seconds (integer or fractional) or an HTTP date.
fn parse_retry_after(headers: &HeaderMap, now: DateTime<Utc>) -> Option<Duration> {
    let raw = headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|value| value.to_str().ok())?
        .trim();

    if let Ok(seconds) = raw.parse::<f64>() {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Some(Duration::ZERO);
        }
        return Some(Duration::from_secs_f64(seconds));
    }

    let at = DateTime::parse_from_rfc2822(raw).ok()?.with_timezone(&Utc);
    Some((at - now).to_std().unwrap_or(Duration::ZERO))
}
