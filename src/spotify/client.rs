use std::{sync::Arc, time::Duration};

use reqwest::{Client, Request, Response, StatusCode, header::RETRY_AFTER};
use serde::de::DeserializeOwned;

use crate::{
    clock::Clock,
    error::{Error, Result},
    warning,
};

/// Delay used when a 429 response carries no usable `Retry-After` header.
pub const DEFAULT_RETRY_AFTER: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Upper bound on 429 retries per request; `None` retries forever.
    pub max_rate_limit_retries: Option<u32>,
    pub max_server_error_retries: u32,
    pub server_error_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_rate_limit_retries: Some(10),
            max_server_error_retries: 3,
            server_error_backoff: Duration::from_secs(10),
        }
    }
}

/// The single place where outgoing requests are sent.
///
/// [`request`](Self::request) hides rate limiting from callers: a 429 answer
/// suspends the task for the advertised `Retry-After` and replays the same
/// request. [`execute`](Self::execute) additionally turns non-success
/// statuses into [`Error`] values.
#[derive(Clone)]
pub struct RateLimitedClient {
    http: Client,
    clock: Arc<dyn Clock>,
    policy: RetryPolicy,
}

impl RateLimitedClient {
    pub fn new(clock: Arc<dyn Clock>, policy: RetryPolicy) -> Self {
        Self::with_http(Client::new(), clock, policy)
    }

    pub fn with_http(http: Client, clock: Arc<dyn Clock>, policy: RetryPolicy) -> Self {
        Self {
            http,
            clock,
            policy,
        }
    }

    /// Underlying reqwest client, used to build requests.
    pub fn http(&self) -> &Client {
        &self.http
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }

    /// Sends `request`, retrying transparently while the server answers 429.
    /// Any other status is handed back untouched.
    ///
    /// # Arguments
    ///
    /// * `request` - A built request. Every attempt sends a clone of it, so
    ///   the body must not be a stream.
    ///
    /// # Returns
    ///
    /// The first response whose status is not 429, success or not.
    ///
    /// # Rate Limiting
    ///
    /// - Reads `Retry-After` as whole seconds, one second when absent
    /// - Waits through the client's [`Clock`] without blocking other tasks
    /// - Gives up after `RetryPolicy::max_rate_limit_retries` retries
    ///
    /// # Errors
    ///
    /// - `Error::RateLimitExhausted` when the retry bound is reached
    /// - `Error::Network` for transport failures
    /// - `Error::Configuration` if the request cannot be cloned
    ///
    /// # Example
    ///
    /// ```
    /// let request = client.http().get(url).bearer_auth(token).build()?;
    /// let response = client.request(request).await?;
    /// ```
    pub async fn request(&self, request: Request) -> Result<Response> {
        let mut retries: u32 = 0;

        loop {
            let attempt = replay(&request)?;
            let response = self.http.execute(attempt).await?;

            if response.status() != StatusCode::TOO_MANY_REQUESTS {
                return Ok(response);
            }

            if let Some(max) = self.policy.max_rate_limit_retries {
                if retries >= max {
                    return Err(Error::RateLimitExhausted {
                        url: request.url().to_string(),
                        attempts: retries + 1,
                    });
                }
            }

            let wait = retry_after(&response);
            warning!(
                "Rate limited by {}, retrying in {} seconds",
                request.url().path(),
                wait.as_secs()
            );
            self.clock.sleep(wait).await;
            retries += 1;
        }
    }

    /// Like [`request`](Self::request) but classifies the final status.
    /// Temporary server failures are retried after a fixed backoff.
    pub async fn execute(&self, request: Request) -> Result<Response> {
        let mut retries: u32 = 0;

        loop {
            let response = self.request(replay(&request)?).await?;
            match classify(response).await {
                Err(e) if e.is_retryable() && retries < self.policy.max_server_error_retries => {
                    retries += 1;
                    warning!("{}, retry {} of {}", e, retries, self.policy.max_server_error_retries);
                    self.clock.sleep(self.policy.server_error_backoff).await;
                }
                other => return other,
            }
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, request: Request) -> Result<T> {
        let response = self.execute(request).await?;
        let body = response.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

fn replay(request: &Request) -> Result<Request> {
    request.try_clone().ok_or_else(|| {
        Error::Configuration(format!(
            "request to {} has a streaming body and cannot be retried",
            request.url()
        ))
    })
}

/// Reads `Retry-After` as a whole number of seconds.
pub fn retry_after(response: &Response) -> Duration {
    response
        .headers()
        .get(RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
        .unwrap_or(DEFAULT_RETRY_AFTER)
}

/// Maps a response onto the error taxonomy. 2xx passes through.
pub async fn classify(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let url = response.url().to_string();
    if is_retryable_status(status) {
        return Err(Error::RetryableNetwork { status, url });
    }

    let message = response.text().await.unwrap_or_default();
    Err(Error::FatalApi {
        status,
        url,
        message,
    })
}

pub fn is_retryable_status(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::INTERNAL_SERVER_ERROR
            | StatusCode::BAD_GATEWAY
            | StatusCode::SERVICE_UNAVAILABLE
            | StatusCode::GATEWAY_TIMEOUT
    )
}
