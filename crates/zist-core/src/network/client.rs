//! HTTP client for the GitHub API.
//!
//! Wraps reqwest with:
//! - GitHub `Accept` header and optional bearer auth on every request
//! - Cache-busting `timestamp` query parameter
//! - Rate limit tracking from response headers
//! - Status code to [`ZistError`] mapping

use crate::config::{ClientConfig, NetworkConfig};
use crate::{Result, ZistError};
use chrono::Utc;
use reqwest::{header, Client, Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Rate limit state extracted from response headers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RateLimitState {
    /// Remaining requests allowed.
    pub remaining: Option<u64>,
    /// Total request limit.
    pub limit: Option<u64>,
    /// Unix timestamp when the rate limit resets.
    pub reset: Option<u64>,
}

impl RateLimitState {
    pub fn is_exhausted(&self) -> bool {
        self.remaining == Some(0)
    }

    /// Get time until rate limit resets.
    pub fn time_until_reset(&self) -> Option<Duration> {
        let now = SystemTime::now().duration_since(UNIX_EPOCH).ok()?.as_secs();
        self.reset
            .filter(|reset| *reset > now)
            .map(|reset| Duration::from_secs(reset - now))
    }
}

/// HTTP client shared by every remote call.
pub struct HttpClient {
    client: Client,
    cache_busting: bool,
    rate_limit_remaining: AtomicI64,
    rate_limit_limit: AtomicU64,
    rate_limit_reset: AtomicU64,
}

impl HttpClient {
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let mut builder = Client::builder().user_agent(NetworkConfig::USER_AGENT);
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(|e| ZistError::Network {
            message: format!("Failed to create HTTP client: {}", e),
            cause: None,
        })?;

        Ok(Self {
            client,
            cache_busting: config.cache_busting,
            rate_limit_remaining: AtomicI64::new(-1),
            rate_limit_limit: AtomicU64::new(0),
            rate_limit_reset: AtomicU64::new(0),
        })
    }

    /// Get the current rate limit state.
    pub fn rate_limit_state(&self) -> RateLimitState {
        let remaining = self.rate_limit_remaining.load(Ordering::SeqCst);
        let limit = self.rate_limit_limit.load(Ordering::SeqCst);
        let reset = self.rate_limit_reset.load(Ordering::SeqCst);
        RateLimitState {
            remaining: u64::try_from(remaining).ok(),
            limit: (limit > 0).then_some(limit),
            reset: (reset > 0).then_some(reset),
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, bearer: Option<&str>) -> Result<T> {
        let response = self.send(self.request(Method::GET, url, bearer), url).await?;
        decode_json(response, url).await
    }

    /// Fetch a body as text (raw file contents).
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let response = self.send(self.request(Method::GET, url, None), url).await?;
        response.text().await.map_err(ZistError::from)
    }

    pub async fn post_json<B, T>(&self, url: &str, bearer: Option<&str>, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::POST, url, bearer).json(body);
        let response = self.send(request, url).await?;
        decode_json(response, url).await
    }

    pub async fn patch_json<B, T>(&self, url: &str, bearer: Option<&str>, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.request(Method::PATCH, url, bearer).json(body);
        let response = self.send(request, url).await?;
        decode_json(response, url).await
    }

    pub async fn delete(&self, url: &str, bearer: Option<&str>) -> Result<()> {
        self.send(self.request(Method::DELETE, url, bearer), url)
            .await
            .map(|_| ())
    }

    // Internal methods

    fn request(&self, method: Method, url: &str, bearer: Option<&str>) -> RequestBuilder {
        let mut request = self
            .client
            .request(method, url)
            .header(header::ACCEPT, NetworkConfig::GITHUB_ACCEPT);
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        if self.cache_busting {
            request = request.query(&[(
                NetworkConfig::CACHE_BUSTING_PARAM,
                Utc::now().timestamp_millis(),
            )]);
        }
        request
    }

    async fn send(&self, request: RequestBuilder, url: &str) -> Result<Response> {
        let response = request.send().await?;
        self.update_rate_limits(&response);
        self.check_response_status(response, url)
    }

    fn update_rate_limits(&self, response: &Response) {
        let headers = response.headers();
        let parse = |name: &str| -> Option<u64> {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
        };

        if let Some(remaining) = parse("X-RateLimit-Remaining") {
            self.rate_limit_remaining
                .store(i64::try_from(remaining).unwrap_or(i64::MAX), Ordering::SeqCst);
        }
        if let Some(limit) = parse("X-RateLimit-Limit") {
            self.rate_limit_limit.store(limit, Ordering::SeqCst);
        }
        if let Some(reset) = parse("X-RateLimit-Reset") {
            self.rate_limit_reset.store(reset, Ordering::SeqCst);
        }

        let state = self.rate_limit_state();
        if let (Some(remaining), Some(limit)) = (state.remaining, state.limit) {
            debug!("Rate limit: {}/{}", remaining, limit);
        }
    }

    fn check_response_status(&self, response: Response, url: &str) -> Result<Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let target = strip_query(url);
        let rate_limits = self.rate_limit_state();

        let rate_limited = status == StatusCode::TOO_MANY_REQUESTS
            || (status == StatusCode::FORBIDDEN && rate_limits.is_exhausted());
        if rate_limited {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .or_else(|| rate_limits.time_until_reset().map(|d| d.as_secs()));
            return Err(ZistError::RateLimited {
                service: extract_domain(url),
                retry_after_secs: retry_after,
            });
        }

        Err(match status {
            StatusCode::NOT_FOUND => ZistError::NotFound { resource: target },
            StatusCode::UNAUTHORIZED => ZistError::unauthenticated(target),
            _ => ZistError::GitHubApi {
                message: format!("{} returned {}", target, status),
                status_code: Some(status.as_u16()),
            },
        })
    }
}

async fn decode_json<T: DeserializeOwned>(response: Response, url: &str) -> Result<T> {
    response.json::<T>().await.map_err(|e| ZistError::Json {
        message: format!("Failed to parse response from {}: {}", strip_query(url), e),
        source: None,
    })
}

fn strip_query(url: &str) -> String {
    url.split('?').next().unwrap_or(url).to_string()
}

/// Extract domain from a URL.
pub fn extract_domain(url: &str) -> String {
    url::Url::parse(url)
        .map(|u| u.host_str().unwrap_or("unknown").to_string())
        .unwrap_or_else(|_| "unknown".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_exhausted() {
        let state = RateLimitState {
            remaining: Some(0),
            limit: Some(60),
            reset: None,
        };
        assert!(state.is_exhausted());
        assert!(!RateLimitState::default().is_exhausted());
    }

    #[test]
    fn test_time_until_reset_in_past() {
        let state = RateLimitState {
            remaining: Some(0),
            limit: Some(60),
            reset: Some(1),
        };
        assert!(state.time_until_reset().is_none());
    }

    #[test]
    fn test_extract_domain() {
        assert_eq!(extract_domain("https://api.github.com/gists/1"), "api.github.com");
        assert_eq!(extract_domain("invalid-url"), "unknown");
    }

    #[test]
    fn test_strip_query() {
        assert_eq!(strip_query("http://h/api/gist?id=1"), "http://h/api/gist");
        assert_eq!(strip_query("http://h/gists"), "http://h/gists");
    }

    #[tokio::test]
    async fn test_client_creation() {
        let client = HttpClient::new(&ClientConfig::default()).unwrap();
        assert_eq!(client.rate_limit_state(), RateLimitState::default());
    }
}
