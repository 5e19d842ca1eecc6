//! Centralized configuration for Zist.
//!
//! Constants for the GitHub endpoints and cache sizing, plus the runtime
//! [`ClientConfig`] that decides which resolution tiers are available.

use crate::{Result, ZistError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Network-related configuration.
pub struct NetworkConfig;

impl NetworkConfig {
    pub const GITHUB_API_BASE: &'static str = "https://api.github.com";
    pub const GITHUB_ACCEPT: &'static str = "application/vnd.github.v3+json";
    pub const USER_AGENT: &'static str = "Zist/0.3";
    pub const FIRST_PAGE: u32 = 1;
    pub const RAW_FILE_CACHE_CAPACITY: u64 = 512;
    pub const RAW_FILE_TTL: Duration = Duration::from_secs(3600);
    /// Query parameter appended to every request to defeat intermediary caches.
    pub const CACHE_BUSTING_PARAM: &'static str = "timestamp";
}

/// Navigation targets emitted after a mutation settles.
pub struct Route;

impl Route {
    pub const DASHBOARD: &'static str = "/dashboard";
}

const API_BASE_ENV_VAR: &str = "ZIST_API_BASE";
const PROXY_ORIGIN_ENV_VAR: &str = "ZIST_PROXY_ORIGIN";
const TIMEOUT_ENV_VAR: &str = "ZIST_REQUEST_TIMEOUT_SECS";

/// Runtime configuration for the remote gist client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct ClientConfig {
    /// Base URL of the GitHub REST API.
    pub api_base: String,
    /// Origin of the local proxy used as the last resolution tier.
    pub proxy_origin: Option<String>,
    /// Per-request timeout. `None` leaves requests unbounded.
    pub request_timeout: Option<Duration>,
    /// Append a `timestamp` query parameter to every request.
    pub cache_busting: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: NetworkConfig::GITHUB_API_BASE.to_string(),
            proxy_origin: None,
            request_timeout: None,
            cache_busting: true,
        }
    }
}

impl ClientConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_proxy_origin(mut self, origin: impl Into<String>) -> Self {
        self.proxy_origin = Some(origin.into().trim_end_matches('/').to_string());
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = Some(timeout);
        self
    }

    pub fn with_cache_busting(mut self, enabled: bool) -> Self {
        self.cache_busting = enabled;
        self
    }

    /// Build a config from `ZIST_*` environment variables, falling back to
    /// defaults for anything unset.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config = Self::default();

        if let Some(base) = lookup(API_BASE_ENV_VAR).filter(|v| !v.trim().is_empty()) {
            url::Url::parse(base.trim()).map_err(|e| ZistError::Config {
                message: format!("{} is not a valid URL: {}", API_BASE_ENV_VAR, e),
            })?;
            config = config.with_api_base(base.trim());
        }

        if let Some(origin) = lookup(PROXY_ORIGIN_ENV_VAR).filter(|v| !v.trim().is_empty()) {
            url::Url::parse(origin.trim()).map_err(|e| ZistError::Config {
                message: format!("{} is not a valid URL: {}", PROXY_ORIGIN_ENV_VAR, e),
            })?;
            config = config.with_proxy_origin(origin.trim());
        }

        if let Some(secs) = lookup(TIMEOUT_ENV_VAR).filter(|v| !v.trim().is_empty()) {
            let secs: u64 = secs.trim().parse().map_err(|_| ZistError::Config {
                message: format!("{} must be a whole number of seconds", TIMEOUT_ENV_VAR),
            })?;
            config = config.with_request_timeout(Duration::from_secs(secs));
        }

        Ok(config)
    }
}
