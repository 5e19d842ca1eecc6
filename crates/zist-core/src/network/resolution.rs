//! Ordered fallback between ways of reaching a read endpoint.
//!
//! Reads go direct with the bearer token, then direct without it, then
//! through the local proxy. Each tier is tried only if the previous failed.

use super::session::Session;
use crate::config::ClientConfig;
use crate::{Result, ZistError};
use std::fmt;
use std::future::Future;
use tracing::{debug, warn};

/// One way of reaching the gist resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    /// GitHub API with the session's bearer token.
    Authenticated,
    /// GitHub API without credentials.
    Anonymous,
    /// The local proxy's `/api/*` routes.
    LocalProxy,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Authenticated => write!(f, "authenticated"),
            Strategy::Anonymous => write!(f, "anonymous"),
            Strategy::LocalProxy => write!(f, "local-proxy"),
        }
    }
}

/// Strategies to try, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionChain {
    strategies: Vec<Strategy>,
}

impl ResolutionChain {
    pub fn new(strategies: Vec<Strategy>) -> Self {
        Self { strategies }
    }

    /// Chain for a read: authenticated when a token exists, always anonymous,
    /// proxy when an origin is configured.
    pub fn for_session(session: &Session, config: &ClientConfig) -> Self {
        let mut strategies = Vec::with_capacity(3);
        if session.token().is_some() {
            strategies.push(Strategy::Authenticated);
        }
        strategies.push(Strategy::Anonymous);
        if config.proxy_origin.is_some() {
            strategies.push(Strategy::LocalProxy);
        }
        Self { strategies }
    }

    pub fn strategies(&self) -> &[Strategy] {
        &self.strategies
    }

    /// Run `attempt` for each strategy until one succeeds.
    ///
    /// A single-strategy chain returns that strategy's error unchanged;
    /// otherwise every failure is collected into `AllStrategiesFailed`.
    pub async fn resolve<T, F, Fut>(&self, resource: &str, mut attempt: F) -> Result<T>
    where
        F: FnMut(Strategy) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut failures: Vec<(Strategy, ZistError)> = Vec::new();

        for &strategy in &self.strategies {
            debug!("Resolving {} via {}", resource, strategy);
            match attempt(strategy).await {
                Ok(value) => {
                    if !failures.is_empty() {
                        debug!(
                            "Resolved {} via {} after {} failed attempts",
                            resource,
                            strategy,
                            failures.len()
                        );
                    }
                    return Ok(value);
                }
                Err(e) => {
                    warn!("Fetching {} via {} failed: {}", resource, strategy, e);
                    failures.push((strategy, e));
                }
            }
        }

        if failures.len() == 1 {
            if let Some((_, err)) = failures.pop() {
                return Err(err);
            }
        }

        Err(ZistError::AllStrategiesFailed {
            resource: resource.to_string(),
            attempts: failures
                .iter()
                .map(|(strategy, err)| format!("{}: {}", strategy, err))
                .collect(),
        })
    }
}
