//! Builder for configuring ZistApi initialization.

use crate::cache::GistCache;
use crate::config::ClientConfig;
use crate::coordinator::{MutationCoordinator, NoopEffects, UiEffects};
use crate::network::{GistRemote, GitHubGists, Session};
use crate::reader::GistReader;
use crate::{Result, ZistApi};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Builder for [`ZistApi`].
///
/// Defaults to the GitHub API with [`ClientConfig::default`], a one hour raw
/// file TTL and no UI effects.
pub struct ZistApiBuilder {
    session: Session,
    config: ClientConfig,
    remote: Option<Arc<dyn GistRemote>>,
    effects: Arc<dyn UiEffects>,
    file_ttl: Option<Duration>,
}

impl ZistApiBuilder {
    pub fn new(session: Session) -> Self {
        Self {
            session,
            config: ClientConfig::default(),
            remote: None,
            effects: Arc::new(NoopEffects),
            file_ttl: None,
        }
    }

    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Use `remote` instead of building a [`GitHubGists`] from the config.
    pub fn remote(mut self, remote: Arc<dyn GistRemote>) -> Self {
        self.remote = Some(remote);
        self
    }

    pub fn effects(mut self, effects: Arc<dyn UiEffects>) -> Self {
        self.effects = effects;
        self
    }

    pub fn file_ttl(mut self, ttl: Duration) -> Self {
        self.file_ttl = Some(ttl);
        self
    }

    pub fn build(self) -> Result<ZistApi> {
        let remote: Arc<dyn GistRemote> = match self.remote {
            Some(remote) => remote,
            None => Arc::new(GitHubGists::new(self.config)?),
        };
        let cache = Arc::new(match self.file_ttl {
            Some(ttl) => GistCache::with_file_ttl(ttl),
            None => GistCache::new(),
        });
        debug!("Building Zist API for {:?}", self.session);

        Ok(ZistApi {
            reader: GistReader::new(cache.clone(), remote.clone(), self.session.clone()),
            coordinator: MutationCoordinator::new(
                cache.clone(),
                remote,
                self.session,
                self.effects,
            ),
            cache,
        })
    }
}
