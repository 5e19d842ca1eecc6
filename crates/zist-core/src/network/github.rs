//! GitHub gists API client.
//!
//! Reads go through a [`ResolutionChain`]; writes always go direct with the
//! session token and never fall back.

use super::client::HttpClient;
use super::remote::{GistRemote, GistScope};
use super::resolution::{ResolutionChain, Strategy};
use super::session::Session;
use crate::config::ClientConfig;
use crate::models::{GistCreatePayload, GistPatch, GistRecord, GitHubUser};
use crate::{Result, ZistError};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, info};
use urlencoding::encode;

/// [`GistRemote`] backed by the GitHub REST API and an optional local proxy.
pub struct GitHubGists {
    http: Arc<HttpClient>,
    config: ClientConfig,
}

/// A read endpoint, expressed once per tier.
struct ReadTarget {
    resource: String,
    api_url: String,
    proxy_path: String,
}

impl GitHubGists {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let http = HttpClient::new(&config)?;
        Ok(Self {
            http: Arc::new(http),
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn http(&self) -> &HttpClient {
        &self.http
    }

    fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.config.api_base, path)
    }

    async fn read<T: DeserializeOwned>(&self, session: &Session, target: ReadTarget) -> Result<T> {
        let chain = ResolutionChain::for_session(session, &self.config);
        chain
            .resolve(&target.resource, |strategy| {
                let target = &target;
                async move {
                    match strategy {
                        Strategy::Authenticated => {
                            let token = session.require_token(&target.resource)?;
                            self.http.get_json(&target.api_url, Some(token)).await
                        }
                        Strategy::Anonymous => self.http.get_json(&target.api_url, None).await,
                        Strategy::LocalProxy => {
                            let origin = self.config.proxy_origin.as_deref().ok_or_else(|| {
                                ZistError::Config {
                                    message: "no proxy origin configured".to_string(),
                                }
                            })?;
                            let url = format!("{}{}", origin, target.proxy_path);
                            self.http.get_json(&url, None).await
                        }
                    }
                }
            })
            .await
    }
}

#[async_trait]
impl GistRemote for GitHubGists {
    async fn list_page(
        &self,
        session: &Session,
        scope: &GistScope,
        page: u32,
    ) -> Result<Vec<GistRecord>> {
        let gists: Vec<GistRecord> = match scope {
            GistScope::Authenticated => {
                let token = session.require_token("listing your gists")?;
                let url = self.api_url(&format!("/gists?page={}", page));
                self.http.get_json(&url, Some(token)).await?
            }
            GistScope::User { username } => {
                let user = encode(username);
                self.read(
                    session,
                    ReadTarget {
                        resource: format!("gists of {} (page {})", username, page),
                        api_url: self.api_url(&format!("/users/{}/gists?page={}", user, page)),
                        proxy_path: format!("/api/userGists?username={}&page={}", user, page),
                    },
                )
                .await?
            }
        };
        debug!("Fetched {} gists for {} page {}", gists.len(), scope, page);
        Ok(gists)
    }

    async fn get_gist(&self, session: &Session, id: &str) -> Result<GistRecord> {
        let id = encode(id);
        self.read(
            session,
            ReadTarget {
                resource: format!("gist {}", id),
                api_url: self.api_url(&format!("/gists/{}", id)),
                proxy_path: format!("/api/gist?id={}", id),
            },
        )
        .await
    }

    async fn create_gist(
        &self,
        session: &Session,
        payload: &GistCreatePayload,
    ) -> Result<GistRecord> {
        let token = session.require_token("creating a gist")?;
        let created: GistRecord = self
            .http
            .post_json(&self.api_url("/gists"), Some(token), payload)
            .await?;
        info!("Created gist {}", created.id);
        Ok(created)
    }

    async fn update_gist(&self, session: &Session, patch: &GistPatch) -> Result<GistRecord> {
        let token = session.require_token("updating a gist")?;
        let url = self.api_url(&format!("/gists/{}", encode(&patch.id)));
        self.http.patch_json(&url, Some(token), patch).await
    }

    async fn delete_gist(&self, session: &Session, id: &str) -> Result<()> {
        let token = session.require_token("deleting a gist")?;
        let url = self.api_url(&format!("/gists/{}", encode(id)));
        self.http.delete(&url, Some(token)).await
    }

    async fn fetch_raw(&self, raw_url: &str) -> Result<String> {
        self.http.get_text(raw_url).await
    }

    async fn get_user(&self, session: &Session, username: &str) -> Result<GitHubUser> {
        let user = encode(username);
        self.read(
            session,
            ReadTarget {
                resource: format!("profile of {}", username),
                api_url: self.api_url(&format!("/users/{}", user)),
                proxy_path: format!("/api/profile?username={}", user),
            },
        )
        .await
    }
}
