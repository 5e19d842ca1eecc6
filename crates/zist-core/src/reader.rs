//! Cache-first reads of gist collections, single gists and file contents.
//!
//! Every network read registers a ticket with the cache. If a mutation
//! cancels the ticket while the request is in flight, the response is dropped
//! and the caller gets whatever the cache holds now.

use crate::cache::{CacheKey, GistCache, GistPages};
use crate::config::NetworkConfig;
use crate::models::{FileMetadata, GistRecord, GitHubUser};
use crate::network::{GistRemote, GistScope, Session};
use crate::query::{self, FilterSpec, SortField, SortOrder};
use crate::{Result, ZistError};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Content of one gist file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileContent {
    pub filename: String,
    pub content: String,
}

/// Read side over the shared cache.
pub struct GistReader {
    cache: Arc<GistCache>,
    remote: Arc<dyn GistRemote>,
    session: Session,
}

impl GistReader {
    pub fn new(cache: Arc<GistCache>, remote: Arc<dyn GistRemote>, session: Session) -> Self {
        Self {
            cache,
            remote,
            session,
        }
    }

    pub fn cache(&self) -> &Arc<GistCache> {
        &self.cache
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Fetch the next page of `scope` into the cache.
    ///
    /// A stale or missing collection restarts from the first page. An
    /// exhausted, fresh collection is returned as is.
    pub async fn fetch_next_page(&self, scope: &GistScope) -> Result<GistPages> {
        let owner = scope.cache_owner(&self.session)?;
        let key = CacheKey::gists(&owner);

        let page_number = match self.cache.collection(&owner) {
            Some(pages) if !self.cache.is_stale(&key) => match pages.next_page {
                Some(next) => next,
                None => return Ok(pages),
            },
            _ => NetworkConfig::FIRST_PAGE,
        };

        let ticket = self.cache.begin_read(key);
        let page = match self.remote.list_page(&self.session, scope, page_number).await {
            Ok(page) => page,
            Err(e) => {
                self.cache.finish_read(&ticket);
                return Err(e);
            }
        };

        let committed = self.cache.commit_collection(ticket, move |mut pages| {
            if page_number == NetworkConfig::FIRST_PAGE {
                pages = GistPages::default();
            }
            pages.push_page(page_number, page);
            pages
        });

        match committed {
            Err(ZistError::Cancelled) => self
                .cache
                .collection(&owner)
                .ok_or(ZistError::Cancelled),
            other => other,
        }
    }

    /// Fetch pages until the listing is exhausted and return every record.
    pub async fn load_all(&self, scope: &GistScope) -> Result<Vec<GistRecord>> {
        loop {
            let pages = self.fetch_next_page(scope).await?;
            if pages.is_exhausted() {
                debug!("Loaded {} gists for {}", pages.len(), scope);
                return Ok(pages.flatten());
            }
        }
    }

    /// Load `scope` and compute its filtered, sorted view.
    pub async fn view(
        &self,
        scope: &GistScope,
        filter: &FilterSpec,
        sort: SortField,
        order: SortOrder,
    ) -> Result<Vec<GistRecord>> {
        let gists = self.load_all(scope).await?;
        Ok(query::apply(&gists, filter, sort, order))
    }

    pub async fn get_gist(&self, id: &str) -> Result<GistRecord> {
        let key = CacheKey::gist(id);
        if !self.cache.is_stale(&key) {
            if let Some(record) = self.cache.gist(id) {
                debug!("Gist cache hit for {}", id);
                return Ok(record);
            }
        }

        let ticket = self.cache.begin_read(key);
        let record = match self.remote.get_gist(&self.session, id).await {
            Ok(record) => record,
            Err(e) => {
                self.cache.finish_read(&ticket);
                return Err(e);
            }
        };

        match self.cache.commit_gist(ticket, record) {
            Err(ZistError::Cancelled) => self.cache.gist(id).ok_or(ZistError::Cancelled),
            other => other,
        }
    }

    /// Raw file content, cached by its URL.
    pub async fn get_file(&self, raw_url: &str) -> Result<String> {
        if let Some(content) = self.cache.file(raw_url) {
            debug!("File cache hit for {}", raw_url);
            return Ok(content);
        }

        let ticket = self.cache.begin_read(CacheKey::gist_file(raw_url));
        let content = match self.remote.fetch_raw(raw_url).await {
            Ok(content) => content,
            Err(e) => {
                self.cache.finish_read(&ticket);
                return Err(e);
            }
        };

        match self.cache.commit_file(ticket, content.clone()) {
            Err(ZistError::Cancelled) => Ok(content),
            other => other,
        }
    }

    /// Contents of every file in `files`, fetched concurrently.
    pub async fn get_all_files(
        &self,
        files: &BTreeMap<String, FileMetadata>,
    ) -> Result<Vec<FileContent>> {
        try_join_all(files.iter().map(|(filename, meta)| async move {
            let content = self.get_file(&meta.raw_url).await?;
            Ok::<_, ZistError>(FileContent {
                filename: filename.clone(),
                content,
            })
        }))
        .await
    }

    pub async fn get_user(&self, username: &str) -> Result<GitHubUser> {
        self.remote.get_user(&self.session, username).await
    }
}
