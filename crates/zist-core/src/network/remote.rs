//! The remote gist resource as seen by the reader and the coordinator.

use super::session::Session;
use crate::models::{GistCreatePayload, GistPatch, GistRecord, GitHubUser};
use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

const USER_SCOPE_PREFIX: &str = "user:";

/// Which collection a listing reads.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GistScope {
    /// Every gist of the signed-in user, private ones included.
    Authenticated,
    /// Public gists of a named user.
    User { username: String },
}

impl GistScope {
    pub fn user(username: impl Into<String>) -> Self {
        GistScope::User {
            username: username.into(),
        }
    }

    /// Cache owner key for this collection.
    ///
    /// Public listings live under `user:{username}` so they never share an
    /// entry with the signed-in user's own listing.
    pub fn cache_owner(&self, session: &Session) -> Result<String> {
        match self {
            GistScope::Authenticated => session.owner_key().map(str::to_string),
            GistScope::User { username } => Ok(format!("{}{}", USER_SCOPE_PREFIX, username)),
        }
    }
}

impl fmt::Display for GistScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GistScope::Authenticated => write!(f, "authenticated user"),
            GistScope::User { username } => write!(f, "user {}", username),
        }
    }
}

/// Collection resource with list, get, create, partial update and delete.
///
/// Listing is page-number based starting at 1; an empty page ends it.
#[async_trait]
pub trait GistRemote: Send + Sync {
    async fn list_page(&self, session: &Session, scope: &GistScope, page: u32)
        -> Result<Vec<GistRecord>>;

    async fn get_gist(&self, session: &Session, id: &str) -> Result<GistRecord>;

    async fn create_gist(&self, session: &Session, payload: &GistCreatePayload)
        -> Result<GistRecord>;

    async fn update_gist(&self, session: &Session, patch: &GistPatch) -> Result<GistRecord>;

    async fn delete_gist(&self, session: &Session, id: &str) -> Result<()>;

    /// Raw file content by its opaque URL.
    async fn fetch_raw(&self, raw_url: &str) -> Result<String>;

    async fn get_user(&self, session: &Session, username: &str) -> Result<GitHubUser>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_owner() {
        let session = Session::authenticated("t", "42");
        assert_eq!(GistScope::Authenticated.cache_owner(&session).unwrap(), "42");
        assert_eq!(
            GistScope::user("octocat").cache_owner(&session).unwrap(),
            "user:octocat"
        );
        assert!(GistScope::Authenticated
            .cache_owner(&Session::anonymous())
            .is_err());
    }

    #[test]
    fn test_own_and_public_listings_do_not_share_owner() {
        let session = Session::anonymous().with_login("octocat");
        assert_ne!(
            GistScope::Authenticated.cache_owner(&session).unwrap(),
            GistScope::user("octocat").cache_owner(&session).unwrap()
        );
    }
}
