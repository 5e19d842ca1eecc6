//! Cache keys and namespaces.

use std::fmt;

/// Group of cache keys that can be invalidated together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    /// Paged gist collections, keyed by owner.
    Gists,
    /// Single gists, keyed by id.
    Gist,
    /// Raw file contents, keyed by raw URL.
    GistFile,
}

impl Namespace {
    pub fn as_str(&self) -> &'static str {
        match self {
            Namespace::Gists => "gists",
            Namespace::Gist => "gist",
            Namespace::GistFile => "gistFile",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Explicit key for one cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    Gists { owner: String },
    Gist { id: String },
    GistFile { raw_url: String },
}

impl CacheKey {
    pub fn gists(owner: impl Into<String>) -> Self {
        CacheKey::Gists { owner: owner.into() }
    }

    pub fn gist(id: impl Into<String>) -> Self {
        CacheKey::Gist { id: id.into() }
    }

    pub fn gist_file(raw_url: impl Into<String>) -> Self {
        CacheKey::GistFile {
            raw_url: raw_url.into(),
        }
    }

    pub fn namespace(&self) -> Namespace {
        match self {
            CacheKey::Gists { .. } => Namespace::Gists,
            CacheKey::Gist { .. } => Namespace::Gist,
            CacheKey::GistFile { .. } => Namespace::GistFile,
        }
    }

    fn id_part(&self) -> &str {
        match self {
            CacheKey::Gists { owner } => owner,
            CacheKey::Gist { id } => id,
            CacheKey::GistFile { raw_url } => raw_url,
        }
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.namespace(), self.id_part())
    }
}
