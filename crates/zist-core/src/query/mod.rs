//! Filtering and sorting over a gist collection.
//!
//! Everything here is pure: the input slice is never modified and the output
//! holds clones of input records, in input order until the final stable sort.

mod language;

pub use language::language_for_filename;

use crate::models::GistRecord;
use crate::sidecar::parse_description;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Declarative filter over a collection. Unset fields do not filter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSpec {
    /// Exact category match.
    pub category: Option<String>,
    /// Keep records carrying any of these tags. Empty means no tag filter.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Case-insensitive substring over description text or file names.
    pub search: Option<String>,
    /// Language derived from file extensions.
    pub language: Option<String>,
    /// When `Some(true)`, keep only private gists.
    pub private: Option<bool>,
}

impl FilterSpec {
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = tags.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_search(mut self, search: impl Into<String>) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn with_private(mut self, private: bool) -> Self {
        self.private = Some(private);
        self
    }
}

/// Timestamp a collection is sorted by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortField {
    Created,
    #[default]
    Updated,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl std::str::FromStr for SortField {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "created" => Ok(SortField::Created),
            "updated" => Ok(SortField::Updated),
            other => Err(format!("unknown sort field: {}", other)),
        }
    }
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "asc" => Ok(SortOrder::Asc),
            "desc" => Ok(SortOrder::Desc),
            other => Err(format!("unknown sort order: {}", other)),
        }
    }
}

/// Compute the visible view of `gists`.
///
/// Records without files are dropped, each active filter is applied in turn,
/// then the survivors are stably sorted by the chosen timestamp.
pub fn apply(
    gists: &[GistRecord],
    filter: &FilterSpec,
    sort: SortField,
    order: SortOrder,
) -> Vec<GistRecord> {
    let search = filter
        .search
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(str::to_lowercase);

    let mut data: Vec<GistRecord> = gists
        .iter()
        .filter(|gist| gist.has_files())
        .filter(|gist| matches_sidecar(gist, filter))
        .filter(|gist| match filter.language.as_deref().filter(|l| !l.is_empty()) {
            Some(language) => gist
                .files
                .keys()
                .any(|name| language_for_filename(name) == Some(language)),
            None => true,
        })
        .filter(|gist| match filter.private {
            Some(true) => !gist.public,
            _ => true,
        })
        .filter(|gist| match &search {
            Some(needle) => matches_search(gist, needle),
            None => true,
        })
        .cloned()
        .collect();

    let key = |gist: &GistRecord| match sort {
        SortField::Created => gist.created_millis(),
        SortField::Updated => gist.updated_millis(),
    };

    // `sort_by` is stable, so equal timestamps keep their input order.
    match order {
        SortOrder::Asc => data.sort_by(|a, b| key(a).cmp(&key(b))),
        SortOrder::Desc => data.sort_by(|a, b| key(b).cmp(&key(a))),
    }

    data
}

fn matches_sidecar(gist: &GistRecord, filter: &FilterSpec) -> bool {
    let category = filter.category.as_deref().filter(|c| !c.is_empty());
    if category.is_none() && filter.tags.is_empty() {
        return true;
    }

    let config = parse_description(&gist.description).config;

    if let Some(category) = category {
        if config.category.as_deref() != Some(category) {
            return false;
        }
    }

    filter.tags.is_empty() || config.tags().iter().any(|tag| filter.tags.contains(tag))
}

fn matches_search(gist: &GistRecord, needle: &str) -> bool {
    let text = parse_description(&gist.description).text;
    if text.to_lowercase().contains(needle) {
        return true;
    }
    let names = gist.files.keys().cloned().collect::<Vec<_>>().join(" ");
    names.to_lowercase().contains(needle)
}

/// Distinct categories used across `gists`, sorted.
pub fn categories(gists: &[GistRecord]) -> Vec<String> {
    gists
        .iter()
        .filter_map(|gist| parse_description(&gist.description).config.category)
        .filter(|category| !category.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct tags used across `gists`, sorted.
pub fn tags(gists: &[GistRecord]) -> Vec<String> {
    gists
        .iter()
        .flat_map(|gist| {
            parse_description(&gist.description)
                .config
                .tags
                .unwrap_or_default()
        })
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Distinct languages derivable from file names across `gists`, sorted.
pub fn languages(gists: &[GistRecord]) -> Vec<String> {
    gists
        .iter()
        .flat_map(|gist| gist.files.keys())
        .filter_map(|name| language_for_filename(name))
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}
