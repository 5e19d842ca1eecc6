//! Gist records as returned by the GitHub gists API.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Metadata for a single file inside a gist.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileMetadata {
    pub filename: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub raw_url: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(rename = "type", default)]
    pub mime_type: Option<String>,
    /// Inline content, present on single-gist responses.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truncated: Option<bool>,
}

impl FileMetadata {
    /// Metadata for a file that only exists locally so far.
    pub fn pending(filename: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            size: 0,
            raw_url: String::new(),
            language: None,
            mime_type: None,
            content: None,
            truncated: None,
        }
    }
}

/// A gist as stored in the cache.
///
/// Fields the engine does not interpret (`html_url`, `owner`, `history`, ...)
/// are kept in `extra` so reconciliation never drops server data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GistRecord {
    pub id: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(default)]
    pub public: bool,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
    #[serde(default)]
    pub files: BTreeMap<String, FileMetadata>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Field-level overlay applied on top of a [`GistRecord`].
///
/// `None` leaves the base field alone. `files` replaces the whole mapping,
/// `extra` is merged key by key. The overlay always wins on conflicts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GistOverlay {
    pub description: Option<String>,
    pub public: Option<bool>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub files: Option<BTreeMap<String, FileMetadata>>,
    pub extra: Map<String, Value>,
}

impl From<&GistRecord> for GistOverlay {
    fn from(record: &GistRecord) -> Self {
        Self {
            description: Some(record.description.clone()),
            public: Some(record.public),
            created_at: Some(record.created_at.clone()),
            updated_at: Some(record.updated_at.clone()),
            files: Some(record.files.clone()),
            extra: record.extra.clone(),
        }
    }
}

impl GistRecord {
    /// Return a copy of this record with `overlay` merged over it.
    ///
    /// This is the only merge used by the cache, for optimistic patches and
    /// server reconciliation alike.
    pub fn overlay(&self, overlay: &GistOverlay) -> GistRecord {
        let mut merged = self.clone();
        if let Some(description) = &overlay.description {
            merged.description = description.clone();
        }
        if let Some(public) = overlay.public {
            merged.public = public;
        }
        if let Some(created_at) = &overlay.created_at {
            merged.created_at = created_at.clone();
        }
        if let Some(updated_at) = &overlay.updated_at {
            merged.updated_at = updated_at.clone();
        }
        if let Some(files) = &overlay.files {
            merged.files = files.clone();
        }
        for (key, value) in &overlay.extra {
            merged.extra.insert(key.clone(), value.clone());
        }
        merged
    }

    /// Merge an authoritative server record over this cached one.
    pub fn reconcile(&self, incoming: &GistRecord) -> GistRecord {
        self.overlay(&GistOverlay::from(incoming))
    }

    pub fn created_millis(&self) -> i64 {
        timestamp_millis(&self.created_at).unwrap_or(i64::MIN)
    }

    pub fn updated_millis(&self) -> i64 {
        timestamp_millis(&self.updated_at).unwrap_or(i64::MIN)
    }

    pub fn has_files(&self) -> bool {
        !self.files.is_empty()
    }
}

/// Parse a GitHub timestamp into epoch milliseconds.
///
/// Accepts RFC 3339 and bare `YYYY-MM-DD` dates (midnight UTC).
pub fn timestamp_millis(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc).timestamp_millis());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().timestamp_millis())
}
