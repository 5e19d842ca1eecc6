//! Request bodies for creating and editing gists.

use super::gist::{FileMetadata, GistOverlay, GistRecord};
use crate::query::language_for_filename;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A file in a create request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewFile {
    pub filename: String,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
}

/// Body of `POST /gists`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GistCreatePayload {
    pub description: String,
    pub public: bool,
    pub files: BTreeMap<String, NewFile>,
}

/// One file edit inside a [`GistPatch`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilePatch {
    /// New name for the file, when renaming.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
}

/// Partial update of an existing gist (`PATCH /gists/{id}`).
///
/// A `None` entry in `files` deletes that file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GistPatch {
    #[serde(skip_serializing)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<BTreeMap<String, Option<FilePatch>>>,
}

impl GistPatch {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            description: None,
            public: None,
            files: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_public(mut self, public: bool) -> Self {
        self.public = Some(public);
        self
    }

    pub fn with_file(mut self, name: impl Into<String>, patch: FilePatch) -> Self {
        self.files
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), Some(patch));
        self
    }

    pub fn delete_file(mut self, name: impl Into<String>) -> Self {
        self.files
            .get_or_insert_with(BTreeMap::new)
            .insert(name.into(), None);
        self
    }

    /// The overlay this patch produces on top of `base`.
    ///
    /// File edits are resolved against the base mapping first, so the overlay
    /// carries the complete resulting file set.
    pub fn to_overlay(&self, base: &GistRecord) -> GistOverlay {
        let files = self.files.as_ref().map(|edits| {
            let mut files = base.files.clone();
            for (name, edit) in edits {
                let existing = files.remove(name);
                let Some(edit) = edit else {
                    continue;
                };
                let target = edit.filename.clone().unwrap_or_else(|| name.clone());
                let mut meta = existing.unwrap_or_else(|| FileMetadata::pending(target.clone()));
                meta.filename = target.clone();
                if let Some(content) = &edit.content {
                    meta.size = content.len() as u64;
                    meta.content = Some(content.clone());
                    meta.truncated = Some(false);
                }
                if let Some(language) = language_for_filename(&target) {
                    meta.language = Some(language.to_string());
                }
                files.insert(target, meta);
            }
            files
        });

        GistOverlay {
            description: self.description.clone(),
            public: self.public,
            files,
            ..Default::default()
        }
    }
}

/// A file being edited before it is saved.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftFile {
    pub filename: String,
    pub content: String,
}

/// An editor draft that becomes a new gist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GistDraft {
    pub description: String,
    #[serde(default)]
    pub public: bool,
    pub files: Vec<DraftFile>,
}

impl GistDraft {
    /// Build the create request, naming unnamed files `file1`, `file2`, ...
    /// by their position in the draft.
    pub fn into_payload(self) -> GistCreatePayload {
        let mut files = BTreeMap::new();
        for (index, file) in self.files.into_iter().enumerate() {
            let filename = if file.filename.trim().is_empty() {
                format!("file{}", index + 1)
            } else {
                file.filename
            };
            let language = language_for_filename(&filename).map(str::to_string);
            files.insert(
                filename.clone(),
                NewFile {
                    filename,
                    content: file.content,
                    language,
                },
            );
        }

        GistCreatePayload {
            description: self.description,
            public: self.public,
            files,
        }
    }
}
