//! Category and tag metadata stored inside a gist description.
//!
//! GitHub has no place for custom metadata, so the description is written as
//! `visible text` + `<-ZIST-CONFIG->` + JSON object. A description without the
//! separator has no config.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Literal separator between the visible description and the JSON config.
pub const SIDECAR_SEPARATOR: &str = "<-ZIST-CONFIG->";

/// Structured metadata attached to a gist.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SidecarConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
}

impl SidecarConfig {
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.tags.is_none()
    }

    pub fn tags(&self) -> &[String] {
        self.tags.as_deref().unwrap_or_default()
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn without_category(mut self) -> Self {
        self.category = None;
        self
    }

    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = Some(tags);
        self
    }

    /// Apply whichever of `category` and `tags` were provided.
    ///
    /// An empty category string counts as not provided.
    pub fn merged(self, category: Option<String>, tags: Option<Vec<String>>) -> Self {
        let mut config = self;
        if let Some(category) = category.filter(|c| !c.is_empty()) {
            config.category = Some(category);
        }
        if let Some(tags) = tags {
            config.tags = Some(tags);
        }
        config
    }
}

/// A description split into its visible text and config.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDescription {
    pub text: String,
    pub config: SidecarConfig,
}

/// Split a raw description at the first separator.
///
/// Malformed JSON after the separator yields an empty config.
pub fn parse_description(description: &str) -> ParsedDescription {
    let Some((text, config_text)) = description.split_once(SIDECAR_SEPARATOR) else {
        return ParsedDescription {
            text: description.to_string(),
            config: SidecarConfig::default(),
        };
    };

    let config = if config_text.trim().is_empty() {
        SidecarConfig::default()
    } else {
        match serde_json::from_str::<SidecarConfig>(config_text) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring malformed gist config: {}", e);
                SidecarConfig::default()
            }
        }
    };

    ParsedDescription {
        text: text.to_string(),
        config,
    }
}

pub fn description_text(description: &str) -> String {
    parse_description(description).text
}

pub fn sidecar_config(description: &str) -> SidecarConfig {
    parse_description(description).config
}

/// Encode visible text and config into a single description.
pub fn encode_description(text: &str, config: &SidecarConfig) -> String {
    // Serializing a struct of strings cannot fail.
    let json = serde_json::to_string(config).unwrap_or_else(|_| "{}".to_string());
    format!("{}{}{}", text, SIDECAR_SEPARATOR, json)
}

/// Replace the config of an existing description, keeping its visible text.
pub fn update_description(description: &str, config: &SidecarConfig) -> String {
    encode_description(&parse_description(description).text, config)
}
