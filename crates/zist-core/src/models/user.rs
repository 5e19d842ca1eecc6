//! GitHub user profile.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Public profile of a GitHub user, as returned by `GET /users/{login}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubUser {
    pub login: String,
    pub id: u64,
    #[serde(default)]
    pub avatar_url: String,
    #[serde(default)]
    pub html_url: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub public_gists: Option<u64>,
    #[serde(default)]
    pub followers: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
