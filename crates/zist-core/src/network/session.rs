//! Identity handed over by the OAuth provider.

use crate::{Result, ZistError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Bearer token and user identity for the current session.
///
/// Issued elsewhere; this crate only reads it.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: Option<String>,
    /// Provider user id, used as the owner key of the user's own collection.
    pub user_id: Option<String>,
    pub login: Option<String>,
}

impl Session {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn authenticated(access_token: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            access_token: Some(access_token.into()),
            user_id: Some(user_id.into()),
            login: None,
        }
    }

    pub fn with_login(mut self, login: impl Into<String>) -> Self {
        self.login = Some(login.into());
        self
    }

    /// The bearer token, if a non-empty one is present.
    pub fn token(&self) -> Option<&str> {
        self.access_token.as_deref().filter(|t| !t.is_empty())
    }

    pub fn require_token(&self, operation: &str) -> Result<&str> {
        self.token().ok_or_else(|| ZistError::unauthenticated(operation))
    }

    /// Owner key for the signed-in user's collection.
    pub fn owner_key(&self) -> Result<&str> {
        let present = |id: &&str| !id.is_empty();
        self.user_id
            .as_deref()
            .filter(present)
            .or_else(|| self.login.as_deref().filter(present))
            .ok_or_else(|| ZistError::unauthenticated("resolving the signed-in user"))
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &self.access_token.as_ref().map(|_| "<redacted>"))
            .field("user_id", &self.user_id)
            .field("login", &self.login)
            .finish()
    }
}
