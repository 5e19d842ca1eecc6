//! Network layer for the remote gist resource.
//!
//! Provides:
//! - HTTP client with GitHub headers and rate limit tracking
//! - Session identity and the read resolution chain
//! - The [`GistRemote`] trait and its GitHub implementation

pub mod client;
pub mod github;
pub mod remote;
pub mod resolution;
pub mod session;

pub use client::{HttpClient, RateLimitState};
pub use github::GitHubGists;
pub use remote::{GistRemote, GistScope};
pub use resolution::{ResolutionChain, Strategy};
pub use session::Session;
