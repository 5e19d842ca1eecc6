//! Zist Core - headless engine of the Zist gist organizer.
//!
//! This crate holds everything below the UI: the query engine over gist
//! collections, the sidecar codec that stores categories and tags inside a
//! gist description, and the optimistic mutation coordinator that keeps the
//! cache consistent while writes are in flight.
//!
//! # Example
//!
//! ```rust,ignore
//! use zist_core::{FilterSpec, GistScope, Session, SortField, SortOrder, ZistApi};
//!
//! #[tokio::main]
//! async fn main() -> zist_core::Result<()> {
//!     let api = ZistApi::builder(Session::authenticated("ghp_...", "583231"))
//!         .build()?;
//!
//!     let rust = api
//!         .reader()
//!         .view(
//!             &GistScope::Authenticated,
//!             &FilterSpec::default().with_language("Rust"),
//!             SortField::Updated,
//!             SortOrder::Desc,
//!         )
//!         .await?;
//!     println!("{} Rust gists", rust.len());
//!
//!     api.coordinator().set_category(&rust[0].id, "snippets").await?;
//!     Ok(())
//! }
//! ```

pub mod cache;
pub mod cancel;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod models;
pub mod network;
pub mod query;
pub mod reader;
pub mod sidecar;

mod api;

#[cfg(test)]
mod testing;

// Re-export commonly used types
pub use cache::{CacheKey, GistCache, GistPages, Namespace};
pub use cancel::CancellationToken;
pub use config::{ClientConfig, NetworkConfig, Route};
pub use coordinator::{
    ChannelEffects, MutationCoordinator, MutationPhase, NoopEffects, UiEffect, UiEffects,
};
pub use error::{Result, ZistError};
pub use models::{
    DraftFile, FileMetadata, FilePatch, GistCreatePayload, GistDraft, GistPatch, GistRecord,
    GitHubUser,
};
pub use network::{GistRemote, GistScope, GitHubGists, Session};
pub use query::{FilterSpec, SortField, SortOrder};
pub use reader::{FileContent, GistReader};
pub use sidecar::{ParsedDescription, SidecarConfig, SIDECAR_SEPARATOR};

pub use api::ZistApiBuilder;

use std::sync::Arc;

/// Entry point bundling one session's cache, reader and coordinator.
///
/// The reader and the coordinator share the same [`GistCache`], so reads see
/// optimistic writes and mutations can cancel reads.
pub struct ZistApi {
    cache: Arc<GistCache>,
    reader: GistReader,
    coordinator: MutationCoordinator,
}

impl ZistApi {
    pub fn builder(session: Session) -> ZistApiBuilder {
        ZistApiBuilder::new(session)
    }

    pub fn cache(&self) -> &Arc<GistCache> {
        &self.cache
    }

    pub fn reader(&self) -> &GistReader {
        &self.reader
    }

    pub fn coordinator(&self) -> &MutationCoordinator {
        &self.coordinator
    }
}
