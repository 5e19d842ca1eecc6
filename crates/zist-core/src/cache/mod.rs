//! Explicit cache for gist data.
//!
//! Three namespaces share one store:
//! - `gists`: paged collections keyed by owner
//! - `gist`: single gists keyed by id
//! - `gistFile`: raw file contents keyed by raw URL

mod key;
mod pages;
mod store;

pub use key::{CacheKey, Namespace};
pub use pages::GistPages;
pub use store::{CacheSnapshot, GistCache, ReadTicket};
