//! Wire and cache data types.

mod gist;
mod payload;
mod user;

pub use gist::{timestamp_millis, FileMetadata, GistOverlay, GistRecord};
pub use payload::{DraftFile, FilePatch, GistCreatePayload, GistDraft, GistPatch, NewFile};
pub use user::GitHubUser;
