//! Scratch storage: a flat namespace of named artifacts.
//!
//! Every pipeline operation receives its storage as an explicit
//! [`ArtifactStore`] handle rather than reaching for a global directory.
//! [`FsStore`] is the production backend, rooted at one directory;
//! [`MemoryStore`] keeps artifacts in a map for unit tests.
//!
//! Names handed to a store are plain file names: no separators, never `.` or
//! `..`. Backends re-check this and treat a nested name as absent, so a
//! store can never be asked to touch anything outside its root.

pub mod fs;
pub mod locks;
pub mod memory;

pub use fs::FsStore;
pub use locks::{NameGuard, NameLocks};
pub use memory::MemoryStore;

use crate::error::Log2TxtError;
use async_trait::async_trait;
use tokio::io::AsyncRead;

/// Byte stream over one artifact's content.
pub type ArtifactReader = Box<dyn AsyncRead + Send + Unpin>;

/// An artifact opened for streaming.
pub struct ArtifactHandle {
    /// Plain artifact name.
    pub name: String,
    /// Content length in bytes at the time of opening.
    pub len: u64,
    /// Reader positioned at the start of the content.
    pub reader: ArtifactReader,
}

impl std::fmt::Debug for ArtifactHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArtifactHandle")
            .field("name", &self.name)
            .field("len", &self.len)
            .finish_non_exhaustive()
    }
}

/// A flat, name-addressed artifact store.
///
/// Writes replace the whole artifact; a concurrent reader observes either the
/// old or the new content.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Short description for logs, e.g. the root directory.
    fn describe(&self) -> String;

    /// Names of every artifact, sorted.
    async fn list(&self) -> Result<Vec<String>, Log2TxtError>;

    /// Full content of `name`, or [`Log2TxtError::NotFound`].
    async fn read(&self, name: &str) -> Result<Vec<u8>, Log2TxtError>;

    /// Open `name` for streaming, or [`Log2TxtError::NotFound`].
    async fn open(&self, name: &str) -> Result<ArtifactHandle, Log2TxtError>;

    /// Create or replace `name` with `content`.
    async fn write(&self, name: &str, content: &[u8]) -> Result<(), Log2TxtError>;

    /// Delete `name`. Returns `false` if it did not exist.
    async fn remove(&self, name: &str) -> Result<bool, Log2TxtError>;

    /// Whether the backing storage is reachable.
    async fn is_available(&self) -> bool;

    /// Delete leftovers that are not artifacts, such as files of an
    /// interrupted write. Returns how many were removed.
    ///
    /// Stores that never leave anything behind keep the default.
    async fn remove_leftovers(&self) -> Result<usize, Log2TxtError> {
        Ok(0)
    }
}
