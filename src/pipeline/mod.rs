//! Pipeline stages for log conversion, merging and packaging.
//!
//! Each submodule is a pure transformation with no storage access; the
//! [`crate::service::LogService`] drives them against an
//! [`crate::storage::ArtifactStore`].
//!
//! ## Data Flow
//!
//! ```text
//! upload ──▶ sanitize ──▶ normalise ──▶ store ──▶ merge / archive
//! (name,bytes) (name)      (CRLF→LF)    (write)   (concat / zip)
//! ```
//!
//! 1. [`sanitize`]: reduce caller-supplied names to one plain path component
//! 2. [`normalise`]: decode bytes as text, rewrite line endings, derive names
//! 3. [`merge`]: ordered concatenation with a newline after each part
//! 4. [`archive`]: zip text artifacts; CPU-bound, run in `spawn_blocking`

pub mod archive;
pub mod merge;
pub mod normalise;
pub mod sanitize;
