//! # log2txt
//!
//! Turn uploaded `.log` files into LF-terminated `.txt` files, merge them,
//! and hand them back one at a time or as a zip archive.
//!
//! ## Pipeline Overview
//!
//! ```text
//! uploads
//!  │
//!  ├─ 1. Convert    CRLF → LF, `name.log` → `name.txt` (replaces previous batch)
//!  ├─ 2. Merge      raw logs → merged.log, stored text → merged.txt
//!  ├─ 3. Download   one artifact, confined to its storage area
//!  ├─ 4. Archive    every `.txt` → converted_files.zip (Deflate 9)
//!  └─ 5. Reset      delete everything in scratch storage
//! ```
//!
//! All state lives in one flat scratch store behind the [`ArtifactStore`]
//! trait: [`FsStore`] for a directory, [`MemoryStore`] for tests.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use log2txt::{FsStore, LogService, PipelineConfig, UploadedFile};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = FsStore::open("public/converted").await?;
//!     let service = LogService::new(Arc::new(store), PipelineConfig::default());
//!
//!     let out = service
//!         .convert(vec![UploadedFile::new("app.log", "one\r\ntwo\r\n")])
//!         .await?;
//!     assert_eq!(out.converted_files, ["app.txt"]);
//!     Ok(())
//! }
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `cli`   | on      | Enables the `log2txt` binary (clap + anyhow + tracing-subscriber + browser launcher) |
//!
//! Disable `cli` when embedding only the library and router:
//! ```toml
//! log2txt = { version = "0.1", default-features = false }
//! ```

// ── Modules ──────────────────────────────────────────────────────────────

pub mod config;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod progress;
pub mod server;
pub mod service;
pub mod storage;

// ── Re-exports ───────────────────────────────────────────────────────────

pub use config::{PipelineConfig, PipelineConfigBuilder, ServerConfig, DEFAULT_AREA};
pub use error::{ErrorKind, FileError, Log2TxtError};
pub use output::{ClearReport, ConvertOutput, Download, MergedLog, MergedText, UploadedFile};
pub use progress::{ConversionProgressCallback, NoopProgressCallback, ProgressCallback};
pub use server::{build_service, router};
pub use service::LogService;
pub use storage::{ArtifactHandle, ArtifactStore, FsStore, MemoryStore};
