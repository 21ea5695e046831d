//! Configuration types for the conversion, merge and retrieval pipeline.
//!
//! Pipeline behaviour is controlled through [`PipelineConfig`], built via its
//! [`PipelineConfigBuilder`]. The HTTP layer adds [`ServerConfig`] on top.
//!
//! Every artifact name the pipeline writes on its own (the merged files and
//! the archive) is a *fixed name*: the same literal string on every call, so
//! each call overwrites the previous result.

use crate::error::Log2TxtError;
use crate::pipeline::sanitize::is_plain_name;
use crate::progress::ProgressCallback;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::net::SocketAddr;
use std::path::PathBuf;

/// Name of the storage area backed by the scratch directory.
pub const DEFAULT_AREA: &str = "converted";

/// Configuration for the conversion / merge / retrieval pipeline.
///
/// Built via [`PipelineConfig::builder()`] or using
/// [`PipelineConfig::default()`].
///
/// # Example
/// ```rust
/// use log2txt::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .compression_level(6)
///     .read_concurrency(4)
///     .build()
///     .unwrap();
/// assert_eq!(config.output_extension, ".txt");
/// ```
#[derive(Clone)]
pub struct PipelineConfig {
    /// Extension stripped from upload names before the output extension is
    /// appended. Matched case-sensitively. Default: `.log`.
    pub source_extension: String,

    /// Extension of converted artifacts. Also selects which artifacts the
    /// conversion reset deletes and which ones the archive includes.
    /// Default: `.txt`.
    pub output_extension: String,

    /// Fixed name of the raw-log merge result. Default: `merged.log`.
    pub merged_log_name: String,

    /// Fixed name of the converted-text merge result. Default: `merged.txt`.
    pub merged_text_name: String,

    /// Fixed name of the bulk-download archive. Default: `converted_files.zip`.
    ///
    /// Must not end in [`Self::output_extension`], or the archive would be
    /// swept into its own next build.
    pub archive_name: String,

    /// Deflate level for archive entries, 0–9. Default: 9.
    pub compression_level: u32,

    /// Maximum artifact reads in flight during a text merge. Default: 8.
    pub read_concurrency: usize,

    /// Receives per-file conversion events.
    pub progress_callback: Option<ProgressCallback>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            source_extension: ".log".to_string(),
            output_extension: ".txt".to_string(),
            merged_log_name: "merged.log".to_string(),
            merged_text_name: "merged.txt".to_string(),
            archive_name: "converted_files.zip".to_string(),
            compression_level: 9,
            read_concurrency: 8,
            progress_callback: None,
        }
    }
}

impl fmt::Debug for PipelineConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineConfig")
            .field("source_extension", &self.source_extension)
            .field("output_extension", &self.output_extension)
            .field("merged_log_name", &self.merged_log_name)
            .field("merged_text_name", &self.merged_text_name)
            .field("archive_name", &self.archive_name)
            .field("compression_level", &self.compression_level)
            .field("read_concurrency", &self.read_concurrency)
            .field(
                "progress_callback",
                &self
                    .progress_callback
                    .as_ref()
                    .map(|_| "<dyn ConversionProgressCallback>"),
            )
            .finish()
    }
}

impl PipelineConfig {
    /// Create a new builder for `PipelineConfig`.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`PipelineConfig`].
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    pub fn source_extension(mut self, ext: impl Into<String>) -> Self {
        self.config.source_extension = ext.into();
        self
    }

    pub fn output_extension(mut self, ext: impl Into<String>) -> Self {
        self.config.output_extension = ext.into();
        self
    }

    pub fn merged_log_name(mut self, name: impl Into<String>) -> Self {
        self.config.merged_log_name = name.into();
        self
    }

    pub fn merged_text_name(mut self, name: impl Into<String>) -> Self {
        self.config.merged_text_name = name.into();
        self
    }

    pub fn archive_name(mut self, name: impl Into<String>) -> Self {
        self.config.archive_name = name.into();
        self
    }

    pub fn compression_level(mut self, level: u32) -> Self {
        self.config.compression_level = level.min(9);
        self
    }

    pub fn read_concurrency(mut self, n: usize) -> Self {
        self.config.read_concurrency = n.max(1);
        self
    }

    pub fn progress_callback(mut self, cb: ProgressCallback) -> Self {
        self.config.progress_callback = Some(cb);
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<PipelineConfig, Log2TxtError> {
        let c = &self.config;
        for (label, ext) in [
            ("source extension", &c.source_extension),
            ("output extension", &c.output_extension),
        ] {
            if !ext.starts_with('.') || ext.len() < 2 || !is_plain_name(ext) {
                return Err(Log2TxtError::InvalidConfig(format!(
                    "{label} must look like '.ext', got '{ext}'"
                )));
            }
        }
        for (label, name) in [
            ("merged log name", &c.merged_log_name),
            ("merged text name", &c.merged_text_name),
            ("archive name", &c.archive_name),
        ] {
            if !is_plain_name(name) {
                return Err(Log2TxtError::InvalidConfig(format!(
                    "{label} must be a single file name, got '{name}'"
                )));
            }
        }
        if c.archive_name.ends_with(&c.output_extension) {
            return Err(Log2TxtError::InvalidConfig(format!(
                "archive name '{}' must not end in the output extension '{}'",
                c.archive_name, c.output_extension
            )));
        }
        if c.compression_level > 9 {
            return Err(Log2TxtError::InvalidConfig(format!(
                "compression level must be 0–9, got {}",
                c.compression_level
            )));
        }
        if c.read_concurrency == 0 {
            return Err(Log2TxtError::InvalidConfig(
                "read concurrency must be ≥ 1".into(),
            ));
        }
        Ok(self.config)
    }
}

/// Configuration of the HTTP front end.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the server binds to. Default: `127.0.0.1:3000`.
    pub bind_addr: SocketAddr,

    /// Scratch directory holding every artifact. Created on startup.
    /// Default: `public/converted`.
    pub scratch_dir: PathBuf,

    /// Maximum request body size in bytes for uploads. Default: 64 MiB.
    pub max_upload_bytes: usize,

    /// Open the upload page in the default browser once listening.
    pub open_browser: bool,

    /// Additional read-only download areas, keyed by the `folder` selector.
    /// The scratch directory is always registered as [`DEFAULT_AREA`].
    pub extra_areas: BTreeMap<String, PathBuf>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            scratch_dir: PathBuf::from("public").join(DEFAULT_AREA),
            max_upload_bytes: 64 * 1024 * 1024,
            open_browser: true,
            extra_areas: BTreeMap::new(),
        }
    }
}

impl ServerConfig {
    /// URL a browser should be pointed at.
    ///
    /// An unspecified bind address (`0.0.0.0` / `::`) is shown as `localhost`.
    pub fn public_url(&self) -> String {
        if self.bind_addr.ip().is_unspecified() {
            format!("http://localhost:{}", self.bind_addr.port())
        } else {
            format!("http://{}", self.bind_addr)
        }
    }
}
