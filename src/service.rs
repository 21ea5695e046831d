//! The pipeline operations: convert, merge, download, reset.
//!
//! [`LogService`] binds a [`PipelineConfig`] to an [`ArtifactStore`] and
//! exposes one async method per operation. It is `Send + Sync` and meant to
//! be shared behind an `Arc` by every request handler.
//!
//! ## Failure model
//!
//! Operations fail fast and never roll back. A conversion that fails on its
//! third file leaves the first two written and the previous batch's text
//! artifacts gone. Merges validate and read everything before the single
//! write, so a failed merge leaves the store untouched.

use crate::config::{PipelineConfig, DEFAULT_AREA};
use crate::error::{FileError, Log2TxtError};
use crate::output::{
    content_type_for, ClearReport, ConvertOutput, Download, MergedLog, MergedText, UploadedFile,
};
use crate::pipeline::{archive, merge, normalise, sanitize};
use crate::storage::{ArtifactStore, NameLocks};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Message returned by a successful cache reset.
pub const CACHE_CLEARED: &str = "Cache cleared successfully";

/// Conversion, merge and retrieval over one scratch store.
pub struct LogService {
    store: Arc<dyn ArtifactStore>,
    areas: BTreeMap<String, Arc<dyn ArtifactStore>>,
    locks: NameLocks,
    config: PipelineConfig,
}

impl std::fmt::Debug for LogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogService")
            .field("store", &self.store.describe())
            .field("areas", &self.areas.keys().collect::<Vec<_>>())
            .field("config", &self.config)
            .finish()
    }
}

impl LogService {
    /// Create a service writing to `store`, registered as the
    /// [`DEFAULT_AREA`] download area.
    pub fn new(store: Arc<dyn ArtifactStore>, config: PipelineConfig) -> Self {
        let mut areas = BTreeMap::new();
        areas.insert(DEFAULT_AREA.to_string(), Arc::clone(&store));
        Self {
            store,
            areas,
            locks: NameLocks::new(),
            config,
        }
    }

    /// Register an additional read-only download area.
    ///
    /// Registering [`DEFAULT_AREA`] again is ignored: that selector always
    /// refers to the scratch store.
    pub fn with_area(mut self, name: impl Into<String>, store: Arc<dyn ArtifactStore>) -> Self {
        let name = name.into();
        if name == DEFAULT_AREA {
            warn!("Ignoring extra download area named '{}'", DEFAULT_AREA);
        } else {
            self.areas.insert(name, store);
        }
        self
    }

    pub fn store(&self) -> &Arc<dyn ArtifactStore> {
        &self.store
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Registered download area selectors.
    pub fn area_names(&self) -> impl Iterator<Item = &str> {
        self.areas.keys().map(String::as_str)
    }

    // ── Conversion ───────────────────────────────────────────────────────

    /// Convert a batch of uploads to text artifacts.
    ///
    /// Clears every existing output-extension artifact first (best-effort:
    /// failures are logged and the batch goes on), then writes one
    /// artifact per upload with `\r\n` rewritten to `\n`. Duplicate derived
    /// names overwrite each other in upload order.
    ///
    /// # Returns
    /// Artifact names in upload order.
    ///
    /// # Errors
    /// - [`Log2TxtError::Validation`] for an empty batch or an upload whose
    ///   name has no usable file-name component; nothing is deleted.
    /// - [`Log2TxtError::Io`] if a write fails. Files written before the
    ///   failure stay written.
    pub async fn convert(&self, files: Vec<UploadedFile>) -> Result<ConvertOutput, Log2TxtError> {
        let start = Instant::now();
        let cfg = &self.config;
        info!("Starting conversion of {} files", files.len());

        // ── Step 1: Validate and derive names ───────────────────────────
        if files.is_empty() {
            return Err(Log2TxtError::Validation("no files to convert".into()));
        }
        let mut jobs = Vec::with_capacity(files.len());
        for (i, file) in files.into_iter().enumerate() {
            let Some(output) =
                normalise::derive_output_name(&file.name, &cfg.source_extension, &cfg.output_extension)
            else {
                let err = FileError::BadName {
                    index: i + 1,
                    name: file.name,
                };
                return Err(Log2TxtError::Validation(err.to_string()));
            };
            jobs.push((file, output));
        }
        let total = jobs.len();

        // ── Step 2: Reset previous batch ────────────────────────────────
        match self.remove_matching(&cfg.output_extension).await {
            Ok(cleared) => debug!("Cleared {} previous text artifacts", cleared),
            Err(e) => warn!("Previous batch only partly cleared: {}", e),
        }

        if let Some(ref cb) = cfg.progress_callback {
            cb.on_batch_start(total);
        }

        // ── Step 3: Normalise and write each file ───────────────────────
        let mut converted = Vec::with_capacity(total);
        for (i, (file, output)) in jobs.into_iter().enumerate() {
            let index = i + 1;
            if let Some(ref cb) = cfg.progress_callback {
                cb.on_file_start(index, total, &file.name);
            }

            let text = normalise::convert_bytes(&file.bytes);
            let written = {
                let _guard = self.locks.lock(&output).await;
                self.store.write(&output, text.as_bytes()).await
            };

            if let Err(e) = written {
                if let Some(ref cb) = cfg.progress_callback {
                    let file_err = FileError::WriteFailed {
                        index,
                        name: file.name.clone(),
                        detail: e.to_string(),
                    };
                    cb.on_file_error(index, total, &file_err.to_string());
                }
                warn!(
                    "Conversion stopped at file {}/{} ('{}'): {}",
                    index, total, file.name, e
                );
                return Err(e);
            }

            debug!("Converted {} to {} ({} bytes)", file.name, output, text.len());
            if let Some(ref cb) = cfg.progress_callback {
                cb.on_file_complete(index, total, &output, text.len());
            }
            converted.push(output);
        }

        if let Some(ref cb) = cfg.progress_callback {
            cb.on_batch_complete(total, converted.len());
        }
        info!(
            "Conversion complete: {} files in {}ms",
            converted.len(),
            start.elapsed().as_millis()
        );

        Ok(ConvertOutput {
            converted_files: converted,
        })
    }

    // ── Merging ──────────────────────────────────────────────────────────

    /// Concatenate raw uploads, in order, into the fixed merged-log artifact.
    ///
    /// Line endings are left as uploaded. The merged content is returned
    /// alongside the name.
    pub async fn merge_logs(&self, files: Vec<UploadedFile>) -> Result<MergedLog, Log2TxtError> {
        merge::check_arity(files.len())?;
        info!("Merging {} uploaded logs", files.len());

        let merged = merge::concat_with_newlines(
            files.iter().map(|f| normalise::decode_text(&f.bytes)),
        );

        let name = &self.config.merged_log_name;
        {
            let _guard = self.locks.lock(name).await;
            self.store.write(name, merged.as_bytes()).await?;
        }
        info!("Wrote {} ({} bytes)", name, merged.len());

        Ok(MergedLog {
            merged_file_name: name.clone(),
            merged_content: merged,
        })
    }

    /// Concatenate stored artifacts, in the given order, into the fixed
    /// merged-text artifact.
    ///
    /// # Errors
    /// - [`Log2TxtError::Validation`] for fewer than two names.
    /// - [`Log2TxtError::NotFound`] if any name is absent; nothing is written.
    pub async fn merge_text(&self, names: &[String]) -> Result<MergedText, Log2TxtError> {
        merge::check_arity(names.len())?;
        info!("Merging {} text artifacts", names.len());

        let names = names
            .iter()
            .map(|n| sanitize::artifact_name(n))
            .collect::<Result<Vec<_>, _>>()?;

        // `buffered` keeps results in request order. Each read owns its name
        // so the returned future stays `Send`.
        let contents: Vec<Vec<u8>> = stream::iter(names)
            .map(|name| {
                let store = Arc::clone(&self.store);
                async move { store.read(&name).await }
            })
            .buffered(self.config.read_concurrency)
            .try_collect()
            .await?;

        let merged =
            merge::concat_with_newlines(contents.iter().map(|c| normalise::decode_text(c)));

        let name = &self.config.merged_text_name;
        {
            let _guard = self.locks.lock(name).await;
            self.store.write(name, merged.as_bytes()).await?;
        }
        info!("Wrote {} ({} bytes)", name, merged.len());

        Ok(MergedText {
            merged_file_name: name.clone(),
        })
    }

    // ── Retrieval ────────────────────────────────────────────────────────

    /// Open one artifact for download.
    ///
    /// `requested` is reduced to its final path component before lookup, so
    /// no request can reach outside the area. `area` selects a registered
    /// download area; `None` means [`DEFAULT_AREA`].
    pub async fn download(
        &self,
        requested: &str,
        area: Option<&str>,
    ) -> Result<Download, Log2TxtError> {
        let area_name = area.unwrap_or(DEFAULT_AREA);
        let store = self
            .areas
            .get(area_name)
            .ok_or_else(|| Log2TxtError::not_found(area_name))?;

        let name = sanitize::artifact_name(requested)?;
        if name != requested {
            debug!("Download name '{}' reduced to '{}'", requested, name);
        }

        let handle = store.open(&name).await?;
        info!("Serving {}/{} ({} bytes)", area_name, handle.name, handle.len);
        Ok(Download {
            content_type: content_type_for(&handle.name),
            file_name: handle.name,
            len: handle.len,
            reader: handle.reader,
        })
    }

    /// Package every output-extension artifact into the fixed archive
    /// artifact and open it for download.
    ///
    /// The archive stays in the store until the next reset. Its own name
    /// never matches the output extension, so it is not swept into later
    /// archives.
    pub async fn download_all(&self) -> Result<Download, Log2TxtError> {
        let cfg = &self.config;
        let archive_name = cfg.archive_name.clone();
        let _guard = self.locks.lock(&archive_name).await;

        let names: Vec<String> = self
            .store
            .list()
            .await?
            .into_iter()
            .filter(|n| n.ends_with(&cfg.output_extension))
            .collect();

        let mut entries = Vec::with_capacity(names.len());
        for name in names {
            match self.store.read(&name).await {
                Ok(content) => entries.push((name, content)),
                // Removed between listing and reading.
                Err(Log2TxtError::NotFound { .. }) => {
                    debug!("Skipping {} (removed while archiving)", name)
                }
                Err(e) => return Err(e),
            }
        }
        let count = entries.len();

        let level = cfg.compression_level;
        let bytes = tokio::task::spawn_blocking(move || archive::build_archive(entries, level))
            .await
            .map_err(|e| Log2TxtError::Internal(format!("archive task panicked: {e}")))??;

        self.store.write(&archive_name, &bytes).await?;
        let handle = self.store.open(&archive_name).await?;
        info!(
            "Built {} with {} entries ({} bytes)",
            archive_name, count, handle.len
        );

        Ok(Download {
            content_type: content_type_for(&handle.name),
            file_name: handle.name,
            len: handle.len,
            reader: handle.reader,
        })
    }

    // ── Reset ────────────────────────────────────────────────────────────

    /// Delete every artifact in the scratch store, plus anything an
    /// interrupted write left behind.
    ///
    /// Best-effort: individual delete failures are logged and the sweep
    /// continues; afterwards the first failure is reported as
    /// [`Log2TxtError::Io`]. An empty store is a successful no-op.
    pub async fn clear_cache(&self) -> Result<ClearReport, Log2TxtError> {
        let swept = self.remove_matching("").await;
        let leftovers = self.store.remove_leftovers().await;
        let removed = swept?;
        let leftovers = leftovers?;
        if leftovers > 0 {
            debug!("Removed {} leftover partial files", leftovers);
        }
        info!("Cache cleared: {} artifacts removed", removed);
        Ok(ClearReport {
            message: CACHE_CLEARED.to_string(),
            removed,
        })
    }

    /// Remove every artifact whose name ends in `suffix`, continuing past
    /// individual failures.
    async fn remove_matching(&self, suffix: &str) -> Result<usize, Log2TxtError> {
        let names = self.store.list().await?;
        let mut removed = 0;
        let mut failures: Vec<Log2TxtError> = Vec::new();

        for name in names.iter().filter(|n| n.ends_with(suffix)) {
            let _guard = self.locks.lock(name).await;
            match self.store.remove(name).await {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => {
                    warn!("Failed to delete {}: {}", name, e);
                    failures.push(e);
                }
            }
        }

        match failures.len() {
            0 => Ok(removed),
            n => {
                let first = failures.swap_remove(0);
                let source = match first {
                    Log2TxtError::Io { source, .. } => source,
                    other => std::io::Error::new(std::io::ErrorKind::Other, other.to_string()),
                };
                Err(Log2TxtError::io(
                    format!("failed to delete {n} of {} artifacts", removed + n),
                    source,
                ))
            }
        }
    }
}
