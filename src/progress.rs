//! Progress-callback trait for per-file conversion events.
//!
//! Inject an [`Arc<dyn ConversionProgressCallback>`] via
//! [`crate::config::PipelineConfigBuilder::progress_callback`] to receive
//! events as [`crate::service::LogService::convert`] works through a batch.
//!
//! Callers can forward events to a terminal progress bar (the `log2txt`
//! binary does), a log line, or a channel, without the library knowing how
//! the host application reports progress.
//!
//! # Example
//!
//! ```rust
//! use log2txt::{ConversionProgressCallback, PipelineConfig};
//! use std::sync::{Arc, atomic::{AtomicUsize, Ordering}};
//!
//! struct CountingCallback {
//!     completed: AtomicUsize,
//! }
//!
//! impl ConversionProgressCallback for CountingCallback {
//!     fn on_file_complete(&self, index: usize, total: usize, output_name: &str, bytes: usize) {
//!         self.completed.fetch_add(1, Ordering::SeqCst);
//!         eprintln!("{}/{} -> {} ({} bytes)", index, total, output_name, bytes);
//!     }
//! }
//!
//! let counter = Arc::new(CountingCallback { completed: AtomicUsize::new(0) });
//!
//! let config = PipelineConfig::builder()
//!     .progress_callback(counter as Arc<dyn ConversionProgressCallback>)
//!     .build()
//!     .unwrap();
//! ```

use std::sync::Arc;

/// Called by the conversion pipeline as it processes each uploaded file.
///
/// Implementations must be `Send + Sync`: the service is shared across
/// request handlers. All methods have default no-op implementations so
/// callers only override what they care about.
pub trait ConversionProgressCallback: Send + Sync {
    /// Called once, after the previous batch's text artifacts were cleared.
    fn on_batch_start(&self, total_files: usize) {
        let _ = total_files;
    }

    /// Called before a file is decoded.
    ///
    /// # Arguments
    /// * `index`       — 1-indexed position in the batch
    /// * `total_files` — batch size
    /// * `source_name` — name the file was uploaded under
    fn on_file_start(&self, index: usize, total_files: usize, source_name: &str) {
        let _ = (index, total_files, source_name);
    }

    /// Called after the converted text was written to storage.
    ///
    /// # Arguments
    /// * `output_name` — derived artifact name, e.g. `app.txt`
    /// * `bytes`       — byte length of the written text
    fn on_file_complete(&self, index: usize, total_files: usize, output_name: &str, bytes: usize) {
        let _ = (index, total_files, output_name, bytes);
    }

    /// Called when a file fails. The batch stops after this call.
    fn on_file_error(&self, index: usize, total_files: usize, error: &str) {
        let _ = (index, total_files, error);
    }

    /// Called once when every file was written.
    fn on_batch_complete(&self, total_files: usize, written: usize) {
        let _ = (total_files, written);
    }
}

/// A no-op implementation for callers that don't need progress events.
pub struct NoopProgressCallback;

impl ConversionProgressCallback for NoopProgressCallback {}

/// Convenience alias matching the type stored in [`crate::config::PipelineConfig`].
pub type ProgressCallback = Arc<dyn ConversionProgressCallback>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct TrackingCallback {
        starts: AtomicUsize,
        completes: AtomicUsize,
        errors: AtomicUsize,
        batch_total: AtomicUsize,
        written_total: AtomicUsize,
    }

    impl ConversionProgressCallback for TrackingCallback {
        fn on_batch_start(&self, total_files: usize) {
            self.batch_total.store(total_files, Ordering::SeqCst);
        }

        fn on_file_start(&self, _index: usize, _total: usize, _source_name: &str) {
            self.starts.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_complete(&self, _index: usize, _total: usize, _output: &str, _bytes: usize) {
            self.completes.fetch_add(1, Ordering::SeqCst);
        }

        fn on_file_error(&self, _index: usize, _total: usize, _error: &str) {
            self.errors.fetch_add(1, Ordering::SeqCst);
        }

        fn on_batch_complete(&self, _total: usize, written: usize) {
            self.written_total.store(written, Ordering::SeqCst);
        }
    }

    #[test]
    fn noop_callback_does_not_panic() {
        let cb = NoopProgressCallback;
        cb.on_batch_start(2);
        cb.on_file_start(1, 2, "a.log");
        cb.on_file_complete(1, 2, "a.txt", 42);
        cb.on_file_error(2, 2, "disk full");
        cb.on_batch_complete(2, 1);
    }

    #[test]
    fn tracking_callback_receives_events() {
        let tracker = TrackingCallback::default();

        tracker.on_batch_start(3);
        tracker.on_file_start(1, 3, "a.log");
        tracker.on_file_complete(1, 3, "a.txt", 10);
        tracker.on_file_start(2, 3, "b.log");
        tracker.on_file_complete(2, 3, "b.txt", 20);
        tracker.on_file_start(3, 3, "c.log");
        tracker.on_file_error(3, 3, "write failed");

        assert_eq!(tracker.batch_total.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.starts.load(Ordering::SeqCst), 3);
        assert_eq!(tracker.completes.load(Ordering::SeqCst), 2);
        assert_eq!(tracker.errors.load(Ordering::SeqCst), 1);

        tracker.on_batch_complete(3, 2);
        assert_eq!(tracker.written_total.load(Ordering::SeqCst), 2);
    }
}
