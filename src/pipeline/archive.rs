//! Zip packaging for the bulk download.
//!
//! ## Why spawn_blocking?
//!
//! The `zip` crate writes synchronously and Deflate at level 9 is CPU-bound.
//! [`build_archive`] is a plain blocking function; callers run it inside
//! `tokio::task::spawn_blocking` so request workers never stall on it.
//!
//! Entries are sorted by name: directory enumeration order differs between
//! platforms, and a sorted archive is reproducible for the same inputs.

use crate::error::Log2TxtError;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Build a zip archive from `(name, content)` pairs.
///
/// `level` 0 stores entries uncompressed; 1–9 selects the Deflate level.
pub fn build_archive(
    mut entries: Vec<(String, Vec<u8>)>,
    level: u32,
) -> Result<Vec<u8>, Log2TxtError> {
    entries.sort_by(|a, b| a.0.cmp(&b.0));

    let options = if level == 0 {
        SimpleFileOptions::default().compression_method(CompressionMethod::Stored)
    } else {
        SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(i64::from(level.min(9))))
    };

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in &entries {
        zip.start_file(name.as_str(), options)
            .map_err(|e| Log2TxtError::Archive(format!("entry '{name}': {e}")))?;
        zip.write_all(content)
            .map_err(|e| Log2TxtError::Archive(format!("entry '{name}': {e}")))?;
    }

    let cursor = zip
        .finish()
        .map_err(|e| Log2TxtError::Archive(e.to_string()))?;
    Ok(cursor.into_inner())
}
