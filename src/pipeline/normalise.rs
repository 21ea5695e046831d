//! Text normalisation: bytes → text with LF line endings, plus output naming.
//!
//! `\r\n` is rewritten to `\n`. A lone `\r` (classic Mac line ending) and a
//! lone `\n` are left exactly as they are; nothing else about the content is
//! inspected.
//!
//! A run of carriage returns directly in front of a line feed (`\r\r\n`) is
//! collapsed together with it, so converted text never contains `\r\n`.
//! Those extra carriage returns are dropped on purpose, even though a single
//! find-and-replace pass would have kept one of them.

use super::sanitize::{final_component, is_plain_name};
use std::borrow::Cow;

/// Decode uploaded bytes as UTF-8, replacing invalid sequences with U+FFFD.
pub fn decode_text(bytes: &[u8]) -> Cow<'_, str> {
    String::from_utf8_lossy(bytes)
}

/// Replace every `\r\n` with `\n`.
///
/// Carriage returns are held back until the next character is known: they
/// are dropped in front of `\n` and emitted unchanged anywhere else.
pub fn normalise_line_endings(text: &str) -> String {
    if !text.contains("\r\n") {
        return text.to_string();
    }
    let mut out = String::with_capacity(text.len());
    let mut pending_cr = 0usize;
    for c in text.chars() {
        match c {
            '\r' => pending_cr += 1,
            '\n' => {
                pending_cr = 0;
                out.push('\n');
            }
            _ => {
                for _ in 0..pending_cr {
                    out.push('\r');
                }
                pending_cr = 0;
                out.push(c);
            }
        }
    }
    for _ in 0..pending_cr {
        out.push('\r');
    }
    out
}

/// Decode and normalise in one step.
pub fn convert_bytes(bytes: &[u8]) -> String {
    normalise_line_endings(&decode_text(bytes))
}

/// Derive the artifact name for an uploaded file.
///
/// Takes the final path component of `source_name`, strips a trailing
/// `source_ext` (case-sensitive) and appends `output_ext`. A name that *is*
/// the extension (`".log"`) keeps it, so the result is never a bare
/// extension. Returns `None` when the upload name has no usable component.
///
/// ```rust
/// use log2txt::pipeline::normalise::derive_output_name;
///
/// assert_eq!(derive_output_name("a.b.log", ".log", ".txt").as_deref(), Some("a.b.txt"));
/// assert_eq!(derive_output_name("a.text", ".log", ".txt").as_deref(), Some("a.text.txt"));
/// ```
pub fn derive_output_name(source_name: &str, source_ext: &str, output_ext: &str) -> Option<String> {
    let base = final_component(source_name);
    if !is_plain_name(base) {
        return None;
    }
    let stem = match base.strip_suffix(source_ext) {
        Some(stem) if !stem.is_empty() => stem,
        _ => base,
    };
    Some(format!("{stem}{output_ext}"))
}
