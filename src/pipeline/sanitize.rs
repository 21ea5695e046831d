//! Name sanitisation: the single guard between caller input and storage paths.
//!
//! Every name that reaches a storage backend has passed through this module.
//! A caller-supplied name is reduced to its final path component, so
//! directory segments, `..` hops and absolute prefixes are discarded before
//! the name is ever joined onto a storage root. Both `/` and `\` count as
//! separators regardless of host platform.

use crate::error::Log2TxtError;

fn is_separator(c: char) -> bool {
    c == '/' || c == '\\'
}

/// Final path component of `name`, ignoring trailing separators.
///
/// `"../../etc/passwd"` → `"passwd"`, `"C:\\logs\\a.log"` → `"a.log"`,
/// `"dir/"` → `"dir"`.
pub fn final_component(name: &str) -> &str {
    let trimmed = name.trim_end_matches(is_separator);
    match trimmed.rfind(is_separator) {
        Some(pos) => &trimmed[pos + 1..],
        None => trimmed,
    }
}

/// Whether `name` can be used as-is as a flat artifact name.
pub fn is_plain_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(is_separator)
        && !name.contains('\0')
}

/// Resolve a requested artifact name to a plain name inside the store.
///
/// # Errors
/// [`Log2TxtError::NotFound`] when nothing usable is left after stripping
/// directory segments (empty, `.`, `..`, or a NUL byte).
pub fn artifact_name(requested: &str) -> Result<String, Log2TxtError> {
    let name = final_component(requested);
    if is_plain_name(name) {
        Ok(name.to_string())
    } else {
        Err(Log2TxtError::not_found(requested))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn final_component_strips_directories() {
        assert_eq!(final_component("a.txt"), "a.txt");
        assert_eq!(final_component("logs/a.txt"), "a.txt");
        assert_eq!(final_component("/abs/path/a.txt"), "a.txt");
        assert_eq!(final_component("C:\\logs\\a.log"), "a.log");
        assert_eq!(final_component("dir/"), "dir");
        assert_eq!(final_component(""), "");
    }

    #[test]
    fn traversal_payloads_never_leave_a_separator() {
        let payloads = [
            "../../etc/passwd",
            "..\\..\\windows\\win.ini",
            "/etc/passwd",
            "....//....//etc/passwd",
            "a/../../../b",
            "..",
            "../",
            "./.",
            "%2e%2e/secret",
        ];
        for payload in payloads {
            match artifact_name(payload) {
                Ok(name) => {
                    assert!(is_plain_name(&name), "{payload} -> {name}");
                    assert_ne!(name, "..");
                }
                Err(e) => assert!(matches!(e, Log2TxtError::NotFound { .. })),
            }
        }
        assert_eq!(artifact_name("../../etc/passwd").unwrap(), "passwd");
    }

    #[test]
    fn rejects_names_with_nothing_left() {
        for bad in ["", "/", "..", ".", "dir/..", "a\0b"] {
            let err = artifact_name(bad).unwrap_err();
            assert!(matches!(err, Log2TxtError::NotFound { .. }), "{bad:?}");
        }
    }

    #[test]
    fn plain_names() {
        assert!(is_plain_name("merged.txt"));
        assert!(is_plain_name(".hidden"));
        assert!(is_plain_name("...")); // three dots is an ordinary name
        assert!(!is_plain_name("a/b"));
        assert!(!is_plain_name("a\\b"));
    }
}
