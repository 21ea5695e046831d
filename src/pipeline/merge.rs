//! Ordered concatenation for the two merge variants.
//!
//! Every part is followed by exactly one `\n`, whether or not it already
//! ended in one, so file boundaries are always on their own line.

use crate::error::Log2TxtError;

/// Fewest inputs a merge accepts.
pub const MIN_MERGE_INPUTS: usize = 2;

/// Fail with [`Log2TxtError::Validation`] when fewer than
/// [`MIN_MERGE_INPUTS`] inputs were supplied.
pub fn check_arity(count: usize) -> Result<(), Log2TxtError> {
    if count < MIN_MERGE_INPUTS {
        return Err(Log2TxtError::Validation(format!(
            "insufficient files: need at least {MIN_MERGE_INPUTS} to merge, got {count}"
        )));
    }
    Ok(())
}

/// Concatenate `parts` in order, appending `\n` after each.
pub fn concat_with_newlines<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    parts.into_iter().fold(String::new(), |mut acc, part| {
        acc.push_str(part.as_ref());
        acc.push('\n');
        acc
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn two_parts() {
        assert_eq!(concat_with_newlines(["x", "y"]), "x\ny\n");
    }

    #[test]
    fn parts_ending_in_newline_still_get_separator() {
        assert_eq!(concat_with_newlines(["a\n", "b"]), "a\n\nb\n");
    }

    #[test]
    fn empty_parts_contribute_a_line() {
        assert_eq!(concat_with_newlines(["", ""]), "\n\n");
    }

    #[test]
    fn arity() {
        assert!(check_arity(0).is_err());
        let err = check_arity(1).unwrap_err();
        assert!(err.to_string().contains("insufficient files"), "got: {err}");
        assert!(check_arity(2).is_ok());
        assert!(check_arity(10).is_ok());
    }
}
