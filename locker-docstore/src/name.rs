//! Validation for the path segments documents are stored under.

use crate::error::{DocStoreError, DocStoreResult};

/// Longest accepted username or document name, in bytes.
pub const MAX_SEGMENT_LEN: usize = 200;

/// Rejects anything that could name a different directory entry than the
/// one intended: separators, NUL, `.`/`..`, and leading dots (which also
/// keeps in-flight temp files out of listings).
pub fn validate_segment(kind: &str, segment: &str) -> DocStoreResult<()> {
    let reason = if segment.is_empty() {
        Some("is empty")
    } else if segment.len() > MAX_SEGMENT_LEN {
        Some("is too long")
    } else if segment.starts_with('.') {
        Some("starts with '.'")
    } else if segment.contains(['/', '\\', '\0']) {
        Some("contains a path separator or NUL")
    } else if segment.chars().any(char::is_control) {
        Some("contains a control character")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(DocStoreError::InvalidName(format!(
            "{kind} {segment:?} {reason}"
        ))),
        None => Ok(()),
    }
}
