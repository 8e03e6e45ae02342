//! Path validation utilities

use crate::error::{GitoliteError, Result};
use std::path::Path;

/// Check if a path has exactly the given extension
///
/// The match is case-sensitive: `bob.PUB` is not a `pub` file.
#[must_use]
pub fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|ext| ext == extension)
}

/// Validate a single path segment such as a key owner or location
///
/// The segment must not be `.` or `..` and must not contain a path
/// separator, so joining it onto a base directory never escapes that
/// directory.
///
/// # Errors
///
/// Returns an argument error naming `what` if the segment is unsafe
pub fn validate_path_component(what: &str, segment: &str) -> Result<()> {
    if segment == "." || segment == ".." || segment.contains(['/', '\\']) {
        return Err(GitoliteError::argument(format!(
            "{what} '{segment}' is not a valid path segment"
        )));
    }
    Ok(())
}
