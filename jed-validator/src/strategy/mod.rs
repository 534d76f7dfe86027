//! Intake strategies.
//!
//! Only the filesystem strategy exists today. In-memory content (an HTTP
//! request body, an upload form) goes straight through
//! [`crate::validate_content`] and needs no strategy.

pub mod fs;

use std::path::Path;

use crate::error::{ScanError, ScanErrorKind};

/// The name a file is validated under: its final path component.
///
/// # Errors
///
/// Returns a `ScanError` if the path has no file name or it is not UTF-8.
pub fn candidate_name(path: &Path) -> Result<&str, ScanError> {
    path.file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| {
            ScanError::new(
                path,
                ScanErrorKind::InvalidFileName,
                "Path has no UTF-8 file name".to_owned(),
            )
        })
}
