//! Error types for file intake.

use std::path::{Path, PathBuf};

use jed_check::JedecError;
use serde::Serialize;

/// The kind of intake failure that prevented a file from being validated.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScanErrorKind {
    /// An I/O error occurred while reading the file.
    IoError,
    /// The file exceeded the configured maximum size limit.
    FileTooLarge,
    /// The file content is not valid UTF-8 text.
    InvalidEncoding,
    /// The path has no usable file name.
    InvalidFileName,
    /// The resolved path is outside the scan root (symlink escape).
    OutsideRepository,
    /// A resource limit (`max_files` or `max_total_bytes`) was reached, truncating the scan.
    LimitExceeded,
    /// A directory traversal error (permission denied, loop detected, etc.).
    WalkError,
    /// An exclude glob pattern could not be parsed.
    InvalidExcludePattern,
}

/// A file that could not be validated at all.
///
/// Distinct from [`Rejection`]: a rejection means the file was read and
/// failed a structural check. A `ScanError` means it never got that far.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[non_exhaustive]
pub struct ScanError {
    pub file: PathBuf,
    pub kind: ScanErrorKind,
    /// Human-readable description of the failure.
    pub message: String,
}

impl ScanError {
    #[must_use]
    pub fn new(file: &Path, kind: ScanErrorKind, message: String) -> Self {
        Self {
            file: file.to_owned(),
            kind,
            message,
        }
    }

    /// Format the error for human-readable output.
    #[must_use]
    pub fn format_human_readable(&self) -> String {
        format!("{}: [scan error] {}", self.file.display(), self.message)
    }
}

/// A file that was read and failed validation.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[non_exhaustive]
pub struct Rejection {
    /// Path the file was read from.
    pub file: PathBuf,
    /// File name the verdict was computed for.
    pub name: String,
    /// Stable failure class, see [`JedecError::code`].
    pub code: String,
    /// Short reason, e.g. `SPI port disabled`.
    pub reason: String,
    /// Sentence for the upload page status line.
    pub status: String,
}

impl Rejection {
    #[must_use]
    pub fn new(file: &Path, name: &str, error: &JedecError) -> Self {
        Self {
            file: file.to_owned(),
            name: name.to_owned(),
            code: error.code().to_owned(),
            reason: error.to_string(),
            status: error.status_line(),
        }
    }

    /// Format the rejection for human-readable output.
    ///
    /// `{file}: {reason} [{code}]`
    #[must_use]
    pub fn format_human_readable(&self) -> String {
        format!("{}: {} [{}]", self.file.display(), self.reason, self.code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jed_check::Marker;

    #[test]
    fn test_format_rejection() {
        let rejection = Rejection::new(
            Path::new("fuses/device.jed"),
            "device.jed",
            &JedecError::MissingMarker(Marker::FuseTable),
        );

        let formatted = rejection.format_human_readable();
        assert_eq!(
            formatted,
            "fuses/device.jed: missing L for fuse table [missing_marker]"
        );
        assert_eq!(
            rejection.status,
            "File check failed: could not find 'L' for fuse table"
        );
    }

    #[test]
    fn test_format_scan_error() {
        let err = ScanError::new(
            Path::new("fuses/blob.jed"),
            ScanErrorKind::InvalidEncoding,
            "File is not valid UTF-8".to_owned(),
        );

        let formatted = err.format_human_readable();
        assert!(formatted.starts_with("fuses/blob.jed: [scan error]"));
        assert!(formatted.contains("UTF-8"));
    }
}
