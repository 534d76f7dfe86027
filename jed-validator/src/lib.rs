//! # jed-validator
//!
//! Pre-upload gate for JEDEC fuse maps.
//!
//! The structural checks live in [`jed_check`]; this crate is the intake
//! around them. It finds candidate files on disk, reads them safely, runs
//! the checks and collects a [`ValidationReport`] that the [`output`]
//! module renders for people or machines.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::PathBuf;
//! use jed_validator::{FsSourceConfig, validate_fs};
//!
//! let mut fs_config = FsSourceConfig::for_paths(vec![PathBuf::from("data")]);
//! fs_config.exclude = vec!["*.bak.jed".to_owned()];
//!
//! let report = validate_fs(&fs_config).unwrap();
//! println!("Files scanned: {}", report.scanned_files);
//! println!("Rejected: {}", report.rejections_count());
//! println!("OK: {}", report.ok);
//! ```

mod config;
mod error;
pub mod output;
mod report;
mod strategy;

pub use config::{DEFAULT_MAX_FILE_SIZE, FsSourceConfig};
pub use error::{Rejection, ScanError, ScanErrorKind};
pub use report::{AcceptedFile, FileVerdict, ValidationReport};
pub use strategy::candidate_name;

use std::path::Path;

use strategy::fs::{find_files, read_file_bounded};

/// Validate in-memory content under the given file name.
///
/// `file` only labels the verdict; nothing is read from it.
#[must_use]
pub fn validate_content(file: &Path, name: &str, content: &str) -> FileVerdict {
    let verdict = jed_check::validate(name, content);
    match &verdict {
        Ok(_) => tracing::debug!(file = %file.display(), name, "accepted"),
        Err(err) => tracing::debug!(
            file = %file.display(),
            name,
            code = err.code(),
            "rejected: {err}"
        ),
    }
    FileVerdict::from_verdict(file, name, &verdict)
}

/// Read and validate one file under an explicit name.
///
/// This is what an upload form does: the bytes come from `path`, but the
/// name checks apply to `name`.
///
/// # Errors
///
/// Returns a `ScanError` if the file cannot be read as text within
/// `max_file_size` bytes.
pub fn validate_file_as(
    path: &Path,
    name: &str,
    max_file_size: u64,
) -> Result<FileVerdict, ScanError> {
    let content = read_file_bounded(path, max_file_size)?;
    Ok(validate_content(path, name, &content))
}

/// Validate JEDEC files on disk.
///
/// This is the primary public API.
///
/// # Errors
///
/// Returns an error if `fs_config.paths` is empty or if any provided path does not exist.
/// Returns `Ok` with `scanned_files: 0` if paths exist but contain no candidate files.
/// Read failures are reported in `report.scan_errors` and never silently discarded.
pub fn validate_fs(fs_config: &FsSourceConfig) -> anyhow::Result<ValidationReport> {
    if fs_config.paths.is_empty() {
        anyhow::bail!("No paths provided for validation");
    }

    for path in &fs_config.paths {
        if !path.exists() {
            anyhow::bail!("Path does not exist: {}", path.display());
        }
    }

    let (files, scan_errors) = find_files(fs_config);
    tracing::debug!(candidates = files.len(), "discovered files");

    let mut report = ValidationReport {
        // Discovery failures count as failed files up front.
        failed_files: scan_errors.len(),
        scan_errors,
        ..ValidationReport::default()
    };
    let mut total_bytes: u64 = 0;

    for file_path in &files {
        if report.files_attempted() >= fs_config.max_files {
            push_scan_error(
                &mut report,
                ScanError::new(
                    file_path,
                    ScanErrorKind::LimitExceeded,
                    format!(
                        "Scan aborted: max_files limit ({}) reached; remaining files not scanned",
                        fs_config.max_files
                    ),
                ),
            );
            break;
        }

        let name = match strategy::candidate_name(file_path) {
            Ok(name) => name,
            Err(e) => {
                push_scan_error(&mut report, e);
                continue;
            }
        };

        let content = match read_file_bounded(file_path, fs_config.max_file_size) {
            Ok(c) => c,
            Err(e) => {
                push_scan_error(&mut report, e);
                continue;
            }
        };

        let file_bytes = content.len() as u64;
        if total_bytes.saturating_add(file_bytes) > fs_config.max_total_bytes {
            push_scan_error(
                &mut report,
                ScanError::new(
                    file_path,
                    ScanErrorKind::LimitExceeded,
                    format!(
                        "Scan aborted: max_total_bytes limit ({}) reached; \
                         remaining files not scanned",
                        fs_config.max_total_bytes
                    ),
                ),
            );
            break;
        }
        total_bytes = total_bytes.saturating_add(file_bytes);

        report.scanned_files += 1;
        match validate_content(file_path, name, &content) {
            FileVerdict::Accepted(accepted) => report.accepted.push(accepted),
            FileVerdict::Rejected(rejection) => report.rejections.push(rejection),
        }
    }

    report.ok = report.rejections.is_empty() && report.scan_errors.is_empty();
    tracing::info!(
        scanned = report.scanned_files,
        failed = report.failed_files,
        rejected = report.rejections_count(),
        "validation finished"
    );
    Ok(report)
}

fn push_scan_error(report: &mut ValidationReport, error: ScanError) {
    tracing::warn!(file = %error.file.display(), "{}", error.message);
    report.scan_errors.push(error);
    report.failed_files += 1;
}
