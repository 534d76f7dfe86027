//! Validation report types.

use std::path::{Path, PathBuf};

use jed_check::{Accepted, Verdict};
use serde::Serialize;

use crate::error::{Rejection, ScanError};

/// A file that may be uploaded.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[non_exhaustive]
pub struct AcceptedFile {
    pub file: PathBuf,
    pub name: String,
    /// `true` when the name is an exempt web asset and the content was not scanned.
    pub exempt: bool,
    /// Width of the fuse-table address, for scanned fuse maps.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_digits: Option<usize>,
}

/// Verdict for a single file, tied to where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileVerdict {
    Accepted(AcceptedFile),
    Rejected(Rejection),
}

impl FileVerdict {
    #[must_use]
    pub fn from_verdict(file: &Path, name: &str, verdict: &Verdict) -> Self {
        match verdict {
            Ok(accepted) => {
                let address_digits = match accepted {
                    Accepted::Exempt => None,
                    Accepted::Checked(summary) => Some(summary.address_digits),
                };
                Self::Accepted(AcceptedFile {
                    file: file.to_owned(),
                    name: name.to_owned(),
                    exempt: address_digits.is_none(),
                    address_digits,
                })
            }
            Err(err) => Self::Rejected(Rejection::new(file, name, err)),
        }
    }

    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted(_))
    }

    /// Line for the status reporter: empty reason on success, the status
    /// sentence on failure.
    #[must_use]
    pub fn status_line(&self) -> String {
        match self {
            Self::Accepted(accepted) if accepted.exempt => {
                format!("{} is exempt from checks", accepted.name)
            }
            Self::Accepted(accepted) => format!("{} passed file check", accepted.name),
            Self::Rejected(rejection) => rejection.status.clone(),
        }
    }
}

/// Result of a validation run.
///
/// Callers must check both `rejections` and `scan_errors`. A non-empty
/// `scan_errors` means some files were never checked.
#[derive(Debug, Clone, Default, Serialize)]
#[non_exhaustive]
pub struct ValidationReport {
    /// Number of files read and checked.
    pub scanned_files: usize,
    /// Number of files that could not be read.
    pub failed_files: usize,
    /// Whether every scanned file was accepted AND no scan errors occurred.
    pub ok: bool,
    pub accepted: Vec<AcceptedFile>,
    pub rejections: Vec<Rejection>,
    pub scan_errors: Vec<ScanError>,
}

impl ValidationReport {
    /// Total number of files attempted (scanned + failed).
    #[must_use]
    pub fn files_attempted(&self) -> usize {
        self.scanned_files + self.failed_files
    }

    /// Number of rejected files.
    #[must_use]
    pub fn rejections_count(&self) -> usize {
        self.rejections.len()
    }
}
