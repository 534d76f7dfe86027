//! Configuration for file intake.

use std::path::PathBuf;

/// Default per-file read limit. Fuse maps for the supported parts are a few
/// hundred kilobytes at most.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 1_048_576;

/// Filesystem intake options.
///
/// `paths` is required and must be non-empty. Explicit file paths are
/// always validated; directories contribute only `.jed` files and exempt
/// web assets.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct FsSourceConfig {
    /// Paths to validate (files or directories).
    pub paths: Vec<PathBuf>,
    /// Exclude patterns (glob format), matched against the full path and the
    /// file name.
    pub exclude: Vec<String>,
    /// Maximum file size in bytes (default: 1 MiB).
    pub max_file_size: u64,
    /// Whether to follow symbolic links while walking directories.
    ///
    /// **Defaults to `false`**. Even when enabled, files that resolve outside
    /// the scan root are reported, not read.
    pub follow_links: bool,
    /// Maximum directory traversal depth (default: 64).
    pub max_depth: usize,
    /// Maximum total number of files to validate (default: `100_000`).
    pub max_files: usize,
    /// Maximum total bytes to read across all files (default: 512 MB).
    pub max_total_bytes: u64,
}

impl Default for FsSourceConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            exclude: Vec::new(),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            follow_links: false,
            max_depth: 64,
            max_files: 100_000,
            max_total_bytes: 536_870_912,
        }
    }
}

impl FsSourceConfig {
    /// Config for the given paths with every other option at its default.
    #[must_use]
    pub fn for_paths(paths: Vec<PathBuf>) -> Self {
        Self {
            paths,
            ..Self::default()
        }
    }
}
