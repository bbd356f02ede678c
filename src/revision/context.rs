//! Host capabilities handed to the revision pipeline.

use std::path::{Path, PathBuf};

use jwalk::{Parallelism, WalkDir};

use super::error::{Result, RevisionError};
use super::minify::MinifierRegistry;
use crate::utils::path::expand_path;

/// Lists the files to revision under a directory.
pub trait FileScanner {
    /// Absolute paths of all files under `root`, in a stable order.
    fn scan(&self, root: &Path) -> Result<Vec<PathBuf>>;
}

/// Sorted recursive directory walk.
///
/// Dot files and dot directories are skipped unless `include_hidden` is set.
/// Symlinks are not followed.
#[derive(Debug, Clone, Copy, Default)]
pub struct WalkScanner {
    pub include_hidden: bool,
}

impl FileScanner for WalkScanner {
    fn scan(&self, root: &Path) -> Result<Vec<PathBuf>> {
        let walker = WalkDir::new(root)
            .sort(true)
            .skip_hidden(!self.include_hidden)
            .parallelism(Parallelism::Serial);

        let mut files = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| {
                RevisionError::read(root, std::io::Error::other(e.to_string()))
            })?;
            if entry.file_type().is_file() {
                files.push(entry.path());
            }
        }
        Ok(files)
    }
}

/// Everything the pipeline needs from its host.
pub struct RevisionContext<'a> {
    pub scanner: &'a dyn FileScanner,
    pub minifiers: &'a MinifierRegistry,
    /// Compute everything, write nothing.
    pub dry_run: bool,
    /// Print options and one line per file.
    pub verbose: bool,
    /// Show a single-line progress counter.
    pub show_progress: bool,
}

/// Resolve `path` to an absolute, existing directory.
///
/// `role` names the directory in the error message.
pub fn validate_dir(path: &Path, role: &str) -> Result<PathBuf> {
    if path.as_os_str().is_empty() {
        return Err(RevisionError::Configuration(format!("{role} path is empty")));
    }
    let resolved = expand_path(path);
    if !resolved.is_dir() {
        return Err(RevisionError::Configuration(format!(
            "{role} `{}` is not a directory",
            resolved.display()
        )));
    }
    Ok(resolved)
}
