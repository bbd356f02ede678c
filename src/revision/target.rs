//! Source file records and revisioned destination paths.
//!
//! ```text
//! source root:  /site/assets
//! source file:  /site/assets/js/app.js
//! destination:  /site/public/build/js/app.<fingerprint>.min.js
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use super::error::{Result, RevisionError};
use super::minify::should_minify;
use crate::utils::path::relative_slash_path;

/// One scanned file and everything derived from it.
#[derive(Debug, Clone)]
pub struct SourceFile {
    /// Absolute source path.
    pub path: PathBuf,
    /// Last extension, without the dot.
    pub extension: Option<String>,
    pub minify: bool,
    /// Absolute revisioned destination path.
    pub destination: PathBuf,
}

impl SourceFile {
    /// Build the record for `path`, found under `source_root`.
    pub fn new(
        path: &Path,
        source_root: &Path,
        destination_root: &Path,
        fingerprint: &str,
        minify_enabled: bool,
    ) -> Self {
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned());
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();

        let relative_dir = path
            .parent()
            .map(|dir| relative_slash_path(dir, source_root))
            .unwrap_or_default();

        let minify = extension
            .as_deref()
            .is_some_and(|ext| should_minify(ext, &file_name, minify_enabled));

        let name = revisioned_name(&stem, fingerprint, minify, extension.as_deref());
        let mut destination = destination_root.to_path_buf();
        if !relative_dir.is_empty() {
            destination.extend(relative_dir.split('/'));
        }
        destination.push(name);

        Self {
            path: path.to_path_buf(),
            extension,
            minify,
            destination,
        }
    }
}

/// `stem.fingerprint.[min.]ext`
pub fn revisioned_name(
    stem: &str,
    fingerprint: &str,
    minify: bool,
    extension: Option<&str>,
) -> String {
    let min = if minify { ".min" } else { "" };
    match extension {
        Some(ext) => format!("{stem}.{fingerprint}{min}.{ext}"),
        None => format!("{stem}.{fingerprint}{min}"),
    }
}

/// Create `dir` and any missing parents with the permission bits of `template`.
///
/// On non-Unix platforms the directories get default permissions.
pub fn create_dir_like(dir: &Path, template: &Path) -> Result<()> {
    if dir.is_dir() {
        return Ok(());
    }

    #[cfg(unix)]
    {
        use std::os::unix::fs::{DirBuilderExt, PermissionsExt};

        let mode = fs::metadata(template)
            .map_err(|e| RevisionError::read(template, e))?
            .permissions()
            .mode();
        fs::DirBuilder::new()
            .recursive(true)
            .mode(mode & 0o7777)
            .create(dir)
            .map_err(|e| RevisionError::write(dir, e))
    }

    #[cfg(not(unix))]
    {
        let _ = template;
        fs::create_dir_all(dir).map_err(|e| RevisionError::write(dir, e))
    }
}
