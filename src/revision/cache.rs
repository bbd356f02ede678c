//! Content-addressed cache of minified output.
//!
//! Entries live in a hidden directory beside the source root:
//!
//! ```text
//! assets/                          ← source root
//! .elixir-revision-cache/
//!     <sha256(path)>.<sha256(content)>
//! ```
//!
//! The path hash identifies *which* file, the content hash identifies *which
//! version*. After every cached minify only the current version of a file is
//! kept. Runs are assumed to have exclusive use of the directory: two
//! concurrent runs over the same source tree can race on pruning.

use std::fs;
use std::path::{Path, PathBuf};

use super::error::{Result, RevisionError};
use super::fingerprint::{HashAlgorithm, sha256_file};
use super::minify::Minifier;

/// Cache directory name, created next to the source root.
pub const CACHE_DIR_NAME: &str = ".elixir-revision-cache";

/// Name of a cache entry: `<path hash>.<content hash>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheKey {
    pub path_hash: String,
    pub content_hash: String,
}

impl CacheKey {
    /// Derive the key for `source` from its absolute path and current content.
    pub fn for_source(source: &Path) -> Result<Self> {
        let path_hash =
            HashAlgorithm::Sha256.hex_digest(source.to_string_lossy().as_bytes());
        let content_hash = sha256_file(source)?;
        Ok(Self {
            path_hash,
            content_hash,
        })
    }

    pub fn file_name(&self) -> String {
        format!("{}.{}", self.path_hash, self.content_hash)
    }

    /// Prefix shared by every entry of the same source file.
    pub fn identity_prefix(&self) -> String {
        format!("{}.", self.path_hash)
    }
}

/// Outcome of a cached minify.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheLookup {
    Hit,
    Miss,
}

/// On-disk minify cache.
#[derive(Debug, Clone)]
pub struct MinifyCache {
    dir: PathBuf,
}

impl MinifyCache {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Cache located beside `source_root`.
    pub fn beside(source_root: &Path) -> Self {
        let parent = source_root
            .parent()
            .map_or_else(|| source_root.join(".."), Path::to_path_buf);
        Self::new(parent.join(CACHE_DIR_NAME))
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn entry_path(&self, key: &CacheKey) -> PathBuf {
        self.dir.join(key.file_name())
    }

    /// Create the cache directory if missing.
    pub fn ensure_dir(&self) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(|e| RevisionError::write(&self.dir, e))
    }

    /// Minify `source` into `destination` through the cache.
    ///
    /// The minifier only runs when no entry exists for the current content.
    /// It writes a `.partial` sibling that is renamed into place once
    /// complete, so an interrupted minify never leaves a readable entry.
    /// Older entries of the same source file (and stale partials) are
    /// removed afterwards.
    pub fn minify(
        &self,
        source: &Path,
        destination: &Path,
        minifier: &dyn Minifier,
    ) -> Result<CacheLookup> {
        let key = CacheKey::for_source(source)?;
        let entry = self.entry_path(&key);

        let lookup = if entry.is_file() {
            CacheLookup::Hit
        } else {
            let partial = self.dir.join(format!("{}.partial", key.file_name()));
            if let Err(err) = minifier.minify(source, &partial) {
                fs::remove_file(&partial).ok();
                return Err(err);
            }
            fs::rename(&partial, &entry).map_err(|e| RevisionError::write(&entry, e))?;
            CacheLookup::Miss
        };

        fs::copy(&entry, destination).map_err(|e| RevisionError::write(destination, e))?;
        self.prune(&key)?;

        Ok(lookup)
    }

    /// Remove every entry of `key`'s source file except `key` itself.
    ///
    /// Returns the number of removed entries.
    pub fn prune(&self, key: &CacheKey) -> Result<usize> {
        let keep = key.file_name();
        let mut removed = 0;
        for name in self.entries_for(key)? {
            if name == keep {
                continue;
            }
            let path = self.dir.join(&name);
            fs::remove_file(&path).map_err(|e| RevisionError::write(&path, e))?;
            removed += 1;
        }
        Ok(removed)
    }

    /// Names of all entries sharing `key`'s path identity.
    pub fn entries_for(&self, key: &CacheKey) -> Result<Vec<String>> {
        let prefix = key.identity_prefix();
        let entries = fs::read_dir(&self.dir).map_err(|e| RevisionError::read(&self.dir, e))?;

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| RevisionError::read(&self.dir, e))?;
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with(&prefix) {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}
