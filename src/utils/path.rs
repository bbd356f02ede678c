//! Path normalization utilities.
//!
//! - `normalize_path` - absolute form (canonicalize + fallback)
//! - `expand_path` - `~` expansion, then normalization
//! - `relative_slash_path` - lexical root stripping with `/` separators

use std::path::{Component, Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Expand a leading `~` and normalize.
pub fn expand_path(path: &Path) -> PathBuf {
    let expanded = shellexpand::tilde(&path.to_string_lossy()).into_owned();
    normalize_path(Path::new(&expanded))
}

/// Path of `path` relative to `root`, joined with `/`.
///
/// The prefix is removed lexically, without resolving symlinks or `..`:
/// two spellings of the same directory do not match. Returns an empty
/// string for `root` itself, and the whole path when it is not under `root`.
pub fn relative_slash_path(path: &Path, root: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let mut out = String::new();
    for component in relative.components() {
        let part = match component {
            Component::RootDir => {
                out.push('/');
                continue;
            }
            Component::Prefix(prefix) => prefix.as_os_str().to_string_lossy(),
            Component::CurDir => ".".into(),
            Component::ParentDir => "..".into(),
            Component::Normal(name) => name.to_string_lossy(),
        };
        if !out.is_empty() && !out.ends_with('/') {
            out.push('/');
        }
        out.push_str(&part);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_path_absolute() {
        let normalized = normalize_path(Path::new("/absolute/path/file.txt"));
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_normalize_path_relative() {
        let normalized = normalize_path(Path::new("relative/path/file.txt"));
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_expand_path_tilde() {
        if std::env::var_os("HOME").is_none() {
            return;
        }
        let expanded = expand_path(Path::new("~/assets"));
        assert!(expanded.is_absolute());
        assert!(!expanded.to_string_lossy().contains('~'));
    }

    #[test]
    fn test_relative_slash_path() {
        let root = Path::new("/site/assets");
        assert_eq!(relative_slash_path(Path::new("/site/assets/a.css"), root), "a.css");
        assert_eq!(
            relative_slash_path(Path::new("/site/assets/sub/deep/b.js"), root),
            "sub/deep/b.js"
        );
        assert_eq!(relative_slash_path(root, root), "");
    }

    #[test]
    fn test_relative_slash_path_outside_root() {
        let root = Path::new("/site/assets");
        assert_eq!(
            relative_slash_path(Path::new("/other/x.css"), root),
            "/other/x.css"
        );
        // Lexical only: `..` is kept, not resolved
        assert_eq!(
            relative_slash_path(Path::new("/site/assets/../assets/a.css"), root),
            "../assets/a.css"
        );
        // Sibling directory sharing a name prefix is not under root
        assert_eq!(
            relative_slash_path(Path::new("/site/assets2/a.css"), root),
            "/site/assets2/a.css"
        );
    }
}
