//! Revision option set.
//!
//! Options arrive as a query string (`hash=md5&hash_length=8&minify`) and
//! may be pre-seeded from the `[revision]` table of a config file:
//!
//! | key            | value                                        |
//! |----------------|----------------------------------------------|
//! | `hash`         | `sha256` (default), `sha224`, `sha384`, `sha512`, `md5`, `blake3`, `mtime` |
//! | `hash_length`  | leading characters to keep                   |
//! | `minify`       | flag: minify `.css` / `.js`                  |
//! | `minify_cache` | `0`/`false`/`no`/`off` disables the cache    |
//! | `php_manifest` | flag: also write a PHP manifest              |
//! | `php_variable` | assign the PHP array instead of returning it |

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::revision::{HashMethod, RevisionError};

/// Parsed revision options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RevisionOptions {
    pub hash: HashMethod,
    pub hash_length: Option<usize>,
    pub minify: bool,
    /// On unless explicitly disabled.
    pub minify_cache: bool,
    pub php_manifest: bool,
    pub php_variable: Option<String>,
}

impl Default for RevisionOptions {
    fn default() -> Self {
        Self {
            hash: HashMethod::default(),
            hash_length: None,
            minify: false,
            minify_cache: true,
            php_manifest: false,
            php_variable: None,
        }
    }
}

impl RevisionOptions {
    /// Parse a query string on top of the defaults.
    #[cfg(test)]
    pub fn parse(query: &str) -> Result<Self, RevisionError> {
        let mut options = Self::default();
        options.apply_query(query)?;
        Ok(options)
    }

    /// Apply a query string. Later keys win; unknown keys are returned.
    pub fn apply_query(&mut self, query: &str) -> Result<Vec<String>, RevisionError> {
        let query = query.trim_start_matches('?');
        let mut unknown = Vec::new();

        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                "hash" => self.hash = value.parse()?,
                "hash_length" => self.hash_length = Some(parse_length(&value)?),
                "minify" => self.minify = true,
                "minify_cache" => self.minify_cache = !is_explicit_false(&value),
                "php_manifest" => self.php_manifest = true,
                "php_variable" => {
                    self.php_variable = Some(value.into_owned()).filter(|v| !v.is_empty())
                }
                "" => {}
                other => unknown.push(other.to_string()),
            }
        }

        Ok(unknown)
    }

    /// Apply the `[revision]` table of a config file.
    pub fn apply_section(&mut self, section: &RevisionSection) -> Result<(), RevisionError> {
        if let Some(hash) = &section.hash {
            self.hash = hash.parse()?;
        }
        if section.hash_length.is_some() {
            self.hash_length = section.hash_length;
        }
        if let Some(minify) = section.minify {
            self.minify = minify;
        }
        if let Some(minify_cache) = section.minify_cache {
            self.minify_cache = minify_cache;
        }
        if let Some(php_manifest) = section.php_manifest {
            self.php_manifest = php_manifest;
        }
        if section.php_variable.is_some() {
            self.php_variable.clone_from(&section.php_variable);
        }
        Ok(())
    }
}

/// `[revision]` table of a config file.
///
/// Kept flat: unknown-key detection does not see through flattened fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RevisionSection {
    pub destination: Option<PathBuf>,
    pub manifest: Option<PathBuf>,
    pub config_dir: Option<PathBuf>,
    pub hidden: Option<bool>,
    pub hash: Option<String>,
    pub hash_length: Option<usize>,
    pub minify: Option<bool>,
    pub minify_cache: Option<bool>,
    pub php_manifest: Option<bool>,
    pub php_variable: Option<String>,
}

fn parse_length(value: &str) -> Result<usize, RevisionError> {
    value.trim().parse().map_err(|_| {
        RevisionError::Configuration(format!(
            "hash_length must be a non-negative integer, got `{value}`"
        ))
    })
}

/// Empty or a falsy word.
fn is_explicit_false(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "" | "0" | "false" | "no" | "off"
    )
}
