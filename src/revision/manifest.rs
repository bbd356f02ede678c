//! Revision manifest: original path → revisioned path.
//!
//! ```json
//! {
//!     "css/app.css": "css/app.3f2a9c1e.min.css",
//!     "img/logo.png": "img/logo.77be0d12.png"
//! }
//! ```
//!
//! Entries keep scan order (`serde_json` is built with `preserve_order`).

use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value};
use serde_json::ser::{PrettyFormatter, Serializer};

use crate::utils::path::relative_slash_path;

const JSON_INDENT: &[u8] = b"    ";

/// Ordered manifest of revisioned files.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    entries: Map<String, Value>,
}

impl Manifest {
    /// Record a revisioned file.
    ///
    /// Both paths are made relative to their roots. Recording the same
    /// source twice overwrites the value in place.
    pub fn record(
        &mut self,
        original: &Path,
        revisioned: &Path,
        source_root: &Path,
        destination_root: &Path,
    ) {
        let key = relative_slash_path(original, source_root);
        let value = relative_slash_path(revisioned, destination_root);
        self.insert(key, value);
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), Value::String(value.into()));
    }

    #[cfg(test)]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).and_then(Value::as_str)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str().unwrap_or_default()))
    }

    /// Pretty JSON with 4-space indentation. Slashes are not escaped.
    pub fn to_json(&self) -> String {
        let mut buf = Vec::new();
        let formatter = PrettyFormatter::with_indent(JSON_INDENT);
        let mut ser = Serializer::with_formatter(&mut buf, formatter);
        // Serializing a map of strings into a Vec cannot fail
        if self.entries.serialize(&mut ser).is_err() {
            return String::from("{}");
        }
        String::from_utf8(buf).unwrap_or_default()
    }

    /// PHP source returning (or assigning) the manifest as an array literal.
    pub fn to_php(&self, variable: Option<&str>) -> String {
        let mut out = String::from("<?php\n\n");
        match variable {
            Some(name) => {
                out.push('$');
                out.push_str(name.trim_start_matches('$'));
                out.push_str(" = [\n");
            }
            None => out.push_str("return [\n"),
        }
        for (key, value) in self.iter() {
            out.push_str(&format!(
                "    \"{}\" => \"{}\",\n",
                php_escape(key),
                php_escape(value)
            ));
        }
        out.push_str("];\n");
        out
    }
}

/// Location of the PHP manifest: `<config_dir>/<manifest name without .json>.php`.
pub fn php_manifest_path(manifest_file: &Path, config_dir: &Path) -> PathBuf {
    let name = manifest_file
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let stem = name.strip_suffix(".json").unwrap_or(&name);
    config_dir.join(format!("{stem}.php"))
}

/// Escape for a double-quoted PHP string.
fn php_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' | '"' | '$' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out
}
