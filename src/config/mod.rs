//! Run configuration for `tola-rev`.
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── error      # ConfigError
//! ├── options    # RevisionOptions (query string + [revision] table)
//! └── mod.rs     # RevisionConfig (this file)
//! ```
//!
//! # Precedence
//!
//! Later layers win:
//!
//! | Layer              | Source                                       |
//! |--------------------|----------------------------------------------|
//! | defaults           | `RevisionOptions::default()`                 |
//! | config file        | `[revision]` table of `rev.toml` / `-C FILE` |
//! | option string      | fourth positional, `hash=md5&minify`         |
//! | CLI flags          | `--config-dir`, `--hidden`                   |
//!
//! ```toml
//! [revision]
//! destination = "public/build"
//! manifest = "public/build/rev-manifest.json"
//! hash = "md5"
//! hash_length = 8
//! minify = true
//! ```

mod error;
mod options;

pub use error::ConfigError;
pub use options::{RevisionOptions, RevisionSection};

use crate::{cli::Cli, debug, log, revision::RevisionRequest, revision::RevisionError};
use anyhow::{Context, Result};
use owo_colors::OwoColorize;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};

/// Config file looked up in the working directory when `-C` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "rev.toml";

/// PHP manifest directory when neither the file nor the CLI names one.
pub const DEFAULT_CONFIG_DIR: &str = "config";

/// Root of a config file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub revision: RevisionSection,
}

impl FileConfig {
    /// Parse TOML content, collecting any unknown fields.
    pub fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Load a config file, warning about unknown fields.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }
}

fn print_unknown_fields_warning(fields: &[String], path: &Path) {
    let display_path = path
        .file_name()
        .map(|n| n.to_string_lossy())
        .unwrap_or_else(|| path.to_string_lossy());

    log!("warning"; "unknown fields in {}, ignored:", display_path);
    for field in fields {
        log!("warning"; "  {}", field.yellow());
    }
}

/// Everything `main` needs for one run.
#[derive(Debug, Clone)]
pub struct RevisionConfig {
    pub request: RevisionRequest,
    pub include_hidden: bool,
    /// Config file that was loaded, if any.
    pub config_path: Option<PathBuf>,
}

impl RevisionConfig {
    /// Layer defaults, config file, option string and CLI flags.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = resolve_config_path(cli)?;
        let file = match &config_path {
            Some(path) => FileConfig::from_path(path)
                .with_context(|| format!("failed to load {}", path.display()))?,
            None => FileConfig::default(),
        };
        let base = config_path
            .as_deref()
            .and_then(Path::parent)
            .map(Path::to_path_buf)
            .unwrap_or_default();

        Self::from_layers(cli, file.revision, &base, config_path)
    }

    /// Merge an already-parsed `[revision]` table with the CLI.
    ///
    /// Relative paths from the file resolve against `base`.
    fn from_layers(
        cli: &Cli,
        section: RevisionSection,
        base: &Path,
        config_path: Option<PathBuf>,
    ) -> Result<Self> {
        let mut options = RevisionOptions::default();
        options.apply_section(&section)?;

        if let Some(query) = &cli.options {
            let unknown = options.apply_query(query)?;
            for key in unknown {
                debug!("config"; "ignoring unknown option `{}`", key);
            }
        }

        let from_file = |path: Option<PathBuf>| path.map(|p| base.join(p));

        let destination = cli
            .destination
            .clone()
            .or_else(|| from_file(section.destination.clone()))
            .ok_or_else(|| RevisionError::Configuration("no destination directory given".into()))?;
        let manifest = cli
            .manifest
            .clone()
            .or_else(|| from_file(section.manifest.clone()))
            .ok_or_else(|| RevisionError::Configuration("no manifest path given".into()))?;
        let config_dir = cli
            .config_dir
            .clone()
            .or_else(|| from_file(section.config_dir.clone()))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_DIR));

        let request =
            RevisionRequest::new(&cli.source, &destination, &manifest, &config_dir, options)?;

        Ok(Self {
            request,
            include_hidden: cli.hidden || section.hidden.unwrap_or(false),
            config_path,
        })
    }
}

/// An explicit `-C` must exist; the default file is optional.
fn resolve_config_path(cli: &Cli) -> Result<Option<PathBuf>> {
    match &cli.config {
        Some(path) => {
            let path = crate::utils::path::expand_path(path);
            if !path.is_file() {
                anyhow::bail!("config file '{}' not found", path.display());
            }
            Ok(Some(path))
        }
        None => {
            let path = PathBuf::from(DEFAULT_CONFIG_FILE);
            Ok(path.is_file().then(|| crate::utils::path::normalize_path(&path)))
        }
    }
}
