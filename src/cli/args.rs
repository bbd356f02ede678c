//! Command-line interface definitions.

use clap::{ColorChoice, Parser};
use std::path::PathBuf;

/// Revision static assets: fingerprint, minify, copy and record them in a manifest
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Directory of assets to revision
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub source: PathBuf,

    /// Directory receiving the revisioned files
    #[arg(value_hint = clap::ValueHint::DirPath)]
    pub destination: Option<PathBuf>,

    /// JSON manifest output path
    #[arg(value_hint = clap::ValueHint::FilePath)]
    pub manifest: Option<PathBuf>,

    /// Options as a query string, e.g. `hash=md5&hash_length=8&minify`
    #[arg(value_name = "OPTIONS")]
    pub options: Option<String>,

    /// Config file with a `[revision]` table (default: rev.toml, if present)
    #[arg(short = 'C', long, value_hint = clap::ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    /// Directory for the PHP manifest (default: config)
    #[arg(long, value_hint = clap::ValueHint::DirPath)]
    pub config_dir: Option<PathBuf>,

    /// Compute fingerprints and the manifest without writing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// Include dot files and dot directories in the scan
    #[arg(long)]
    pub hidden: bool,

    /// Enable verbose output
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Control colored output (auto, always, never)
    #[arg(long, default_value = "auto")]
    pub color: ColorChoice,
}
