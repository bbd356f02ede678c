//! tola-rev - Fingerprint, minify and copy static assets, then write a manifest.

mod cli;
mod config;
mod logger;
mod revision;
mod utils;

use std::io::{IsTerminal, stdout};

use anyhow::{Context, Result};
use clap::{ColorChoice, Parser};
use cli::Cli;
use config::RevisionConfig;
use revision::{MinifierRegistry, RevisionContext, RevisionReport, WalkScanner};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set global color override based on CLI option
    match cli.color {
        ColorChoice::Always => owo_colors::set_override(true),
        ColorChoice::Never => owo_colors::set_override(false),
        ColorChoice::Auto => {} // owo-colors auto-detects TTY
    }
    logger::set_verbose(cli.verbose);

    let config = RevisionConfig::load(&cli)?;
    if let Some(path) = &config.config_path {
        debug!("config"; "loaded {}", path.display());
    }
    if cli.dry_run {
        log!("rev"; "dry run, nothing will be written");
    }

    let scanner = WalkScanner {
        include_hidden: config.include_hidden,
    };
    let minifiers = MinifierRegistry::default();
    let ctx = RevisionContext {
        scanner: &scanner,
        minifiers: &minifiers,
        dry_run: cli.dry_run,
        verbose: cli.verbose,
        show_progress: !cli.verbose && stdout().is_terminal(),
    };

    let report = revision::run(&ctx, &config.request)
        .with_context(|| format!("failed to revision {}", config.request.source.display()))?;

    print_report(&report);
    Ok(())
}

fn print_report(report: &RevisionReport) {
    for path in &report.written {
        debug!("done"; "wrote {}", path.display());
    }
    log!("done"; "{}", report);
}
