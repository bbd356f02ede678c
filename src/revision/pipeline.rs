//! The revision pass: scan → fingerprint → minify or copy → record.
//!
//! ```text
//! assets/css/app.css ──fingerprint──▶ 3f2a9c1e
//!        │                              │
//!        ├─ minify? ─▶ MinifyCache ─────┤
//!        └─ copy ───────────────────────┤
//!                                       ▼
//!                 public/css/app.3f2a9c1e.min.css
//!                 manifest["css/app.css"] = "css/app.3f2a9c1e.min.css"
//! ```
//!
//! Files are processed one at a time in scan order. The first error aborts
//! the run and nothing is written to the manifest paths.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use crate::config::RevisionOptions;
use crate::log;
use crate::logger::ProgressLine;
use crate::utils::path::{normalize_path, relative_slash_path};

use super::cache::{CacheLookup, MinifyCache};
use super::context::{RevisionContext, validate_dir};
use super::error::{Result, RevisionError};
use super::fingerprint::fingerprint;
use super::manifest::{Manifest, php_manifest_path};
use super::target::{SourceFile, create_dir_like};

/// Resolved inputs of one run.
#[derive(Debug, Clone)]
pub struct RevisionRequest {
    /// Absolute source root.
    pub source: PathBuf,
    /// Absolute destination root.
    pub destination: PathBuf,
    /// JSON manifest path.
    pub manifest: PathBuf,
    /// Directory receiving the PHP manifest.
    pub config_dir: PathBuf,
    pub options: RevisionOptions,
}

impl RevisionRequest {
    /// Validate the directories and build a request.
    ///
    /// Source and destination must be existing directories.
    pub fn new(
        source: &Path,
        destination: &Path,
        manifest: &Path,
        config_dir: &Path,
        options: RevisionOptions,
    ) -> Result<Self> {
        let source = validate_dir(source, "source")?;
        let destination = validate_dir(destination, "destination")?;
        if manifest.as_os_str().is_empty() {
            return Err(RevisionError::Configuration("manifest path is empty".into()));
        }

        Ok(Self {
            source,
            destination,
            manifest: normalize_path(manifest),
            config_dir: normalize_path(config_dir),
            options,
        })
    }
}

/// What a run produced.
#[derive(Debug, Clone, Default)]
pub struct RevisionReport {
    pub manifest: Manifest,
    pub files: usize,
    pub minified: usize,
    pub cache_hits: usize,
    /// Manifest files written (empty for dry runs).
    pub written: Vec<PathBuf>,
}

impl fmt::Display for RevisionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = |n: usize| if n == 1 { "" } else { "s" };
        write!(f, "revisioned {} file{}", self.files, s(self.files))?;
        if self.minified > 0 {
            write!(f, ", minified {}", self.minified)?;
            if self.cache_hits > 0 {
                write!(f, " ({} from cache)", self.cache_hits)?;
            }
        }
        Ok(())
    }
}

/// Run the revision pass described by `request`.
pub fn run(ctx: &RevisionContext<'_>, request: &RevisionRequest) -> Result<RevisionReport> {
    let options = &request.options;

    log!("rev"; "revisioning files in {}", request.source.display());
    log!("rev"; "copying them to {}", request.destination.display());
    log!("rev"; "recording them in {}", request.manifest.display());
    if ctx.verbose {
        echo_options(options);
    }

    let cache = options
        .minify_cache
        .then(|| MinifyCache::beside(&request.source));
    if let Some(cache) = &cache {
        if ctx.verbose {
            log!("rev"; "minify cache in {}", cache.dir().display());
        }
        if !ctx.dry_run {
            cache.ensure_dir()?;
        }
    }

    let paths = ctx.scanner.scan(&request.source)?;
    let progress = ctx
        .show_progress
        .then(|| ProgressLine::new("files", paths.len()));

    let mut report = RevisionReport::default();
    for path in &paths {
        let file = revision_file(ctx, request, cache.as_ref(), path, &mut report)?;

        report.manifest.record(
            &file.path,
            &file.destination,
            &request.source,
            &request.destination,
        );
        report.files += 1;

        if ctx.verbose {
            log!("rev"; "{} -> {}",
                relative_slash_path(&file.path, &request.source),
                relative_slash_path(&file.destination, &request.destination));
        }
        if let Some(progress) = &progress {
            progress.inc();
        }
    }
    if let Some(progress) = progress {
        progress.finish();
    }

    if !ctx.dry_run {
        write_manifests(request, &mut report)?;
    }

    Ok(report)
}

/// Fingerprint one file and, unless dry-running, write its revisioned copy.
fn revision_file(
    ctx: &RevisionContext<'_>,
    request: &RevisionRequest,
    cache: Option<&MinifyCache>,
    path: &Path,
    report: &mut RevisionReport,
) -> Result<SourceFile> {
    let options = &request.options;
    let hash = fingerprint(path, options.hash, options.hash_length)?;
    let file = SourceFile::new(
        path,
        &request.source,
        &request.destination,
        &hash,
        options.minify,
    );

    let minifier = match (&file.extension, file.minify) {
        (Some(ext), true) => Some(ctx.minifiers.get(ext)?),
        _ => None,
    };
    if minifier.is_some() {
        report.minified += 1;
    }

    if ctx.dry_run {
        return Ok(file);
    }

    if let Some(parent) = file.destination.parent() {
        create_dir_like(parent, &request.destination)?;
    }

    match (minifier, cache) {
        (Some(minifier), Some(cache)) => {
            if cache.minify(&file.path, &file.destination, minifier)? == CacheLookup::Hit {
                report.cache_hits += 1;
            }
        }
        (Some(minifier), None) => minifier.minify(&file.path, &file.destination)?,
        (None, _) => {
            fs::copy(&file.path, &file.destination)
                .map_err(|e| RevisionError::write(&file.destination, e))?;
        }
    }

    Ok(file)
}

fn write_manifests(request: &RevisionRequest, report: &mut RevisionReport) -> Result<()> {
    write_file(&request.manifest, &report.manifest.to_json())?;
    report.written.push(request.manifest.clone());

    if request.options.php_manifest {
        let php_path = php_manifest_path(&request.manifest, &request.config_dir);
        let php = report
            .manifest
            .to_php(request.options.php_variable.as_deref());
        write_file(&php_path, &php)?;
        report.written.push(php_path);
    }
    Ok(())
}

fn write_file(path: &Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| RevisionError::write(parent, e))?;
    }
    fs::write(path, content).map_err(|e| RevisionError::write(path, e))
}

fn echo_options(options: &RevisionOptions) {
    if options.minify {
        log!("rev"; "minification is enabled");
        if !options.minify_cache {
            log!("rev"; "minify cache is disabled");
        }
    }
    log!("rev"; "hash set to {}", options.hash);
    if let Some(len) = options.hash_length {
        log!("rev"; "hash reduced to {} characters", len);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::revision::cache::tests::CountingMinifier;
    use crate::revision::context::WalkScanner;
    use crate::revision::fingerprint::HashAlgorithm;
    use crate::revision::minify::MinifierRegistry;
    use tempfile::TempDir;

    const SHA256_A: &str = "ca978112ca1bbdcafac231b39a23dc4da786eff8147c4e72b9807785afee48bb";
    const SHA256_B: &str = "3e23e8160039594a33894f6564e1b1348bbd7a0088d42c4acb73eeaed59c009d";

    struct Site {
        _dir: TempDir,
        root: PathBuf,
        source: PathBuf,
        destination: PathBuf,
        manifest: PathBuf,
    }

    impl Site {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            let root = dir.path().canonicalize().unwrap().join("site");
            let source = root.join("assets");
            let destination = root.join("public/build");
            fs::create_dir_all(source.join("sub")).unwrap();
            fs::create_dir_all(&destination).unwrap();
            fs::write(source.join("a.css"), "a").unwrap();
            fs::write(source.join("sub/b.js"), "b").unwrap();
            let manifest = destination.join("rev-manifest.json");
            Self {
                _dir: dir,
                root,
                source,
                destination,
                manifest,
            }
        }

        fn request(&self, query: &str) -> RevisionRequest {
            RevisionRequest::new(
                &self.source,
                &self.destination,
                &self.manifest,
                &self.root.join("config"),
                RevisionOptions::parse(query).unwrap(),
            )
            .unwrap()
        }

        fn cache_dir(&self) -> PathBuf {
            self.root.join(".elixir-revision-cache")
        }
    }

    fn run_with(
        request: &RevisionRequest,
        registry: &MinifierRegistry,
        dry_run: bool,
    ) -> Result<RevisionReport> {
        let scanner = WalkScanner::default();
        let ctx = RevisionContext {
            scanner: &scanner,
            minifiers: registry,
            dry_run,
            verbose: false,
            show_progress: false,
        };
        run(&ctx, request)
    }

    fn counting_registry() -> (MinifierRegistry, CountingMinifier) {
        let minifier = CountingMinifier::default();
        let mut registry = MinifierRegistry::new();
        registry
            .register("css", minifier.clone())
            .register("js", minifier.clone());
        (registry, minifier)
    }

    #[test]
    fn test_manifest_without_minify() {
        let site = Site::new();
        let request = site.request("");
        let report = run_with(&request, &MinifierRegistry::default(), false).unwrap();

        assert_eq!(report.files, 2);
        assert_eq!(report.minified, 0);
        let keys: Vec<_> = report.manifest.iter().collect();
        assert_eq!(
            keys,
            [
                ("a.css", format!("a.{SHA256_A}.css").as_str()),
                ("sub/b.js", format!("sub/b.{SHA256_B}.js").as_str()),
            ]
        );

        let json = fs::read_to_string(&site.manifest).unwrap();
        assert_eq!(json, report.manifest.to_json());
        assert!(json.contains("\"sub/b.js\": \"sub/b."));

        let copied = site.destination.join(format!("sub/b.{SHA256_B}.js"));
        assert_eq!(fs::read_to_string(copied).unwrap(), "b");
        assert_eq!(report.written, [site.manifest.clone()]);
    }

    #[test]
    fn test_hash_length_and_algorithm() {
        let site = Site::new();
        let request = site.request("hash=md5&hash_length=6");
        let report = run_with(&request, &MinifierRegistry::default(), false).unwrap();

        let md5_a = HashAlgorithm::Md5.hex_digest(b"a");
        assert_eq!(
            report.manifest.get("a.css"),
            Some(format!("a.{}.css", &md5_a[..6]).as_str())
        );
        assert!(site.destination.join(format!("a.{}.css", &md5_a[..6])).is_file());
    }

    #[test]
    fn test_minify_uses_cache_across_runs() {
        let site = Site::new();
        let (registry, minifier) = counting_registry();
        let request = site.request("minify&hash_length=8");

        let first = run_with(&request, &registry, false).unwrap();
        assert_eq!(first.minified, 2);
        assert_eq!(first.cache_hits, 0);
        assert_eq!(
            first.manifest.get("a.css"),
            Some(format!("a.{}.min.css", &SHA256_A[..8]).as_str())
        );
        let minified = site.destination.join(format!("a.{}.min.css", &SHA256_A[..8]));
        assert_eq!(fs::read_to_string(minified).unwrap(), "A");

        let second = run_with(&request, &registry, false).unwrap();
        assert_eq!(second.cache_hits, 2);
        assert_eq!(minifier.calls.get(), 2);
        assert_eq!(fs::read_dir(site.cache_dir()).unwrap().count(), 2);
        assert_eq!(first.manifest, second.manifest);
    }

    #[test]
    fn test_content_change_prunes_cache() {
        let site = Site::new();
        let (registry, minifier) = counting_registry();
        let request = site.request("minify");

        run_with(&request, &registry, false).unwrap();
        fs::write(site.source.join("a.css"), "changed").unwrap();
        let report = run_with(&request, &registry, false).unwrap();

        assert_eq!(report.cache_hits, 1);
        assert_eq!(minifier.calls.get(), 3);
        assert_eq!(fs::read_dir(site.cache_dir()).unwrap().count(), 2);
    }

    #[test]
    fn test_minify_cache_disabled() {
        let site = Site::new();
        let (registry, minifier) = counting_registry();
        let request = site.request("minify&minify_cache=0");

        let report = run_with(&request, &registry, false).unwrap();
        run_with(&request, &registry, false).unwrap();

        assert_eq!(minifier.calls.get(), 4);
        assert!(!site.cache_dir().exists());
        // Bypassing the cache keeps the `min.` infix
        assert!(report.manifest.get("sub/b.js").unwrap().ends_with(".min.js"));
    }

    #[test]
    fn test_already_minified_is_copied() {
        let site = Site::new();
        fs::write(site.source.join("vendor.MIN.js"), "keep  me").unwrap();
        let (registry, minifier) = counting_registry();

        let report = run_with(&site.request("minify"), &registry, false).unwrap();
        assert_eq!(report.minified, 2);
        assert_eq!(minifier.calls.get(), 2);
        let revisioned = report.manifest.get("vendor.MIN.js").unwrap();
        assert!(!revisioned.contains(".min."));
        assert_eq!(
            fs::read_to_string(site.destination.join(revisioned)).unwrap(),
            "keep  me"
        );
    }

    #[test]
    fn test_dry_run_writes_nothing() {
        let site = Site::new();
        let (registry, minifier) = counting_registry();
        let request = site.request("minify&php_manifest");

        let dry = run_with(&request, &registry, true).unwrap();
        assert_eq!(fs::read_dir(&site.destination).unwrap().count(), 0);
        assert!(!site.cache_dir().exists());
        assert!(!site.root.join("config").exists());
        assert_eq!(minifier.calls.get(), 0);
        assert!(dry.written.is_empty());

        let real = run_with(&request, &registry, false).unwrap();
        assert_eq!(dry.manifest.to_json(), real.manifest.to_json());
        assert_eq!(dry.manifest.to_php(None), real.manifest.to_php(None));
    }

    #[test]
    fn test_dry_run_still_reports_unknown_minifier() {
        let site = Site::new();
        let request = site.request("minify");
        let err = run_with(&request, &MinifierRegistry::new(), true).unwrap_err();
        assert!(matches!(err, RevisionError::UnsupportedMinifyExtension(_)));
    }

    #[test]
    fn test_php_manifest() {
        let site = Site::new();
        let request = site.request("php_manifest&hash_length=4");
        let report = run_with(&request, &MinifierRegistry::default(), false).unwrap();

        let php_path = site.root.join("config/rev-manifest.php");
        assert_eq!(report.written, [site.manifest.clone(), php_path.clone()]);
        let php = fs::read_to_string(php_path).unwrap();
        assert_eq!(
            php,
            format!(
                "<?php\n\nreturn [\n    \"a.css\" => \"a.{}.css\",\n    \"sub/b.js\" => \"sub/b.{}.js\",\n];\n",
                &SHA256_A[..4],
                &SHA256_B[..4]
            )
        );
    }

    #[test]
    fn test_minification_error_aborts_without_manifest() {
        let site = Site::new();
        fs::write(site.source.join("a.css"), "a { color: red }").unwrap();
        fs::write(site.source.join("sub/b.js"), "function (").unwrap();

        let request = site.request("minify");
        let err = run_with(&request, &MinifierRegistry::default(), false).unwrap_err();
        assert!(matches!(err, RevisionError::Minification { .. }));
        assert!(!site.manifest.exists());
    }

    #[cfg(unix)]
    #[test]
    fn test_new_directories_inherit_destination_mode() {
        use std::os::unix::fs::PermissionsExt;

        let site = Site::new();
        fs::set_permissions(&site.destination, fs::Permissions::from_mode(0o750)).unwrap();
        run_with(&site.request(""), &MinifierRegistry::default(), false).unwrap();

        let sub = fs::metadata(site.destination.join("sub")).unwrap();
        let mode = sub.permissions().mode() & 0o777;
        assert_eq!(mode & !0o750, 0);
    }

    #[test]
    fn test_request_validation() {
        let site = Site::new();
        let err = RevisionRequest::new(
            &site.root.join("missing"),
            &site.destination,
            &site.manifest,
            &site.root,
            RevisionOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RevisionError::Configuration(_)));

        let err = RevisionRequest::new(
            &site.source,
            &site.destination,
            Path::new(""),
            &site.root,
            RevisionOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, RevisionError::Configuration(_)));
    }

    #[test]
    fn test_verbose_run_matches_quiet_run() {
        let site = Site::new();
        let (registry, _minifier) = counting_registry();
        let request = site.request("minify&hash_length=8");
        let scanner = WalkScanner::default();
        let ctx = RevisionContext {
            scanner: &scanner,
            minifiers: &registry,
            dry_run: true,
            verbose: true,
            show_progress: false,
        };

        let verbose = run(&ctx, &request).unwrap();
        let quiet = run_with(&request, &registry, true).unwrap();
        assert_eq!(verbose.manifest, quiet.manifest);
        assert!(!site.cache_dir().exists());
    }

    #[test]
    fn test_report_display() {
        let report = RevisionReport {
            files: 3,
            minified: 2,
            cache_hits: 1,
            ..RevisionReport::default()
        };
        assert_eq!(report.to_string(), "revisioned 3 files, minified 2 (1 from cache)");
    }
}
