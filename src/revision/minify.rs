//! Minification capability for revisioned JS and CSS files.
//!
//! Minifiers are looked up by uppercased extension (`CSS`, `JS`) in a
//! [`MinifierRegistry`]. The default registry uses oxc for JavaScript and
//! lightningcss for CSS.

use std::fs;
use std::path::Path;

use lightningcss::stylesheet::{ParserOptions, PrinterOptions, StyleSheet};
use oxc::allocator::Allocator;
use oxc::codegen::{Codegen, CodegenOptions, CommentOptions};
use oxc::mangler::MangleOptions;
use oxc::minifier::{CompressOptions, Minifier as OxcMinifier, MinifierOptions};
use oxc::parser::Parser;
use oxc::span::SourceType;
use rustc_hash::FxHashMap;

use super::error::{Result, RevisionError};

/// Extensions eligible for minification.
pub const MINIFY_EXTENSIONS: [&str; 2] = ["css", "js"];

/// Whether a file should be minified.
///
/// The extension match is case-sensitive. Any `.min` in the file name,
/// in any case and at any position, marks the file as already minified.
pub fn should_minify(extension: &str, file_name: &str, enabled: bool) -> bool {
    enabled
        && MINIFY_EXTENSIONS.contains(&extension)
        && !file_name.to_ascii_lowercase().contains(".min")
}

/// Reads a source file and writes its minified form to a destination path.
pub trait Minifier {
    fn minify(&self, source: &Path, destination: &Path) -> Result<()>;
}

/// JavaScript minifier backed by oxc.
pub struct JsMinifier;

/// CSS minifier backed by lightningcss.
pub struct CssMinifier;

impl Minifier for JsMinifier {
    fn minify(&self, source: &Path, destination: &Path) -> Result<()> {
        let content = read_source(source)?;
        let minified = minify_js(&content).map_err(|msg| RevisionError::minify(source, msg))?;
        fs::write(destination, minified).map_err(|e| RevisionError::write(destination, e))
    }
}

impl Minifier for CssMinifier {
    fn minify(&self, source: &Path, destination: &Path) -> Result<()> {
        let content = read_source(source)?;
        let minified = minify_css(&content).map_err(|msg| RevisionError::minify(source, msg))?;
        fs::write(destination, minified).map_err(|e| RevisionError::write(destination, e))
    }
}

fn read_source(source: &Path) -> Result<String> {
    fs::read_to_string(source).map_err(|e| RevisionError::read(source, e))
}

/// Minify JavaScript source code.
pub fn minify_js(source: &str) -> Result<String, String> {
    let allocator = Allocator::default();
    let source_type = SourceType::mjs();
    let ret = Parser::new(&allocator, source, source_type).parse();
    if let Some(error) = ret.errors.first() {
        return Err(error.to_string());
    }
    let mut program = ret.program;
    let options = MinifierOptions {
        mangle: Some(MangleOptions::default()),
        compress: Some(CompressOptions::smallest()),
    };
    let ret = OxcMinifier::new(options).minify(&allocator, &mut program);
    let code = Codegen::new()
        .with_options(CodegenOptions {
            minify: true,
            comments: CommentOptions::disabled(),
            ..CodegenOptions::default()
        })
        .with_scoping(ret.scoping)
        .build(&program)
        .code;
    Ok(code)
}

/// Minify CSS source code.
pub fn minify_css(source: &str) -> Result<String, String> {
    let stylesheet =
        StyleSheet::parse(source, ParserOptions::default()).map_err(|e| e.to_string())?;
    let result = stylesheet
        .to_css(PrinterOptions {
            minify: true,
            ..PrinterOptions::default()
        })
        .map_err(|e| e.to_string())?;
    Ok(result.code)
}

/// Extension → minifier lookup table.
pub struct MinifierRegistry {
    minifiers: FxHashMap<String, Box<dyn Minifier>>,
}

impl MinifierRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self {
            minifiers: FxHashMap::default(),
        }
    }

    /// Register `minifier` for `extension` (case-insensitive).
    pub fn register(&mut self, extension: &str, minifier: impl Minifier + 'static) -> &mut Self {
        self.minifiers
            .insert(extension.to_ascii_uppercase(), Box::new(minifier));
        self
    }

    /// Resolve the minifier for `extension`.
    pub fn get(&self, extension: &str) -> Result<&dyn Minifier> {
        self.minifiers
            .get(&extension.to_ascii_uppercase())
            .map(|m| m.as_ref())
            .ok_or_else(|| RevisionError::UnsupportedMinifyExtension(extension.to_string()))
    }
}

impl Default for MinifierRegistry {
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register("css", CssMinifier).register("js", JsMinifier);
        registry
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_should_minify() {
        assert!(should_minify("css", "style.css", true));
        assert!(should_minify("js", "app.js", true));
        assert!(!should_minify("css", "style.css", false));
        assert!(!should_minify("png", "logo.png", true));
        // Extension match is case-sensitive
        assert!(!should_minify("CSS", "STYLE.CSS", true));
    }

    #[test]
    fn test_should_minify_skips_min_anywhere() {
        assert!(!should_minify("js", "app.min.js", true));
        assert!(!should_minify("js", "APP.MIN.JS", true));
        assert!(!should_minify("css", "weird.min.css.bak.css", true));
        assert!(!should_minify("js", "jquery.Minimal.js", true));
        assert!(should_minify("js", "admin.js", true));
    }

    #[test]
    fn test_minify_js() {
        let source = "// helper\nfunction greet(name) {\n  const message = 'hi ' + name;\n  console.log(message);\n}\ngreet('there');\n";
        let out = minify_js(source).unwrap();
        assert!(out.len() < source.len());
        assert!(out.contains("console.log"));
        assert!(!out.contains("// helper"));
    }

    #[test]
    fn test_minify_js_syntax_error() {
        assert!(minify_js("function (").is_err());
    }

    #[test]
    fn test_minify_css() {
        let out = minify_css("body {\n  color: red;\n}\n").unwrap();
        assert_eq!(out, "body{color:red}");
    }

    #[test]
    fn test_registry_lookup() {
        let registry = MinifierRegistry::default();
        assert!(registry.get("css").is_ok());
        assert!(registry.get("JS").is_ok());

        let err = registry.get("scss").err().unwrap();
        assert!(matches!(err, RevisionError::UnsupportedMinifyExtension(ext) if ext == "scss"));
        assert!(MinifierRegistry::new().get("css").is_err());
    }

    #[test]
    fn test_css_minifier_writes_destination() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("style.css");
        let dest = dir.path().join("style.min.css");
        fs::write(&source, "a {\n  color: red;\n}\n").unwrap();

        CssMinifier.minify(&source, &dest).unwrap();
        assert_eq!(fs::read_to_string(&dest).unwrap(), "a{color:red}");
    }

    #[test]
    fn test_js_minifier_failure() {
        let dir = TempDir::new().unwrap();
        let source = dir.path().join("broken.js");
        let dest = dir.path().join("broken.min.js");
        fs::write(&source, "let = ;;{").unwrap();

        let err = JsMinifier.minify(&source, &dest).unwrap_err();
        assert!(matches!(err, RevisionError::Minification { .. }));
        assert!(!dest.exists());
    }
}
