//! Revision error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that abort a revision run.
///
/// Every variant is fatal: the pipeline never skips a file and continues,
/// and no manifest is written once one of these is returned.
#[derive(Debug, Error)]
pub enum RevisionError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("unsupported hash algorithm `{0}`")]
    UnsupportedHashAlgorithm(String),

    #[error("no minifier registered for extension `{0}`")]
    UnsupportedMinifyExtension(String),

    #[error("failed to read `{}`", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write `{}`", path.display())]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to minify `{}`: {message}", path.display())]
    Minification { path: PathBuf, message: String },
}

impl RevisionError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.into(),
            source,
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::FileWrite {
            path: path.into(),
            source,
        }
    }

    pub fn minify(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Minification {
            path: path.into(),
            message: message.into(),
        }
    }
}

pub type Result<T, E = RevisionError> = std::result::Result<T, E>;
