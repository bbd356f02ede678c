//! Fingerprint computation for revisioned file names.
//!
//! A fingerprint is either the hex digest of a file's content or its
//! modification time, optionally cut down to a fixed number of characters:
//!
//! ```text
//! app.js  --sha256-->  9f86d081884c7d65...  --hash_length=8-->  9f86d081
//! app.js  --mtime--->  1718000000
//! ```

use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::UNIX_EPOCH;

use sha2::{Digest, Sha224, Sha256, Sha384, Sha512};

use super::error::{Result, RevisionError};

/// Content digest algorithms available for fingerprinting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashAlgorithm {
    Md5,
    Sha224,
    Sha256,
    Sha384,
    Sha512,
    Blake3,
}

impl HashAlgorithm {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Md5 => "md5",
            Self::Sha224 => "sha224",
            Self::Sha256 => "sha256",
            Self::Sha384 => "sha384",
            Self::Sha512 => "sha512",
            Self::Blake3 => "blake3",
        }
    }

    /// Lowercase hex digest of `data`.
    pub fn hex_digest(self, data: &[u8]) -> String {
        match self {
            Self::Md5 => format!("{:x}", md5::compute(data)),
            Self::Sha224 => hex::encode(Sha224::digest(data)),
            Self::Sha256 => hex::encode(Sha256::digest(data)),
            Self::Sha384 => hex::encode(Sha384::digest(data)),
            Self::Sha512 => hex::encode(Sha512::digest(data)),
            Self::Blake3 => blake3::hash(data).to_hex().to_string(),
        }
    }
}

/// How a file's fingerprint is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashMethod {
    /// Modification time in seconds since the Unix epoch.
    Mtime,
    Digest(HashAlgorithm),
}

impl Default for HashMethod {
    fn default() -> Self {
        Self::Digest(HashAlgorithm::Sha256)
    }
}

impl FromStr for HashMethod {
    type Err = RevisionError;

    fn from_str(s: &str) -> Result<Self> {
        let algorithm = match s.to_ascii_lowercase().as_str() {
            "mtime" => return Ok(Self::Mtime),
            "md5" => HashAlgorithm::Md5,
            "sha224" => HashAlgorithm::Sha224,
            "sha256" => HashAlgorithm::Sha256,
            "sha384" => HashAlgorithm::Sha384,
            "sha512" => HashAlgorithm::Sha512,
            "blake3" => HashAlgorithm::Blake3,
            _ => return Err(RevisionError::UnsupportedHashAlgorithm(s.to_string())),
        };
        Ok(Self::Digest(algorithm))
    }
}

impl fmt::Display for HashMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mtime => f.write_str("mtime"),
            Self::Digest(algorithm) => f.write_str(algorithm.name()),
        }
    }
}

/// Compute the fingerprint of `path`.
///
/// `truncate` keeps only the leading characters. It is applied to `mtime`
/// fingerprints too, and `Some(0)` yields an empty string.
pub fn fingerprint(path: &Path, method: HashMethod, truncate: Option<usize>) -> Result<String> {
    let full = match method {
        HashMethod::Mtime => mtime_seconds(path)?.to_string(),
        HashMethod::Digest(algorithm) => {
            let content = fs::read(path).map_err(|e| RevisionError::read(path, e))?;
            algorithm.hex_digest(&content)
        }
    };

    Ok(match truncate {
        Some(len) => full.chars().take(len).collect(),
        None => full,
    })
}

/// Hex sha256 of a file's content.
pub fn sha256_file(path: &Path) -> Result<String> {
    let content = fs::read(path).map_err(|e| RevisionError::read(path, e))?;
    Ok(HashAlgorithm::Sha256.hex_digest(&content))
}

fn mtime_seconds(path: &Path) -> Result<u64> {
    let modified = fs::metadata(path)
        .and_then(|m| m.modified())
        .map_err(|e| RevisionError::read(path, e))?;
    // Pre-epoch timestamps collapse to 0.
    Ok(modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0))
}
