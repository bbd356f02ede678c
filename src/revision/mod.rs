//! Asset revisioning.
//!
//! # Module Structure
//!
//! ```text
//! revision/
//! ├── fingerprint  # HashMethod, content / mtime fingerprints
//! ├── minify       # Minifier trait, registry, css/js minifiers
//! ├── cache        # Content-addressed minify cache
//! ├── target       # Destination naming (stem.hash[.min].ext)
//! ├── manifest     # JSON / PHP manifest rendering
//! ├── context      # FileScanner, RevisionContext
//! ├── error        # RevisionError
//! └── pipeline     # run(): the whole pass
//! ```

mod cache;
mod context;
mod error;
mod fingerprint;
mod manifest;
mod minify;
mod pipeline;
mod target;

pub use context::{RevisionContext, WalkScanner};
pub use error::RevisionError;
pub use fingerprint::HashMethod;
pub use minify::MinifierRegistry;
pub use pipeline::{RevisionReport, RevisionRequest, run};
