//! gisx Core Library
//!
//! Provides the domain logic for resolving and fetching GIS addon
//! sources: classification of raw location strings, hosting-service URL
//! synthesis, and format-specific retrieval into a working directory.

pub mod config;
pub mod error;
pub mod family;
pub mod fetch;
pub mod hosting;
pub mod ops;
pub mod source;
pub mod workdir;

/// Re-exports of commonly used types
pub mod prelude {
    // Configuration
    pub use crate::config::{FetchConfig, OFFICIAL_REPO_URL};

    // Errors
    pub use crate::error::FetchError;

    // Source classification
    pub use crate::source::{ArchiveFormat, ResolvedSource, SourceClassifier, SourceKind};

    // Fetching
    pub use crate::fetch::{Downloader, Fetcher, GitRepo};

    // Orchestration
    pub use crate::ops::{BatchOutcome, FetchOperation, FetchOptions, FetchReport};

    // Working directory
    pub use crate::workdir::WorkDir;
}
