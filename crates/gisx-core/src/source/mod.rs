//! Source classification: raw location strings to fetchable sources.

pub mod classifier;
pub mod spec;

pub use classifier::{HttpProbe, Probe, SourceClassifier};
pub use spec::{ArchiveFormat, ResolvedSource, SourceKind, TAR_FAMILY_SUFFIXES};
