//! Source kind and resolved source types.

use std::fmt;

/// Archive formats the fetcher can extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFormat {
    /// ZIP archive
    Zip,
    /// gzip-compressed tar (`.tar.gz`, `.targz`)
    TarGz,
    /// gzip stream (`.gz`, `.gzip`), read as a compressed tar
    Gz,
    /// bzip2-compressed tar (`.bz2`, `.tar.bz2`)
    Bz2,
    /// uncompressed tar
    Tar,
}

/// Tar-family suffixes, in the order they are tested.
///
/// Order matters: `tar.gz` must be tested before `gz` so a `.tar.gz`
/// file is not classified as a bare gzip stream.
pub const TAR_FAMILY_SUFFIXES: &[&str] = &["tar.gz", "gz", "bz2", "tar", "gzip", "targz"];

impl ArchiveFormat {
    /// Map a tar-family suffix (without leading dot) to its format.
    pub fn from_tar_suffix(suffix: &str) -> Option<Self> {
        match suffix {
            "tar.gz" | "targz" => Some(Self::TarGz),
            "gz" | "gzip" => Some(Self::Gz),
            "bz2" => Some(Self::Bz2),
            "tar" => Some(Self::Tar),
            _ => None,
        }
    }

    /// True for every format read through the tar machinery.
    pub fn is_tar_family(self) -> bool {
        !matches!(self, Self::Zip)
    }
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Zip => "zip",
            Self::TarGz => "tar.gz",
            Self::Gz => "gz",
            Self::Bz2 => "bz2",
            Self::Tar => "tar",
        };
        write!(f, "{}", name)
    }
}

/// Closed set of source kinds; determines the fetch strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// The official addon repository
    Official,
    /// A fork of the official repository
    OfficialFork,
    /// Subversion repository export (historic default for unrecognized remotes)
    VcsExport,
    /// Archive downloaded over HTTP
    RemoteArchive(ArchiveFormat),
    /// Archive on the local filesystem
    LocalArchive(ArchiveFormat),
    /// Directory on the local filesystem
    LocalDirectory,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Official => write!(f, "official"),
            Self::OfficialFork => write!(f, "official-fork"),
            Self::VcsExport => write!(f, "svn"),
            Self::RemoteArchive(fmt_) => write!(f, "remote-{}", fmt_),
            Self::LocalArchive(fmt_) => write!(f, "local-{}", fmt_),
            Self::LocalDirectory => write!(f, "dir"),
        }
    }
}

/// A classified source: kind plus URL or absolute path.
///
/// Immutable after creation; produced by the classifier and consumed by
/// the fetcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSource {
    /// Which fetch strategy applies
    pub kind: SourceKind,
    /// URL string or absolute filesystem path
    pub location: String,
}

impl ResolvedSource {
    /// Create a new resolved source.
    pub fn new(kind: SourceKind, location: impl Into<String>) -> Self {
        Self {
            kind,
            location: location.into(),
        }
    }

    /// Check if this source is on the local filesystem.
    pub fn is_local(&self) -> bool {
        matches!(
            self.kind,
            SourceKind::LocalArchive(_) | SourceKind::LocalDirectory
        )
    }
}
