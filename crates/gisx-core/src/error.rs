//! Error taxonomy for source resolution and fetching.
//!
//! Public APIs return `anyhow::Result`; these typed variants are
//! constructed wherever the failure class matters to callers (batch
//! reporting downcasts to them).

use thiserror::Error;

/// Failure classes surfaced by the classifier and fetcher.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Neither local existence nor any remote probe succeeded.
    #[error("cannot open URL <{url}> (tried: {attempts:?})")]
    UnresolvableSource {
        /// The raw input that could not be resolved
        url: String,
        /// URLs probed before giving up
        attempts: Vec<String>,
    },

    /// An explicitly requested branch does not exist on the remote.
    #[error("branch <{branch}> not found in repository <{url}>")]
    UnknownHostBranch {
        /// Requested branch name
        branch: String,
        /// Repository URL
        url: String,
    },

    /// Archive download failed after exhausting the branch-name retry.
    #[error("download failed from <{url}>; check the 'url' and 'branch' options")]
    DownloadFailed {
        /// Last URL attempted
        url: String,
    },

    /// Corrupt or unsupported archive content.
    #[error("archive file is unreadable: {reason}")]
    ArchiveUnreadable {
        /// Underlying decoder error
        reason: String,
    },

    /// A required version-control executable is absent.
    #[error("'{program}' not found but needed to fetch addons; please install '{program}' first")]
    VersionControlClientMissing {
        /// Executable name (git or svn)
        program: String,
    },

    /// A required build executable is absent.
    #[error("'{program}' required to compile addons; please install '{program}' first")]
    BuildToolMissing {
        /// Executable name
        program: String,
    },

    /// Version-control export returned nonzero or the addon is not in the tree.
    #[error("addon <{name}> not found")]
    SourceNotFound {
        /// Addon name
        name: String,
    },
}
