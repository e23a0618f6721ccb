//! Source classifier implementation.

use std::path::Path;

use anyhow::Context;
use tracing::debug;

use crate::config::FetchConfig;
use crate::error::FetchError;
use crate::hosting::{self, DefaultBranch, HttpBranchLookup};

use super::spec::{ArchiveFormat, ResolvedSource, SourceKind, TAR_FAMILY_SUFFIXES};

/// Reachability probe for remote inputs.
///
/// Injected so classification stays deterministic under test; the
/// default implementation performs a blocking HTTP GET.
pub trait Probe {
    /// True when the URL answers without a transport or status error.
    fn is_reachable(&self, url: &str) -> bool;
}

/// Probe backed by blocking HTTP.
#[derive(Debug)]
pub struct HttpProbe {
    client: reqwest::blocking::Client,
}

impl HttpProbe {
    /// Create a probe with the given user agent.
    pub fn new(user_agent: &str) -> Self {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent.to_string())
            .build()
            .unwrap_or_default();
        Self { client }
    }
}

impl Probe for HttpProbe {
    fn is_reachable(&self, url: &str) -> bool {
        self.client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .is_ok()
    }
}

/// Classifies a raw location string into a [`ResolvedSource`].
pub struct SourceClassifier<'a> {
    config: &'a FetchConfig,
    probe: Box<dyn Probe>,
    branches: Box<dyn DefaultBranch>,
}

impl<'a> SourceClassifier<'a> {
    /// Create a classifier with live HTTP probes.
    pub fn new(config: &'a FetchConfig) -> Self {
        Self {
            config,
            probe: Box::new(HttpProbe::new(&config.user_agent)),
            branches: Box::new(HttpBranchLookup::new(&config.user_agent)),
        }
    }

    /// Create a classifier with injected probes (used by tests).
    pub fn with_probes(
        config: &'a FetchConfig,
        probe: Box<dyn Probe>,
        branches: Box<dyn DefaultBranch>,
    ) -> Self {
        Self {
            config,
            probe,
            branches,
        }
    }

    /// Classify a raw location string.
    ///
    /// Local paths win over remote interpretations, which has the known
    /// consequence that a nonexistent local path is treated as a remote
    /// URL. Unrecognized remotes fall back to Subversion for backwards
    /// compatibility.
    pub fn classify(
        &self,
        url: Option<&str>,
        name: &str,
        branch: Option<&str>,
        fork: bool,
    ) -> anyhow::Result<ResolvedSource> {
        // The official repository needs no further inspection.
        let url = match url {
            None | Some("") => {
                return Ok(ResolvedSource::new(
                    SourceKind::Official,
                    &self.config.official_repo,
                ));
            }
            Some(url) if url == self.config.official_repo => {
                return Ok(ResolvedSource::new(SourceKind::Official, url));
            }
            Some(url) => url,
        };

        // Local paths are sometimes pasted with a file:// scheme.
        let url = url.strip_prefix("file://").unwrap_or(url);

        self.validate(url)?;

        // A validated fork URL bypasses all further classification.
        if fork {
            return Ok(ResolvedSource::new(SourceKind::OfficialFork, url));
        }

        let path = Path::new(url);
        if path.is_dir() {
            return Ok(ResolvedSource::new(
                SourceKind::LocalDirectory,
                absolute(path)?,
            ));
        }
        if path.exists() {
            if url.ends_with(".zip") {
                return Ok(ResolvedSource::new(
                    SourceKind::LocalArchive(ArchiveFormat::Zip),
                    absolute(path)?,
                ));
            }
            for suffix in TAR_FAMILY_SUFFIXES {
                if url.ends_with(&format!(".{}", suffix)) {
                    let format = ArchiveFormat::from_tar_suffix(suffix)
                        .expect("tar family suffixes all map to a format");
                    return Ok(ResolvedSource::new(
                        SourceKind::LocalArchive(format),
                        absolute(path)?,
                    ));
                }
            }
            anyhow::bail!("Local file <{}> has an unsupported archive suffix", url);
        }

        // Remote handling: known hosting service templates first.
        if let Some(resolved) =
            hosting::resolve_archive_url(url, name, branch, self.branches.as_ref())
        {
            return Ok(ResolvedSource::new(
                SourceKind::RemoteArchive(ArchiveFormat::Zip),
                resolved,
            ));
        }
        // Deliberately permissive: accepts query-string forms like
        // ?format=zip, not only a .zip suffix.
        if url.ends_with("zip") {
            return Ok(ResolvedSource::new(
                SourceKind::RemoteArchive(ArchiveFormat::Zip),
                url,
            ));
        }
        for suffix in TAR_FAMILY_SUFFIXES {
            if url.ends_with(suffix) {
                let format = ArchiveFormat::from_tar_suffix(suffix)
                    .expect("tar family suffixes all map to a format");
                return Ok(ResolvedSource::new(
                    SourceKind::RemoteArchive(format),
                    url,
                ));
            }
        }

        // Historic default for anything else.
        debug!(url, "falling back to Subversion source");
        Ok(ResolvedSource::new(SourceKind::VcsExport, url))
    }

    /// Confirm the input names an existing local path or a reachable URL.
    ///
    /// Inputs without a scheme are probed with both http:// and https://
    /// prefixes before giving up.
    fn validate(&self, url: &str) -> anyhow::Result<()> {
        if Path::new(url).exists() {
            return Ok(());
        }

        let attempts = if url.starts_with("http") {
            vec![url.to_string()]
        } else {
            vec![format!("http://{}", url), format!("https://{}", url)]
        };

        if attempts.iter().any(|candidate| self.probe.is_reachable(candidate)) {
            return Ok(());
        }

        Err(FetchError::UnresolvableSource {
            url: url.to_string(),
            attempts,
        }
        .into())
    }
}

fn absolute(path: &Path) -> anyhow::Result<String> {
    let absolute = std::path::absolute(path)
        .with_context(|| format!("Failed to resolve absolute path: {}", path.display()))?;
    Ok(absolute.display().to_string())
}
