//! Fetch orchestration: classification, working directory, retrieval.
//!
//! This is the surface the external build step talks to: it receives a
//! local directory of source code and the set of entries touched, for
//! the metadata layer to record.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::warn;

use crate::config::FetchConfig;
use crate::fetch::Fetcher;
use crate::source::{ResolvedSource, SourceClassifier};
use crate::workdir::WorkDir;

/// Options for a single fetch.
#[derive(Debug, Clone)]
pub struct FetchOptions {
    /// Addon name
    pub name: String,
    /// Raw source location; empty or absent means the official repository
    pub source: Option<String>,
    /// Branch to fetch from
    pub branch: Option<String>,
    /// Treat the source as a fork of the official repository
    pub fork: bool,
    /// Keep the working directory for inspection
    pub preserve: bool,
}

impl FetchOptions {
    /// Create options for an addon name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source: None,
            branch: None,
            fork: false,
            preserve: false,
        }
    }

    /// Set the raw source location.
    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }

    /// Set the branch.
    pub fn with_branch(mut self, branch: impl Into<String>) -> Self {
        self.branch = Some(branch.into());
        self
    }

    /// Mark the source as an official-repository fork.
    pub fn with_fork(mut self, fork: bool) -> Self {
        self.fork = fork;
        self
    }

    /// Keep the working directory after the fetch.
    pub fn with_preserve(mut self, preserve: bool) -> Self {
        self.preserve = preserve;
        self
    }
}

/// Result of a successful fetch.
///
/// Holds the working directory guard: the caller owns cleanup, which
/// happens when the report is dropped (unless preserve was requested).
#[derive(Debug)]
pub struct FetchReport {
    /// The classified source
    pub source: ResolvedSource,
    /// Directory containing the addon source code
    pub directory: PathBuf,
    /// Top-level entries in the source directory, for the metadata layer
    pub entries: Vec<String>,
    workdir: WorkDir,
}

impl FetchReport {
    /// Keep the working directory when this report drops.
    pub fn preserve(&mut self) {
        self.workdir.set_preserve(true);
    }
}

/// Outcome of a batch of fetches.
#[derive(Debug)]
pub struct BatchOutcome {
    /// Successful fetches, in request order
    pub reports: Vec<FetchReport>,
    /// Failed addon names with their errors
    pub failures: Vec<(String, anyhow::Error)>,
}

impl BatchOutcome {
    /// True when every request succeeded.
    pub fn is_success(&self) -> bool {
        self.failures.is_empty()
    }

    /// Convert to a result, erroring when any request failed.
    pub fn into_result(self) -> anyhow::Result<Vec<FetchReport>> {
        if self.failures.is_empty() {
            return Ok(self.reports);
        }
        let names: Vec<&str> = self.failures.iter().map(|(name, _)| name.as_str()).collect();
        anyhow::bail!("Failed to fetch {} addon(s): {}", names.len(), names.join(", "))
    }
}

/// Composes classifier and fetcher for callers.
#[derive(Debug)]
pub struct FetchOperation {
    config: FetchConfig,
}

impl FetchOperation {
    /// Create an operation with the given configuration.
    pub fn new(config: FetchConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Classify without fetching.
    pub fn resolve(&self, options: &FetchOptions) -> anyhow::Result<ResolvedSource> {
        let classifier = SourceClassifier::new(&self.config);
        classifier.classify(
            options.source.as_deref(),
            &options.name,
            options.branch.as_deref(),
            options.fork,
        )
    }

    /// Classify and fetch a single addon.
    pub fn execute(&self, options: &FetchOptions) -> anyhow::Result<FetchReport> {
        let source = self.resolve(options)?;
        let workdir = WorkDir::create(self.config.workdir.as_deref(), options.preserve)?;

        let fetcher = Fetcher::new(&self.config);
        let directory = fetcher.fetch(
            &source,
            &options.name,
            workdir.path(),
            options.branch.as_deref(),
        )?;

        let entries = list_entries(&directory)?;
        Ok(FetchReport {
            source,
            directory,
            entries,
            workdir,
        })
    }

    /// Fetch a batch of addons.
    ///
    /// One addon's failure aborts only that addon; the batch continues
    /// and failures are aggregated in the outcome.
    pub fn execute_batch(&self, requests: &[FetchOptions]) -> BatchOutcome {
        let mut reports = Vec::new();
        let mut failures = Vec::new();
        for options in requests {
            match self.execute(options) {
                Ok(report) => reports.push(report),
                Err(err) => {
                    warn!(name = %options.name, error = %err, "fetch failed");
                    failures.push((options.name.clone(), err));
                }
            }
        }
        BatchOutcome { reports, failures }
    }
}

/// Top-level entry names of the fetched source directory.
fn list_entries(directory: &Path) -> anyhow::Result<Vec<String>> {
    let mut entries: Vec<String> = std::fs::read_dir(directory)
        .with_context(|| format!("Failed to read directory: {}", directory.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.file_name().to_string_lossy().into_owned())
        .collect();
    entries.sort();
    Ok(entries)
}
