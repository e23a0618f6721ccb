//! Git-based fetching from the official addon repository and its forks.
//!
//! Uses a blobless, no-checkout clone so listing the addon tree stays
//! cheap, then narrows the checkout to the requested addon's subtree
//! with a sparse checkout when the installed git supports it.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::Context;
use tracing::debug;

use crate::error::FetchError;

/// Minimum git version with cone-mode sparse checkout.
const SPARSE_CHECKOUT_MIN: (u32, u32) = (2, 25);

/// A cloned addon repository ready for checkout.
#[derive(Debug)]
pub struct GitRepo {
    url: String,
    local_copy: PathBuf,
    git_version: (u32, u32),
    branch: String,
    addons: BTreeMap<String, String>,
}

impl GitRepo {
    /// Clone `url` into `working_directory` and pick the checkout branch.
    ///
    /// Branch precedence: the explicit `branch` argument, then the
    /// version branch (`gisx{major}`, or the previous major's branch)
    /// when the repository follows the official layout, then the
    /// repository's own default branch. An explicit branch that does not
    /// exist on the remote is an error.
    pub fn clone(
        url: &str,
        working_directory: &Path,
        major_version: u32,
        branch: Option<&str>,
        official_layout: bool,
    ) -> anyhow::Result<Self> {
        let git_version = installed_git_version()?;

        let branches = remote_branches(url)?;

        std::fs::create_dir_all(working_directory).with_context(|| {
            format!(
                "Failed to create working directory: {}",
                working_directory.display()
            )
        })?;
        // Key the clone directory by URL so repeated fetches into the
        // same working directory do not collide.
        let key = blake3::hash(url.as_bytes()).to_hex()[..16].to_string();
        let local_copy = working_directory.join(format!("repo-{}", key));

        run_git(
            Some(working_directory),
            &[
                "clone",
                "-q",
                "--no-checkout",
                "--filter=tree:0",
                url,
                local_copy
                    .to_str()
                    .ok_or_else(|| anyhow::anyhow!("Invalid clone directory"))?,
            ],
        )?;

        let default_branch = default_branch(&local_copy)?;

        let checkout_branch = match branch {
            Some(requested) => {
                if !branches.contains_key(requested) {
                    return Err(FetchError::UnknownHostBranch {
                        branch: requested.to_string(),
                        url: url.to_string(),
                    }
                    .into());
                }
                requested.to_string()
            }
            None if official_layout => {
                crate::hosting::version_branch(major_version, |name| {
                    branches.contains_key(name)
                })
                .unwrap_or(default_branch)
            }
            None => default_branch,
        };
        debug!(branch = %checkout_branch, url, "selected checkout branch");

        let addons = scan_addon_paths(&list_tree(&local_copy, &checkout_branch)?);

        Ok(Self {
            url: url.to_string(),
            local_copy,
            git_version,
            branch: checkout_branch,
            addons,
        })
    }

    /// The branch selected for checkout.
    pub fn branch(&self) -> &str {
        &self.branch
    }

    /// Addon name to repository path map for the selected branch.
    pub fn addons(&self) -> &BTreeMap<String, String> {
        &self.addons
    }

    /// Check out the requested addon and return its source directory.
    pub fn fetch_addon(&self, name: &str) -> anyhow::Result<PathBuf> {
        let path = self
            .addons
            .get(name)
            .ok_or_else(|| FetchError::SourceNotFound {
                name: name.to_string(),
            })?;

        if self.git_version >= SPARSE_CHECKOUT_MIN {
            run_git(
                Some(&self.local_copy),
                &["sparse-checkout", "init", "--cone"],
            )?;
            run_git(Some(&self.local_copy), &["sparse-checkout", "set", path])?;
        }
        run_git(Some(&self.local_copy), &["checkout", &self.branch])?;

        let addon_dir = self.local_copy.join(path);
        if !addon_dir.exists() {
            return Err(FetchError::SourceNotFound {
                name: name.to_string(),
            }
            .into());
        }
        debug!(url = self.url, addon = name, dir = %addon_dir.display(), "checked out addon");
        Ok(addon_dir)
    }
}

/// Build the addon name to path map from `git ls-tree` output.
///
/// Only Makefiles under `src/` count; the `tools` and `models` groups
/// are excluded, and the `gui` and `hadoop` groups nest their addons one
/// level deeper than the rest.
fn scan_addon_paths(tree_paths: &[String]) -> BTreeMap<String, String> {
    let mut addons = BTreeMap::new();
    for file_path in tree_paths {
        if !file_path.starts_with("src") || !file_path.ends_with("Makefile") {
            continue;
        }
        let parts: Vec<&str> = file_path.split('/').collect();
        if parts.len() < 2 || matches!(parts[1], "tools" | "models") {
            continue;
        }
        if parts[1] == "hadoop" && parts.len() >= 4 {
            let prefix = parts[..4].join("/");
            if prefix.contains("hd.") {
                addons.insert(parts[3].to_string(), prefix);
            }
        } else if parts[1] == "gui" {
            if parts.len() >= 4 {
                addons.insert(parts[3].to_string(), parts[..4].join("/"));
            }
        } else if parts.len() >= 3 && parts[2] != "Makefile" && parts[2] != "hd" {
            addons.insert(parts[2].to_string(), parts[..3].join("/"));
        }
    }
    addons
}

/// Determine the installed git version as (major, minor).
fn installed_git_version() -> anyhow::Result<(u32, u32)> {
    let output = git_command()
        .arg("--version")
        .output()
        .map_err(missing_git)?;
    if !output.status.success() {
        anyhow::bail!("Failed to run git --version");
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let version = stdout
        .split_whitespace()
        .nth(2)
        .ok_or_else(|| anyhow::anyhow!("Unexpected git version output: {}", stdout))?;
    let mut parts = version.split('.');
    let major: u32 = parts
        .next()
        .ok_or_else(|| anyhow::anyhow!("Invalid git version: {}", version))?
        .parse()?;
    let minor: u32 = parts
        .next()
        .ok_or_else(|| anyhow::anyhow!("Invalid git version: {}", version))?
        .parse()?;
    Ok((major, minor))
}

/// Remote branch name to commit map via `git ls-remote --heads`.
fn remote_branches(url: &str) -> anyhow::Result<BTreeMap<String, String>> {
    let output = git_command()
        .args(["ls-remote", "--heads", url])
        .output()
        .map_err(missing_git)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("git ls-remote failed for {}: {}", url, stderr.trim());
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut branches = BTreeMap::new();
    for line in stdout.lines() {
        if let Some((commit, reference)) = line.split_once('\t') {
            let name = reference.rsplit('/').next().unwrap_or(reference);
            branches.insert(name.to_string(), commit.to_string());
        }
    }
    Ok(branches)
}

/// The remote default branch from the cloned repository's origin HEAD.
fn default_branch(local_copy: &Path) -> anyhow::Result<String> {
    let output = git_command()
        .args(["symbolic-ref", "refs/remotes/origin/HEAD"])
        .current_dir(local_copy)
        .output()
        .map_err(missing_git)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("git symbolic-ref failed: {}", stderr.trim());
    }
    let reference = String::from_utf8_lossy(&output.stdout).trim().to_string();
    Ok(reference
        .rsplit('/')
        .next()
        .unwrap_or(&reference)
        .to_string())
}

/// Full recursive tree listing for a branch.
fn list_tree(local_copy: &Path, branch: &str) -> anyhow::Result<Vec<String>> {
    let output = git_command()
        .args(["ls-tree", "--name-only", "-r", branch])
        .current_dir(local_copy)
        .output()
        .map_err(missing_git)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("git ls-tree failed for {}: {}", branch, stderr.trim());
    }
    Ok(String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(str::to_string)
        .collect())
}

/// Run a git command, surfacing stderr on failure.
fn run_git(cwd: Option<&Path>, args: &[&str]) -> anyhow::Result<()> {
    let mut cmd = git_command();
    cmd.args(args);
    if let Some(dir) = cwd {
        cmd.current_dir(dir);
    }
    let output = cmd.output().map_err(missing_git)?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        anyhow::bail!("Git command failed {:?}: {}", args, stderr.trim());
    }
    Ok(())
}

fn git_command() -> Command {
    Command::new("git")
}

fn missing_git(err: std::io::Error) -> anyhow::Error {
    if err.kind() == ErrorKind::NotFound {
        FetchError::VersionControlClientMissing {
            program: "git".to_string(),
        }
        .into()
    } else {
        anyhow::Error::new(err).context("Failed to invoke git")
    }
}
