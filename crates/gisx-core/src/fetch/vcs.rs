//! Subversion export, the historic fallback for unrecognized remotes.

use std::io::ErrorKind;
use std::path::Path;
use std::process::Command;

use tracing::debug;

use crate::error::FetchError;
use crate::family::module_family;

/// Export `<url>/<family>/<name>` into `directory`.
pub fn export(url: &str, name: &str, directory: &Path) -> anyhow::Result<()> {
    let full_url = format!("{}/{}/{}", url.trim_end_matches('/'), module_family(name), name);
    debug!(url = full_url, "exporting from Subversion");

    let directory = directory
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid export directory"))?;
    let status = Command::new("svn")
        .args(["export", &full_url, directory])
        .status()
        .map_err(|err| {
            if err.kind() == ErrorKind::NotFound {
                anyhow::Error::new(FetchError::VersionControlClientMissing {
                    program: "svn".to_string(),
                })
            } else {
                anyhow::Error::new(err).context("Failed to invoke svn")
            }
        })?;

    if !status.success() {
        return Err(FetchError::SourceNotFound {
            name: name.to_string(),
        }
        .into());
    }
    Ok(())
}
