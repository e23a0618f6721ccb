//! Working directory lifecycle.
//!
//! Fetches happen inside a scoped working directory that is removed on
//! every exit path, normal or not, unless the caller asked for the
//! source to be preserved for inspection.

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

/// A working directory removed on drop unless preserved.
#[derive(Debug)]
pub struct WorkDir {
    path: PathBuf,
    preserve: bool,
}

impl WorkDir {
    /// Create a fresh working directory.
    ///
    /// With no `base` the platform cache directory is used; each call
    /// gets a unique subdirectory keyed by process id, so concurrent
    /// invocations of the tool do not collide.
    pub fn create(base: Option<&Path>, preserve: bool) -> anyhow::Result<Self> {
        let base = match base {
            Some(dir) => dir.to_path_buf(),
            None => dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("gisx")
                .join("work"),
        };
        std::fs::create_dir_all(&base)
            .with_context(|| format!("Failed to create directory: {}", base.display()))?;

        for attempt in 0u32..100 {
            let candidate = base.join(format!("{}.{}", std::process::id(), attempt));
            if candidate.exists() {
                continue;
            }
            std::fs::create_dir(&candidate).with_context(|| {
                format!(
                    "Failed to create working directory: {}",
                    candidate.display()
                )
            })?;
            return Ok(Self {
                path: candidate,
                preserve,
            });
        }
        anyhow::bail!(
            "Failed to allocate a working directory in {}",
            base.display()
        )
    }

    /// Path of the working directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the directory when this guard drops.
    pub fn set_preserve(&mut self, preserve: bool) {
        self.preserve = preserve;
    }
}

impl Drop for WorkDir {
    fn drop(&mut self) {
        if self.preserve {
            info!(path = %self.path.display(), "path to the source code kept");
        } else {
            let _ = std::fs::remove_dir_all(&self.path);
        }
    }
}
