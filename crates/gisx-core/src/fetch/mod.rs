//! Fetching resolved sources into a local working directory.

pub mod download;
pub mod extract;
pub mod git;
pub mod newlines;
pub mod vcs;

pub use download::Downloader;
pub use git::GitRepo;
pub use newlines::fix_newlines;

use std::path::{Path, PathBuf};

use anyhow::Context;
use tracing::info;

use crate::config::FetchConfig;
use crate::source::{ArchiveFormat, ResolvedSource, SourceKind};

/// Retrieves the content of a resolved source.
#[derive(Debug)]
pub struct Fetcher<'a> {
    config: &'a FetchConfig,
    downloader: Downloader,
}

impl<'a> Fetcher<'a> {
    /// Create a fetcher for the given configuration.
    pub fn new(config: &'a FetchConfig) -> Self {
        Self {
            config,
            downloader: Downloader::new(&config.user_agent),
        }
    }

    /// Fetch `source` into `workdir` and return the addon source directory.
    ///
    /// The fetcher only writes inside `workdir`; the caller owns the
    /// directory and its cleanup. `branch` is forwarded to the
    /// repository checkout and to the download retry decision.
    pub fn fetch(
        &self,
        source: &ResolvedSource,
        name: &str,
        workdir: &Path,
        branch: Option<&str>,
    ) -> anyhow::Result<PathBuf> {
        let dest = workdir.join(name);
        info!(name, location = %source.location, kind = %source.kind, "fetching");

        match source.kind {
            SourceKind::Official | SourceKind::OfficialFork => {
                let repo = GitRepo::clone(
                    &source.location,
                    workdir,
                    self.config.major_version,
                    branch,
                    true,
                )?;
                repo.fetch_addon(name)
            }
            SourceKind::VcsExport => {
                vcs::export(&source.location, name, &dest)?;
                Ok(dest)
            }
            SourceKind::RemoteArchive(ArchiveFormat::Zip) => {
                // A fixed local name avoids clashing with archive content.
                let archive = workdir.join("extension.zip");
                self.downloader
                    .download_archive(&source.location, &archive, branch.is_some())?;
                extract::extract_zip(&archive, &dest, workdir)?;
                fix_newlines(&dest)?;
                Ok(dest)
            }
            SourceKind::RemoteArchive(format) => {
                let archive = workdir.join(format!("extension.{}", format));
                self.downloader.download_to(&source.location, &archive)?;
                extract::extract_tar(&archive, format, &dest, workdir)?;
                fix_newlines(&dest)?;
                Ok(dest)
            }
            SourceKind::LocalArchive(ArchiveFormat::Zip) => {
                extract::extract_zip(Path::new(&source.location), &dest, workdir)?;
                fix_newlines(&dest)?;
                Ok(dest)
            }
            SourceKind::LocalArchive(format) => {
                extract::extract_tar(Path::new(&source.location), format, &dest, workdir)?;
                fix_newlines(&dest)?;
                Ok(dest)
            }
            SourceKind::LocalDirectory => {
                extract::copy_dir_merging(Path::new(&source.location), &dest)
                    .with_context(|| format!("Failed to copy {}", source.location))?;
                fix_newlines(&dest)?;
                Ok(dest)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ResolvedSource;

    #[test]
    fn local_directory_fetch_copies_and_normalizes() {
        let temp = tempfile::TempDir::new().expect("Failed to create temp dir");
        let src = temp.path().join("src");
        std::fs::create_dir_all(src.join("sub")).expect("Should create dirs");
        std::fs::write(src.join("Makefile"), b"all:\r\n\ttrue\r\n").expect("Should write file");
        std::fs::write(src.join("sub").join("notes.txt"), b"plain\n").expect("Should write file");

        let workdir = temp.path().join("work");
        std::fs::create_dir_all(&workdir).expect("Should create workdir");

        let config = FetchConfig::default();
        let fetcher = Fetcher::new(&config);
        let source = ResolvedSource::new(
            SourceKind::LocalDirectory,
            src.display().to_string(),
        );

        let dir = fetcher
            .fetch(&source, "g.example", &workdir, None)
            .expect("Fetch should succeed");

        assert_eq!(dir, workdir.join("g.example"));
        let makefile = std::fs::read(dir.join("Makefile")).expect("Should read file");
        assert_eq!(makefile, b"all:\n\ttrue\n");
        assert!(dir.join("sub").join("notes.txt").exists());
    }

    #[test]
    fn local_zip_fetch_extracts_into_named_dir() {
        let temp = tempfile::TempDir::new().expect("Failed to create temp dir");
        let archive = temp.path().join("module.zip");
        let mut buf = std::io::Cursor::new(Vec::new());
        {
            use std::io::Write;
            let mut writer = zip::ZipWriter::new(&mut buf);
            let options = zip::write::SimpleFileOptions::default();
            writer
                .start_file("module-1.0/Makefile", options)
                .expect("Failed to start file");
            writer.write_all(b"all:\n").expect("Failed to write entry");
            writer.finish().expect("Failed to finish zip");
        }
        std::fs::write(&archive, buf.into_inner()).expect("Should write archive");

        let workdir = temp.path().join("work");
        std::fs::create_dir_all(&workdir).expect("Should create workdir");

        let config = FetchConfig::default();
        let fetcher = Fetcher::new(&config);
        let source = ResolvedSource::new(
            SourceKind::LocalArchive(ArchiveFormat::Zip),
            archive.display().to_string(),
        );

        let dir = fetcher
            .fetch(&source, "r.module", &workdir, None)
            .expect("Fetch should succeed");

        assert!(dir.join("Makefile").exists());
    }
}
