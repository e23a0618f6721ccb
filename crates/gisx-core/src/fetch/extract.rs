//! Archive extraction with single-root flattening.
//!
//! Archives may or may not wrap their content in a single named folder.
//! Extraction therefore goes to a private scratch directory first; if
//! exactly one top-level directory comes out, its contents are promoted
//! into the destination, otherwise every top-level entry is copied over,
//! merging with anything already present.

use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;

use anyhow::Context;
use flate2::read::GzDecoder;
use tracing::debug;

use crate::error::FetchError;
use crate::source::ArchiveFormat;

/// Extract a ZIP archive into `directory`, using `tmpdir` for scratch space.
///
/// Entries containing a bytecode-cache marker are skipped, as are entries
/// whose paths would escape the extraction root.
pub fn extract_zip(archive: &Path, directory: &Path, tmpdir: &Path) -> anyhow::Result<()> {
    debug!(archive = %archive.display(), directory = %directory.display(), "extracting zip");
    let file = File::open(archive)
        .with_context(|| format!("Failed to open archive: {}", archive.display()))?;
    let mut zip = zip::ZipArchive::new(file).map_err(|err| FetchError::ArchiveUnreadable {
        reason: err.to_string(),
    })?;

    let extract_dir = scratch_dir(tmpdir)?;
    for i in 0..zip.len() {
        let mut entry = zip
            .by_index(i)
            .map_err(|err| FetchError::ArchiveUnreadable {
                reason: err.to_string(),
            })?;
        if entry.name().contains("__pycache__") {
            continue;
        }
        // Sanitize entry paths to stay inside the extraction root.
        let outpath = match entry.enclosed_name() {
            Some(path) => extract_dir.join(path),
            None => continue,
        };

        if entry.is_dir() {
            std::fs::create_dir_all(&outpath)
                .with_context(|| format!("Failed to create directory: {}", outpath.display()))?;
        } else {
            if let Some(parent) = outpath.parent() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create parent directory: {}", parent.display())
                })?;
            }
            let mut outfile = File::create(&outpath)
                .with_context(|| format!("Failed to create file: {}", outpath.display()))?;
            let mut buffer = Vec::new();
            entry
                .read_to_end(&mut buffer)
                .map_err(|err| FetchError::ArchiveUnreadable {
                    reason: err.to_string(),
                })?;
            outfile
                .write_all(&buffer)
                .with_context(|| format!("Failed to write file: {}", outpath.display()))?;

            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                if let Some(mode) = entry.unix_mode() {
                    std::fs::set_permissions(&outpath, std::fs::Permissions::from_mode(mode)).ok();
                }
            }
        }
    }

    move_extracted_files(&extract_dir, directory)?;
    std::fs::remove_dir_all(&extract_dir).ok();
    Ok(())
}

/// Extract a tar-family archive into `directory`, using `tmpdir` for scratch.
pub fn extract_tar(
    archive: &Path,
    format: ArchiveFormat,
    directory: &Path,
    tmpdir: &Path,
) -> anyhow::Result<()> {
    debug!(archive = %archive.display(), %format, "extracting tar archive");
    let file = File::open(archive)
        .with_context(|| format!("Failed to open archive: {}", archive.display()))?;

    let reader: Box<dyn Read> = match format {
        ArchiveFormat::TarGz | ArchiveFormat::Gz => Box::new(GzDecoder::new(file)),
        ArchiveFormat::Bz2 => Box::new(bzip2::read::BzDecoder::new(file)),
        ArchiveFormat::Tar => Box::new(file),
        ArchiveFormat::Zip => anyhow::bail!("zip archives use the zip extractor"),
    };

    let extract_dir = scratch_dir(tmpdir)?;
    tar::Archive::new(reader)
        .unpack(&extract_dir)
        .map_err(|err| FetchError::ArchiveUnreadable {
            reason: err.to_string(),
        })?;

    move_extracted_files(&extract_dir, directory)?;
    std::fs::remove_dir_all(&extract_dir).ok();
    Ok(())
}

/// Move extracted files into the target directory, flattening one level.
///
/// A single extracted top-level directory has its contents promoted so
/// the wrapping folder name disappears; multiple entries are copied over
/// individually, merging into pre-existing directories.
fn move_extracted_files(extract_dir: &Path, target_dir: &Path) -> anyhow::Result<()> {
    let entries: Vec<_> = std::fs::read_dir(extract_dir)
        .with_context(|| format!("Failed to read directory: {}", extract_dir.display()))?
        .collect::<Result<_, _>>()?;

    if entries.len() == 1 && entries[0].path().is_dir() {
        copy_dir_merging(&entries[0].path(), target_dir)?;
        return Ok(());
    }

    std::fs::create_dir_all(target_dir)
        .with_context(|| format!("Failed to create directory: {}", target_dir.display()))?;
    for entry in entries {
        let src = entry.path();
        let dst = target_dir.join(entry.file_name());
        if src.is_dir() {
            copy_dir_merging(&src, &dst)?;
        } else {
            std::fs::copy(&src, &dst)
                .with_context(|| format!("Failed to copy file: {}", src.display()))?;
        }
    }
    Ok(())
}

/// Copy a directory tree, merging into existing destination directories.
pub fn copy_dir_merging(src: &Path, dst: &Path) -> anyhow::Result<()> {
    std::fs::create_dir_all(dst)
        .with_context(|| format!("Failed to create directory: {}", dst.display()))?;
    for entry in std::fs::read_dir(src)
        .with_context(|| format!("Failed to read directory: {}", src.display()))?
    {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        if src_path.is_dir() {
            copy_dir_merging(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)
                .with_context(|| format!("Failed to copy file: {}", src_path.display()))?;
        }
    }
    Ok(())
}

/// Allocate a fresh scratch subdirectory inside `tmpdir`.
fn scratch_dir(tmpdir: &Path) -> anyhow::Result<std::path::PathBuf> {
    for attempt in 0u32.. {
        let candidate = tmpdir.join(format!("extract_dir.{}", attempt));
        if !candidate.exists() {
            std::fs::create_dir_all(&candidate).with_context(|| {
                format!("Failed to create scratch directory: {}", candidate.display())
            })?;
            return Ok(candidate);
        }
    }
    unreachable!("scratch directory allocation exhausted u32 attempts")
}
