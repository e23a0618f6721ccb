//! Integration tests for gisx-core: classify and fetch end to end
//! against local sources, with no network involved.

use std::io::Write;

use gisx_core::prelude::*;

fn write_zip(path: &std::path::Path, entries: &[(&str, &[u8])]) {
    let mut buf = std::io::Cursor::new(Vec::new());
    {
        let mut writer = zip::ZipWriter::new(&mut buf);
        let options = zip::write::SimpleFileOptions::default();
        for (name, content) in entries {
            writer.start_file(*name, options).expect("Failed to start file");
            writer.write_all(content).expect("Failed to write entry");
        }
        writer.finish().expect("Failed to finish zip");
    }
    std::fs::write(path, buf.into_inner()).expect("Should write archive");
}

#[test]
fn empty_source_resolves_to_official_repository() {
    let op = FetchOperation::new(FetchConfig::default());
    let source = op
        .resolve(&FetchOptions::new("g.example"))
        .expect("Resolve should succeed");
    assert_eq!(source.kind, SourceKind::Official);
    assert_eq!(source.location, OFFICIAL_REPO_URL);
}

#[test]
fn local_zip_fetch_end_to_end() {
    let temp = tempfile::TempDir::new().expect("Failed to create temp dir");
    let archive = temp.path().join("r.example.zip");
    write_zip(
        &archive,
        &[
            ("r.example/Makefile", b"MODULE_TOPDIR = ../..\r\n"),
            ("r.example/r.example.py", b"#!/usr/bin/env python\n"),
        ],
    );

    let config = FetchConfig::default().with_workdir(temp.path().join("work"));
    let op = FetchOperation::new(config);
    let options = FetchOptions::new("r.example").with_source(archive.display().to_string());

    let report = op.execute(&options).expect("Fetch should succeed");

    assert_eq!(
        report.source.kind,
        SourceKind::LocalArchive(ArchiveFormat::Zip)
    );
    // Single wrapping directory is flattened away.
    assert!(report.directory.join("Makefile").exists());
    assert!(report.directory.join("r.example.py").exists());
    // CRLF endings were normalized.
    let makefile = std::fs::read(report.directory.join("Makefile")).expect("Should read");
    assert_eq!(makefile, b"MODULE_TOPDIR = ../..\n");
    // Touched entries are reported for the metadata layer.
    assert_eq!(
        report.entries,
        vec!["Makefile".to_string(), "r.example.py".to_string()]
    );
}

#[test]
fn preserved_report_keeps_the_working_directory() {
    let temp = tempfile::TempDir::new().expect("Failed to create temp dir");
    let src = temp.path().join("addon");
    std::fs::create_dir_all(&src).expect("Should create dir");
    std::fs::write(src.join("Makefile"), b"all:\n").expect("Should write file");

    let config = FetchConfig::default().with_workdir(temp.path().join("work"));
    let op = FetchOperation::new(config);
    let options = FetchOptions::new("g.keep")
        .with_source(src.display().to_string())
        .with_preserve(true);

    let report = op.execute(&options).expect("Fetch should succeed");
    let directory = report.directory.clone();
    drop(report);

    assert!(directory.exists());
}
