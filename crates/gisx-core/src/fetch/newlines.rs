//! CRLF to LF normalization for fetched source trees.
//!
//! Archives produced on Windows frequently carry CRLF endings that break
//! Makefile-driven builds. Binary files are detected with a control-byte
//! heuristic and left alone.

use std::path::Path;

use anyhow::Context;

/// Bytes allowed in a text file: BEL, BS, TAB, LF, FF, CR, ESC and the
/// printable range, DEL excluded.
fn is_text_byte(byte: u8) -> bool {
    matches!(byte, 7 | 8 | 9 | 10 | 12 | 13 | 27) || (byte >= 0x20 && byte != 0x7F)
}

/// Classify a buffer as binary if any byte falls outside the text set.
pub fn is_binary(bytes: &[u8]) -> bool {
    bytes.iter().any(|&b| !is_text_byte(b))
}

/// Replace CRLF with LF in every text file under `directory`, recursively.
///
/// Files are sniffed by their first 1024 bytes; unchanged files are not
/// rewritten, so the operation is idempotent.
pub fn fix_newlines(directory: &Path) -> anyhow::Result<()> {
    for entry in std::fs::read_dir(directory)
        .with_context(|| format!("Failed to read directory: {}", directory.display()))?
    {
        let entry = entry?;
        let path = entry.path();
        if path.is_dir() {
            fix_newlines(&path)?;
            continue;
        }
        if !path.is_file() {
            continue;
        }

        let data = std::fs::read(&path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;
        let sniff_len = data.len().min(1024);
        if is_binary(&data[..sniff_len]) {
            continue;
        }

        let fixed = replace_crlf(&data);
        if fixed.len() != data.len() {
            std::fs::write(&path, fixed)
                .with_context(|| format!("Failed to write file: {}", path.display()))?;
        }
    }
    Ok(())
}

fn replace_crlf(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len());
    let mut i = 0;
    while i < data.len() {
        if data[i] == b'\r' && data.get(i + 1) == Some(&b'\n') {
            out.push(b'\n');
            i += 2;
        } else {
            out.push(data[i]);
            i += 1;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nul_byte_means_binary() {
        assert!(is_binary(b"hello\0world"));
    }

    #[test]
    fn plain_text_is_not_binary() {
        assert!(!is_binary(b"#!/bin/sh\necho hello\r\n"));
        assert!(!is_binary("UTF-8 bytes are fine: \u{00e9}".as_bytes()));
    }

    #[test]
    fn crlf_is_replaced_in_text_files() {
        let temp = tempfile::TempDir::new().expect("Failed to create temp dir");
        let file = temp.path().join("script.sh");
        std::fs::write(&file, b"line one\r\nline two\r\n").expect("Should write file");

        fix_newlines(temp.path()).expect("Normalization should succeed");

        let content = std::fs::read(&file).expect("Should read file");
        assert_eq!(content, b"line one\nline two\n");
    }

    #[test]
    fn binary_files_are_untouched() {
        let temp = tempfile::TempDir::new().expect("Failed to create temp dir");
        let file = temp.path().join("blob.bin");
        let payload = b"\x00\x01\r\n\x02".to_vec();
        std::fs::write(&file, &payload).expect("Should write file");

        fix_newlines(temp.path()).expect("Normalization should succeed");

        assert_eq!(std::fs::read(&file).expect("Should read file"), payload);
    }

    #[test]
    fn normalization_is_idempotent() {
        let temp = tempfile::TempDir::new().expect("Failed to create temp dir");
        let nested = temp.path().join("sub");
        std::fs::create_dir(&nested).expect("Should create dir");
        let file = nested.join("main.c");
        std::fs::write(&file, b"int main()\r\n{\r\n}\r\n").expect("Should write file");

        fix_newlines(temp.path()).expect("First pass should succeed");
        let once = std::fs::read(&file).expect("Should read file");
        fix_newlines(temp.path()).expect("Second pass should succeed");
        let twice = std::fs::read(&file).expect("Should read file");

        assert_eq!(once, twice);
    }

    #[test]
    fn lone_cr_is_preserved() {
        let data = replace_crlf(b"a\rb\r\nc");
        assert_eq!(data, b"a\rb\nc");
    }
}
