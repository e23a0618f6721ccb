//! Blocking HTTP downloads with the default-branch retry.

use std::io::Write;
use std::path::Path;

use anyhow::Context;
use tracing::{debug, info};

use crate::error::FetchError;

/// Downloads remote archives to local files.
#[derive(Debug)]
pub struct Downloader {
    client: reqwest::blocking::Client,
}

impl Downloader {
    /// Create a downloader with the given user agent.
    pub fn new(user_agent: &str) -> Self {
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent.to_string())
            .build()
            .unwrap_or_default();
        Self { client }
    }

    /// Download `url` into `dest`, single attempt.
    pub fn download_to(&self, url: &str, dest: &Path) -> anyhow::Result<()> {
        debug!(url, dest = %dest.display(), "downloading");
        let response = self
            .client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|_| FetchError::DownloadFailed {
                url: url.to_string(),
            })?;

        let bytes = response.bytes().map_err(|_| FetchError::DownloadFailed {
            url: url.to_string(),
        })?;
        let mut file = std::fs::File::create(dest)
            .with_context(|| format!("Failed to create file: {}", dest.display()))?;
        file.write_all(&bytes)
            .with_context(|| format!("Failed to write file: {}", dest.display()))?;
        Ok(())
    }

    /// Download an archive, retrying once with the alternate default
    /// branch name when no explicit branch was requested.
    ///
    /// URLs synthesized for known hosting services guess `main` when the
    /// hosting API could not be asked; repositories that still use
    /// `master` 404 on that guess, so one substitution retry is allowed
    /// before declaring failure. Returns the URL that succeeded.
    pub fn download_archive(
        &self,
        url: &str,
        dest: &Path,
        explicit_branch: bool,
    ) -> anyhow::Result<String> {
        match self.download_to(url, dest) {
            Ok(()) => Ok(url.to_string()),
            Err(_) if !explicit_branch && url.contains("main") => {
                let fallback = url.replace("main", "master");
                info!(url = %fallback, "expected default branch not found, trying again");
                // A failure here reports the retried URL, the last one
                // actually attempted.
                self.download_to(&fallback, dest)?;
                Ok(fallback)
            }
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread;

    /// Serve `connections` HTTP requests on loopback, answering each via
    /// `respond(path) -> (status line, body)`. Joining the handle yields
    /// the request paths in order.
    fn spawn_server<F>(
        connections: usize,
        respond: F,
    ) -> (String, thread::JoinHandle<Vec<String>>)
    where
        F: Fn(&str) -> (&'static str, Vec<u8>) + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind");
        let addr = listener.local_addr().expect("Failed to get address");
        let handle = thread::spawn(move || {
            let mut requested = Vec::new();
            for _ in 0..connections {
                let (mut stream, _) = listener.accept().expect("Failed to accept");
                let mut reader = BufReader::new(&mut stream);
                let mut request_line = String::new();
                reader.read_line(&mut request_line).expect("Failed to read");
                loop {
                    let mut header = String::new();
                    reader.read_line(&mut header).expect("Failed to read header");
                    if header == "\r\n" || header.is_empty() {
                        break;
                    }
                }
                let path = request_line
                    .split_whitespace()
                    .nth(1)
                    .unwrap_or("/")
                    .to_string();
                let (status, body) = respond(&path);
                let head = format!(
                    "HTTP/1.1 {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    status,
                    body.len()
                );
                stream.write_all(head.as_bytes()).expect("Failed to write");
                stream.write_all(&body).expect("Failed to write body");
                requested.push(path);
            }
            requested
        });
        (format!("http://{}", addr), handle)
    }

    fn downcast_url(err: &anyhow::Error) -> &str {
        match err.downcast_ref::<FetchError>() {
            Some(FetchError::DownloadFailed { url }) => url,
            other => panic!("expected DownloadFailed, got {:?}", other),
        }
    }

    #[test]
    fn archive_download_retries_master_when_main_is_missing() {
        let (base, handle) = spawn_server(2, |path| {
            if path.contains("main") {
                ("404 Not Found", Vec::new())
            } else {
                ("200 OK", b"payload".to_vec())
            }
        });
        let temp = tempfile::TempDir::new().expect("Failed to create temp dir");
        let dest = temp.path().join("extension.zip");

        let url = format!("{}/repo/archive/main.zip", base);
        let downloader = Downloader::new("test-agent");
        let fetched = downloader
            .download_archive(&url, &dest, false)
            .expect("Retry should succeed");

        assert!(fetched.ends_with("/repo/archive/master.zip"));
        assert_eq!(std::fs::read(&dest).expect("Should read"), b"payload");
        let requested = handle.join().expect("Server thread should finish");
        assert_eq!(requested.len(), 2);
        assert_eq!(requested[0], "/repo/archive/main.zip");
        assert_eq!(requested[1], "/repo/archive/master.zip");
    }

    #[test]
    fn explicit_branch_fails_without_retry() {
        let (base, handle) = spawn_server(1, |_| ("404 Not Found", Vec::new()));
        let temp = tempfile::TempDir::new().expect("Failed to create temp dir");
        let dest = temp.path().join("extension.zip");

        let url = format!("{}/repo/archive/main.zip", base);
        let downloader = Downloader::new("test-agent");
        let err = downloader
            .download_archive(&url, &dest, true)
            .expect_err("Download should fail");

        assert_eq!(downcast_url(&err), url);
        let requested = handle.join().expect("Server thread should finish");
        assert_eq!(requested.len(), 1);
    }

    #[test]
    fn failed_retry_reports_the_last_attempted_url() {
        let (base, handle) = spawn_server(2, |_| ("404 Not Found", Vec::new()));
        let temp = tempfile::TempDir::new().expect("Failed to create temp dir");
        let dest = temp.path().join("extension.zip");

        let url = format!("{}/repo/archive/main.zip", base);
        let downloader = Downloader::new("test-agent");
        let err = downloader
            .download_archive(&url, &dest, false)
            .expect_err("Download should fail");

        assert_eq!(
            downcast_url(&err),
            format!("{}/repo/archive/master.zip", base)
        );
        let requested = handle.join().expect("Server thread should finish");
        assert_eq!(requested.len(), 2);
    }
}
