//! HTTP-based asset downloader.
//!
//! Streams a release asset to a scratch file, sending a bearer token when
//! one is configured. Scratch files are always fresh, so there is no
//! resume support.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Write};
use std::path::Path;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{AUTHORIZATION, USER_AGENT};
use tracing::debug;

use crate::manager::error::{ManagerError, ManagerResult};
use crate::manager::resolver::CLIENT_USER_AGENT;
use crate::manager::traits::ArchiveDownloader;

/// Default timeout for asset downloads in seconds.
pub const DEFAULT_DOWNLOAD_TIMEOUT_SECS: u64 = 300; // 5 minutes

/// Buffer size for reading/writing during downloads (64KB).
const BUFFER_SIZE: usize = 64 * 1024;

/// HTTP-based asset downloader.
#[derive(Debug)]
pub struct HttpDownloader {
    client: Client,
    token: Option<String>,
    pub(crate) timeout: Duration,
}

impl HttpDownloader {
    /// Create a new HTTP downloader with default settings.
    pub fn new() -> ManagerResult<Self> {
        Self::with_timeout(Duration::from_secs(DEFAULT_DOWNLOAD_TIMEOUT_SECS))
    }

    /// Create a new HTTP downloader with custom timeout.
    pub fn with_timeout(timeout: Duration) -> ManagerResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ManagerError::HttpError(e.to_string()))?;

        Ok(Self {
            client,
            token: None,
            timeout,
        })
    }

    /// Send `Authorization: Bearer <token>` with every download.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token.filter(|t| !t.trim().is_empty());
        self
    }

    /// Stream the response body of `url` into `dest`.
    fn stream_download(&self, url: &str, dest: &Path) -> ManagerResult<u64> {
        let mut request = self.client.get(url).header(USER_AGENT, CLIENT_USER_AGENT);
        if let Some(token) = &self.token {
            request = request.header(AUTHORIZATION, format!("Bearer {}", token));
        }

        let mut response = request.send().map_err(|e| {
            if e.is_timeout() {
                ManagerError::Timeout {
                    url: url.to_string(),
                    timeout_secs: self.timeout.as_secs(),
                }
            } else {
                ManagerError::DownloadFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(ManagerError::DownloadFailed {
                url: url.to_string(),
                reason: format!("GET request failed with status {}", status),
            });
        }

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent).map_err(|e| ManagerError::CreateDirFailed {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let file = File::create(dest).map_err(|e| ManagerError::WriteFailed {
            path: dest.to_path_buf(),
            source: e,
        })?;

        let mut writer = BufWriter::new(file);
        let mut buffer = vec![0u8; BUFFER_SIZE];
        let mut downloaded = 0u64;

        loop {
            let bytes_read =
                response
                    .read(&mut buffer)
                    .map_err(|e| ManagerError::DownloadFailed {
                        url: url.to_string(),
                        reason: format!("Read error: {}", e),
                    })?;

            if bytes_read == 0 {
                break;
            }

            writer
                .write_all(&buffer[..bytes_read])
                .map_err(|e| ManagerError::WriteFailed {
                    path: dest.to_path_buf(),
                    source: e,
                })?;

            downloaded += bytes_read as u64;
        }

        writer.flush().map_err(|e| ManagerError::WriteFailed {
            path: dest.to_path_buf(),
            source: e,
        })?;

        debug!(url, bytes = downloaded, "Download complete");
        Ok(downloaded)
    }
}

impl ArchiveDownloader for HttpDownloader {
    fn download(&self, url: &str, dest: &Path) -> ManagerResult<u64> {
        self.stream_download(url, dest)
    }
}
