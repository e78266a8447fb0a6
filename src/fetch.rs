//! Streaming file transfers into the local mirror.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use futures::StreamExt;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::config::DownloadConfig;
use crate::error::{Error, Result};
use crate::fs::{FileSystem, TokioFileSystem};
use crate::mirror::PART_SUFFIX;

/// Returns the temp path a download of `path` is written to: a hidden
/// sibling carrying [`PART_SUFFIX`], which no mirrored file can use.
#[must_use]
pub fn part_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(PART_SUFFIX);
    path.with_file_name(name)
}

/// Downloads single files, writing through a temp file that is renamed
/// onto the destination only after the whole body arrived.
pub struct FileFetcher<F: FileSystem = TokioFileSystem> {
    http: reqwest::Client,
    config: DownloadConfig,
    fs: F,
}

impl FileFetcher<TokioFileSystem> {
    /// Creates a fetcher writing through `tokio::fs`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: DownloadConfig) -> Result<Self> {
        Self::with_fs(config, TokioFileSystem)
    }
}

impl<F: FileSystem> FileFetcher<F> {
    /// Creates a fetcher with a custom file system implementation.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_fs(config: DownloadConfig, fs: F) -> Result<Self> {
        // Bodies can be large, so the timeout bounds connect and each read
        // rather than the whole transfer.
        let http = reqwest::Client::builder()
            .connect_timeout(config.timeout())
            .read_timeout(config.timeout())
            .build()?;
        Ok(Self { http, config, fs })
    }

    #[must_use]
    pub const fn config(&self) -> &DownloadConfig {
        &self.config
    }

    #[must_use]
    pub const fn fs(&self) -> &F {
        &self.fs
    }

    async fn ensure_parent_dir(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            self.fs.create_dir_all(parent).await?;
        }
        Ok(())
    }

    /// Streams `url` into `dest` and returns the number of bytes written.
    ///
    /// The body is written to [`part_path`] and renamed to `dest` on
    /// success, so an interrupted transfer never leaves a file at `dest`. On
    /// error the temp file is removed if `cleanup_on_error` is set.
    ///
    /// # Errors
    ///
    /// Returns an error on network failure, a non-success status, or a
    /// failed write or rename.
    pub async fn download_file(&self, url: &str, dest: &Path) -> Result<u64> {
        self.ensure_parent_dir(dest).await?;

        let pp = part_path(dest);
        match self.stream_to(url, &pp).await {
            Ok(written) => {
                self.fs.rename_file(&pp, dest).await?;
                log::info!("Downloaded {} ({written} bytes)", dest.display());
                Ok(written)
            }
            Err(e) => {
                if self.config.cleanup_on_error {
                    let _ = self.fs.remove_file(&pp).await;
                }
                Err(e)
            }
        }
    }

    async fn stream_to(&self, url: &str, part: &Path) -> Result<u64> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(Error::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let file = self.fs.create_file(part).await?;
        let mut writer = BufWriter::with_capacity(self.config.chunk_size.max(1), file);
        let mut body = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = body.next().await {
            let chunk = chunk?;
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        writer.flush().await?;

        Ok(written)
    }
}
