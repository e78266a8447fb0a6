//! Sync engine: walks selected remote folders and fills the local mirror.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;

use async_trait::async_trait;

use crate::api::ApiClient;
use crate::config::AppConfig;
use crate::entry::{Entry, children_of};
use crate::error::Result;
use crate::fetch::FileFetcher;
use crate::fs::{FileSystem, TokioFileSystem};
use crate::mirror::LocalMirror;

/// The remote side of a sync pass.
#[async_trait]
pub trait Remote: Send + Sync {
    /// Lists the entries below `prefix`.
    async fn list(&self, prefix: &str) -> Result<Vec<Entry>>;

    /// Downloads `url` to `dest`, returning the bytes written.
    async fn download(&self, url: &str, dest: &Path) -> Result<u64>;

    /// Connectivity heuristic used before periodic passes.
    async fn is_online(&self) -> bool;
}

/// [`Remote`] backed by the HTTP listing endpoint and file host.
pub struct HttpRemote {
    api: ApiClient,
    fetcher: FileFetcher,
}

impl HttpRemote {
    #[must_use]
    pub const fn new(api: ApiClient, fetcher: FileFetcher) -> Self {
        Self { api, fetcher }
    }

    /// Builds the listing client and fetcher from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if either HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::new(
            ApiClient::new(config.api.clone())?,
            FileFetcher::new(config.download.clone())?,
        ))
    }

    #[must_use]
    pub const fn api(&self) -> &ApiClient {
        &self.api
    }
}

#[async_trait]
impl Remote for HttpRemote {
    async fn list(&self, prefix: &str) -> Result<Vec<Entry>> {
        self.api.fetch_files(prefix).await
    }

    async fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        self.fetcher.download_file(url, dest).await
    }

    async fn is_online(&self) -> bool {
        self.api.is_online().await
    }
}

/// Counters for one sync pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncStats {
    pub folders_listed: usize,
    pub folders_failed: usize,
    pub files_downloaded: usize,
    pub files_skipped: usize,
    pub files_failed: usize,
    pub bytes_downloaded: u64,
}

impl SyncStats {
    fn merge(&mut self, other: Self) {
        self.folders_listed += other.folders_listed;
        self.folders_failed += other.folders_failed;
        self.files_downloaded += other.files_downloaded;
        self.files_skipped += other.files_skipped;
        self.files_failed += other.files_failed;
        self.bytes_downloaded += other.bytes_downloaded;
    }

    /// True when every listing and download of the pass succeeded.
    #[must_use]
    pub const fn is_clean(&self) -> bool {
        self.folders_failed == 0 && self.files_failed == 0
    }
}

/// Coarse status reported while a pass runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    /// A pass over the selection began.
    Starting,
    /// Walking one selected folder.
    Syncing(String),
    /// Listing a folder failed; it is retried on the next pass.
    ListingFailed(String),
    /// The pass ran to its end. Not a success signal: see
    /// [`SyncStats::is_clean`].
    Complete(SyncStats),
}

impl fmt::Display for SyncStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Starting => write!(f, "Syncing..."),
            Self::Syncing(prefix) => write!(f, "Syncing {prefix}"),
            Self::ListingFailed(_) => write!(f, "No connection, will sync later."),
            Self::Complete(_) => write!(f, "Sync complete!"),
        }
    }
}

/// Receives status updates during a pass.
///
/// All methods have default no-op implementations for convenience.
pub trait SyncProgress: Send + Sync {
    fn on_status(&self, _status: &SyncStatus) {}

    fn on_file_downloaded(&self, _name: &str, _bytes: u64) {}

    fn on_file_error(&self, _name: &str, _error: &str) {}
}

/// A null progress implementation that ignores all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoProgress;

impl SyncProgress for NoProgress {}

/// Mirrors selected remote folders into a [`LocalMirror`].
pub struct SyncEngine<R: Remote = HttpRemote, F: FileSystem = TokioFileSystem> {
    remote: R,
    mirror: LocalMirror,
    fs: F,
}

impl<R: Remote> SyncEngine<R, TokioFileSystem> {
    #[must_use]
    pub const fn new(remote: R, mirror: LocalMirror) -> Self {
        Self {
            remote,
            mirror,
            fs: TokioFileSystem,
        }
    }
}

impl<R: Remote, F: FileSystem> SyncEngine<R, F> {
    #[must_use]
    pub const fn with_fs(remote: R, mirror: LocalMirror, fs: F) -> Self {
        Self { remote, mirror, fs }
    }

    #[must_use]
    pub const fn remote(&self) -> &R {
        &self.remote
    }

    #[must_use]
    pub const fn mirror(&self) -> &LocalMirror {
        &self.mirror
    }

    /// Mirrors `prefix` and everything below it.
    ///
    /// A folder whose listing fails is reported and skipped; its siblings
    /// still sync. Files are fetched only when nothing exists at their local
    /// path yet. Individual download failures are logged and counted, never
    /// propagated. Each prefix is listed at most once per call.
    pub async fn sync_folder(&self, prefix: &str, progress: &dyn SyncProgress) -> SyncStats {
        let mut stats = SyncStats::default();
        let mut pending = vec![prefix.to_string()];
        let mut visited = HashSet::new();

        while let Some(current) = pending.pop() {
            if !visited.insert(current.clone()) {
                continue;
            }

            let entries = match self.remote.list(&current).await {
                Ok(entries) => entries,
                Err(e) => {
                    log::warn!("Listing '{current}' failed: {e}");
                    stats.folders_failed += 1;
                    progress.on_status(&SyncStatus::ListingFailed(current));
                    continue;
                }
            };
            stats.folders_listed += 1;

            match self.mirror.local_path(&current) {
                Ok(dir) => {
                    if let Err(e) = self.fs.create_dir_all(&dir).await {
                        log::error!("Cannot create {}: {e}", dir.display());
                    }
                }
                Err(e) => {
                    log::warn!("{e}");
                    continue;
                }
            }

            let mut subfolders = Vec::new();
            for entry in children_of(entries, &current) {
                if entry.is_folder() {
                    subfolders.push(entry.name);
                } else {
                    self.sync_file(&entry, &mut stats, progress).await;
                }
            }
            // Reversed so sub-folders are walked in listing order.
            pending.extend(subfolders.into_iter().rev());
        }

        stats
    }

    async fn sync_file(&self, entry: &Entry, stats: &mut SyncStats, progress: &dyn SyncProgress) {
        let dest = match self.mirror.local_path(&entry.name) {
            Ok(dest) => dest,
            Err(e) => {
                log::warn!("{e}");
                stats.files_failed += 1;
                progress.on_file_error(&entry.name, &e.to_string());
                return;
            }
        };

        // Any existing file, whatever its size, counts as synced.
        if self.fs.file_exists(&dest).await {
            stats.files_skipped += 1;
            return;
        }

        let Some(url) = entry.url.as_deref() else {
            log::warn!("Listing entry '{}' has no download URL", entry.name);
            stats.files_failed += 1;
            progress.on_file_error(&entry.name, "no download URL");
            return;
        };

        match self.remote.download(url, &dest).await {
            Ok(bytes) => {
                stats.files_downloaded += 1;
                stats.bytes_downloaded += bytes;
                progress.on_file_downloaded(&entry.name, bytes);
            }
            Err(e) => {
                log::error!("Download failed: {url}: {e}");
                stats.files_failed += 1;
                progress.on_file_error(&entry.name, &e.to_string());
            }
        }
    }

    /// Runs [`sync_folder`](Self::sync_folder) over every selected prefix in
    /// order. Reports [`SyncStatus::Complete`] at the end even when every
    /// folder failed.
    pub async fn sync_selected(&self, selection: &[String], progress: &dyn SyncProgress) -> SyncStats {
        log::info!("Sync pass over {} folder(s)", selection.len());
        progress.on_status(&SyncStatus::Starting);

        let mut stats = SyncStats::default();
        for prefix in selection {
            progress.on_status(&SyncStatus::Syncing(prefix.clone()));
            stats.merge(self.sync_folder(prefix, progress).await);
        }

        log::info!(
            "Sync pass finished: {} downloaded, {} skipped, {} failed, {} folder(s) unreachable",
            stats.files_downloaded,
            stats.files_skipped,
            stats.files_failed,
            stats.folders_failed
        );
        progress.on_status(&SyncStatus::Complete(stats));
        stats
    }
}
