//! Configuration types for listing, downloading and the sync schedule.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Listing endpoint used when no configuration overrides it.
pub const DEFAULT_API_URL: &str = "https://edu-24-7-3.onrender.com/api/files";

/// Host probed to decide whether the machine is online.
pub const DEFAULT_PROBE_URL: &str = "https://www.google.com";

/// Directory name used under the per-user config and data roots.
pub const APP_DIR: &str = "edu-offline";

/// Environment variable overriding [`ApiConfig::url`].
pub const ENV_API_URL: &str = "EDU_OFFLINE_API_URL";

/// Environment variable overriding [`PathConfig::data_dir`].
pub const ENV_DATA_DIR: &str = "EDU_OFFLINE_DATA_DIR";

/// Remote listing endpoint settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Listing endpoint, queried with an optional `prefix` parameter.
    pub url: String,
    /// External host used as a connectivity heuristic.
    pub probe_url: String,
    /// Timeout for a single listing request, in seconds.
    pub listing_timeout_secs: u64,
    /// Timeout for the connectivity probe, in seconds.
    pub probe_timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            url: DEFAULT_API_URL.to_string(),
            probe_url: DEFAULT_PROBE_URL.to_string(),
            listing_timeout_secs: 10,
            probe_timeout_secs: 3,
        }
    }
}

impl ApiConfig {
    /// Sets the listing endpoint.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    /// Sets the connectivity probe URL.
    #[must_use]
    pub fn with_probe_url(mut self, url: impl Into<String>) -> Self {
        self.probe_url = url.into();
        self
    }

    /// Listing timeout, never shorter than one second.
    #[must_use]
    pub fn listing_timeout(&self) -> Duration {
        Duration::from_secs(self.listing_timeout_secs.max(1))
    }

    /// Probe timeout, never shorter than one second.
    #[must_use]
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs.max(1))
    }
}

/// Configuration for file transfers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DownloadConfig {
    /// Connect and read timeout for a file transfer, in seconds.
    pub timeout_secs: u64,
    /// Write buffer size used while streaming a body to disk.
    pub chunk_size: usize,
    /// Whether to remove the temp file when a transfer fails.
    pub cleanup_on_error: bool,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            chunk_size: 4096,
            cleanup_on_error: true,
        }
    }
}

impl DownloadConfig {
    /// Creates a new configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the transfer timeout in seconds.
    #[must_use]
    pub const fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// Sets the write buffer size.
    #[must_use]
    pub const fn with_chunk_size(mut self, size: usize) -> Self {
        self.chunk_size = size;
        self
    }

    /// Sets whether to clean up temp files on transfer error.
    #[must_use]
    pub const fn with_cleanup_on_error(mut self, cleanup: bool) -> Self {
        self.cleanup_on_error = cleanup;
        self
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

/// Background sync schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Seconds between periodic sync passes.
    pub interval_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self { interval_secs: 60 }
    }
}

impl SyncConfig {
    /// Period of the sync loop. A zero setting is treated as one second
    /// since `tokio::time::interval` rejects a zero period.
    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }
}

/// Where the mirror, the selection file and the log live.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Per-user application data directory.
    pub data_dir: PathBuf,
}

impl Default for PathConfig {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir().unwrap_or_else(|| PathBuf::from("."));
        Self {
            data_dir: data_dir.join(APP_DIR),
        }
    }
}

impl PathConfig {
    /// Creates a path configuration rooted at `data_dir`.
    #[must_use]
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    /// Root of the local mirror tree.
    #[must_use]
    pub fn mirror_root(&self) -> PathBuf {
        self.data_dir.join("files")
    }

    /// JSON file holding the selected folder prefixes.
    #[must_use]
    pub fn selection_file(&self) -> PathBuf {
        self.data_dir.join("selected.json")
    }

    /// Log file used while the TUI owns the terminal.
    #[must_use]
    pub fn log_file(&self) -> PathBuf {
        self.data_dir.join("edu-offline.log")
    }
}

/// Complete application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub api: ApiConfig,
    pub download: DownloadConfig,
    pub sync: SyncConfig,
    pub paths: PathConfig,
}

impl AppConfig {
    /// Creates a new config with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Default location of the configuration file.
    #[must_use]
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR)
            .join("config.toml")
    }

    /// Loads configuration from `path`. Keys missing from the file keep
    /// their default values.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// sets a timeout or interval to zero.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        config
            .validate()
            .map_err(|e| Error::Config(format!("{}: {e}", path.display())))?;
        Ok(config)
    }

    /// Checks that every duration setting is non-zero.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the first zero setting.
    pub fn validate(&self) -> Result<()> {
        let durations = [
            ("api.listing_timeout_secs", self.api.listing_timeout_secs),
            ("api.probe_timeout_secs", self.api.probe_timeout_secs),
            ("download.timeout_secs", self.download.timeout_secs),
            ("sync.interval_secs", self.sync.interval_secs),
        ];
        match durations.iter().find(|(_, secs)| *secs == 0) {
            Some((key, _)) => Err(Error::Config(format!("{key} must be at least 1"))),
            None => Ok(()),
        }
    }

    /// Loads configuration from `path`, writing a template with defaults
    /// first if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the template cannot be written or the existing
    /// file cannot be parsed.
    pub fn load_or_create(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load(path);
        }
        let config = Self::default();
        config.save(path)?;
        log::info!("Wrote default configuration to {}", path.display());
        Ok(config)
    }

    /// Writes the configuration as TOML, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let toml_str = toml::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))?;
        std::fs::write(path, toml_str)?;
        Ok(())
    }

    /// Applies `EDU_OFFLINE_*` overrides from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up through `lookup`. Empty values are ignored.
    #[must_use]
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(url) = lookup(ENV_API_URL).filter(|v| !v.is_empty()) {
            self.api.url = url;
        }
        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.is_empty()) {
            self.paths.data_dir = PathBuf::from(dir);
        }
        self
    }
}
