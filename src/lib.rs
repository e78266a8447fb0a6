//! edu-offline - Offline mirror of a remote course-material tree.
//!
//! The library lists a remote folder hierarchy through an HTTP listing API,
//! keeps a persisted set of folders selected for offline use, and mirrors
//! those folders to a local directory. UIs (the `cli` and `tui` features)
//! are thin layers over these pieces.
//!
//! # Example
//!
//! ```no_run
//! use edu_offline::{AppConfig, HttpRemote, LocalMirror, NoProgress, SelectionStore, SyncEngine};
//!
//! # async fn example() -> edu_offline::Result<()> {
//! let config = AppConfig::default();
//! let engine = SyncEngine::new(
//!     HttpRemote::from_config(&config)?,
//!     LocalMirror::new(config.paths.mirror_root()),
//! );
//!
//! let selection = SelectionStore::new(config.paths.selection_file()).load()?;
//! let stats = engine.sync_selected(&selection, &NoProgress).await;
//! println!("Downloaded {} files", stats.files_downloaded);
//! # Ok(())
//! # }
//! ```

#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

pub mod api;
pub mod config;
pub mod entry;
pub mod error;
pub mod fetch;
pub mod format;
pub mod fs;
pub mod mirror;
pub mod opener;
pub mod scheduler;
pub mod selection;
pub mod sync;

#[cfg(feature = "cli")]
pub mod cli;

#[cfg(feature = "tui")]
pub mod tui;

#[cfg(test)]
mod test_utils;

// Re-export main types for convenience
pub use api::ApiClient;
pub use config::{ApiConfig, AppConfig, DownloadConfig, PathConfig, SyncConfig};
pub use entry::{Entry, children_of, parent_prefix, root_folders};
pub use error::{Error, Result};
pub use fetch::FileFetcher;
pub use format::{format_bytes, format_clock, summarize};
pub use fs::{FileSystem, TokioFileSystem};
pub use mirror::{Availability, LocalMirror};
pub use opener::open_path;
pub use scheduler::{SyncCoordinator, SyncEvent, Trigger};
pub use selection::SelectionStore;
pub use sync::{HttpRemote, NoProgress, Remote, SyncEngine, SyncProgress, SyncStats, SyncStatus};
