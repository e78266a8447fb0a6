//! Event types for TUI mode.

use crate::Entry;

/// Root folder row of the left panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FolderItem {
    pub prefix: String,
    pub checked: bool,
}

/// Results of listing loads, sent from background tasks to the TUI.
///
/// Sync progress travels on its own channel as [`crate::SyncEvent`].
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// Root listing finished, with checkbox state taken from the selection.
    RootsLoaded(Result<Vec<FolderItem>, String>),
    /// Listing of `prefix` for the browse panel finished.
    ListingLoaded {
        prefix: String,
        result: Result<Vec<Entry>, String>,
    },
}
