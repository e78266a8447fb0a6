//! Application state model.

use chrono::Local;
use ratatui::widgets::ListState;

use crate::{Entry, SyncEvent, SyncStatus, children_of, format_clock, parent_prefix, summarize};

use super::event::{AppEvent, FolderItem};

pub const STATUS_LOADING: &str = "Loading folders...";
pub const STATUS_READY: &str = "Select folders to sync or browse their contents.";
pub const STATUS_ROOTS_FAILED: &str = "Could not load folder list. Are you online?";
pub const STATUS_NOTHING_SELECTED: &str = "Select folders to sync.";
pub const STATUS_ONLINE: &str = "Connected. Downloading...";
pub const STATUS_OFFLINE: &str =
    "No connection. Downloads resume automatically when the internet is back.";
pub const BROWSE_FAILED: &str = "Could not load contents.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Popup {
    None,
    /// Asks before wiping the local mirror.
    ConfirmDelete,
    Message { title: String, body: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Folders,
    Browser,
}

/// Side effects requested by input or events, performed by the UI loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    LoadRoots,
    Browse(String),
    Toggle { folder: String, selected: bool },
    Open(String),
    /// Re-checks the mirror, then either confirms or reports nothing to delete.
    RequestDelete,
    ClearDownloads,
    RefreshDownloads,
}

/// One row of the browse panel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowseRow<'a> {
    /// Goes to the parent prefix.
    Up(String),
    Entry(&'a Entry),
}

#[derive(Default)]
pub struct BrowseState {
    /// Prefix currently shown; `None` until the first listing arrives.
    pub prefix: Option<String>,
    /// Latest prefix asked for. Listings for anything else are stale.
    pub requested: Option<String>,
    pub entries: Vec<Entry>,
    pub error: Option<String>,
    pub loading: bool,
    pub list_state: ListState,
}

impl BrowseState {
    pub fn rows(&self) -> Vec<BrowseRow<'_>> {
        let mut rows = Vec::with_capacity(self.entries.len() + 1);
        if let Some(prefix) = self.prefix.as_deref().filter(|p| !p.is_empty()) {
            rows.push(BrowseRow::Up(parent_prefix(prefix)));
        }
        rows.extend(self.entries.iter().map(BrowseRow::Entry));
        rows
    }
}

pub struct App {
    pub popup: Popup,
    pub should_quit: bool,
    pub focus: Focus,
    // Left panel
    pub folders: Vec<FolderItem>,
    pub folder_state: ListState,
    // Right panel
    pub browse: BrowseState,
    // Status
    pub status: String,
    pub has_downloads: bool,
    pub syncing: bool,
    pub failed_files: usize,
    pub last_sync: Option<String>,
    pub last_summary: Option<String>,
    actions: Vec<Action>,
}

impl App {
    pub fn new() -> Self {
        Self {
            popup: Popup::None,
            should_quit: false,
            focus: Focus::Folders,
            folders: Vec::new(),
            folder_state: ListState::default(),
            browse: BrowseState::default(),
            status: STATUS_LOADING.to_string(),
            has_downloads: false,
            syncing: false,
            failed_files: 0,
            last_sync: None,
            last_summary: None,
            actions: vec![Action::LoadRoots, Action::RefreshDownloads],
        }
    }

    pub fn push_action(&mut self, action: Action) {
        self.actions.push(action);
    }

    /// Drains the actions queued since the last call.
    pub fn take_actions(&mut self) -> Vec<Action> {
        std::mem::take(&mut self.actions)
    }

    pub fn show_message(&mut self, title: impl Into<String>, body: impl Into<String>) {
        self.popup = Popup::Message {
            title: title.into(),
            body: body.into(),
        };
    }

    pub fn selected_count(&self) -> usize {
        self.folders.iter().filter(|f| f.checked).count()
    }

    pub fn browse_to(&mut self, prefix: String) {
        self.browse.requested = Some(prefix.clone());
        self.browse.loading = true;
        self.push_action(Action::Browse(prefix));
    }

    /// Browses the parent of the shown prefix. No-op at the root.
    pub fn browse_up(&mut self) {
        if let Some(prefix) = self.browse.prefix.as_deref().filter(|p| !p.is_empty()) {
            let parent = parent_prefix(prefix);
            self.browse_to(parent);
        }
    }

    /// Flips the checkbox of the highlighted root folder.
    pub fn toggle_folder(&mut self) {
        let Some(item) = self
            .folder_state
            .selected()
            .and_then(|i| self.folders.get_mut(i))
        else {
            return;
        };
        item.checked = !item.checked;
        let action = Action::Toggle {
            folder: item.prefix.clone(),
            selected: item.checked,
        };
        self.push_action(action);
        self.status = SyncStatus::Starting.to_string();
    }

    /// Sets the checkbox of `prefix`, if it is listed.
    pub fn set_checked(&mut self, prefix: &str, checked: bool) {
        if let Some(item) = self.folders.iter_mut().find(|f| f.prefix == prefix) {
            item.checked = checked;
        }
    }

    /// Enter on the focused panel.
    pub fn activate(&mut self) {
        match self.focus {
            Focus::Folders => {
                if let Some(prefix) = self
                    .folder_state
                    .selected()
                    .and_then(|i| self.folders.get(i))
                    .map(|f| f.prefix.clone())
                {
                    self.focus = Focus::Browser;
                    self.browse_to(prefix);
                }
            }
            Focus::Browser => {
                let Some(index) = self.browse.list_state.selected() else {
                    return;
                };
                let target = match self.browse.rows().get(index) {
                    Some(BrowseRow::Up(parent)) => Some(Action::Browse(parent.clone())),
                    Some(BrowseRow::Entry(entry)) if entry.is_folder() => {
                        Some(Action::Browse(entry.name.clone()))
                    }
                    Some(BrowseRow::Entry(entry)) => Some(Action::Open(entry.name.clone())),
                    None => None,
                };
                match target {
                    Some(Action::Browse(prefix)) => self.browse_to(prefix),
                    Some(action) => self.push_action(action),
                    None => {}
                }
            }
        }
    }

    pub fn move_cursor(&mut self, down: bool) {
        let (state, len) = match self.focus {
            Focus::Folders => (&mut self.folder_state, self.folders.len()),
            Focus::Browser => {
                let len = self.browse.rows().len();
                (&mut self.browse.list_state, len)
            }
        };
        if len == 0 {
            return;
        }
        let i = state.selected().unwrap_or(0);
        let next = if down {
            (i + 1) % len
        } else if i == 0 {
            len - 1
        } else {
            i - 1
        };
        state.select(Some(next));
    }

    pub fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::RootsLoaded(Ok(folders)) => {
                self.folders = folders;
                self.folder_state
                    .select(if self.folders.is_empty() { None } else { Some(0) });
                self.status = STATUS_READY.to_string();
            }
            AppEvent::RootsLoaded(Err(e)) => {
                log::warn!("Root listing failed: {e}");
                self.status = STATUS_ROOTS_FAILED.to_string();
            }
            AppEvent::ListingLoaded { prefix, result } => {
                if self.browse.requested.as_deref() != Some(prefix.as_str()) {
                    log::debug!("Dropping stale listing for '{prefix}'");
                    return;
                }
                self.browse.loading = false;
                match result {
                    Ok(entries) => {
                        self.browse.entries = children_of(entries, &prefix);
                        self.browse.error = None;
                    }
                    Err(e) => {
                        log::warn!("Listing '{prefix}' failed: {e}");
                        self.browse.entries.clear();
                        self.browse.error = Some(BROWSE_FAILED.to_string());
                    }
                }
                self.browse.prefix = Some(prefix);
                let has_rows = !self.browse.rows().is_empty();
                self.browse.list_state.select(has_rows.then_some(0));
            }
        }
    }

    pub fn apply_sync_event(&mut self, event: SyncEvent) {
        match event {
            SyncEvent::Status(status) => {
                match &status {
                    SyncStatus::Starting => {
                        self.syncing = true;
                        self.failed_files = 0;
                    }
                    SyncStatus::Complete(stats) => {
                        self.syncing = false;
                        self.last_sync = Some(format_clock(&Local::now()));
                        self.last_summary = Some(summarize(stats));
                        self.push_action(Action::RefreshDownloads);
                    }
                    SyncStatus::Syncing(_) | SyncStatus::ListingFailed(_) => {}
                }
                self.status = status.to_string();
            }
            SyncEvent::FileDownloaded { .. } => self.has_downloads = true,
            SyncEvent::FileFailed { .. } => self.failed_files += 1,
            SyncEvent::NothingSelected => {
                self.status = STATUS_NOTHING_SELECTED.to_string();
                self.push_action(Action::RefreshDownloads);
            }
            SyncEvent::Online => {
                self.status = STATUS_ONLINE.to_string();
                self.push_action(Action::RefreshDownloads);
            }
            SyncEvent::Offline => {
                self.status = STATUS_OFFLINE.to_string();
                self.push_action(Action::RefreshDownloads);
            }
            SyncEvent::SelectionError(e) => {
                self.status = format!("Selection file unreadable: {e}");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SyncStats;

    fn loaded_app() -> App {
        let mut app = App::new();
        app.take_actions();
        app.apply_event(AppEvent::RootsLoaded(Ok(vec![
            FolderItem {
                prefix: "math/".to_string(),
                checked: false,
            },
            FolderItem {
                prefix: "science/".to_string(),
                checked: true,
            },
        ])));
        app
    }

    #[test]
    fn app_initial_state() {
        let mut app = App::new();
        assert_eq!(app.popup, Popup::None);
        assert!(!app.should_quit);
        assert_eq!(app.focus, Focus::Folders);
        assert_eq!(app.status, STATUS_LOADING);
        assert_eq!(
            app.take_actions(),
            vec![Action::LoadRoots, Action::RefreshDownloads]
        );
        assert!(app.take_actions().is_empty());
    }

    #[test]
    fn roots_loaded_sets_status_and_cursor() {
        let app = loaded_app();
        assert_eq!(app.status, STATUS_READY);
        assert_eq!(app.folder_state.selected(), Some(0));
        assert_eq!(app.selected_count(), 1);
    }

    #[test]
    fn roots_failure_sets_offline_hint() {
        let mut app = App::new();
        app.apply_event(AppEvent::RootsLoaded(Err("timeout".to_string())));
        assert_eq!(app.status, STATUS_ROOTS_FAILED);
        assert!(app.folders.is_empty());
    }

    #[test]
    fn toggle_flips_checkbox_and_requests_sync() {
        let mut app = loaded_app();
        app.toggle_folder();
        assert!(app.folders[0].checked);
        assert_eq!(app.status, "Syncing...");
        assert_eq!(
            app.take_actions(),
            vec![Action::Toggle {
                folder: "math/".to_string(),
                selected: true
            }]
        );

        app.move_cursor(true);
        app.toggle_folder();
        assert!(!app.folders[1].checked);
        assert_eq!(
            app.take_actions(),
            vec![Action::Toggle {
                folder: "science/".to_string(),
                selected: false
            }]
        );
    }

    #[test]
    fn enter_on_folder_browses_it() {
        let mut app = loaded_app();
        app.activate();
        assert_eq!(app.focus, Focus::Browser);
        assert!(app.browse.loading);
        assert_eq!(app.take_actions(), vec![Action::Browse("math/".to_string())]);
    }

    #[test]
    fn listing_hides_sentinels_and_self_echo() {
        let mut app = loaded_app();
        app.browse_to("docs/".to_string());
        app.apply_event(AppEvent::ListingLoaded {
            prefix: "docs/".to_string(),
            result: Ok(vec![
                Entry::folder("docs/"),
                Entry::file("docs/.init", "http://x/.init"),
                Entry::folder("docs/sub/"),
                Entry::file("docs/a.txt", "http://x/a.txt"),
            ]),
        });

        let rows = app.browse.rows();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0], BrowseRow::Up(String::new()));
        assert!(matches!(rows[1], BrowseRow::Entry(e) if e.name == "docs/sub/"));
        assert!(matches!(rows[2], BrowseRow::Entry(e) if e.name == "docs/a.txt"));
        assert!(!app.browse.loading);
        assert_eq!(app.browse.list_state.selected(), Some(0));
    }

    #[test]
    fn stale_listing_is_dropped() {
        let mut app = loaded_app();
        app.browse_to("math/".to_string());
        app.browse_to("science/".to_string());
        app.apply_event(AppEvent::ListingLoaded {
            prefix: "math/".to_string(),
            result: Ok(vec![Entry::file("math/a.pdf", "http://x/a.pdf")]),
        });
        assert!(app.browse.prefix.is_none());
        assert!(app.browse.loading);

        app.apply_event(AppEvent::ListingLoaded {
            prefix: "science/".to_string(),
            result: Ok(vec![]),
        });
        assert_eq!(app.browse.prefix.as_deref(), Some("science/"));
    }

    #[test]
    fn listing_failure_keeps_back_row() {
        let mut app = loaded_app();
        app.browse_to("math/algebra/".to_string());
        app.apply_event(AppEvent::ListingLoaded {
            prefix: "math/algebra/".to_string(),
            result: Err("503".to_string()),
        });
        assert_eq!(app.browse.error.as_deref(), Some(BROWSE_FAILED));
        assert_eq!(app.browse.rows(), vec![BrowseRow::Up("math/".to_string())]);
    }

    #[test]
    fn browser_enter_opens_files_and_descends_folders() {
        let mut app = loaded_app();
        app.focus = Focus::Browser;
        app.browse_to("math/".to_string());
        app.apply_event(AppEvent::ListingLoaded {
            prefix: "math/".to_string(),
            result: Ok(vec![
                Entry::folder("math/algebra/"),
                Entry::file("math/intro.pdf", "http://x/intro.pdf"),
            ]),
        });
        app.take_actions();

        app.move_cursor(true);
        app.activate();
        assert_eq!(
            app.take_actions(),
            vec![Action::Browse("math/algebra/".to_string())]
        );

        app.move_cursor(true);
        app.activate();
        assert_eq!(
            app.take_actions(),
            vec![Action::Open("math/intro.pdf".to_string())]
        );
    }

    #[test]
    fn browse_up_goes_to_parent_and_stops_at_root() {
        let mut app = loaded_app();
        app.browse.prefix = Some("a/b/".to_string());
        app.browse_up();
        assert_eq!(app.take_actions(), vec![Action::Browse("a/".to_string())]);

        app.browse.prefix = Some(String::new());
        app.browse_up();
        assert!(app.take_actions().is_empty());
    }

    #[test]
    fn cursor_wraps_around() {
        let mut app = loaded_app();
        app.move_cursor(false);
        assert_eq!(app.folder_state.selected(), Some(1));
        app.move_cursor(true);
        assert_eq!(app.folder_state.selected(), Some(0));
    }

    #[test]
    fn sync_events_drive_status() {
        let mut app = loaded_app();

        app.apply_sync_event(SyncEvent::Status(SyncStatus::Starting));
        assert!(app.syncing);
        assert_eq!(app.status, "Syncing...");

        app.apply_sync_event(SyncEvent::FileDownloaded {
            name: "math/a.pdf".to_string(),
            bytes: 10,
        });
        assert!(app.has_downloads);

        app.apply_sync_event(SyncEvent::FileFailed {
            name: "math/b.pdf".to_string(),
            error: "404".to_string(),
        });
        assert_eq!(app.failed_files, 1);

        app.apply_sync_event(SyncEvent::Status(SyncStatus::ListingFailed(
            "science/".to_string(),
        )));
        assert_eq!(app.status, "No connection, will sync later.");

        app.apply_sync_event(SyncEvent::Status(SyncStatus::Complete(SyncStats {
            files_downloaded: 1,
            bytes_downloaded: 10,
            ..SyncStats::default()
        })));
        assert!(!app.syncing);
        assert_eq!(app.status, "Sync complete!");
        assert!(app.last_sync.is_some());
        assert_eq!(app.last_summary.as_deref(), Some("1 downloaded (10 B)"));
        assert_eq!(app.take_actions(), vec![Action::RefreshDownloads]);
    }

    #[test]
    fn periodic_tick_events_refresh_delete_state() {
        let mut app = loaded_app();
        for (event, status) in [
            (SyncEvent::NothingSelected, STATUS_NOTHING_SELECTED),
            (SyncEvent::Online, STATUS_ONLINE),
            (SyncEvent::Offline, STATUS_OFFLINE),
        ] {
            app.apply_sync_event(event);
            assert_eq!(app.status, status);
            assert_eq!(app.take_actions(), vec![Action::RefreshDownloads]);
        }
    }
}
