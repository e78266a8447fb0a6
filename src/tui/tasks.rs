//! Side effects requested by the UI: background listings, selection
//! writes, sync triggers, opening files and clearing the mirror.

use std::sync::Arc;

use tokio::sync::mpsc;

use crate::{
    ApiClient, Availability, Remote, SelectionStore, SyncCoordinator, open_path, root_folders,
};

use super::app::{Action, App, Popup};
use super::event::{AppEvent, FolderItem};

pub const NOT_AVAILABLE: &str = "The file is not fully downloaded yet or was moved.";

/// Shared services the UI loop hands actions to.
pub struct Services<R: Remote = crate::HttpRemote> {
    pub api: ApiClient,
    pub coordinator: Arc<SyncCoordinator<R>>,
    pub events: mpsc::UnboundedSender<AppEvent>,
}

impl<R: Remote + 'static> Services<R> {
    fn store(&self) -> &SelectionStore {
        self.coordinator.store()
    }

    pub fn perform(&self, app: &mut App, action: Action) {
        match action {
            Action::LoadRoots => self.spawn_load_roots(),
            Action::Browse(prefix) => self.spawn_browse(prefix),
            Action::Toggle { folder, selected } => {
                if let Err(e) = self.store().toggle(&folder, selected) {
                    log::error!("Cannot save selection: {e}");
                    app.set_checked(&folder, !selected);
                    app.status = format!("Could not save selection: {e}");
                    return;
                }
                self.coordinator.trigger();
            }
            Action::Open(name) => open_file(app, &self.coordinator, &name),
            Action::RequestDelete => {
                app.has_downloads = self.coordinator.engine().mirror().has_downloads();
                if app.has_downloads {
                    app.popup = Popup::ConfirmDelete;
                } else {
                    app.show_message("Nothing to delete", "No files have been downloaded yet.");
                }
            }
            Action::ClearDownloads => {
                match self.coordinator.engine().mirror().clear_downloads() {
                    Ok(()) => app.show_message("Done", "All downloaded files have been removed!"),
                    Err(e) => {
                        log::error!("Clearing downloads failed: {e}");
                        app.show_message("Error", format!("Could not delete:\n{e}"));
                    }
                }
                app.has_downloads = self.coordinator.engine().mirror().has_downloads();
            }
            Action::RefreshDownloads => {
                app.has_downloads = self.coordinator.engine().mirror().has_downloads();
            }
        }
    }

    fn spawn_load_roots(&self) {
        let api = self.api.clone();
        let store = self.store().clone();
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = match api.fetch_files("").await {
                Ok(entries) => {
                    // An unreadable selection shows every box unchecked.
                    let selected = store.load().unwrap_or_else(|e| {
                        log::warn!("Cannot read selection: {e}");
                        Vec::new()
                    });
                    Ok(root_folders(&entries)
                        .into_iter()
                        .map(|prefix| FolderItem {
                            checked: selected.contains(&prefix),
                            prefix,
                        })
                        .collect())
                }
                Err(e) => Err(e.to_string()),
            };
            let _ = tx.send(AppEvent::RootsLoaded(result));
        });
    }

    fn spawn_browse(&self, prefix: String) {
        let api = self.api.clone();
        let tx = self.events.clone();
        tokio::spawn(async move {
            let result = api.fetch_files(&prefix).await.map_err(|e| e.to_string());
            let _ = tx.send(AppEvent::ListingLoaded { prefix, result });
        });
    }
}

fn open_file<R: Remote + 'static>(app: &mut App, coordinator: &SyncCoordinator<R>, name: &str) {
    match coordinator.engine().mirror().availability(name) {
        Ok(Availability::Ready(path)) => {
            if let Err(e) = open_path(&path) {
                log::error!("Cannot open {}: {e}", path.display());
                app.show_message("Error", format!("Could not open the file:\n{e}"));
            }
        }
        Ok(Availability::NotYet(path)) => {
            log::info!("{} is not available yet", path.display());
            app.show_message("Not available", NOT_AVAILABLE);
        }
        Err(e) => app.show_message("Error", format!("Could not open the file:\n{e}")),
    }
}
