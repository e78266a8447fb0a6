//! Headless modes: one-shot sync, periodic watch, listing and selection
//! edits from the command line.

mod progress;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    ApiClient, AppConfig, HttpRemote, LocalMirror, SelectionStore, SyncCoordinator, SyncEngine,
    SyncEvent, SyncStats, SyncStatus, children_of, format_bytes, summarize,
};

use progress::{SpinnerProgress, print_listing, print_summary};

fn build_engine(config: &AppConfig) -> crate::Result<SyncEngine> {
    let engine = SyncEngine::new(
        HttpRemote::from_config(config)?,
        LocalMirror::new(config.paths.mirror_root()),
    );
    engine.mirror().ensure_root()?;
    Ok(engine)
}

/// Runs one pass over the stored selection and prints a summary.
///
/// # Errors
///
/// Returns an error if the selection cannot be read or the HTTP clients
/// cannot be built. Listing and download failures only show up in the
/// returned stats.
pub async fn run_sync(config: &AppConfig) -> crate::Result<SyncStats> {
    let selection = SelectionStore::new(config.paths.selection_file()).load()?;
    if selection.is_empty() {
        println!("No folders selected. Use --select <folder/> or the TUI to pick some.");
        return Ok(SyncStats::default());
    }

    let engine = build_engine(config)?;
    println!("Syncing {} folder(s) into {}", selection.len(), engine.mirror().root().display());

    let progress = SpinnerProgress::new();
    let stats = engine.sync_selected(&selection, &progress).await;
    progress.finish();

    print_summary(&stats);
    Ok(stats)
}

/// Log line for a background sync event, if it deserves one.
fn describe(event: &SyncEvent) -> Option<(log::Level, String)> {
    match event {
        SyncEvent::Status(SyncStatus::Complete(stats)) => {
            Some((log::Level::Info, format!("Sync complete: {}", summarize(stats))))
        }
        SyncEvent::Status(SyncStatus::ListingFailed(prefix)) => {
            Some((log::Level::Warn, format!("Could not list '{prefix}', will retry")))
        }
        SyncEvent::Status(_) => None,
        SyncEvent::FileDownloaded { name, bytes } => Some((
            log::Level::Info,
            format!("Downloaded {name} ({})", format_bytes(*bytes)),
        )),
        SyncEvent::FileFailed { name, error } => {
            Some((log::Level::Warn, format!("Failed {name}: {error}")))
        }
        SyncEvent::NothingSelected => Some((log::Level::Info, "No folders selected".to_string())),
        SyncEvent::Online => Some((log::Level::Debug, "Online, starting pass".to_string())),
        SyncEvent::Offline => Some((
            log::Level::Info,
            "Offline, will retry on the next tick".to_string(),
        )),
        SyncEvent::SelectionError(e) => {
            Some((log::Level::Error, format!("Selection file unreadable: {e}")))
        }
    }
}

/// Resolves on SIGINT or SIGTERM (systemd sends SIGTERM).
async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => log::info!("Received SIGINT"),
                    _ = sigterm.recv() => log::info!("Received SIGTERM"),
                }
            }
            Err(e) => {
                log::warn!("Cannot register SIGTERM handler: {e}");
                let _ = tokio::signal::ctrl_c().await;
                log::info!("Received SIGINT");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        log::info!("Received SIGINT");
    }
}

/// Runs the periodic sync loop until SIGINT/SIGTERM, logging progress.
///
/// # Errors
///
/// Returns an error if the HTTP clients cannot be built or the mirror root
/// cannot be created.
pub async fn run_watch(config: &AppConfig) -> crate::Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel();
    let coordinator = SyncCoordinator::new(
        build_engine(config)?,
        SelectionStore::new(config.paths.selection_file()),
        tx,
    );

    let cancel = CancellationToken::new();
    let interval = config.sync.interval();
    log::info!("Watching selection every {}s", interval.as_secs());
    let periodic = tokio::spawn(std::sync::Arc::clone(&coordinator).run_periodic(interval, cancel.clone()));

    let shutdown = shutdown_signal();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            () = &mut shutdown => break,
            event = rx.recv() => {
                let Some(event) = event else {
                    log::warn!("Event channel closed");
                    break;
                };
                if let Some((level, message)) = describe(&event) {
                    log::log!(level, "{message}");
                }
            }
        }
    }

    cancel.cancel();
    let _ = periodic.await;
    log::info!("Shutdown complete");
    Ok(())
}

/// Prints the visible children of `prefix` (`""` for the root).
///
/// # Errors
///
/// Returns an error if the listing request fails.
pub async fn run_list(config: &AppConfig, prefix: &str) -> crate::Result<()> {
    let api = ApiClient::new(config.api.clone())?;
    let entries = children_of(api.fetch_files(prefix).await?, prefix);
    print_listing(prefix, &entries);
    Ok(())
}

/// Adds or removes `folder` from the stored selection and prints the result.
///
/// # Errors
///
/// Returns an error if the selection cannot be read or written.
pub fn run_select(config: &AppConfig, folder: &str, selected: bool) -> crate::Result<Vec<String>> {
    let selection = SelectionStore::new(config.paths.selection_file()).toggle(folder, selected)?;
    if selection.is_empty() {
        println!("No folders selected.");
    } else {
        println!("Selected folders:");
        for prefix in &selection {
            println!("  {prefix}");
        }
    }
    Ok(selection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::PathConfig;
    use crate::config::ApiConfig;
    use crate::test_utils::{TestServer, file_body};
    use tempfile::TempDir;

    fn config(dir: &TempDir, api_url: String) -> AppConfig {
        AppConfig {
            api: ApiConfig::default().with_url(api_url),
            paths: PathConfig::new(dir.path()),
            ..AppConfig::default()
        }
    }

    #[tokio::test]
    async fn sync_with_empty_selection_does_nothing() {
        let server = TestServer::start(|_| {}).await;
        let dir = TempDir::new().unwrap();

        let stats = run_sync(&config(&dir, server.api_url())).await.unwrap();

        assert_eq!(stats, SyncStats::default());
        assert!(server.listed_prefixes().is_empty());
    }

    #[tokio::test]
    async fn select_then_sync_downloads_selected_tree() {
        let server = TestServer::start(|tree| {
            tree.folder("math/", &["math/", "math/.init", "math/a.pdf", "math/algebra/"]);
            tree.folder("math/algebra/", &["math/algebra/eq.pdf"]);
            tree.folder("science/", &["science/b.pdf"]);
            tree.file("math/a.pdf", file_body(100));
            tree.file("math/algebra/eq.pdf", file_body(200));
            tree.file("science/b.pdf", file_body(300));
        })
        .await;
        let dir = TempDir::new().unwrap();
        let config = config(&dir, server.api_url());

        assert_eq!(run_select(&config, "math/", true).unwrap(), vec!["math/"]);
        let stats = run_sync(&config).await.unwrap();

        assert_eq!(stats.files_downloaded, 2);
        assert_eq!(stats.bytes_downloaded, 300);
        assert_eq!(server.total_downloads(), 2);
        assert_eq!(server.download_count("science/b.pdf"), 0);
        let mirror = config.paths.mirror_root();
        assert_eq!(
            std::fs::read(mirror.join("math").join("algebra").join("eq.pdf")).unwrap(),
            file_body(200)
        );
        assert!(!mirror.join("math").join(".init").exists());
    }

    #[tokio::test]
    async fn list_propagates_listing_errors() {
        let server = TestServer::start(|tree| tree.fail_listing("math/")).await;
        let dir = TempDir::new().unwrap();
        let config = config(&dir, server.api_url());

        assert!(run_list(&config, "math/").await.is_err());
        assert!(run_list(&config, "").await.is_ok());
    }

    #[test]
    fn unselect_removes_folder() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir, "http://127.0.0.1:9/api/files".to_string());
        run_select(&config, "math/", true).unwrap();
        run_select(&config, "science/", true).unwrap();
        assert_eq!(run_select(&config, "math/", false).unwrap(), vec!["science/"]);
    }

    #[test]
    fn describe_levels() {
        let (level, message) = describe(&SyncEvent::Status(SyncStatus::Complete(SyncStats {
            files_downloaded: 1,
            bytes_downloaded: 2048,
            ..SyncStats::default()
        })))
        .unwrap();
        assert_eq!(level, log::Level::Info);
        assert_eq!(message, "Sync complete: 1 downloaded (2.00 KB)");

        assert!(describe(&SyncEvent::Status(SyncStatus::Starting)).is_none());
        assert_eq!(
            describe(&SyncEvent::SelectionError("bad".to_string())).map(|(l, _)| l),
            Some(log::Level::Error)
        );
        assert_eq!(
            describe(&SyncEvent::FileFailed {
                name: "a".to_string(),
                error: "404".to_string()
            })
            .map(|(l, _)| l),
            Some(log::Level::Warn)
        );
    }
}
