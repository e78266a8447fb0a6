//! Interactive TUI: root folders with sync checkboxes, a browse panel and
//! the delete-all action, with periodic sync running in the background.

mod app;
mod draw;
mod event;
mod input;
mod tasks;

use std::io;
use std::sync::Arc;
use std::time::Duration;

use crossterm::event::{Event, KeyEventKind};
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::{
    AppConfig, HttpRemote, LocalMirror, Result, SelectionStore, SyncCoordinator, SyncEngine,
    SyncEvent,
};

use self::app::App;
use self::draw::draw;
use self::event::AppEvent;
use self::input::handle_input;
use self::tasks::Services;

/// RAII guard that ensures terminal cleanup on drop.
/// Restores terminal to normal mode even if a panic occurs.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> io::Result<Self> {
        enable_raw_mode()?;
        crossterm::execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = crossterm::execute!(io::stdout(), LeaveAlternateScreen);
    }
}

/// Run the interactive TUI until the user quits.
///
/// The periodic sync loop starts immediately and is cancelled on exit. A
/// pass still running at that point is abandoned; its temporary file is
/// replaced by the next run.
///
/// # Errors
/// Returns an error if the HTTP clients cannot be built, the mirror root
/// cannot be created, or terminal I/O fails.
pub async fn run(config: &AppConfig) -> Result<()> {
    let remote = HttpRemote::from_config(config)?;
    let api = remote.api().clone();
    let mirror = LocalMirror::new(config.paths.mirror_root());
    mirror.ensure_root()?;

    let (sync_tx, mut sync_rx) = mpsc::unbounded_channel::<SyncEvent>();
    let (event_tx, mut event_rx) = mpsc::unbounded_channel::<AppEvent>();

    let coordinator = SyncCoordinator::new(
        SyncEngine::new(remote, mirror),
        SelectionStore::new(config.paths.selection_file()),
        sync_tx,
    );
    let services = Services {
        api,
        coordinator: Arc::clone(&coordinator),
        events: event_tx,
    };

    let cancel = CancellationToken::new();
    tokio::spawn(Arc::clone(&coordinator).run_periodic(config.sync.interval(), cancel.clone()));

    // Initialize terminal with RAII guard for automatic cleanup
    let _terminal_guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut app = App::new();
    log::info!("TUI started, mirror at {}", config.paths.mirror_root().display());

    loop {
        for action in app.take_actions() {
            services.perform(&mut app, action);
        }

        terminal.draw(|f| draw(f, &app))?;

        // Poll for events with 100ms timeout
        if crossterm::event::poll(Duration::from_millis(100))?
            && let Event::Key(key) = crossterm::event::read()?
            && key.kind == KeyEventKind::Press
        {
            handle_input(&mut app, key);
        }

        // Drain listing results and sync progress (non-blocking)
        while let Ok(event) = event_rx.try_recv() {
            app.apply_event(event);
        }
        while let Ok(event) = sync_rx.try_recv() {
            app.apply_sync_event(event);
        }

        if app.should_quit {
            break;
        }
    }

    cancel.cancel();

    // Show cursor before exit (terminal cleanup handled by RAII guard)
    terminal.show_cursor()?;
    log::info!("TUI closed");

    Ok(())
}
