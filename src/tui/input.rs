//! Keyboard input handling.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

use super::app::{Action, App, Focus, Popup};

pub fn handle_input(app: &mut App, key: KeyEvent) {
    // Global quit
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        app.should_quit = true;
        return;
    }

    match app.popup {
        Popup::ConfirmDelete => handle_confirm_input(app, key),
        Popup::Message { .. } => {
            if matches!(key.code, KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ')) {
                app.popup = Popup::None;
            }
        }
        Popup::None => handle_main_input(app, key),
    }
}

fn handle_confirm_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('y' | 'Y') => {
            app.popup = Popup::None;
            app.push_action(Action::ClearDownloads);
        }
        KeyCode::Char('n' | 'N') | KeyCode::Esc => {
            app.popup = Popup::None;
        }
        _ => {}
    }
}

fn handle_main_input(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => {
            app.should_quit = true;
        }
        KeyCode::Tab | KeyCode::BackTab => {
            app.focus = match app.focus {
                Focus::Folders => Focus::Browser,
                Focus::Browser => Focus::Folders,
            };
        }
        KeyCode::Left => app.focus = Focus::Folders,
        KeyCode::Right => app.focus = Focus::Browser,
        KeyCode::Up | KeyCode::Char('k') => app.move_cursor(false),
        KeyCode::Down | KeyCode::Char('j') => app.move_cursor(true),
        KeyCode::Char(' ') if app.focus == Focus::Folders => app.toggle_folder(),
        KeyCode::Enter => app.activate(),
        KeyCode::Backspace if app.focus == Focus::Browser => app.browse_up(),
        KeyCode::Char('d') => app.push_action(Action::RequestDelete),
        KeyCode::Char('r') => {
            app.push_action(Action::LoadRoots);
            if let Some(prefix) = app.browse.prefix.clone() {
                app.browse_to(prefix);
            }
        }
        _ => {}
    }
}
