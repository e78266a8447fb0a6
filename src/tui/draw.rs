//! All drawing / rendering functions.

use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap};

use super::app::{App, BrowseRow, Focus, Popup};

pub fn draw(frame: &mut ratatui::Frame, app: &App) {
    draw_main(frame, app);
    match &app.popup {
        Popup::None => {}
        Popup::ConfirmDelete => draw_confirm_popup(frame),
        Popup::Message { title, body } => draw_message_popup(frame, title, body),
    }
}

fn panel_style(app: &App, panel: Focus) -> Style {
    if app.focus == panel && app.popup == Popup::None {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn draw_main(frame: &mut ratatui::Frame, app: &App) {
    let area = frame.area();

    let title_right = match (&app.last_sync, &app.last_summary) {
        (Some(at), Some(summary)) => format!(" Last sync {at}: {summary} "),
        _ => format!(" {} folder(s) selected ", app.selected_count()),
    };

    let outer = Block::default()
        .title(" Edu 24/7 Offline ")
        .title(Line::from(title_right).alignment(Alignment::Right))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(if app.syncing {
            Color::Yellow
        } else {
            Color::Cyan
        }));
    let inner = outer.inner(area);
    frame.render_widget(outer, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(5),    // Panels
            Constraint::Length(1), // Status line
            Constraint::Length(1), // Controls bar
        ])
        .split(inner);

    let panels = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
        .split(chunks[0]);

    draw_folders(frame, app, panels[0]);
    draw_browser(frame, app, panels[1]);

    let status_line =
        Paragraph::new(Line::from(build_status_line(app))).style(Style::default().fg(Color::White));
    frame.render_widget(status_line, chunks[1]);

    frame.render_widget(
        Paragraph::new(Line::from(build_controls(app))).alignment(Alignment::Center),
        chunks[2],
    );
}

fn build_status_line(app: &App) -> Vec<Span<'_>> {
    let mut spans = vec![Span::styled(
        format!(" {}", app.status),
        Style::default().fg(if app.syncing {
            Color::Yellow
        } else {
            Color::Green
        }),
    )];

    if app.failed_files > 0 {
        spans.push(Span::styled(" | ", Style::default().fg(Color::DarkGray)));
        spans.push(Span::styled(
            format!("{} failed", app.failed_files),
            Style::default().fg(Color::Red),
        ));
    }

    spans
}

fn build_controls(app: &App) -> Vec<Span<'static>> {
    let dim = Style::default().fg(Color::DarkGray);
    let delete = if app.has_downloads {
        Style::default().fg(Color::Red)
    } else {
        dim
    };
    vec![
        Span::styled("tab:switch  space:sync  enter:open  bksp:back  r:reload  ", dim),
        Span::styled("d:delete downloads", delete),
        Span::styled("  q:quit", dim),
    ]
}

fn draw_folders(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .folders
        .iter()
        .map(|f| {
            let (mark, color) = if f.checked {
                ("[x]", Color::Green)
            } else {
                ("[ ]", Color::White)
            };
            ListItem::new(format!(
                "{mark} \u{1f4c1} {}",
                f.prefix.trim_matches('/')
            ))
            .style(Style::default().fg(color))
        })
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .title(" Root folders ")
                .borders(Borders::ALL)
                .border_style(panel_style(app, Focus::Folders)),
        )
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    frame.render_stateful_widget(list, area, &mut app.folder_state.clone());
}

fn draw_browser(frame: &mut ratatui::Frame, app: &App, area: Rect) {
    let browse = &app.browse;
    let title = match (&browse.prefix, browse.loading) {
        (_, true) => " Loading... ".to_string(),
        (Some(prefix), false) if !prefix.is_empty() => format!(" {prefix} "),
        (Some(_), false) => " / ".to_string(),
        (None, false) => " Contents ".to_string(),
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(panel_style(app, Focus::Browser));

    let prefix = browse.prefix.as_deref().unwrap_or_default();
    let mut items: Vec<ListItem> = browse
        .rows()
        .iter()
        .map(|row| match row {
            BrowseRow::Up(_) => {
                ListItem::new("\u{2b05} Back").style(Style::default().fg(Color::Cyan))
            }
            BrowseRow::Entry(entry) if entry.is_folder() => {
                ListItem::new(format!("\u{1f4c1} {}", entry.label(prefix)))
            }
            BrowseRow::Entry(entry) => {
                ListItem::new(format!("   \u{1f4c4} {}", entry.label(prefix)))
                    .style(Style::default().fg(Color::Gray))
            }
        })
        .collect();

    if let Some(error) = &browse.error {
        items.push(ListItem::new(error.as_str()).style(Style::default().fg(Color::Red)));
    } else if browse.prefix.is_none() && !browse.loading {
        items.push(
            ListItem::new("Press enter on a folder to browse it.")
                .style(Style::default().fg(Color::DarkGray)),
        );
    }

    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED));
    frame.render_stateful_widget(list, area, &mut browse.list_state.clone());
}

fn draw_confirm_popup(frame: &mut ratatui::Frame) {
    let area = centered_rect(56, 7, frame.area());
    frame.render_widget(Clear, area);

    let text = vec![
        Line::from("Delete ALL downloaded files?"),
        Line::from("This cannot be undone."),
        Line::from(""),
        Line::from(Span::styled(
            "y: delete | n/Esc: cancel",
            Style::default().fg(Color::DarkGray),
        )),
    ];
    let popup = Paragraph::new(text)
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .title(" Confirm ")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Red)),
        );
    frame.render_widget(popup, area);
}

fn draw_message_popup(frame: &mut ratatui::Frame, title: &str, body: &str) {
    let area = centered_rect(56, 8, frame.area());
    frame.render_widget(Clear, area);

    let mut text: Vec<Line> = body.lines().map(Line::from).collect();
    text.push(Line::from(""));
    text.push(Line::from(Span::styled(
        "Enter/Esc to close",
        Style::default().fg(Color::DarkGray),
    )));
    let popup = Paragraph::new(text)
        .alignment(Alignment::Center)
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .title(format!(" {title} "))
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );
    frame.render_widget(popup, area);
}

/// Returns a centered rectangle of the given size within `area`.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width.min(area.width), height.min(area.height))
}
