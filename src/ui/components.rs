//! Shared UI components (status bar, keybindings panel, avatar, modals).
//!
use ratatui::Frame;
use ratatui::layout::{Alignment, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};

use crate::api::PhotoStatus;
use crate::app::form::GENDER_OPTIONS;
use crate::app::keymap::KeyAction;
use crate::app::{AppState, InputMode, ModalState};

/// Render the bottom status bar with mode and pagination.
pub fn render_status_bar(f: &mut Frame, area: Rect, app: &AppState) {
    let mode = match app.input_mode {
        InputMode::Normal => "NORMAL",
        InputMode::Editing => "EDIT",
        InputMode::Modal => "MODAL",
    };
    let store = &app.store;
    let loading = if store.loading() { "  loading…" } else { "" };
    let msg = format!(
        "mode: {mode}  users:{}/{}  page:{}/{}  page size:{}{loading}",
        store.users().len(),
        store.total_users(),
        store.page(),
        store.total_pages(),
        store.page_size(),
    );
    let p = Paragraph::new(msg).style(
        Style::default()
            .fg(app.theme.status_fg)
            .bg(app.theme.status_bg),
    );
    f.render_widget(p, area);
}

/// Render the keybindings viewer, read from the active keymap.
pub fn render_keybinds_panel(f: &mut Frame, area: Rect, app: &AppState) {
    let block = Block::default()
        .title("Keybindings")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border));
    let inner = block.inner(area);

    let sections: [(&str, &[(&str, KeyAction)]); 3] = [
        ("General:", &[("Quit", KeyAction::Quit), ("Back", KeyAction::Back), ("Toggle keybindings", KeyAction::ToggleKeybindsPane)]),
        (
            "Navigation:",
            &[
                ("Move up", KeyAction::MoveUp),
                ("Move down", KeyAction::MoveDown),
                ("Page up", KeyAction::PageUp),
                ("Page down", KeyAction::PageDown),
            ],
        ),
        (
            "Users:",
            &[
                ("Open details", KeyAction::OpenDetails),
                ("New user", KeyAction::NewUser),
                ("Edit user", KeyAction::EditUser),
                ("Delete user", KeyAction::DeleteUser),
            ],
        ),
    ];
    let form_keys = [
        ("Next / previous field", "Down, Tab / Up"),
        ("Pick gender, save", "Enter"),
        ("Save", "Ctrl+s"),
        ("Cancel", "Esc"),
    ];

    let col1_w = sections
        .iter()
        .flat_map(|(_, rows)| rows.iter().map(|(label, _)| label.len()))
        .chain(form_keys.iter().map(|(label, _)| label.len()))
        .max()
        .unwrap_or(0)
        .min((inner.width as usize).saturating_sub(10));
    let row = |label: &str, value: String| -> Line<'static> {
        let lbl: String = label.chars().take(col1_w).collect();
        Line::from(vec![
            Span::raw(format!("  {lbl:>col1_w$} │ ")),
            Span::styled(value, Style::default().add_modifier(Modifier::ITALIC)),
        ])
    };
    let heading = |text: &str| -> Line<'static> {
        Line::from(Span::styled(text.to_string(), Style::default().add_modifier(Modifier::BOLD)))
    };

    let mut lines: Vec<Line> = Vec::new();
    for (title, rows) in sections {
        lines.push(heading(title));
        for (label, action) in rows {
            lines.push(row(label, app.keymap.keys_for(*action).join(", ")));
        }
        lines.push(Line::raw(""));
    }
    lines.push(heading("Form:"));
    for (label, keys) in form_keys {
        lines.push(row(label, keys.to_string()));
    }

    let p = Paragraph::new(lines).wrap(Wrap { trim: false });
    f.render_widget(block, area);
    f.render_widget(p, inner);
}

/// Compute a rectangle centered within `area` with a maximum size.
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect {
        x,
        y,
        width: width.min(area.width),
        height: height.min(area.height),
    }
}

/// Initials shown in place of the photo.
pub fn initials(first_name: &str, last_name: &str) -> String {
    let letters: String = [first_name, last_name]
        .iter()
        .filter_map(|s| s.trim().chars().next())
        .flat_map(char::to_uppercase)
        .collect();
    if letters.is_empty() { "?".to_string() } else { letters }
}

/// Photo placeholder box: initials with the reachability of the photo URL.
pub fn render_avatar(f: &mut Frame, area: Rect, app: &AppState, initials: &str, status: PhotoStatus) {
    let border = match status {
        PhotoStatus::Available => app.theme.highlight_fg,
        PhotoStatus::Unavailable => app.theme.error,
        PhotoStatus::Checking | PhotoStatus::Missing => app.theme.border,
    };
    let block = Block::default()
        .title("Photo")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border));
    let inner = block.inner(area);
    let pad = inner.height.saturating_sub(2) / 2;
    let mut lines: Vec<Line> = (0..pad).map(|_| Line::raw("")).collect();
    lines.push(Line::from(Span::styled(
        initials.to_string(),
        Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(Span::styled(
        status.label(),
        Style::default().fg(app.theme.muted),
    )));
    let p = Paragraph::new(lines).alignment(Alignment::Center);
    f.render_widget(block, area);
    f.render_widget(p, inner);
}

/// Render a blocking notification.
pub fn render_info_modal(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    if let ModalState::Info { title, message } = state {
        let max_w = area.width.saturating_sub(6).max(30);
        let min_w = 44u16.min(max_w);
        let text_lines = message.lines().count() as u16;
        let approx_lines = (message.len() as u16 / (min_w.saturating_sub(4).max(10))).max(text_lines);
        let max_h = area.height.saturating_sub(6).max(5);
        let height = (approx_lines + 4).min(max_h).max(5);
        let rect = centered_rect(min_w, height, area);
        let mut lines: Vec<Line> = message.lines().map(|l| Line::raw(l.to_string())).collect();
        lines.push(Line::raw(""));
        lines.push(Line::from(Span::styled("press any key", Style::default().fg(app.theme.muted))));
        let p = Paragraph::new(lines)
            .wrap(Wrap { trim: false })
            .block(
                Block::default()
                    .title(title.clone())
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(app.theme.error)),
            );
        f.render_widget(Clear, rect);
        f.render_widget(p, rect);
    }
}

pub fn render_delete_confirm(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    if let ModalState::DeleteConfirm { name, selected, .. } = state {
        let rect = centered_rect(48, 7, area);
        let button = |label: &'static str, idx: usize| {
            if idx == *selected {
                Span::styled(
                    format!("[ {label} ]"),
                    Style::default()
                        .fg(app.theme.highlight_fg)
                        .bg(app.theme.highlight_bg)
                        .add_modifier(Modifier::BOLD),
                )
            } else {
                Span::raw(format!("  {label}  "))
            }
        };
        let lines = vec![
            Line::raw(format!("Delete {name}?")),
            Line::raw(""),
            Line::from(vec![button("Yes", 0), Span::raw("   "), button("No", 1)]),
        ];
        let p = Paragraph::new(lines).alignment(Alignment::Center).block(
            Block::default()
                .title("Confirm deletion")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
        f.render_widget(Clear, rect);
        f.render_widget(p, rect);
    }
}

pub fn render_gender_picker(f: &mut Frame, area: Rect, app: &AppState, state: &ModalState) {
    if let ModalState::GenderPicker { selected } = state {
        let rect = centered_rect(28, GENDER_OPTIONS.len() as u16 + 2, area);
        let mut text = String::new();
        for (idx, (label, _)) in GENDER_OPTIONS.iter().enumerate() {
            if idx == *selected {
                text.push_str(&format!("▶ {label}\n"));
            } else {
                text.push_str(&format!("  {label}\n"));
            }
        }
        let p = Paragraph::new(text).block(
            Block::default()
                .title("Gender")
                .borders(Borders::ALL)
                .border_style(Style::default().fg(app.theme.border)),
        );
        f.render_widget(Clear, rect);
        f.render_widget(p, rect);
    }
}
