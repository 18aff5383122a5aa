use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::widgets::{Block, Borders, Cell, Paragraph, Row, Table, Wrap};

use crate::api::PhotoStatus;
use crate::app::AppState;

pub fn render_user_list(f: &mut Frame, area: Rect, app: &mut AppState) {
    let block = Block::default()
        .title(format!(
            "Users ({} of {})",
            app.store.users().len(),
            app.store.total_users()
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border));

    // First page still loading: nothing to show yet.
    if app.store.loading() && app.store.page() == 1 && app.store.users().is_empty() {
        let p = Paragraph::new("Loading users…")
            .alignment(Alignment::Center)
            .style(Style::default().fg(app.theme.muted))
            .block(block);
        f.render_widget(p, area);
        return;
    }
    if let Some(err) = app.store.error() {
        let p = Paragraph::new(err.to_string())
            .wrap(Wrap { trim: false })
            .style(Style::default().fg(app.theme.error))
            .block(block);
        f.render_widget(p, area);
        return;
    }

    // Leave a row for the "loading more" footer.
    let body_height = area.height.saturating_sub(4) as usize;
    if body_height > 0 {
        app.rows_per_page = body_height;
    }

    let users = app.store.users();
    let start = (app.selected_index / app.rows_per_page) * app.rows_per_page;
    let end = (start + app.rows_per_page).min(users.len());
    let slice = &users[start.min(end)..end];

    let rows = slice.iter().enumerate().map(|(i, u)| {
        let absolute_index = start + i;
        let style = if absolute_index == app.selected_index {
            Style::default()
                .fg(app.theme.highlight_fg)
                .bg(app.theme.highlight_bg)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(app.theme.text)
        };
        let photo = match app.photo_status(u.photo.as_deref()) {
            PhotoStatus::Available => "yes",
            PhotoStatus::Unavailable => "broken",
            PhotoStatus::Checking => "…",
            PhotoStatus::Missing => "",
        };
        Row::new(vec![
            Cell::from(u.full_name()),
            Cell::from(format!("{} cm", u.height)),
            Cell::from(format!("{} kg", u.weight)),
            Cell::from(u.gender.clone()),
            Cell::from(u.residence.clone()),
            Cell::from(photo),
        ])
        .style(style)
    });

    let widths = [
        Constraint::Percentage(28),
        Constraint::Length(9),
        Constraint::Length(9),
        Constraint::Length(8),
        Constraint::Percentage(40),
        Constraint::Length(7),
    ];
    let header = Row::new(vec!["NAME", "HEIGHT", "WEIGHT", "GENDER", "ADDRESS", "PHOTO"]).style(
        Style::default()
            .fg(app.theme.title)
            .add_modifier(Modifier::BOLD),
    );

    let footer = if app.store.loading() {
        "Loading more…".to_string()
    } else if users.is_empty() {
        "No users. Press n to add one.".to_string()
    } else if app.store.next_page().is_some() {
        format!("page {}/{}  (scroll down for more)", app.store.page(), app.store.total_pages())
    } else {
        format!("page {}/{}", app.store.page(), app.store.total_pages())
    };

    let table = Table::new(rows, widths)
        .header(header)
        .footer(Row::new(vec![footer]).style(Style::default().fg(app.theme.muted)))
        .block(block)
        .column_spacing(1);
    f.render_widget(table, area);
}
