use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::app::AppState;
use crate::ui::components;

/// Detail view of the user with `id`. Shows the store's loaded user once it
/// matches; loading and error states come from the store.
pub fn render_user_details(f: &mut Frame, area: Rect, app: &AppState, id: &str) {
    let block = Block::default()
        .title("User Details")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border));

    let user = app.store.user().filter(|u| u.id == id);
    let placeholder = if app.store.loading() {
        Some(("Loading…".to_string(), app.theme.muted))
    } else if let Some(err) = app.store.error() {
        Some((err.to_string(), app.theme.error))
    } else if user.is_none() {
        Some(("User not found".to_string(), app.theme.muted))
    } else {
        None
    };
    if let Some((text, color)) = placeholder {
        let p = Paragraph::new(text)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: false })
            .style(Style::default().fg(color))
            .block(block);
        f.render_widget(p, area);
        return;
    }
    let Some(user) = user else { return };

    let inner = block.inner(area);
    f.render_widget(block, area);
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(22), Constraint::Min(10)].as_ref())
        .split(inner);
    let avatar_area = Rect {
        height: cols[0].height.min(9),
        ..cols[0]
    };
    components::render_avatar(
        f,
        avatar_area,
        app,
        &components::initials(&user.first_name, &user.last_name),
        app.photo_status(user.photo.as_deref()),
    );

    let label = Style::default().fg(app.theme.muted);
    let value = Style::default().fg(app.theme.text);
    let field = |name: &'static str, text: String| {
        Line::from(vec![Span::styled(format!("{name:<8}"), label), Span::styled(text, value)])
    };
    let lines = vec![
        Line::from(Span::styled(
            user.full_name(),
            Style::default().fg(app.theme.title).add_modifier(Modifier::BOLD),
        )),
        Line::raw(""),
        field("Height", format!("{} cm", user.height)),
        field("Weight", format!("{} kg", user.weight)),
        field("Gender", user.gender.clone()),
        field("Address", user.residence.clone()),
        field("Photo", user.photo.clone().unwrap_or_default()),
        Line::raw(""),
        Line::from(Span::styled("e: edit   d: delete   Esc: back", label)),
    ];
    let p = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default().borders(Borders::LEFT).border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(p, cols[1]);
}
