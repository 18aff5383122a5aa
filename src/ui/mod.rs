//! Rendering. One module per screen plus shared components.
pub mod components;
pub mod detail;
pub mod form;
pub mod list;

use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::Style;
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::{AppState, ModalState, Screen};

pub fn render(f: &mut Frame, app: &mut AppState) {
    let root = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5), Constraint::Length(1)].as_ref())
        .split(f.area());

    let screen = app.screen();
    let p = Paragraph::new(format!(
        "usrapi-manager  {}  api: {}  | ?: keybindings; q: quit",
        screen.title(),
        app.api_url
    ))
    .block(
        Block::default()
            .title("usrapi-manager")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(app.theme.border)),
    )
    .style(Style::default().fg(app.theme.header_fg).bg(app.theme.header_bg));
    f.render_widget(p, root[0]);

    let body = if app.show_keybinds {
        let cols = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(65), Constraint::Percentage(35)].as_ref())
            .split(root[1]);
        components::render_keybinds_panel(f, cols[1], app);
        cols[0]
    } else {
        root[1]
    };

    match screen {
        Screen::UserList => list::render_user_list(f, body, app),
        Screen::UserDetails { id } => detail::render_user_details(f, body, app, &id),
        Screen::UserForm => form::render_user_form(f, body, app),
    }

    components::render_status_bar(f, root[2], app);

    if app.modal.is_some() {
        render_modal(f, f.area(), app);
    }
}

fn render_modal(f: &mut Frame, area: Rect, app: &AppState) {
    let Some(state) = app.modal.as_ref() else { return };
    match state {
        ModalState::DeleteConfirm { .. } => components::render_delete_confirm(f, area, app, state),
        ModalState::GenderPicker { .. } => components::render_gender_picker(f, area, app, state),
        ModalState::Info { .. } => components::render_info_modal(f, area, app, state),
    }
}
