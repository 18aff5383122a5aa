use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};

use crate::app::AppState;
use crate::app::form::{FormField, GENDER_OPTIONS, UserForm};
use crate::store::OperationKind;
use crate::store::OperationStatus;
use crate::ui::components;

pub fn render_user_form(f: &mut Frame, area: Rect, app: &AppState) {
    let Some(form) = app.form.as_ref() else { return };
    let block = Block::default()
        .title(form.title())
        .borders(Borders::ALL)
        .border_style(Style::default().fg(app.theme.border));
    let inner = block.inner(area);
    f.render_widget(block, area);

    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(22), Constraint::Min(20)].as_ref())
        .split(inner);
    let avatar_area = Rect {
        height: cols[0].height.min(9),
        ..cols[0]
    };
    components::render_avatar(
        f,
        avatar_area,
        app,
        &components::initials(&form.first_name, &form.last_name),
        app.photo_status(Some(&form.photo)),
    );

    let label_style = Style::default().fg(app.theme.muted);
    let selected_style = Style::default()
        .fg(app.theme.highlight_fg)
        .add_modifier(Modifier::BOLD);

    let mut lines: Vec<Line> = Vec::new();
    for (idx, field) in FormField::ALL.iter().enumerate() {
        let focused = idx == form.selected;
        let marker = if focused { "▶ " } else { "  " };
        let mut value = display_value(form, *field);
        if focused && *field != FormField::Gender {
            value.push('█');
        }
        lines.push(Line::from(vec![
            Span::styled(marker, selected_style),
            Span::styled(format!("{:<12} ", field.label()), label_style),
            Span::styled(
                value,
                if focused { selected_style } else { Style::default().fg(app.theme.text) },
            ),
        ]));
    }
    lines.push(Line::raw(""));

    let saving = [OperationKind::CreateUser, OperationKind::UpdateUser]
        .iter()
        .any(|kind| app.store.status(*kind) == OperationStatus::Pending);
    let save_label = if saving { "[ Saving… ]" } else { "[ Save ]" };
    let save_style = if form.on_save() {
        selected_style.bg(app.theme.highlight_bg).add_modifier(Modifier::REVERSED)
    } else {
        Style::default().fg(app.theme.title)
    };
    lines.push(Line::from(vec![Span::raw("  "), Span::styled(save_label, save_style)]));
    lines.push(Line::raw(""));
    lines.push(Line::from(Span::styled(
        "Up/Down: move   Enter: pick/save   Ctrl+s: save   Esc: cancel",
        label_style,
    )));

    let p = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::LEFT)
            .border_style(Style::default().fg(app.theme.border)),
    );
    f.render_widget(p, cols[1]);
}

fn display_value(form: &UserForm, field: FormField) -> String {
    if field == FormField::Gender {
        return GENDER_OPTIONS
            .iter()
            .find(|(_, value)| *value == form.gender)
            .map(|(label, _)| format!("{label} ▾"))
            .unwrap_or_else(|| "Select gender ▾".to_string());
    }
    form.value(field).to_string()
}
