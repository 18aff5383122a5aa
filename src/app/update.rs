use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::Terminal;
use ratatui::backend::Backend;
use tracing::{debug, info};

use crate::app::dispatch::{self, Dispatcher};
use crate::app::form::{FormField, GENDER_OPTIONS, UserForm};
use crate::app::keymap::KeyAction;
use crate::app::{AppState, Effect, InputMode, ModalState, Screen};
use crate::store::{OperationKind, OperationStatus, Request};
use crate::ui;

/// Drive the TUI until the user quits. In-flight requests are cancelled on exit.
pub fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    app: &mut AppState,
    dispatcher: &mut Dispatcher,
) -> Result<()> {
    start(app);

    loop {
        flush_effects(app, dispatcher);
        for ev in dispatcher.drain(&mut app.store) {
            on_event(app, ev);
        }
        flush_effects(app, dispatcher);

        terminal.draw(|f| {
            ui::render(f, app);
        })?;

        if app.should_quit {
            break;
        }

        if event::poll(Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    handle_key(app, key);
                }
            }
        }
    }

    info!(in_flight = dispatcher.in_flight(), "quitting");
    dispatcher.cancel_all(&mut app.store);
    Ok(())
}

/// Request the first page for the list screen.
pub fn start(app: &mut AppState) {
    let page = app.store.page();
    let page_size = app.store.page_size();
    app.request(Request::FetchUsers { page, page_size });
}

/// Hand queued effects to the dispatcher.
pub fn flush_effects(app: &mut AppState, dispatcher: &mut Dispatcher) {
    for effect in std::mem::take(&mut app.outbox) {
        match effect {
            Effect::Request(request) => {
                dispatcher.dispatch(&mut app.store, request);
            }
            Effect::ProbePhoto(url) => dispatcher.probe_photo(url),
        }
    }
}

/// React to a completed request or photo probe. The store has already
/// applied the outcome; this handles navigation and notifications.
pub fn on_event(app: &mut AppState, ev: dispatch::Event) {
    match ev {
        dispatch::Event::Photo { url, status } => {
            app.photos.insert(url, status);
        }
        dispatch::Event::Settled { kind, result, .. } => match (kind, result) {
            (OperationKind::FetchUsers, Ok(())) => {
                let urls: Vec<String> = app
                    .store
                    .users()
                    .iter()
                    .filter_map(|u| u.photo.clone())
                    .collect();
                for url in urls {
                    app.request_photo(Some(&url));
                }
                clamp_selection(app);
            }
            (OperationKind::FetchUserById, Ok(())) => {
                let url = app.store.user().and_then(|u| u.photo.clone());
                app.request_photo(url.as_deref());
            }
            (OperationKind::FetchUsers | OperationKind::FetchUserById, Err(_)) => {
                // shown inline from store.error()
            }
            (OperationKind::CreateUser | OperationKind::UpdateUser, Ok(())) => {
                if app.screen() == Screen::UserForm {
                    pop_screen(app);
                }
                if let Screen::UserDetails { id } = app.screen() {
                    app.request(Request::FetchUserById { id });
                }
            }
            (OperationKind::CreateUser | OperationKind::UpdateUser, Err(err)) => {
                show_info(app, "Error", format!("Unable to save user\n{}", err.user_message()));
            }
            (OperationKind::DeleteUser, Ok(())) => {
                if matches!(app.screen(), Screen::UserDetails { .. }) {
                    pop_screen(app);
                }
                clamp_selection(app);
            }
            (OperationKind::DeleteUser, Err(err)) => {
                show_info(app, "Error", format!("Unable to delete user\n{}", err.user_message()));
            }
        },
    }
}

pub fn handle_key(app: &mut AppState, key: KeyEvent) {
    match app.input_mode {
        InputMode::Modal => handle_modal_key(app, key.code),
        InputMode::Editing => handle_form_key(app, key),
        InputMode::Normal => {
            let Some(action) = app.keymap.resolve(&key) else { return };
            debug!(?action, screen = app.screen().title(), "key");
            match action {
                KeyAction::Quit => app.should_quit = true,
                KeyAction::ToggleKeybindsPane => app.show_keybinds = !app.show_keybinds,
                KeyAction::Ignore => {}
                _ => match app.screen() {
                    Screen::UserList => handle_list_action(app, action),
                    Screen::UserDetails { id } => handle_details_action(app, &id, action),
                    Screen::UserForm => {}
                },
            }
        }
    }
}

fn handle_list_action(app: &mut AppState, action: KeyAction) {
    let len = app.store.users().len();
    let rpp = app.rows_per_page.max(1);
    match action {
        KeyAction::MoveUp => app.selected_index = app.selected_index.saturating_sub(1),
        KeyAction::MoveDown => {
            if app.selected_index + 1 < len {
                app.selected_index += 1;
            } else {
                load_more(app);
            }
        }
        KeyAction::PageUp => app.selected_index = app.selected_index.saturating_sub(rpp),
        KeyAction::PageDown => {
            let new_idx = app.selected_index.saturating_add(rpp);
            if new_idx < len {
                app.selected_index = new_idx;
            } else {
                app.selected_index = len.saturating_sub(1);
                load_more(app);
            }
        }
        KeyAction::OpenDetails => {
            if let Some(id) = app.store.users().get(app.selected_index).map(|u| u.id.clone()) {
                open_details(app, id);
            }
        }
        KeyAction::NewUser => open_form(app, UserForm::new()),
        _ => {}
    }
}

fn handle_details_action(app: &mut AppState, id: &str, action: KeyAction) {
    match action {
        KeyAction::Back => pop_screen(app),
        KeyAction::EditUser => {
            // The loaded user may still be the previous one while this id loads or after it failed.
            match app.store.user().filter(|u| u.id == id).cloned() {
                Some(user) => open_form(app, UserForm::edit(&user)),
                None => debug!(id, "edit ignored, user not loaded"),
            }
        }
        KeyAction::DeleteUser => {
            let name = app
                .store
                .user()
                .filter(|u| u.id == id)
                .map(|u| u.full_name())
                .unwrap_or_else(|| id.to_string());
            app.modal = Some(ModalState::DeleteConfirm {
                id: id.to_string(),
                name,
                selected: 1,
            });
            app.input_mode = InputMode::Modal;
        }
        _ => {}
    }
}

fn handle_form_key(app: &mut AppState, key: KeyEvent) {
    let Some(form) = app.form.as_mut() else {
        app.input_mode = InputMode::Normal;
        return;
    };
    let leaving_photo = form.selected_field() == Some(FormField::Photo);
    match key.code {
        KeyCode::Esc => {
            pop_screen(app);
            return;
        }
        KeyCode::Char('s') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            submit_form(app);
            return;
        }
        KeyCode::Up | KeyCode::BackTab => form.select_prev(),
        KeyCode::Down | KeyCode::Tab => form.select_next(),
        KeyCode::Enter => {
            if form.on_save() {
                submit_form(app);
                return;
            }
            if form.selected_field() == Some(FormField::Gender) {
                let selected = form.gender_index();
                app.modal = Some(ModalState::GenderPicker { selected });
                app.input_mode = InputMode::Modal;
                return;
            }
            form.select_next();
        }
        KeyCode::Backspace => form.backspace(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => form.input_char(c),
        _ => {}
    }
    let moved_off_photo = leaving_photo && form.selected_field() != Some(FormField::Photo);
    if moved_off_photo {
        let url = form.photo.clone();
        app.request_photo(Some(&url));
    }
}

fn handle_modal_key(app: &mut AppState, code: KeyCode) {
    match &mut app.modal {
        Some(ModalState::DeleteConfirm { id, selected, .. }) => match code {
            KeyCode::Esc => close_modal(app),
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::Char('h') | KeyCode::Char('l') => {
                *selected = 1 - (*selected).min(1);
            }
            KeyCode::Char('y') => {
                let id = id.clone();
                confirm_delete(app, id);
            }
            KeyCode::Char('n') => close_modal(app),
            KeyCode::Enter => {
                if *selected == 0 {
                    let id = id.clone();
                    confirm_delete(app, id);
                } else {
                    close_modal(app);
                }
            }
            _ => {}
        },
        Some(ModalState::GenderPicker { selected }) => match code {
            KeyCode::Esc => close_modal(app),
            KeyCode::Up | KeyCode::Char('k') => *selected = selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                if *selected + 1 < GENDER_OPTIONS.len() {
                    *selected += 1;
                }
            }
            KeyCode::Enter => {
                let option = *selected;
                if let Some(form) = app.form.as_mut() {
                    form.set_gender(option);
                    form.select_next();
                }
                close_modal(app);
            }
            _ => {}
        },
        Some(ModalState::Info { .. }) => close_modal(app),
        None => close_modal(app),
    }
}

fn confirm_delete(app: &mut AppState, id: String) {
    close_modal(app);
    app.request(Request::DeleteUser { id });
}

fn submit_form(app: &mut AppState) {
    if let Some(form) = app.form.as_ref() {
        let request = form.submit_request();
        info!(op = request.kind().label(), "submitting form");
        app.request(request);
    }
}

/// Ask for the next page when the list end is reached. A page whose fetch
/// failed is requested again before moving on.
fn load_more(app: &mut AppState) {
    let page = if app.store.status(OperationKind::FetchUsers) == OperationStatus::Failed {
        (!app.store.loading()).then(|| app.store.page())
    } else {
        app.store.next_page()
    };
    if let Some(page) = page {
        app.store.set_page(page);
        let page_size = app.store.page_size();
        app.request(Request::FetchUsers { page, page_size });
    }
}

fn open_details(app: &mut AppState, id: String) {
    app.screens.push(Screen::UserDetails { id: id.clone() });
    app.request(Request::FetchUserById { id });
}

fn open_form(app: &mut AppState, form: UserForm) {
    app.request_photo(Some(&form.photo));
    app.form = Some(form);
    app.screens.push(Screen::UserForm);
    app.input_mode = InputMode::Editing;
}

fn pop_screen(app: &mut AppState) {
    if app.screens.len() > 1 && app.screens.pop() == Some(Screen::UserForm) {
        app.form = None;
    }
    app.input_mode = mode_for_screen(app);
}

fn close_modal(app: &mut AppState) {
    app.modal = None;
    app.input_mode = mode_for_screen(app);
}

fn show_info(app: &mut AppState, title: &str, message: String) {
    app.modal = Some(ModalState::Info {
        title: title.to_string(),
        message,
    });
    app.input_mode = InputMode::Modal;
}

fn mode_for_screen(app: &AppState) -> InputMode {
    match app.screen() {
        Screen::UserForm if app.form.is_some() => InputMode::Editing,
        _ => InputMode::Normal,
    }
}

fn clamp_selection(app: &mut AppState) {
    let len = app.store.users().len();
    app.selected_index = app.selected_index.min(len.saturating_sub(1));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{NewOrUpdateUser, User, UsersPage};
    use crate::app::Theme;
    use crate::app::keymap::Keymap;
    use crate::error::ApiError;
    use crate::store::{Response, UsersStore};

    fn mk_app() -> AppState {
        AppState::new(UsersStore::new(2), Theme::dark(), Keymap::default(), "http://test")
    }

    fn press(app: &mut AppState, code: KeyCode) {
        handle_key(app, KeyEvent::new(code, KeyModifiers::NONE));
    }

    fn mk_user(id: &str) -> User {
        NewOrUpdateUser {
            first_name: id.to_uppercase(),
            ..NewOrUpdateUser::default()
        }
        .into_user(id)
    }

    /// Resolve the oldest queued request with `outcome`, as the dispatcher would.
    fn settle(app: &mut AppState, outcome: Result<Response, ApiError>) {
        let Effect::Request(request) = app.outbox.remove(0) else {
            panic!("expected a request");
        };
        let kind = request.kind();
        app.store.begin(kind);
        let result = app.store.resolve(kind, outcome);
        on_event(
            app,
            dispatch::Event::Settled {
                ticket: 0,
                kind,
                result,
            },
        );
    }

    fn page(n: u32, ids: &[&str], total_pages: u32) -> Response {
        Response::Page(UsersPage {
            results: ids.iter().map(|id| mk_user(id)).collect(),
            page: n,
            total_pages,
            total_users: 4,
        })
    }

    #[test]
    fn start_requests_the_first_page() {
        let mut app = mk_app();
        start(&mut app);
        assert_eq!(
            app.outbox,
            vec![Effect::Request(Request::FetchUsers {
                page: 1,
                page_size: 2
            })]
        );
    }

    #[test]
    fn moving_past_the_last_row_loads_the_next_page() {
        let mut app = mk_app();
        start(&mut app);
        settle(&mut app, Ok(page(1, &["a", "b"], 2)));

        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected_index, 1);
        assert!(app.outbox.is_empty());

        press(&mut app, KeyCode::Down);
        assert_eq!(app.store.page(), 2);
        assert_eq!(
            app.outbox,
            vec![Effect::Request(Request::FetchUsers {
                page: 2,
                page_size: 2
            })]
        );
        settle(&mut app, Ok(page(2, &["c", "d"], 2)));
        assert_eq!(app.store.users().len(), 4);

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.selected_index, 3);
        assert!(app.outbox.is_empty(), "no page after the last one");
    }

    #[test]
    fn failed_page_is_requested_again_before_the_next_one() {
        let mut app = AppState::new(UsersStore::new(1), Theme::dark(), Keymap::default(), "http://test");
        start(&mut app);
        settle(&mut app, Ok(page(1, &["a"], 3)));

        press(&mut app, KeyCode::Down);
        settle(&mut app, Err(ApiError::Status { status: 500, body: String::new() }));
        assert_eq!(app.store.users().len(), 1);

        press(&mut app, KeyCode::Down);
        assert_eq!(
            app.outbox,
            vec![Effect::Request(Request::FetchUsers {
                page: 2,
                page_size: 1
            })]
        );
        settle(&mut app, Ok(page(2, &["b"], 3)));
        assert_eq!(app.store.error(), None);

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        assert_eq!(
            app.outbox,
            vec![Effect::Request(Request::FetchUsers {
                page: 3,
                page_size: 1
            })]
        );
    }

    #[test]
    fn edit_waits_for_the_user_on_screen() {
        let mut app = mk_app();
        app.screens.push(Screen::UserDetails { id: "a".into() });
        app.request(Request::FetchUserById { id: "a".into() });
        settle(&mut app, Ok(Response::Fetched(mk_user("a"))));
        press(&mut app, KeyCode::Esc);

        app.screens.push(Screen::UserDetails { id: "b".into() });
        app.request(Request::FetchUserById { id: "b".into() });
        settle(&mut app, Err(ApiError::Status { status: 503, body: String::new() }));
        assert_eq!(app.store.user().map(|u| u.id.as_str()), Some("a"));

        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.screen(), Screen::UserDetails { id: "b".into() });
        assert!(app.form.is_none());
        handle_key(&mut app, KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        assert!(app.outbox.is_empty());

        app.request(Request::FetchUserById { id: "b".into() });
        settle(&mut app, Ok(Response::Fetched(mk_user("b"))));
        app.outbox.clear();
        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.form.as_ref().and_then(|f| f.editing_id.clone()), Some("b".to_string()));
    }

    #[test]
    fn enter_opens_details_and_fetches_by_id() {
        let mut app = mk_app();
        start(&mut app);
        settle(&mut app, Ok(page(1, &["a", "b"], 1)));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.screen(), Screen::UserDetails { id: "b".into() });
        assert_eq!(
            app.outbox,
            vec![Effect::Request(Request::FetchUserById { id: "b".into() })]
        );
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.screen(), Screen::UserList);
    }

    #[test]
    fn delete_flow_confirms_then_navigates_back() {
        let mut app = mk_app();
        start(&mut app);
        settle(&mut app, Ok(page(1, &["x", "y"], 1)));
        press(&mut app, KeyCode::Enter);
        settle(&mut app, Ok(Response::Fetched(mk_user("x"))));

        press(&mut app, KeyCode::Char('d'));
        assert_eq!(app.input_mode, InputMode::Modal);
        press(&mut app, KeyCode::Left);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.modal, None);
        assert_eq!(
            app.outbox,
            vec![Effect::Request(Request::DeleteUser { id: "x".into() })]
        );

        settle(&mut app, Ok(Response::Deleted { id: "x".into() }));
        assert_eq!(app.screen(), Screen::UserList);
        assert_eq!(app.store.users(), &[mk_user("y")]);
    }

    #[test]
    fn failed_delete_shows_a_blocking_notice_and_stays() {
        let mut app = mk_app();
        app.screens.push(Screen::UserDetails { id: "x".into() });
        app.request(Request::DeleteUser { id: "x".into() });
        settle(&mut app, Err(ApiError::Status { status: 500, body: String::new() }));
        assert!(matches!(&app.modal, Some(ModalState::Info { message, .. }) if message.starts_with("Unable to delete user")));
        assert_eq!(app.screen(), Screen::UserDetails { id: "x".into() });
        assert_eq!(app.store.error(), None);

        press(&mut app, KeyCode::Char(' '));
        assert_eq!(app.modal, None);
        assert_eq!(app.input_mode, InputMode::Normal);
    }

    #[test]
    fn new_user_form_creates_and_returns_to_the_list() {
        let mut app = mk_app();
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.screen(), Screen::UserForm);
        assert_eq!(app.input_mode, InputMode::Editing);

        for c in "Ann".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        // Navigate to gender and pick "female".
        for _ in 0..4 {
            press(&mut app, KeyCode::Down);
        }
        press(&mut app, KeyCode::Enter);
        assert!(matches!(app.modal, Some(ModalState::GenderPicker { .. })));
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.form.as_ref().map(|f| f.gender.as_str()), Some("female"));
        assert_eq!(app.input_mode, InputMode::Editing);

        handle_key(&mut app, KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        let Some(Effect::Request(Request::CreateUser { payload })) = app.outbox.first().cloned() else {
            panic!("expected create request, got {:?}", app.outbox);
        };
        assert_eq!(payload.first_name, "Ann");
        assert_eq!(payload.gender, "female");

        settle(&mut app, Ok(Response::Created(payload.into_user("new"))));
        assert_eq!(app.screen(), Screen::UserList);
        assert!(app.form.is_none());
        assert_eq!(app.store.users().last().map(|u| u.id.as_str()), Some("new"));
    }

    #[test]
    fn saving_an_edit_refetches_the_details() {
        let mut app = mk_app();
        app.screens.push(Screen::UserDetails { id: "u1".into() });
        app.request(Request::FetchUserById { id: "u1".into() });
        settle(&mut app, Ok(Response::Fetched(mk_user("u1"))));

        press(&mut app, KeyCode::Char('e'));
        assert_eq!(app.form.as_ref().and_then(|f| f.editing_id.clone()), Some("u1".to_string()));
        handle_key(&mut app, KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        settle(&mut app, Ok(Response::Updated(mk_user("u1"))));

        assert_eq!(app.screen(), Screen::UserDetails { id: "u1".into() });
        assert_eq!(
            app.outbox,
            vec![Effect::Request(Request::FetchUserById { id: "u1".into() })]
        );
    }

    #[test]
    fn failed_save_keeps_the_form_open() {
        let mut app = mk_app();
        press(&mut app, KeyCode::Char('n'));
        handle_key(&mut app, KeyEvent::new(KeyCode::Char('s'), KeyModifiers::CONTROL));
        settle(&mut app, Err(ApiError::Status { status: 422, body: String::new() }));
        assert_eq!(app.screen(), Screen::UserForm);
        assert!(matches!(&app.modal, Some(ModalState::Info { message, .. }) if message.contains("Unable to save user")));
        press(&mut app, KeyCode::Enter);
        assert_eq!(app.input_mode, InputMode::Editing);
    }

    #[test]
    fn leaving_the_photo_field_probes_the_url_once() {
        let mut app = mk_app();
        press(&mut app, KeyCode::Char('n'));
        app.outbox.clear();
        for _ in 0..6 {
            press(&mut app, KeyCode::Down);
        }
        for c in "http://img/a.png".chars() {
            press(&mut app, KeyCode::Char(c));
        }
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Down);
        assert_eq!(app.outbox, vec![Effect::ProbePhoto("http://img/a.png".into())]);
    }
}
