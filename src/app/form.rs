//! State of the create/edit user form.

use crate::api::{NewOrUpdateUser, User};
use crate::store::Request;

/// Gender picker options as (label, value).
pub const GENDER_OPTIONS: [(&str, &str); 3] = [("Male", "male"), ("Female", "female"), ("Other", "other")];

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormField {
    FirstName,
    LastName,
    Height,
    Weight,
    Gender,
    Residence,
    Photo,
}

impl FormField {
    pub const ALL: [FormField; 7] = [
        FormField::FirstName,
        FormField::LastName,
        FormField::Height,
        FormField::Weight,
        FormField::Gender,
        FormField::Residence,
        FormField::Photo,
    ];

    pub fn label(self) -> &'static str {
        match self {
            FormField::FirstName => "First Name",
            FormField::LastName => "Last Name",
            FormField::Height => "Height (cm)",
            FormField::Weight => "Weight (kg)",
            FormField::Gender => "Gender",
            FormField::Residence => "Address",
            FormField::Photo => "Photo URL",
        }
    }

    pub fn is_numeric(self) -> bool {
        matches!(self, FormField::Height | FormField::Weight)
    }
}

/// Editable copy of a user. Numbers are kept as typed and parsed on submit.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UserForm {
    /// Id of the user being edited; `None` when creating.
    pub editing_id: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub height: String,
    pub weight: String,
    pub gender: String,
    pub residence: String,
    pub photo: String,
    /// Focused row: one per field, then the Save button.
    pub selected: usize,
}

impl UserForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-filled form for editing `user`.
    pub fn edit(user: &User) -> Self {
        Self {
            editing_id: Some(user.id.clone()),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            height: format_number(user.height),
            weight: format_number(user.weight),
            gender: user.gender.clone(),
            residence: user.residence.clone(),
            photo: user.photo.clone().unwrap_or_default(),
            selected: 0,
        }
    }

    pub fn title(&self) -> &'static str {
        if self.editing_id.is_some() { "Edit User" } else { "Add New User" }
    }

    /// Index of the Save row.
    pub fn save_index() -> usize {
        FormField::ALL.len()
    }

    pub fn selected_field(&self) -> Option<FormField> {
        FormField::ALL.get(self.selected).copied()
    }

    pub fn on_save(&self) -> bool {
        self.selected == Self::save_index()
    }

    pub fn select_next(&mut self) {
        if self.selected < Self::save_index() {
            self.selected += 1;
        }
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }

    pub fn value(&self, field: FormField) -> &str {
        match field {
            FormField::FirstName => &self.first_name,
            FormField::LastName => &self.last_name,
            FormField::Height => &self.height,
            FormField::Weight => &self.weight,
            FormField::Gender => &self.gender,
            FormField::Residence => &self.residence,
            FormField::Photo => &self.photo,
        }
    }

    fn value_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::FirstName => &mut self.first_name,
            FormField::LastName => &mut self.last_name,
            FormField::Height => &mut self.height,
            FormField::Weight => &mut self.weight,
            FormField::Gender => &mut self.gender,
            FormField::Residence => &mut self.residence,
            FormField::Photo => &mut self.photo,
        }
    }

    /// Type into the focused field. Gender is only set through the picker;
    /// numeric fields take digits and a decimal point.
    pub fn input_char(&mut self, c: char) {
        let Some(field) = self.selected_field() else { return };
        if field == FormField::Gender {
            return;
        }
        if field.is_numeric() && !(c.is_ascii_digit() || c == '.') {
            return;
        }
        self.value_mut(field).push(c);
    }

    pub fn backspace(&mut self) {
        if let Some(field) = self.selected_field() {
            if field != FormField::Gender {
                self.value_mut(field).pop();
            }
        }
    }

    pub fn set_gender(&mut self, option: usize) {
        if let Some((_, value)) = GENDER_OPTIONS.get(option) {
            self.gender = (*value).to_string();
        }
    }

    /// Picker row matching the current gender, or the first one.
    pub fn gender_index(&self) -> usize {
        GENDER_OPTIONS
            .iter()
            .position(|(_, value)| *value == self.gender)
            .unwrap_or(0)
    }

    pub fn to_payload(&self) -> NewOrUpdateUser {
        NewOrUpdateUser {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            height: parse_number(&self.height),
            weight: parse_number(&self.weight),
            gender: self.gender.clone(),
            residence: self.residence.clone(),
            photo: Some(self.photo.clone()),
        }
    }

    /// Update when editing an existing user, create otherwise.
    pub fn submit_request(&self) -> Request {
        let payload = self.to_payload();
        match &self.editing_id {
            Some(id) => Request::UpdateUser {
                id: id.clone(),
                payload,
            },
            None => Request::CreateUser { payload },
        }
    }
}

fn parse_number(s: &str) -> f64 {
    s.trim().parse().unwrap_or(0.0)
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 { format!("{n:.0}") } else { n.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_user() -> User {
        User {
            id: "u7".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
            height: 165.0,
            weight: 55.5,
            gender: "female".into(),
            residence: "London".into(),
            photo: None,
        }
    }

    #[test]
    fn edit_prefills_and_submits_an_update() {
        let form = UserForm::edit(&sample_user());
        assert_eq!(form.title(), "Edit User");
        assert_eq!(form.height, "165");
        assert_eq!(form.weight, "55.5");
        assert_eq!(form.gender_index(), 1);
        match form.submit_request() {
            Request::UpdateUser { id, payload } => {
                assert_eq!(id, "u7");
                assert_eq!(payload.height, 165.0);
                assert_eq!(payload.photo.as_deref(), Some(""));
            }
            other => panic!("expected update, got {other:?}"),
        }
    }

    #[test]
    fn new_form_submits_a_create_without_validation() {
        let form = UserForm::new();
        assert_eq!(form.title(), "Add New User");
        match form.submit_request() {
            Request::CreateUser { payload } => {
                assert_eq!(payload.first_name, "");
                assert_eq!(payload.height, 0.0);
            }
            other => panic!("expected create, got {other:?}"),
        }
    }

    #[test]
    fn typing_respects_field_kinds() {
        let mut form = UserForm::new();
        form.input_char('J');
        form.input_char('o');
        assert_eq!(form.first_name, "Jo");

        form.selected = 2;
        for c in "1a8.5".chars() {
            form.input_char(c);
        }
        assert_eq!(form.height, "18.5");

        form.selected = 4;
        form.input_char('x');
        form.backspace();
        assert_eq!(form.gender, "");
        form.set_gender(2);
        assert_eq!(form.gender, "other");

        form.selected = 2;
        form.backspace();
        assert_eq!(form.height, "18.");
    }

    #[test]
    fn selection_stops_at_save_row() {
        let mut form = UserForm::new();
        for _ in 0..20 {
            form.select_next();
        }
        assert!(form.on_save());
        assert_eq!(form.selected_field(), None);
        form.input_char('z');
        assert_eq!(form, UserForm { selected: UserForm::save_index(), ..UserForm::new() });
        form.select_prev();
        assert_eq!(form.selected_field(), Some(FormField::Photo));
    }
}
