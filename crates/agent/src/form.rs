//! Field list with focus, submit and back buttons, shared by every
//! multi-field stage.

use crate::input::Key;
use crate::outcome::StageName;
use crate::validate::Validator;
use std::fmt::Write as _;

pub const CHAR_LIMIT: usize = 32;
const BACK_LABEL: &str = "Назад";

#[derive(Debug, Clone)]
pub struct Field {
    pub label: &'static str,
    value: String,
    masked: bool,
    multiline: bool,
    char_limit: Option<usize>,
    validator: Option<Validator>,
    error: Option<String>,
}

impl Field {
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            value: String::new(),
            masked: false,
            multiline: false,
            char_limit: Some(CHAR_LIMIT),
            validator: None,
            error: None,
        }
    }

    pub fn masked(mut self) -> Self {
        self.masked = true;
        self
    }

    /// Multi-line bodies take newlines and have no length limit.
    pub fn multiline(mut self) -> Self {
        self.multiline = true;
        self.char_limit = None;
        self
    }

    pub fn unlimited(mut self) -> Self {
        self.char_limit = None;
        self
    }

    pub fn validated(mut self, validator: Validator) -> Self {
        self.validator = Some(validator);
        self
    }

    pub fn with_value(mut self, value: impl Into<String>) -> Self {
        self.value = value.into();
        self
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn is_multiline(&self) -> bool {
        self.multiline
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Sets a value loaded from storage. Not validated.
    pub fn set_value(&mut self, value: impl Into<String>) {
        self.value = value.into();
        self.error = None;
    }

    pub fn insert(&mut self, c: char) -> bool {
        if let Some(limit) = self.char_limit {
            if self.value.chars().count() >= limit {
                return false;
            }
        }
        let mut candidate = self.value.clone();
        candidate.push(c);
        self.commit(candidate)
    }

    pub fn backspace(&mut self) -> bool {
        let mut candidate = self.value.clone();
        if candidate.pop().is_none() {
            return false;
        }
        self.commit(candidate)
    }

    // An empty value is always accepted so a field can be cleared.
    fn commit(&mut self, candidate: String) -> bool {
        if let (Some(validate), false) = (self.validator, candidate.is_empty()) {
            if let Err(e) = validate(&candidate) {
                self.error = Some(e.to_string());
                return false;
            }
        }
        self.value = candidate;
        self.error = None;
        true
    }

    fn shown(&self) -> String {
        if self.masked {
            "*".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormAction {
    None,
    Submit,
    Back,
}

#[derive(Debug, Clone)]
pub struct FormState {
    fields: Vec<Field>,
    focus: usize,
    back: StageName,
    submit_label: &'static str,
}

impl FormState {
    pub fn new(fields: Vec<Field>, back: StageName, submit_label: &'static str) -> Self {
        Self {
            fields,
            focus: 0,
            back,
            submit_label,
        }
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn focus_index(&self) -> usize {
        self.focus
    }

    pub fn back(&self) -> StageName {
        self.back
    }

    pub fn value(&self, index: usize) -> &str {
        self.fields.get(index).map(Field::value).unwrap_or_default()
    }

    pub fn set_value(&mut self, index: usize, value: impl Into<String>) {
        if let Some(field) = self.fields.get_mut(index) {
            field.set_value(value);
        }
    }

    pub fn submit_index(&self) -> usize {
        self.fields.len()
    }

    pub fn back_index(&self) -> usize {
        self.fields.len() + 1
    }

    fn slots(&self) -> usize {
        self.fields.len() + 2
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.slots();
    }

    pub fn focus_prev(&mut self) {
        self.focus = (self.focus + self.slots() - 1) % self.slots();
    }

    pub fn focused_field(&self) -> Option<&Field> {
        self.fields.get(self.focus)
    }

    fn focused_field_mut(&mut self) -> Option<&mut Field> {
        self.fields.get_mut(self.focus)
    }

    /// Applies navigation and editing keys; reports when a button fires.
    pub fn handle_key(&mut self, key: Key) -> FormAction {
        match key {
            Key::Tab | Key::Down => self.focus_next(),
            Key::BackTab | Key::Up => self.focus_prev(),
            Key::Enter if self.focus == self.submit_index() => return FormAction::Submit,
            Key::Enter if self.focus == self.back_index() => return FormAction::Back,
            Key::Enter => match self.focused_field_mut() {
                Some(field) if field.is_multiline() => {
                    field.insert('\n');
                }
                _ => self.focus_next(),
            },
            Key::Char(c) => {
                if let Some(field) = self.focused_field_mut() {
                    field.insert(c);
                }
            }
            Key::Backspace => {
                if let Some(field) = self.focused_field_mut() {
                    field.backspace();
                }
            }
            Key::Ctrl(_) | Key::Esc => {}
        }
        FormAction::None
    }

    /// Plain-text rendering; the focused line is marked with `>`.
    pub fn render(&self, out: &mut String) {
        for (i, field) in self.fields.iter().enumerate() {
            let marker = if i == self.focus { ">" } else { " " };
            if field.is_multiline() {
                let _ = writeln!(out, "{marker} {}:", field.label);
                for line in field.shown().split('\n') {
                    let _ = writeln!(out, "    {line}");
                }
            } else {
                let _ = writeln!(out, "{marker} {}: {}", field.label, field.shown());
            }
            if let Some(err) = field.error() {
                let _ = writeln!(out, "    ! {err}");
            }
        }
        out.push('\n');
        for (i, label) in [(self.submit_index(), self.submit_label), (self.back_index(), BACK_LABEL)] {
            let marker = if i == self.focus { ">" } else { " " };
            let _ = writeln!(out, "{marker} [ {label} ]");
        }
    }
}

/// Stages built around a [`FormState`].
pub trait Form {
    fn form(&self) -> &FormState;

    fn fields(&self) -> &[Field] {
        self.form().fields()
    }

    fn focus_index(&self) -> usize {
        self.form().focus_index()
    }

    fn back(&self) -> StageName {
        self.form().back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validate;

    fn two_fields() -> FormState {
        FormState::new(
            vec![Field::new("Логин"), Field::new("Пароль").masked()],
            StageName::Start,
            "Войти",
        )
    }

    fn type_str(form: &mut FormState, s: &str) {
        for c in s.chars() {
            form.handle_key(Key::Char(c));
        }
    }

    #[test]
    fn focus_cycles_through_fields_and_buttons() {
        let mut form = two_fields();
        let mut seen = vec![form.focus_index()];
        for _ in 0..4 {
            form.handle_key(Key::Tab);
            seen.push(form.focus_index());
        }
        assert_eq!(seen, [0, 1, 2, 3, 0]);

        form.handle_key(Key::Up);
        assert_eq!(form.focus_index(), 3);
        form.handle_key(Key::BackTab);
        assert_eq!(form.focus_index(), 2);
        form.handle_key(Key::Down);
        assert_eq!(form.focus_index(), 3);
    }

    #[test]
    fn enter_advances_on_fields_and_fires_buttons() {
        let mut form = two_fields();
        assert_eq!(form.handle_key(Key::Enter), FormAction::None);
        assert_eq!(form.focus_index(), 1);
        assert_eq!(form.handle_key(Key::Enter), FormAction::None);
        assert_eq!(form.handle_key(Key::Enter), FormAction::Submit);
        form.handle_key(Key::Tab);
        assert_eq!(form.handle_key(Key::Enter), FormAction::Back);
        assert_eq!(form.back(), StageName::Start);
    }

    #[test]
    fn typing_edits_only_the_focused_field() {
        let mut form = two_fields();
        type_str(&mut form, "alice");
        form.handle_key(Key::Tab);
        type_str(&mut form, "pw1");
        form.handle_key(Key::Backspace);
        assert_eq!(form.value(0), "alice");
        assert_eq!(form.value(1), "pw");

        let mut out = String::new();
        form.render(&mut out);
        assert!(out.contains("  Логин: alice"));
        assert!(out.contains("> Пароль: **"));
        assert!(!out.contains("pw"));
    }

    #[test]
    fn character_limit_applies_to_single_line_fields() {
        let mut form = two_fields();
        type_str(&mut form, &"x".repeat(40));
        assert_eq!(form.value(0).len(), CHAR_LIMIT);
    }

    #[test]
    fn validator_rejects_edit_and_keeps_previous_value() {
        let mut form = FormState::new(
            vec![Field::new("cvv").validated(validate::cvv)],
            StageName::RecordList,
            "Сохранить",
        );
        type_str(&mut form, "30x");
        assert_eq!(form.value(0), "30");
        assert!(form.focused_field().unwrap().error().is_some());

        form.handle_key(Key::Char('5'));
        assert_eq!(form.value(0), "305");
        assert!(form.focused_field().unwrap().error().is_none());

        for _ in 0..3 {
            form.handle_key(Key::Backspace);
        }
        assert_eq!(form.value(0), "");
    }

    #[test]
    fn multiline_field_takes_newlines_without_limit() {
        let mut form = FormState::new(
            vec![Field::new("Текст").multiline()],
            StageName::RecordList,
            "Сохранить",
        );
        type_str(&mut form, "line one");
        form.handle_key(Key::Enter);
        type_str(&mut form, &"y".repeat(50));
        assert_eq!(form.focus_index(), 0);
        assert_eq!(form.value(0), format!("line one\n{}", "y".repeat(50)));
    }
}
