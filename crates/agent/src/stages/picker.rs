use crate::input::Key;
use crate::outcome::{Outcome, StageName};
use keeper_protocol::RecordType;
use std::fmt::Write as _;

pub fn type_label(kind: RecordType) -> &'static str {
    match kind {
        RecordType::LoginPassword => "Логин/пароль",
        RecordType::Text => "Текст",
        RecordType::File => "Файл",
        RecordType::CreditCard => "Банковская карта",
    }
}

/// Chooses the type of a new record.
#[derive(Debug, Default)]
pub struct PickerStage {
    cursor: usize,
}

impl PickerStage {
    pub fn selected(&self) -> RecordType {
        RecordType::ALL[self.cursor]
    }

    pub fn handle_key(&mut self, key: Key) -> Outcome {
        match key {
            Key::Up | Key::Char('k') => {
                self.cursor = self.cursor.saturating_sub(1);
                Outcome::None
            }
            Key::Down | Key::Char('j') => {
                self.cursor = (self.cursor + 1).min(RecordType::ALL.len() - 1);
                Outcome::None
            }
            Key::Enter | Key::Char(' ') => Outcome::SwitchStage(self.selected().into()),
            Key::Ctrl('b') => Outcome::SwitchStage(StageName::RecordList),
            _ => Outcome::None,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::from("Новая запись\n\n");
        for (i, kind) in RecordType::ALL.iter().enumerate() {
            let marker = if i == self.cursor { ">" } else { " " };
            let _ = writeln!(out, "{marker} {}", type_label(*kind));
        }
        out.push_str("\n[ Ctrl+b ] - Назад\n");
        out
    }
}
