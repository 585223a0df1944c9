use crate::input::Key;
use crate::outcome::{Outcome, StageName};

/// A message with a single button leading to `back`.
#[derive(Debug, Clone)]
pub struct NoticeStage {
    message: String,
    back: StageName,
    button: String,
}

impl NoticeStage {
    pub fn new(message: impl Into<String>, back: StageName, button: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            back,
            button: button.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn back(&self) -> StageName {
        self.back
    }

    pub fn handle_key(&mut self, key: Key) -> Outcome {
        match key {
            Key::Enter => Outcome::SwitchStage(self.back),
            _ => Outcome::None,
        }
    }

    pub fn render(&self) -> String {
        format!("{}\n\n> [ {} ]\n", self.message, self.button)
    }
}
