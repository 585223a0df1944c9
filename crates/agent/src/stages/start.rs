use crate::input::Key;
use crate::outcome::{Outcome, StageName};

pub struct StartStage;

impl StartStage {
    pub fn handle_key(&mut self, key: Key) -> Outcome {
        match key {
            Key::Ctrl('r') => Outcome::SwitchStage(StageName::Register),
            Key::Ctrl('l') => Outcome::SwitchStage(StageName::Login),
            Key::Char('q') => Outcome::Quit,
            _ => Outcome::None,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::from("Войдите в систему!\n\n");
        out.push_str("[ Ctrl+r ] - Зарегистрироваться\n");
        out.push_str("[ Ctrl+l ] - Авторизоваться\n");
        out.push_str("[ q ] - Выход\n");
        out
    }
}
