use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Key presses the stages understand.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Char(char),
    /// Control chord, always lowercase.
    Ctrl(char),
    Enter,
    Tab,
    BackTab,
    Up,
    Down,
    Backspace,
    Esc,
}

impl Key {
    /// Maps a terminal event. Releases and unsupported keys yield `None`.
    pub fn from_event(event: &KeyEvent) -> Option<Key> {
        if event.kind == KeyEventKind::Release {
            return None;
        }
        let key = match event.code {
            KeyCode::Char(c) if event.modifiers.contains(KeyModifiers::CONTROL) => {
                Key::Ctrl(c.to_ascii_lowercase())
            }
            KeyCode::Char(c) => Key::Char(c),
            KeyCode::Enter => Key::Enter,
            KeyCode::Tab if event.modifiers.contains(KeyModifiers::SHIFT) => Key::BackTab,
            KeyCode::Tab => Key::Tab,
            KeyCode::BackTab => Key::BackTab,
            KeyCode::Up => Key::Up,
            KeyCode::Down => Key::Down,
            KeyCode::Backspace => Key::Backspace,
            KeyCode::Esc => Key::Esc,
            _ => return None,
        };
        Some(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn control_chords_and_shift_tab_are_recognised() {
        let ctrl_s = KeyEvent::new(KeyCode::Char('S'), KeyModifiers::CONTROL);
        assert_eq!(Key::from_event(&ctrl_s), Some(Key::Ctrl('s')));

        let shift_tab = KeyEvent::new(KeyCode::Tab, KeyModifiers::SHIFT);
        assert_eq!(Key::from_event(&shift_tab), Some(Key::BackTab));

        let plain = KeyEvent::new(KeyCode::Char('ж'), KeyModifiers::NONE);
        assert_eq!(Key::from_event(&plain), Some(Key::Char('ж')));

        let f1 = KeyEvent::new(KeyCode::F(1), KeyModifiers::NONE);
        assert_eq!(Key::from_event(&f1), None);
    }
}
