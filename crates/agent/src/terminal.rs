use crate::input::Key;
use crossterm::cursor::{Hide, MoveTo, MoveToNextLine, Show};
use crossterm::event::{self, Event};
use crossterm::style::Print;
use crossterm::terminal::{self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, queue};
use std::io::{self, Stdout, Write};
use tracing::warn;

/// Raw-mode alternate screen. Restores the terminal when dropped.
pub struct Terminal {
    out: Stdout,
}

impl Terminal {
    pub fn enter() -> io::Result<Self> {
        terminal::enable_raw_mode()?;
        let mut out = io::stdout();
        if let Err(e) = execute!(out, EnterAlternateScreen, Hide) {
            let _ = terminal::disable_raw_mode();
            return Err(e);
        }
        Ok(Self { out })
    }

    /// Replaces the screen contents with `frame`.
    pub fn draw(&mut self, frame: &str) -> io::Result<()> {
        queue!(self.out, Clear(ClearType::All), MoveTo(0, 0))?;
        // Raw mode does not translate '\n' into a carriage return.
        for line in frame.lines() {
            queue!(self.out, Print(line), MoveToNextLine(1))?;
        }
        self.out.flush()
    }

    /// Waits for the next key press. `None` for events the stages ignore,
    /// resizes included; the caller simply redraws.
    pub async fn next_key(&mut self) -> io::Result<Option<Key>> {
        let event = tokio::task::spawn_blocking(event::read)
            .await
            .map_err(io::Error::other)??;
        Ok(match event {
            Event::Key(key) => Key::from_event(&key),
            _ => None,
        })
    }
}

impl Drop for Terminal {
    fn drop(&mut self) {
        if let Err(e) = execute!(self.out, Show, LeaveAlternateScreen) {
            warn!("failed to leave alternate screen: {e}");
        }
        if let Err(e) = terminal::disable_raw_mode() {
            warn!("failed to disable raw mode: {e}");
        }
    }
}
