use super::picker::type_label;
use super::StageContext;
use crate::input::Key;
use crate::outcome::{Outcome, StageName};
use keeper_protocol::RecordSummary;
use std::fmt::Write as _;
use tracing::{debug, warn};

#[derive(Debug, Default)]
pub struct ListStage {
    items: Vec<RecordSummary>,
    cursor: usize,
}

impl ListStage {
    pub fn items(&self) -> &[RecordSummary] {
        &self.items
    }

    /// Reloads the user's records. Failures leave the list empty.
    pub async fn prepare(&mut self, ctx: &StageContext<'_>) -> Outcome {
        self.items = match ctx.services.api.list(&ctx.session.token).await {
            Ok(items) => items,
            Err(e) => {
                warn!("failed to list records: {e}");
                Vec::new()
            }
        };
        self.cursor = self.cursor.min(self.items.len().saturating_sub(1));
        debug!(count = self.items.len(), "records listed");
        Outcome::None
    }

    pub async fn handle_key(&mut self, ctx: &StageContext<'_>, key: Key) -> Outcome {
        match key {
            Key::Up | Key::Char('k') => {
                self.cursor = self.cursor.saturating_sub(1);
                Outcome::None
            }
            Key::Down | Key::Char('j') => {
                if self.cursor + 1 < self.items.len() {
                    self.cursor += 1;
                }
                Outcome::None
            }
            Key::Enter => match self.items.get(self.cursor) {
                Some(item) => Outcome::SwitchStageWithRecord(item.record_type.into(), item.id.clone()),
                None => Outcome::None,
            },
            Key::Ctrl('n') => Outcome::SwitchStage(StageName::OperationPicker),
            Key::Ctrl('r') => self.prepare(ctx).await,
            _ => Outcome::None,
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::from("Мои записи\n\n");
        if self.items.is_empty() {
            out.push_str("  Записей пока нет\n");
        }
        for (i, item) in self.items.iter().enumerate() {
            let marker = if i == self.cursor { ">" } else { " " };
            let _ = writeln!(
                out,
                "{marker} {} [{}]",
                String::from_utf8_lossy(&item.name),
                type_label(item.record_type)
            );
            if !item.description.is_empty() {
                let _ = writeln!(out, "    {}", String::from_utf8_lossy(&item.description));
            }
        }
        out.push_str("\n[ Ctrl+n ] - Создать новую запись\n");
        out.push_str("[ Ctrl+r ] - Обновить список\n");
        out
    }
}
