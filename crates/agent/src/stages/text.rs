use super::{editor, StageContext};
use crate::form::{Field, Form, FormAction, FormState};
use crate::input::Key;
use crate::outcome::{Outcome, StageName};
use keeper_protocol::RecordType;

const NAME: usize = 0;
const DESCRIPTION: usize = 1;
const BODY: usize = 2;

/// Free text. The body is stored as raw UTF-8.
pub struct TextForm {
    form: FormState,
    record_id: String,
}

impl TextForm {
    pub fn new() -> Self {
        Self {
            form: FormState::new(
                vec![
                    Field::new("Название"),
                    Field::new("Описание"),
                    Field::new("Текст").multiline(),
                ],
                StageName::RecordList,
                editor::SAVE_LABEL,
            ),
            record_id: String::new(),
        }
    }

    pub async fn prepare(&mut self, ctx: &StageContext<'_>) -> Outcome {
        self.record_id = ctx.session.record_id.clone();
        match editor::load(ctx, RecordType::Text).await {
            Ok(Some(record)) => {
                self.form.set_value(NAME, record.name_lossy());
                self.form.set_value(DESCRIPTION, record.description_lossy());
                self.form.set_value(BODY, String::from_utf8_lossy(&record.body));
                Outcome::None
            }
            Ok(None) => Outcome::None,
            Err(outcome) => outcome,
        }
    }

    pub async fn handle_key(&mut self, ctx: &StageContext<'_>, key: Key) -> Outcome {
        let action = match key {
            Key::Ctrl('s') => FormAction::Submit,
            Key::Ctrl('b') => FormAction::Back,
            // Esc only leaves the body, it never quits from here.
            Key::Esc => {
                if self.form.focus_index() == BODY {
                    self.form.focus_next();
                }
                FormAction::None
            }
            key => self.form.handle_key(key),
        };
        match action {
            FormAction::Submit => self.save(ctx).await,
            FormAction::Back => Outcome::SwitchStage(self.form.back()),
            FormAction::None => Outcome::None,
        }
    }

    async fn save(&self, ctx: &StageContext<'_>) -> Outcome {
        let record = editor::template(
            RecordType::Text,
            &self.record_id,
            self.form.value(NAME),
            self.form.value(DESCRIPTION),
        );
        editor::save(ctx, StageName::Text, &record, self.form.value(BODY).as_bytes()).await
    }

    pub fn render(&self) -> String {
        let mut out = String::from("Текст\n\n");
        self.form.render(&mut out);
        out.push('\n');
        out.push_str(editor::FOOTER);
        out.push_str("[ Esc ] - Выйти из поля текста\n");
        out
    }
}

impl Default for TextForm {
    fn default() -> Self {
        Self::new()
    }
}

impl Form for TextForm {
    fn form(&self) -> &FormState {
        &self.form
    }
}
