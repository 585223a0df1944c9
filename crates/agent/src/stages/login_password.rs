use super::{editor, StageContext};
use crate::form::{Field, Form, FormAction, FormState};
use crate::input::Key;
use crate::outcome::{Outcome, StageName};
use keeper_protocol::{LoginBody, RecordType};
use tracing::warn;

const NAME: usize = 0;
const LOGIN: usize = 1;
const PASSWORD: usize = 2;
const DESCRIPTION: usize = 3;

pub struct LoginPasswordForm {
    form: FormState,
    record_id: String,
}

impl LoginPasswordForm {
    pub fn new() -> Self {
        Self {
            form: FormState::new(
                vec![
                    Field::new("Название"),
                    Field::new("Логин"),
                    Field::new("Пароль"),
                    Field::new("Описание"),
                ],
                StageName::RecordList,
                editor::SAVE_LABEL,
            ),
            record_id: String::new(),
        }
    }

    pub async fn prepare(&mut self, ctx: &StageContext<'_>) -> Outcome {
        self.record_id = ctx.session.record_id.clone();
        let record = match editor::load(ctx, RecordType::LoginPassword).await {
            Ok(Some(record)) => record,
            Ok(None) => return Outcome::None,
            Err(outcome) => return outcome,
        };
        let body: LoginBody = match serde_json::from_slice(&record.body) {
            Ok(body) => body,
            Err(e) => {
                warn!(id = %record.id, "failed to decode login body: {e}");
                return Outcome::None;
            }
        };

        self.form.set_value(NAME, record.name_lossy());
        self.form.set_value(LOGIN, body.login);
        self.form.set_value(PASSWORD, body.password);
        self.form.set_value(DESCRIPTION, record.description_lossy());
        Outcome::None
    }

    pub async fn handle_key(&mut self, ctx: &StageContext<'_>, key: Key) -> Outcome {
        let action = match key {
            Key::Ctrl('s') => FormAction::Submit,
            Key::Ctrl('b') => FormAction::Back,
            key => self.form.handle_key(key),
        };
        match action {
            FormAction::Submit => self.save(ctx).await,
            FormAction::Back => Outcome::SwitchStage(self.form.back()),
            FormAction::None => Outcome::None,
        }
    }

    async fn save(&self, ctx: &StageContext<'_>) -> Outcome {
        let body = LoginBody {
            login: self.form.value(LOGIN).to_string(),
            password: self.form.value(PASSWORD).to_string(),
        };
        let plaintext = match serde_json::to_vec(&body) {
            Ok(bytes) => bytes,
            Err(e) => return Outcome::info(e.to_string(), StageName::LoginPassword, editor::BACK_BUTTON),
        };
        let record = editor::template(
            RecordType::LoginPassword,
            &self.record_id,
            self.form.value(NAME),
            self.form.value(DESCRIPTION),
        );
        editor::save(ctx, StageName::LoginPassword, &record, &plaintext).await
    }

    pub fn render(&self) -> String {
        let mut out = String::from("Логин/пароль\n\n");
        self.form.render(&mut out);
        out.push('\n');
        out.push_str(editor::FOOTER);
        out
    }
}

impl Default for LoginPasswordForm {
    fn default() -> Self {
        Self::new()
    }
}

impl Form for LoginPasswordForm {
    fn form(&self) -> &FormState {
        &self.form
    }
}
