use super::{editor, StageContext};
use crate::form::{Field, Form, FormAction, FormState};
use crate::input::Key;
use crate::outcome::{Outcome, StageName};
use crate::validate;
use keeper_protocol::{CreditCardBody, RecordType};
use tracing::warn;

const NAME: usize = 0;
const CCN: usize = 1;
const EXP: usize = 2;
const CVV: usize = 3;
const DESCRIPTION: usize = 4;

pub struct CreditCardForm {
    form: FormState,
    record_id: String,
}

impl CreditCardForm {
    pub fn new() -> Self {
        Self {
            form: FormState::new(
                vec![
                    Field::new("Название"),
                    Field::new("Номер карты").validated(validate::ccn),
                    Field::new("Срок действия").validated(validate::exp),
                    Field::new("cvv").masked().validated(validate::cvv),
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
        let record = match editor::load(ctx, RecordType::CreditCard).await {
            Ok(Some(record)) => record,
            Ok(None) => return Outcome::None,
            Err(outcome) => return outcome,
        };
        let body: CreditCardBody = match serde_json::from_slice(&record.body) {
            Ok(body) => body,
            Err(e) => {
                warn!(id = %record.id, "failed to decode card body: {e}");
                return Outcome::None;
            }
        };

        self.form.set_value(NAME, record.name_lossy());
        self.form.set_value(CCN, body.ccn);
        self.form.set_value(EXP, body.exp);
        self.form.set_value(CVV, body.cvv);
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
        let body = CreditCardBody {
            ccn: self.form.value(CCN).to_string(),
            exp: self.form.value(EXP).to_string(),
            cvv: self.form.value(CVV).to_string(),
        };
        let plaintext = match serde_json::to_vec(&body) {
            Ok(bytes) => bytes,
            Err(e) => return Outcome::info(e.to_string(), StageName::CreditCard, editor::BACK_BUTTON),
        };
        let record = editor::template(
            RecordType::CreditCard,
            &self.record_id,
            self.form.value(NAME),
            self.form.value(DESCRIPTION),
        );
        editor::save(ctx, StageName::CreditCard, &record, &plaintext).await
    }

    pub fn render(&self) -> String {
        let mut out = String::from("Банковская карта\n\n");
        self.form.render(&mut out);
        out.push('\n');
        out.push_str(editor::FOOTER);
        out
    }
}

impl Default for CreditCardForm {
    fn default() -> Self {
        Self::new()
    }
}

impl Form for CreditCardForm {
    fn form(&self) -> &FormState {
        &self.form
    }
}
