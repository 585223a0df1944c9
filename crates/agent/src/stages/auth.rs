use super::StageContext;
use crate::form::{Field, Form, FormAction, FormState};
use crate::input::Key;
use crate::outcome::{Outcome, StageName};
use keeper_client_sdk::AuthSession;
use keeper_protocol::Credentials;
use tracing::{info, warn};

const USER_NAME: usize = 0;
const PASSWORD: usize = 1;

const BACK_BUTTON: &str = "Назад";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Register,
    Login,
}

/// Registration and login share one form; only the call and the key
/// handling differ.
pub struct AuthStage {
    mode: AuthMode,
    form: FormState,
}

impl AuthStage {
    pub fn new(mode: AuthMode) -> Self {
        let submit = match mode {
            AuthMode::Register => "Зарегистрироваться",
            AuthMode::Login => "Авторизоваться",
        };
        Self {
            mode,
            form: FormState::new(
                vec![Field::new("Логин"), Field::new("Пароль").masked()],
                StageName::Start,
                submit,
            ),
        }
    }

    pub fn mode(&self) -> AuthMode {
        self.mode
    }

    fn name(&self) -> StageName {
        match self.mode {
            AuthMode::Register => StageName::Register,
            AuthMode::Login => StageName::Login,
        }
    }

    pub async fn handle_key(&mut self, ctx: &StageContext<'_>, key: Key) -> Outcome {
        match self.form.handle_key(key) {
            FormAction::Submit => self.submit(ctx).await,
            FormAction::Back => Outcome::SwitchStage(self.form.back()),
            FormAction::None => Outcome::None,
        }
    }

    async fn submit(&self, ctx: &StageContext<'_>) -> Outcome {
        let credentials = Credentials {
            user_name: self.form.value(USER_NAME).to_string(),
            password: self.form.value(PASSWORD).to_string(),
        };
        let api = ctx.services.api.as_ref();
        let result = match self.mode {
            AuthMode::Register => api.register(&credentials).await,
            AuthMode::Login => api.login(&credentials).await,
        };

        let session = match result {
            Ok(session) => session,
            Err(e) => {
                warn!(user = %credentials.user_name, mode = ?self.mode, "auth rejected: {e}");
                return Outcome::info(e.user_message(), self.name(), BACK_BUTTON);
            }
        };

        if self.mode == AuthMode::Register {
            if let Some(outcome) = store_key(ctx, &session) {
                return outcome;
            }
        }

        info!(user = %credentials.user_name, id = %session.user_id, "{}", session.message);
        Outcome::AuthSucceeded {
            user_id: session.user_id,
            token: session.token,
        }
    }

    pub fn render(&self) -> String {
        let title = match self.mode {
            AuthMode::Register => "Регистрация",
            AuthMode::Login => "Авторизация",
        };
        let mut out = format!("{title}\n\n");
        self.form.render(&mut out);
        out
    }
}

/// Persists the key from a registration reply. Returns the error notice to
/// show when that is impossible.
fn store_key(ctx: &StageContext<'_>, session: &AuthSession) -> Option<Outcome> {
    let keys = ctx.services.codec.keys();
    let Some(key) = session.key.as_deref() else {
        warn!(id = %session.user_id, "registration reply carried no key");
        return Some(Outcome::error(
            "Сервер не передал ключ шифрования",
            StageName::Start,
        ));
    };

    match keys.store(&session.user_id, key) {
        Ok(path) => {
            info!(path = %path.display(), "encryption key saved");
            None
        }
        Err(e) => {
            warn!(id = %session.user_id, "failed to save encryption key: {e}");
            let path = keys
                .key_path(&session.user_id)
                .unwrap_or_else(|_| keys.dir().to_path_buf());
            Some(Outcome::error(
                format!(
                    "Не удалось сохранить ключ шифрования. Сохраните файл {} с содержимым: {key}",
                    path.display()
                ),
                StageName::Start,
            ))
        }
    }
}

impl Form for AuthStage {
    fn form(&self) -> &FormState {
        &self.form
    }
}
