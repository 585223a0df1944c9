//! Stage dispatcher: owns the session, the current stage, and the stage a
//! notice was raised from.

use crate::input::Key;
use crate::outcome::{Outcome, StageName};
use crate::session::Session;
use crate::stages::{NoticeStage, Services, Stage, StageContext, StartStage};
use std::mem;
use tracing::debug;

const NOTICE_BUTTON: &str = "Назад";

pub struct App {
    services: Services,
    session: Session,
    stage: Stage,
    /// Stage an open notice was raised from. Resumed, not rebuilt, when the
    /// notice leads back to it.
    parked: Option<Stage>,
    running: bool,
}

impl App {
    pub fn new(services: Services) -> Self {
        Self {
            services,
            session: Session::default(),
            stage: Stage::Start(StartStage),
            parked: None,
            running: true,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn stage(&self) -> &Stage {
        &self.stage
    }

    pub fn stage_name(&self) -> StageName {
        self.stage.name()
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn render(&self) -> String {
        self.stage.render()
    }

    /// Ctrl+c always quits; Esc quits everywhere except the text editor.
    pub async fn handle_key(&mut self, key: Key) {
        let outcome = match key {
            Key::Ctrl('c') => Outcome::Quit,
            Key::Esc if self.stage.name() != StageName::Text => Outcome::Quit,
            key => {
                let ctx = StageContext {
                    session: &self.session,
                    services: &self.services,
                };
                self.stage.handle_key(&ctx, key).await
            }
        };
        self.dispatch(outcome).await;
    }

    async fn dispatch(&mut self, mut outcome: Outcome) {
        loop {
            outcome = match outcome {
                Outcome::None => return,
                Outcome::Quit => {
                    debug!(stage = %self.stage.name(), "quit requested");
                    self.running = false;
                    return;
                }
                Outcome::SwitchStage(name) => {
                    self.session.record_id.clear();
                    self.enter(name).await
                }
                Outcome::SwitchStageWithRecord(name, id) => {
                    self.session.record_id = id;
                    self.enter(name).await
                }
                Outcome::AuthSucceeded { user_id, token } => {
                    self.session = Session {
                        user_id,
                        token,
                        record_id: String::new(),
                    };
                    self.enter(StageName::RecordList).await
                }
                Outcome::ShowError { message, back } => {
                    self.show(Stage::Error(NoticeStage::new(message, back, NOTICE_BUTTON)));
                    return;
                }
                Outcome::ShowInfo {
                    message,
                    back,
                    button,
                } => {
                    self.show(Stage::Info(NoticeStage::new(message, back, button)));
                    return;
                }
            };
        }
    }

    fn show(&mut self, notice: Stage) {
        let previous = mem::replace(&mut self.stage, notice);
        debug!(from = %previous.name(), to = %self.stage.name(), "notice shown");
        if !previous.is_notice() {
            self.parked = Some(previous);
        }
    }

    async fn enter(&mut self, name: StageName) -> Outcome {
        if let Some(parked) = self.parked.take() {
            if parked.name() == name {
                debug!(stage = %name, "stage resumed");
                self.stage = parked;
                return Outcome::None;
            }
        }

        debug!(from = %self.stage.name(), to = %name, "stage switch");
        let mut stage = Stage::fresh(name);
        let ctx = StageContext {
            session: &self.session,
            services: &self.services,
        };
        let outcome = stage.prepare(&ctx).await;
        self.stage = stage;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use base64::{engine::general_purpose::STANDARD, Engine as _};
    use keeper_client_sdk::{ApiError, AuthSession, Codec, KeyStore, TransferLimits, VaultApi};
    use keeper_protocol::{Credentials, Record, RecordSummary, RecordType};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;

    const USER_ID: &str = "u-1";

    #[derive(Default)]
    struct FakeApi {
        records: Mutex<Vec<Record>>,
        reject_login: bool,
        reject_upsert: Option<String>,
    }

    fn session(key: Option<String>) -> AuthSession {
        AuthSession {
            user_id: USER_ID.to_string(),
            token: "token-1".to_string(),
            message: "ok".to_string(),
            key,
        }
    }

    #[async_trait]
    impl VaultApi for FakeApi {
        async fn register(&self, _: &Credentials) -> Result<AuthSession, ApiError> {
            Ok(session(Some(STANDARD.encode([7u8; 16]))))
        }

        async fn login(&self, _: &Credentials) -> Result<AuthSession, ApiError> {
            if self.reject_login {
                return Err(ApiError::Unauthorized {
                    message: "Неверная пара логин/пароль".to_string(),
                });
            }
            Ok(session(None))
        }

        async fn list(&self, _: &str) -> Result<Vec<RecordSummary>, ApiError> {
            Ok(self.records.lock().unwrap().iter().map(Record::summary).collect())
        }

        async fn get(&self, _: &str, id: &str) -> Result<Record, ApiError> {
            self.records
                .lock()
                .unwrap()
                .iter()
                .find(|r| r.id == id)
                .cloned()
                .ok_or_else(|| ApiError::Rejected {
                    status: 500,
                    message: "Внутренняя ошибка сервера".to_string(),
                })
        }

        async fn upsert(&self, _: &str, record: &Record) -> Result<Record, ApiError> {
            if let Some(message) = &self.reject_upsert {
                return Err(ApiError::Rejected {
                    status: 400,
                    message: message.clone(),
                });
            }
            let mut records = self.records.lock().unwrap();
            let mut stored = record.clone();
            if stored.id.is_empty() {
                stored.id = format!("rec-{}", records.len() + 1);
            }
            match records.iter_mut().find(|r| r.id == stored.id) {
                Some(existing) if record.part > 0 => existing.body.extend_from_slice(&record.body),
                Some(existing) => *existing = stored.clone(),
                None => records.push(stored.clone()),
            }
            stored.body.clear();
            Ok(stored)
        }
    }

    fn app_with(api: FakeApi) -> (App, Arc<FakeApi>, TempDir) {
        let dir = TempDir::new().unwrap();
        let api = Arc::new(api);
        let services = Services {
            api: api.clone(),
            codec: Codec::new(KeyStore::new(dir.path().join("users"))),
            limits: TransferLimits::default(),
            download_dir: dir.path().join("files"),
        };
        (App::new(services), api, dir)
    }

    async fn type_str(app: &mut App, s: &str) {
        for c in s.chars() {
            app.handle_key(Key::Char(c)).await;
        }
    }

    async fn submit_credentials(app: &mut App, user: &str, password: &str) {
        type_str(app, user).await;
        app.handle_key(Key::Tab).await;
        type_str(app, password).await;
        app.handle_key(Key::Tab).await;
        app.handle_key(Key::Enter).await;
    }

    #[tokio::test]
    async fn registration_stores_key_and_opens_record_list() {
        let (mut app, _api, dir) = app_with(FakeApi::default());
        app.handle_key(Key::Ctrl('r')).await;
        assert_eq!(app.stage_name(), StageName::Register);

        submit_credentials(&mut app, "alice", "pw1").await;
        assert_eq!(app.stage_name(), StageName::RecordList);
        assert_eq!(app.session().user_id, USER_ID);
        assert!(app.session().is_authenticated());
        assert!(dir.path().join("users").join(USER_ID).is_file());
    }

    #[tokio::test]
    async fn rejected_login_returns_to_filled_form() {
        let (mut app, _api, _dir) = app_with(FakeApi {
            reject_login: true,
            ..FakeApi::default()
        });
        app.handle_key(Key::Ctrl('l')).await;
        submit_credentials(&mut app, "alice", "bad").await;

        match app.stage() {
            Stage::Info(notice) => assert_eq!(notice.message(), "Неверная пара логин/пароль"),
            _ => panic!("expected info notice, got {}", app.stage_name()),
        }
        app.handle_key(Key::Enter).await;
        assert_eq!(app.stage_name(), StageName::Login);
        let form = app.stage().form().unwrap();
        assert_eq!(form.value(0), "alice");
        assert!(!app.session().is_authenticated());
    }

    #[tokio::test]
    async fn created_record_reopens_with_decrypted_fields() {
        let (mut app, api, _dir) = app_with(FakeApi::default());
        app.handle_key(Key::Ctrl('r')).await;
        submit_credentials(&mut app, "alice", "pw1").await;

        app.handle_key(Key::Ctrl('n')).await;
        assert_eq!(app.stage_name(), StageName::OperationPicker);
        app.handle_key(Key::Enter).await;
        assert_eq!(app.stage_name(), StageName::LoginPassword);

        type_str(&mut app, "mail").await;
        app.handle_key(Key::Tab).await;
        type_str(&mut app, "alice@mail").await;
        app.handle_key(Key::Tab).await;
        type_str(&mut app, "s3cret").await;
        app.handle_key(Key::Ctrl('s')).await;

        assert_eq!(app.stage_name(), StageName::RecordList);
        {
            let records = api.records.lock().unwrap();
            assert_eq!(records.len(), 1);
            assert!(!records[0].body.windows(6).any(|w| w == b"s3cret"));
        }
        assert!(app.render().contains("mail"));

        app.handle_key(Key::Enter).await;
        assert_eq!(app.stage_name(), StageName::LoginPassword);
        assert_eq!(app.session().record_id, "rec-1");
        let form = app.stage().form().unwrap();
        assert_eq!(form.value(1), "alice@mail");
        assert_eq!(form.value(2), "s3cret");
    }

    #[tokio::test]
    async fn failed_save_shows_server_message_and_keeps_input() {
        let (mut app, _api, _dir) = app_with(FakeApi {
            reject_upsert: Some("Ошибка в запросе".to_string()),
            ..FakeApi::default()
        });
        app.handle_key(Key::Ctrl('r')).await;
        submit_credentials(&mut app, "alice", "pw1").await;
        app.handle_key(Key::Ctrl('n')).await;
        app.handle_key(Key::Enter).await;
        type_str(&mut app, "mail").await;
        app.handle_key(Key::Ctrl('s')).await;

        match app.stage() {
            Stage::Info(notice) => {
                assert_eq!(notice.message(), "Ошибка в запросе");
                assert_eq!(notice.back(), StageName::LoginPassword);
            }
            _ => panic!("expected info notice, got {}", app.stage_name()),
        }
        app.handle_key(Key::Enter).await;
        assert_eq!(app.stage_name(), StageName::LoginPassword);
        assert_eq!(app.stage().form().unwrap().value(0), "mail");
    }

    #[tokio::test]
    async fn esc_quits_except_inside_text_editor() {
        let (mut app, _api, _dir) = app_with(FakeApi::default());
        app.handle_key(Key::Ctrl('l')).await;
        submit_credentials(&mut app, "alice", "pw1").await;
        app.handle_key(Key::Ctrl('n')).await;
        app.handle_key(Key::Down).await;
        app.handle_key(Key::Enter).await;
        assert_eq!(app.stage_name(), StageName::Text);

        app.handle_key(Key::Esc).await;
        assert!(app.is_running());
        assert_eq!(app.stage_name(), StageName::Text);

        app.handle_key(Key::Ctrl('c')).await;
        assert!(!app.is_running());

        let (mut app, _api, _dir) = app_with(FakeApi::default());
        app.handle_key(Key::Esc).await;
        assert!(!app.is_running());
    }

    #[tokio::test]
    async fn undecryptable_record_opens_error_notice_instead_of_form() {
        let mut garbled = Record::new(RecordType::LoginPassword);
        garbled.id = "r1".to_string();
        garbled.name = b"mail".to_vec();
        garbled.body = vec![0xa5; 64];
        let (mut app, _api, _dir) = app_with(FakeApi {
            records: Mutex::new(vec![garbled]),
            ..FakeApi::default()
        });
        app.handle_key(Key::Ctrl('r')).await;
        submit_credentials(&mut app, "alice", "pw1").await;

        app.handle_key(Key::Enter).await;
        match app.stage() {
            Stage::Error(notice) => {
                assert!(notice.message().starts_with("Не удалось расшифровать запись"));
                assert!(!notice.message().contains("decryption failed"));
                assert_eq!(notice.back(), StageName::RecordList);
            }
            _ => panic!("expected error notice, got {}", app.stage_name()),
        }
        assert!(app.stage().form().is_none());

        app.handle_key(Key::Enter).await;
        assert_eq!(app.stage_name(), StageName::RecordList);
        assert!(app.session().record_id.is_empty());
    }

    #[tokio::test]
    async fn unwritable_key_directory_shows_key_to_save_by_hand() {
        let (mut app, _api, dir) = app_with(FakeApi::default());
        std::fs::write(dir.path().join("users"), b"not a directory").unwrap();

        app.handle_key(Key::Ctrl('r')).await;
        submit_credentials(&mut app, "alice", "pw1").await;

        match app.stage() {
            Stage::Error(notice) => {
                assert_eq!(notice.back(), StageName::Start);
                assert!(notice.message().contains(&STANDARD.encode([7u8; 16])));
            }
            _ => panic!("expected error notice, got {}", app.stage_name()),
        }
        assert!(!app.session().is_authenticated());

        app.handle_key(Key::Enter).await;
        assert_eq!(app.stage_name(), StageName::Start);
    }
}
