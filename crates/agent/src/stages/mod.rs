//! The closed set of screens and their shared plumbing.

mod auth;
mod credit_card;
mod editor;
mod file;
mod list;
mod login_password;
mod notice;
mod picker;
mod start;
mod text;

pub use auth::{AuthMode, AuthStage};
pub use credit_card::CreditCardForm;
pub use file::FileForm;
pub use list::ListStage;
pub use login_password::LoginPasswordForm;
pub use notice::NoticeStage;
pub use picker::PickerStage;
pub use start::StartStage;
pub use text::TextForm;

use crate::form::{Form, FormState};
use crate::input::Key;
use crate::outcome::{Outcome, StageName};
use crate::session::Session;
use keeper_client_sdk::{Codec, Transfer, TransferLimits, VaultApi};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::warn;

/// Long-lived collaborators the stages call into.
pub struct Services {
    pub api: Arc<dyn VaultApi>,
    pub codec: Codec,
    pub limits: TransferLimits,
    pub download_dir: PathBuf,
}

impl Services {
    pub fn transfer(&self) -> Transfer<'_> {
        Transfer::new(self.api.as_ref(), &self.codec, self.limits)
    }
}

pub struct StageContext<'a> {
    pub session: &'a Session,
    pub services: &'a Services,
}

pub enum Stage {
    Start(StartStage),
    Register(AuthStage),
    Login(AuthStage),
    OperationPicker(PickerStage),
    RecordList(ListStage),
    LoginPassword(LoginPasswordForm),
    CreditCard(CreditCardForm),
    Text(TextForm),
    File(FileForm),
    Error(NoticeStage),
    Info(NoticeStage),
}

impl Stage {
    /// A blank stage, not yet prepared. Notices need a message and are
    /// built from their outcome instead; asking for one here yields Start.
    pub fn fresh(name: StageName) -> Self {
        match name {
            StageName::Start => Stage::Start(StartStage),
            StageName::Error | StageName::Info => {
                warn!(stage = %name, "notice requested without a message, opening start");
                Stage::Start(StartStage)
            }
            StageName::Register => Stage::Register(AuthStage::new(AuthMode::Register)),
            StageName::Login => Stage::Login(AuthStage::new(AuthMode::Login)),
            StageName::OperationPicker => Stage::OperationPicker(PickerStage::default()),
            StageName::RecordList => Stage::RecordList(ListStage::default()),
            StageName::LoginPassword => Stage::LoginPassword(LoginPasswordForm::new()),
            StageName::CreditCard => Stage::CreditCard(CreditCardForm::new()),
            StageName::Text => Stage::Text(TextForm::new()),
            StageName::File => Stage::File(FileForm::new()),
        }
    }

    pub fn name(&self) -> StageName {
        match self {
            Stage::Start(_) => StageName::Start,
            Stage::Register(_) => StageName::Register,
            Stage::Login(_) => StageName::Login,
            Stage::OperationPicker(_) => StageName::OperationPicker,
            Stage::RecordList(_) => StageName::RecordList,
            Stage::LoginPassword(_) => StageName::LoginPassword,
            Stage::CreditCard(_) => StageName::CreditCard,
            Stage::Text(_) => StageName::Text,
            Stage::File(_) => StageName::File,
            Stage::Error(_) => StageName::Error,
            Stage::Info(_) => StageName::Info,
        }
    }

    pub fn is_notice(&self) -> bool {
        matches!(self, Stage::Error(_) | Stage::Info(_))
    }

    /// Loads whatever the stage shows. May finish with an outcome of its own.
    pub async fn prepare(&mut self, ctx: &StageContext<'_>) -> Outcome {
        match self {
            Stage::RecordList(s) => s.prepare(ctx).await,
            Stage::LoginPassword(s) => s.prepare(ctx).await,
            Stage::CreditCard(s) => s.prepare(ctx).await,
            Stage::Text(s) => s.prepare(ctx).await,
            Stage::File(s) => s.prepare(ctx).await,
            Stage::Start(_)
            | Stage::Register(_)
            | Stage::Login(_)
            | Stage::OperationPicker(_)
            | Stage::Error(_)
            | Stage::Info(_) => Outcome::None,
        }
    }

    pub async fn handle_key(&mut self, ctx: &StageContext<'_>, key: Key) -> Outcome {
        match self {
            Stage::Start(s) => s.handle_key(key),
            Stage::Register(s) | Stage::Login(s) => s.handle_key(ctx, key).await,
            Stage::OperationPicker(s) => s.handle_key(key),
            Stage::RecordList(s) => s.handle_key(ctx, key).await,
            Stage::LoginPassword(s) => s.handle_key(ctx, key).await,
            Stage::CreditCard(s) => s.handle_key(ctx, key).await,
            Stage::Text(s) => s.handle_key(ctx, key).await,
            Stage::File(s) => s.handle_key(ctx, key).await,
            Stage::Error(s) | Stage::Info(s) => s.handle_key(key),
        }
    }

    pub fn render(&self) -> String {
        match self {
            Stage::Start(s) => s.render(),
            Stage::Register(s) | Stage::Login(s) => s.render(),
            Stage::OperationPicker(s) => s.render(),
            Stage::RecordList(s) => s.render(),
            Stage::LoginPassword(s) => s.render(),
            Stage::CreditCard(s) => s.render(),
            Stage::Text(s) => s.render(),
            Stage::File(s) => s.render(),
            Stage::Error(s) | Stage::Info(s) => s.render(),
        }
    }

    /// Form state of multi-field stages.
    pub fn form(&self) -> Option<&FormState> {
        match self {
            Stage::Register(s) | Stage::Login(s) => Some(s.form()),
            Stage::LoginPassword(s) => Some(s.form()),
            Stage::CreditCard(s) => Some(s.form()),
            Stage::Text(s) => Some(s.form()),
            Stage::File(s) => Some(s.form()),
            _ => None,
        }
    }
}
