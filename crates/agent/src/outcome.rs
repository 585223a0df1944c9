use keeper_protocol::RecordType;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageName {
    Start,
    Register,
    Login,
    OperationPicker,
    RecordList,
    LoginPassword,
    CreditCard,
    Text,
    File,
    Error,
    Info,
}

impl StageName {
    pub fn as_str(self) -> &'static str {
        match self {
            StageName::Start => "start",
            StageName::Register => "registration",
            StageName::Login => "login",
            StageName::OperationPicker => "operation_list",
            StageName::RecordList => "list",
            StageName::LoginPassword => "login_password",
            StageName::CreditCard => "credit_card",
            StageName::Text => "text",
            StageName::File => "file",
            StageName::Error => "error",
            StageName::Info => "info",
        }
    }
}

impl From<RecordType> for StageName {
    fn from(kind: RecordType) -> Self {
        match kind {
            RecordType::LoginPassword => StageName::LoginPassword,
            RecordType::CreditCard => StageName::CreditCard,
            RecordType::Text => StageName::Text,
            RecordType::File => StageName::File,
        }
    }
}

impl fmt::Display for StageName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a stage asks the dispatcher to do next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    None,
    SwitchStage(StageName),
    SwitchStageWithRecord(StageName, String),
    Quit,
    AuthSucceeded { user_id: String, token: String },
    ShowError { message: String, back: StageName },
    ShowInfo {
        message: String,
        back: StageName,
        button: String,
    },
}

impl Outcome {
    pub fn info(message: impl Into<String>, back: StageName, button: impl Into<String>) -> Self {
        Outcome::ShowInfo {
            message: message.into(),
            back,
            button: button.into(),
        }
    }

    pub fn error(message: impl Into<String>, back: StageName) -> Self {
        Outcome::ShowError {
            message: message.into(),
            back,
        }
    }
}
