/// In-memory identity of the running agent. Discarded on exit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
    pub token: String,
    /// Record being edited; empty while creating a new one.
    pub record_id: String,
}

impl Session {
    pub fn is_authenticated(&self) -> bool {
        !self.token.is_empty()
    }
}
