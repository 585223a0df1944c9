//! Terminal client for the keeper vault: a stage machine over a plain-text
//! screen, driven one key press at a time.

pub mod app;
pub mod config;
pub mod form;
pub mod input;
pub mod outcome;
pub mod session;
pub mod shutdown;
pub mod stages;
pub mod terminal;
pub mod validate;

pub use app::App;
pub use config::AgentConfig;
pub use input::Key;
pub use outcome::{Outcome, StageName};
pub use session::Session;
pub use stages::{Services, Stage};
