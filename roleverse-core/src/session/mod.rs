//! Game session: state, the state machine and an async driver.
//!
//! [`SessionMachine`] is synchronous and never touches the network.
//! [`Session`] pairs it with a [`GameBackend`](crate::backend::GameBackend)
//! and runs each request to completion, which is all a line-oriented front
//! end or a test needs.

mod driver;
mod machine;
mod state;

use thiserror::Error;

pub use driver::Session;
pub use machine::{chance_message, parse_save_text, SessionMachine, LOCAL_SESSION_PREFIX};
pub use state::{CharacterSheet, ConnectionStatus, Phase, SessionState};

/// Reasons a session operation is refused.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("No game session yet. Start a game first.")]
    NoSession,

    #[error("Another request is still in progress.")]
    Busy,

    #[error("Save text is empty. Paste the text you got when saving.")]
    EmptySave,

    #[error("Save text is not valid: {0}")]
    InvalidSave(#[from] serde_json::Error),
}
