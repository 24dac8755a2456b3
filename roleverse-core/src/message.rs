//! Transcript messages.

use serde::{Deserialize, Serialize};

/// What produced a message, which decides how it is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MessageKind {
    /// Client or session notices (offline mode, saves, chances).
    System,
    /// AI-generated story text. The only kind that is animated.
    Narration,
    /// Echo of what the player typed.
    PlayerInput,
    /// Validation or server errors.
    Error,
}

impl MessageKind {
    /// Whether messages of this kind are revealed progressively.
    pub fn is_animated(self) -> bool {
        matches!(self, MessageKind::Narration)
    }
}

/// A single entry worth surfacing to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub kind: MessageKind,
    pub raw_text: String,
    pub rendered_instantly: bool,
}

impl Message {
    pub fn new(kind: MessageKind, raw_text: impl Into<String>) -> Self {
        Self {
            kind,
            raw_text: raw_text.into(),
            rendered_instantly: !kind.is_animated(),
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(MessageKind::System, text)
    }

    pub fn narration(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Narration, text)
    }

    pub fn player(text: impl Into<String>) -> Self {
        Self::new(MessageKind::PlayerInput, text)
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self::new(MessageKind::Error, text)
    }
}
