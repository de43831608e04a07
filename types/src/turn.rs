//! Conversation turns.
//!
//! A [`Turn`] is a single role-tagged message in a conversation history. It
//! serializes to the chat-completions wire shape
//! `{"role": "...", "content": "..."}` directly, so request bodies can embed
//! turns without an intermediate DTO.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }

    #[must_use]
    pub const fn is_system(self) -> bool {
        matches!(self, Role::System)
    }
}

/// A single message in a conversation.
///
/// Content may be empty: an inbound message that is blank after trimming still
/// travels through the pipeline as a turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    #[must_use]
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_serializes_to_wire_shape() {
        let turn = Turn::user("привет");
        let json = serde_json::to_value(&turn).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"role": "user", "content": "привет"})
        );
    }

    #[test]
    fn role_strings_match_wire_values() {
        assert_eq!(Role::System.as_str(), "system");
        assert_eq!(Role::User.as_str(), "user");
        assert_eq!(Role::Assistant.as_str(), "assistant");
        assert!(Role::System.is_system());
        assert!(!Role::Assistant.is_system());
    }
}
