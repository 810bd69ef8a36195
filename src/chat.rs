//! Type definitions for chat primitives
//!

use serde::{Deserialize, Serialize};

/// The author of a `Message`
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub(crate) enum Role {
    /// A `System` message is an authoritative message which is used to
    /// instruct the model. It is always the first message in a conversation.
    System,

    /// A message authored by the user
    User,

    /// A message authored by the model
    Assistant,
}

/// A `Message` in a chat conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct Message {
    /// The author of the message
    pub role: Role,
    /// The contents of the message
    pub content: String,
}

impl Message {
    pub(crate) fn new(role: Role, content: String) -> Message {
        Message { role, content }
    }

    pub(crate) fn system(content: String) -> Message {
        Message::new(Role::System, content)
    }

    pub(crate) fn user(content: String) -> Message {
        Message::new(Role::User, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_use_wire_names() {
        let msg = Message::new(Role::Assistant, "hi".to_string());

        let json = serde_json::to_string(&msg).unwrap();

        assert_eq!(json, r#"{"role":"assistant","content":"hi"}"#);
        assert_eq!(Role::System.to_string(), "system");
    }

    #[test]
    fn test_unknown_role_is_rejected() {
        let msg = serde_json::from_str::<Message>(r#"{"role":"narrator","content":"x"}"#);

        assert!(msg.is_err());
    }
}
