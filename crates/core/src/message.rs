//! Turn, History and Session domain types.
//!
//! These are the value objects that flow through the whole system:
//! a request names a session → the session owns a History → the pipeline
//! appends one user Turn and one assistant Turn per successful invocation.

use serde::{Deserialize, Serialize};

/// Opaque identifier for a conversation session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The end user
    User,
    /// The AI assistant
    Assistant,
}

impl Role {
    /// Capitalized label used when flattening a History into a transcript.
    pub fn label(&self) -> &'static str {
        match self {
            Role::User => "User",
            Role::Assistant => "Assistant",
        }
    }
}

/// A single message exchange unit. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    role: Role,
    content: String,
}

impl Turn {
    /// Create a new user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create a new assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}

/// Ordered, append-only sequence of turns for one session.
///
/// The only way to grow a History is [`History::with_exchange`], which
/// appends a user turn followed by an assistant turn, so the pairing
/// invariant holds for every History built through this API.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct History {
    turns: Vec<Turn>,
}

impl History {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return a new History with one user turn and one assistant turn appended.
    pub fn with_exchange(&self, user: impl Into<String>, assistant: impl Into<String>) -> Self {
        let mut turns = Vec::with_capacity(self.turns.len() + 2);
        turns.extend(self.turns.iter().cloned());
        turns.push(Turn::user(user));
        turns.push(Turn::assistant(assistant));
        Self { turns }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn len(&self) -> usize {
        self.turns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.turns.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Turn> {
        self.turns.iter()
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a Turn;
    type IntoIter = std::slice::Iter<'a, Turn>;

    fn into_iter(self) -> Self::IntoIter {
        self.turns.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_user_turn() {
        let turn = Turn::user("Hello!");
        assert_eq!(turn.role(), Role::User);
        assert_eq!(turn.content(), "Hello!");
    }

    #[test]
    fn exchange_appends_user_then_assistant() {
        let history = History::new();
        let next = history.with_exchange("hi", "hello there");

        assert!(history.is_empty());
        assert_eq!(next.len(), 2);
        assert_eq!(next.turns()[0], Turn::user("hi"));
        assert_eq!(next.turns()[1], Turn::assistant("hello there"));
    }

    #[test]
    fn exchange_preserves_existing_turns() {
        let first = History::new().with_exchange("one", "1");
        let second = first.with_exchange("two", "2");

        assert_eq!(second.len(), first.len() + 2);
        assert_eq!(&second.turns()[..2], first.turns());
    }

    #[test]
    fn history_serializes_as_plain_list() {
        let history = History::new().with_exchange("hi", "yo");
        let json = serde_json::to_value(&history).unwrap();
        assert_eq!(
            json,
            serde_json::json!([
                {"role": "user", "content": "hi"},
                {"role": "assistant", "content": "yo"}
            ])
        );
    }

    #[test]
    fn session_id_display() {
        let id = SessionId::from("abc");
        assert_eq!(id.to_string(), "abc");
        assert_eq!(id.as_str(), "abc");
    }
}
