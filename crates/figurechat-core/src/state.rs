//! UI-agnostic chat state types
//!
//! These are shared by every front end and don't depend on any UI framework.

use serde::{Deserialize, Serialize};

use crate::figure::Figure;

/// Who wrote a message in the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    User,
    Figure(String),
    System,
}

impl Sender {
    pub fn label(&self) -> &str {
        match self {
            Sender::User => "You",
            Sender::Figure(name) => name,
            Sender::System => "System",
        }
    }
}

/// A single transcript entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: Sender,
    pub text: String,
}

impl Message {
    pub fn user(text: impl Into<String>) -> Self {
        Self { sender: Sender::User, text: text.into() }
    }

    pub fn figure(name: &str, text: impl Into<String>) -> Self {
        Self { sender: Sender::Figure(name.to_string()), text: text.into() }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self { sender: Sender::System, text: text.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Idle,
    /// A request is in flight; no new submission is accepted.
    Pending,
}

#[derive(Debug, Clone, Default)]
pub struct ChatSessionState {
    pub selected_figure: Option<Figure>,
    pub messages: Vec<Message>,
    pub pending_input: String,
    pub phase: Phase,
}

impl ChatSessionState {
    pub fn is_busy(&self) -> bool {
        self.phase == Phase::Pending
    }
}
