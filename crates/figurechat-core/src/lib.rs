pub mod character;
pub mod config;
pub mod error;
pub mod figure;
pub mod responder;
pub mod retry;
pub mod session;
pub mod state;

#[cfg(test)]
mod test_support;

// Re-export main types for convenience
pub use character::{add_character, create_character, CharacterDraft};
pub use config::Config;
pub use error::{CharacterError, ResponderError, RosterError, SubmitRejection};
pub use figure::{Figure, Roster};
pub use responder::{MockReply, MockResponder, RemoteResponder, Responder};
pub use retry::RetryPolicy;
pub use session::ChatSession;
pub use state::{ChatSessionState, Message, Phase, Sender};
