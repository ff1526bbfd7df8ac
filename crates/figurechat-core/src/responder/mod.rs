pub mod mock;
pub mod remote;

use std::path::Path;

use async_trait::async_trait;

use crate::error::ResponderError;
use crate::figure::Figure;

pub use mock::{MockReply, MockResponder};
pub use remote::RemoteResponder;

/// Produces a figure's reply to a question.
#[async_trait]
pub trait Responder: Send + Sync {
    async fn ask(&self, figure: &Figure, question: &str) -> Result<String, ResponderError>;

    /// Hands a character's source PDF to the backend.
    ///
    /// Returns the id the backend assigned, or `None` when the responder has
    /// no backend and the caller should pick an id itself.
    async fn upload_pdf(&self, _path: &Path) -> Result<Option<i64>, ResponderError> {
        Ok(None)
    }

    /// Short description shown in the chat panel title.
    fn label(&self) -> String;
}
