use std::path::PathBuf;

use thiserror::Error;

/// Why a call to a [`Responder`](crate::Responder) produced no answer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResponderError {
    /// The server answered but reported a failure.
    #[error("server error (status {status:?}): {}", .message.as_deref().unwrap_or("no message"))]
    Remote {
        status: Option<u16>,
        message: Option<String>,
    },
    /// The request never produced a usable response.
    #[error("transport: {0}")]
    Transport(String),
}

impl ResponderError {
    pub fn is_transport(&self) -> bool {
        matches!(self, ResponderError::Transport(_))
    }
}

impl From<reqwest::Error> for ResponderError {
    fn from(err: reqwest::Error) -> Self {
        ResponderError::Transport(err.to_string())
    }
}

/// A `submit` that was refused before anything was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SubmitRejection {
    #[error("no figure selected")]
    NoFigure,
    #[error("question is empty")]
    EmptyInput,
    #[error("a request is already in flight")]
    Busy,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterError {
    #[error("duplicate figure id {0}")]
    DuplicateId(i64),
}

#[derive(Debug, Error)]
pub enum CharacterError {
    #[error("Please provide a character name and select a PDF.")]
    Incomplete,
    #[error("not a PDF file: {0}")]
    NotPdf(PathBuf),
    #[error("file not found: {0}")]
    Missing(PathBuf),
    #[error("upload failed: {0}")]
    Upload(#[from] ResponderError),
    #[error(transparent)]
    Roster(#[from] RosterError),
}
