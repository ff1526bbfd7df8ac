use std::collections::VecDeque;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use super::Responder;
use crate::error::ResponderError;
use crate::figure::Figure;

/// A canned reply for [`MockResponder::scripted`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MockReply {
    Answer(String),
    RemoteError { status: u16, message: Option<String> },
    TransportError,
    /// Panics inside the responder task.
    Panic,
}

impl MockReply {
    pub fn answer(text: &str) -> Self {
        MockReply::Answer(text.to_string())
    }

    fn into_result(self) -> Result<String, ResponderError> {
        match self {
            MockReply::Answer(text) => Ok(text),
            MockReply::RemoteError { status, message } => Err(ResponderError::Remote {
                status: Some(status),
                message,
            }),
            MockReply::TransportError => {
                Err(ResponderError::Transport("mock transport failure".to_string()))
            }
            MockReply::Panic => panic!("mock responder panicked"),
        }
    }
}

enum Mode {
    Placeholder,
    Scripted(Mutex<VecDeque<MockReply>>),
}

/// Offline responder.
///
/// In placeholder mode every question gets
/// "(<name> responds with a placeholder answer)". Scripted mode replays
/// queued replies in order, which is what the session tests drive.
pub struct MockResponder {
    mode: Mode,
    calls: AtomicUsize,
    gate: Option<Arc<Semaphore>>,
}

impl MockResponder {
    pub fn placeholder() -> Self {
        Self {
            mode: Mode::Placeholder,
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    pub fn scripted(replies: impl IntoIterator<Item = MockReply>) -> Self {
        Self {
            mode: Mode::Scripted(Mutex::new(replies.into_iter().collect())),
            calls: AtomicUsize::new(0),
            gate: None,
        }
    }

    /// Hold every reply and upload until [`release`](Self::release) lets it
    /// through.
    pub fn gated(mut self) -> Self {
        self.gate = Some(Arc::new(Semaphore::new(0)));
        self
    }

    /// Lets `n` held calls complete.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    /// Number of `ask` calls received so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn wait_for_gate(&self) -> Result<(), ResponderError> {
        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|_| ResponderError::Transport("mock gate closed".to_string()))?
                .forget();
        }
        Ok(())
    }

    fn queue(queue: &Mutex<VecDeque<MockReply>>) -> MutexGuard<'_, VecDeque<MockReply>> {
        queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl Responder for MockResponder {
    async fn ask(&self, figure: &Figure, _question: &str) -> Result<String, ResponderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.wait_for_gate().await?;

        match &self.mode {
            Mode::Placeholder => Ok(format!("({} responds with a placeholder answer)", figure.name)),
            Mode::Scripted(queue) => {
                let next = Self::queue(queue).pop_front();
                match next {
                    Some(reply) => reply.into_result(),
                    None => Err(ResponderError::Transport("no scripted reply left".to_string())),
                }
            }
        }
    }

    async fn upload_pdf(&self, _path: &Path) -> Result<Option<i64>, ResponderError> {
        self.wait_for_gate().await?;
        Ok(None)
    }

    fn label(&self) -> String {
        "offline".to_string()
    }
}
