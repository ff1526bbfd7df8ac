//! The chat session state machine.
//!
//! A session is `Idle` until a valid submission is dispatched, then `Pending`
//! until the responder resolves. Every resolution (answer, remote error,
//! transport error, or a panicked responder task) appends exactly one reply
//! and returns the session to `Idle`.

use std::sync::Arc;

use futures_util::FutureExt;
use tokio::task::{JoinError, JoinHandle};

use crate::error::{ResponderError, SubmitRejection};
use crate::figure::Figure;
use crate::responder::Responder;
use crate::state::{ChatSessionState, Message, Phase};

pub const TRANSPORT_FAILURE_TEXT: &str = "Failed to reach the server.";
pub const REMOTE_FAILURE_FALLBACK: &str = "The server could not answer that question.";

struct InFlight {
    figure_name: String,
    handle: JoinHandle<Result<String, ResponderError>>,
}

pub struct ChatSession {
    responder: Arc<dyn Responder>,
    state: ChatSessionState,
    in_flight: Option<InFlight>,
}

impl ChatSession {
    pub fn new(responder: Arc<dyn Responder>) -> Self {
        Self {
            responder,
            state: ChatSessionState::default(),
            in_flight: None,
        }
    }

    pub fn state(&self) -> &ChatSessionState {
        &self.state
    }

    pub fn messages(&self) -> &[Message] {
        &self.state.messages
    }

    pub fn selected_figure(&self) -> Option<&Figure> {
        self.state.selected_figure.as_ref()
    }

    pub fn pending_input(&self) -> &str {
        &self.state.pending_input
    }

    pub fn phase(&self) -> Phase {
        self.state.phase
    }

    pub fn is_busy(&self) -> bool {
        self.state.is_busy()
    }

    pub fn responder(&self) -> &Arc<dyn Responder> {
        &self.responder
    }

    /// Starts a fresh conversation with `figure`.
    ///
    /// A request still in flight is detached: it runs to completion but its
    /// reply never reaches this transcript.
    pub fn select_figure(&mut self, figure: Figure) {
        if let Some(flight) = self.in_flight.take() {
            log::debug!("detaching in-flight request for {}", flight.figure_name);
        }
        log::info!("selected figure {} ({})", figure.name, figure.id);
        self.state = ChatSessionState {
            selected_figure: Some(figure),
            ..ChatSessionState::default()
        };
    }

    pub fn set_pending_input(&mut self, text: impl Into<String>) {
        self.state.pending_input = text.into();
    }

    /// Validates the pending input and sends it to the responder.
    ///
    /// On success the user message is in the transcript, the input is cleared
    /// and the session is `Pending`. A rejection leaves the session untouched.
    pub fn dispatch(&mut self) -> Result<(), SubmitRejection> {
        if self.is_busy() {
            return Err(SubmitRejection::Busy);
        }
        let figure = self
            .state
            .selected_figure
            .as_ref()
            .ok_or(SubmitRejection::NoFigure)?;
        let question = self.state.pending_input.trim();
        if question.is_empty() {
            return Err(SubmitRejection::EmptyInput);
        }

        let question = question.to_string();
        let figure = figure.clone();
        let figure_name = figure.name.clone();

        let responder = Arc::clone(&self.responder);
        let asked = question.clone();
        let handle = tokio::spawn(async move { responder.ask(&figure, &asked).await });

        log::debug!("dispatched question to {}", figure_name);
        self.state.messages.push(Message::user(question));
        self.state.pending_input.clear();
        self.state.phase = Phase::Pending;
        self.in_flight = Some(InFlight { figure_name, handle });
        Ok(())
    }

    /// Waits for the in-flight request and appends its reply.
    ///
    /// Returns `None` when nothing is in flight. Dropping the returned future
    /// before it completes leaves the request in flight.
    pub async fn resolve(&mut self) -> Option<&Message> {
        let flight = self.in_flight.as_mut()?;
        let result = (&mut flight.handle).await;
        self.finish(result)
    }

    /// Appends the reply if the in-flight request has already finished.
    pub fn try_resolve(&mut self) -> Option<&Message> {
        let flight = self.in_flight.as_mut()?;
        let result = (&mut flight.handle).now_or_never()?;
        self.finish(result)
    }

    /// Dispatches and waits for the reply.
    pub async fn submit(&mut self) -> Result<Option<&Message>, SubmitRejection> {
        self.dispatch()?;
        Ok(self.resolve().await)
    }

    fn finish(
        &mut self,
        result: Result<Result<String, ResponderError>, JoinError>,
    ) -> Option<&Message> {
        let flight = self.in_flight.take()?;

        let message = match result {
            Ok(Ok(answer)) => Message::figure(&flight.figure_name, answer),
            Ok(Err(ResponderError::Remote { status, message })) => {
                log::warn!("server reported failure (status {:?})", status);
                let text = message
                    .filter(|m| !m.trim().is_empty())
                    .unwrap_or_else(|| REMOTE_FAILURE_FALLBACK.to_string());
                Message::system(text)
            }
            Ok(Err(ResponderError::Transport(reason))) => {
                log::warn!("request failed: {}", reason);
                Message::system(TRANSPORT_FAILURE_TEXT)
            }
            Err(join_error) => {
                log::error!("responder task failed: {}", join_error);
                Message::system(TRANSPORT_FAILURE_TEXT)
            }
        };

        self.state.messages.push(message);
        self.state.phase = Phase::Idle;
        self.state.messages.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::figure::Roster;
    use crate::responder::{MockReply, MockResponder};
    use crate::state::Sender;

    fn einstein() -> Figure {
        Roster::default().get(1).cloned().unwrap()
    }

    fn session_with(responder: MockResponder) -> (ChatSession, Arc<MockResponder>) {
        let responder = Arc::new(responder);
        let session = ChatSession::new(responder.clone());
        (session, responder)
    }

    #[tokio::test]
    async fn test_successful_answer() {
        let (mut session, _) =
            session_with(MockResponder::scripted([MockReply::answer("E=mc^2 explained")]));
        session.select_figure(einstein());
        session.set_pending_input("What is relativity?");

        session.submit().await.unwrap();

        assert_eq!(
            session.messages(),
            &[
                Message::user("What is relativity?"),
                Message::figure("Albert Einstein", "E=mc^2 explained"),
            ]
        );
        assert_eq!(session.messages()[0].sender.label(), "You");
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_remote_error_is_shown_verbatim() {
        let (mut session, _) = session_with(MockResponder::scripted([MockReply::RemoteError {
            status: 429,
            message: Some("rate limited".to_string()),
        }]));
        session.select_figure(einstein());
        session.set_pending_input("What is relativity?");

        session.submit().await.unwrap();

        assert_eq!(session.messages()[1], Message::system("rate limited"));
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_remote_error_without_text_uses_fallback() {
        let (mut session, _) = session_with(MockResponder::scripted([MockReply::RemoteError {
            status: 404,
            message: None,
        }]));
        session.select_figure(einstein());
        session.set_pending_input("Hello?");

        session.submit().await.unwrap();

        assert_eq!(session.messages()[1], Message::system(REMOTE_FAILURE_FALLBACK));
    }

    #[tokio::test]
    async fn test_transport_failure_message() {
        let (mut session, _) = session_with(MockResponder::scripted([MockReply::TransportError]));
        session.select_figure(einstein());
        session.set_pending_input("What is relativity?");

        session.submit().await.unwrap();

        assert_eq!(
            session.messages(),
            &[
                Message::user("What is relativity?"),
                Message::system("Failed to reach the server."),
            ]
        );
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_panicking_responder_still_clears_busy() {
        let (mut session, _) = session_with(MockResponder::scripted([MockReply::Panic]));
        session.select_figure(einstein());
        session.set_pending_input("Will this work?");

        session.submit().await.unwrap();

        assert_eq!(session.messages()[1], Message::system(TRANSPORT_FAILURE_TEXT));
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_double_submit_dispatches_once() {
        let (mut session, responder) =
            session_with(MockResponder::scripted([MockReply::answer("first"), MockReply::answer("second")]).gated());
        session.select_figure(einstein());

        session.set_pending_input("What is relativity?");
        session.dispatch().unwrap();
        assert!(session.is_busy());

        session.set_pending_input("What is relativity?");
        assert_eq!(session.dispatch(), Err(SubmitRejection::Busy));
        assert_eq!(session.messages().len(), 1);
        assert_eq!(session.pending_input(), "What is relativity?");

        responder.release(1);
        let reply = session.resolve().await.cloned();
        assert_eq!(reply, Some(Message::figure("Albert Einstein", "first")));
        assert!(!session.is_busy());
        assert_eq!(responder.calls(), 1);
    }

    #[tokio::test]
    async fn test_try_resolve_waits_for_completion() {
        let (mut session, responder) =
            session_with(MockResponder::scripted([MockReply::answer("later")]).gated());
        session.select_figure(einstein());
        session.set_pending_input("Are you there?");
        session.dispatch().unwrap();

        tokio::task::yield_now().await;
        assert!(session.try_resolve().is_none());
        assert!(session.is_busy());

        responder.release(1);
        let reply = session.resolve().await.cloned();
        assert_eq!(reply.map(|m| m.text), Some("later".to_string()));
        assert!(session.try_resolve().is_none());
    }

    #[tokio::test]
    async fn test_resolve_losing_a_select_keeps_request_in_flight() {
        let (mut session, responder) =
            session_with(MockResponder::scripted([MockReply::answer("still coming")]).gated());
        session.select_figure(einstein());
        session.set_pending_input("Are you there?");
        session.dispatch().unwrap();

        // A key event wins the race, as in the TUI run loop
        let resolved = tokio::select! {
            biased;
            _ = async {} => false,
            _ = async { session.resolve().await.is_some() }, if session.is_busy() => true,
        };
        assert!(!resolved);
        assert!(session.is_busy());

        responder.release(1);
        let resolved = tokio::select! {
            _ = std::future::pending::<()>() => false,
            _ = async { session.resolve().await.is_some() }, if session.is_busy() => true,
        };
        assert!(resolved);
        assert_eq!(session.messages()[1], Message::figure("Albert Einstein", "still coming"));
        assert!(!session.is_busy());
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored() {
        let (mut session, responder) = session_with(MockResponder::scripted([]));
        session.select_figure(einstein());

        for input in ["", "   ", "\n\t"] {
            session.set_pending_input(input);
            assert_eq!(session.dispatch(), Err(SubmitRejection::EmptyInput));
        }

        assert!(session.messages().is_empty());
        assert!(!session.is_busy());
        assert_eq!(responder.calls(), 0);
    }

    #[tokio::test]
    async fn test_submit_without_figure_is_rejected() {
        let (mut session, _) = session_with(MockResponder::scripted([]));
        session.set_pending_input("Hello");

        assert_eq!(session.submit().await.err(), Some(SubmitRejection::NoFigure));
        assert!(session.messages().is_empty());
        assert_eq!(session.pending_input(), "Hello");
    }

    #[tokio::test]
    async fn test_question_is_trimmed() {
        let (mut session, _) = session_with(MockResponder::scripted([MockReply::answer("ok")]));
        session.select_figure(einstein());
        session.set_pending_input("  Why?  ");

        session.submit().await.unwrap();

        assert_eq!(session.messages()[0], Message::user("Why?"));
        assert!(session.pending_input().is_empty());
    }

    #[tokio::test]
    async fn test_selecting_figure_resets_conversation() {
        let roster = Roster::default();
        let (mut session, _) = session_with(MockResponder::placeholder());
        session.select_figure(einstein());

        for question in ["One", "Two", "Three"] {
            session.set_pending_input(question);
            session.submit().await.unwrap();
        }
        assert_eq!(session.messages().len(), 6);

        session.set_pending_input("half-typed");
        session.select_figure(roster.get(3).cloned().unwrap());

        assert!(session.messages().is_empty());
        assert!(session.pending_input().is_empty());
        assert_eq!(session.selected_figure().map(|f| f.id), Some(3));
    }

    #[tokio::test]
    async fn test_switching_figure_while_pending_drops_stale_reply() {
        let roster = Roster::default();
        let (mut session, responder) =
            session_with(MockResponder::scripted([MockReply::answer("stale")]).gated());
        session.select_figure(einstein());
        session.set_pending_input("Slow question");
        session.dispatch().unwrap();

        session.select_figure(roster.get(2).cloned().unwrap());
        assert!(!session.is_busy());

        responder.release(1);
        assert!(session.resolve().await.is_none());
        assert!(session.messages().is_empty());
    }

    #[tokio::test]
    async fn test_user_messages_never_exceed_accepted_submissions() {
        let (mut session, _) = session_with(MockResponder::scripted([
            MockReply::answer("a"),
            MockReply::TransportError,
        ]));
        session.select_figure(einstein());

        let mut accepted = 0;
        for input in ["first", "", "second", "  "] {
            session.set_pending_input(input);
            if session.submit().await.is_ok() {
                accepted += 1;
            }
        }

        let user_messages = session
            .messages()
            .iter()
            .filter(|m| m.sender == Sender::User)
            .count();
        assert_eq!(accepted, 2);
        assert_eq!(user_messages, accepted);
    }
}
