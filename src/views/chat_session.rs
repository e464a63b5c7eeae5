//! State of one chat view: the message log shown on the page, whether a
//! submission is outstanding, and the notice to display.
//!
//! Every transition takes `&self` and returns the next state, so a view is a
//! plain value that the page carries from one render to the next.

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::message::ChatMessage;

pub const FAILURE_TOAST: &str = "Something went wrong.";

/// Ordered log of the messages exchanged on one page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatLog(Vec<ChatMessage>);

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the log as carried in the page's hidden form field. A blank
    /// field is an empty log.
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        if raw.trim().is_empty() {
            return Ok(Self::new());
        }
        serde_json::from_str(raw)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.0)
    }

    pub fn appended(&self, messages: impl IntoIterator<Item = ChatMessage>) -> Self {
        let mut next = self.0.clone();
        next.extend(messages);
        Self(next)
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.0
    }

    pub fn newest_first(&self) -> impl Iterator<Item = &ChatMessage> {
        self.0.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<ChatMessage>> for ChatLog {
    fn from(messages: Vec<ChatMessage>) -> Self {
        Self(messages)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PromptError {
    #[error("Prompt is required.")]
    Empty,
}

/// A prompt that passed form validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt(String);

impl Prompt {
    pub fn parse(raw: &str) -> Result<Self, PromptError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(PromptError::Empty);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct RelayFailure {
    pub message: String,
}

impl RelayFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self { message: message.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Invalid(#[from] PromptError),

    #[error("a submission is already in flight")]
    InFlight,

    #[error("relay failed: {0}")]
    Relay(#[from] RelayFailure),
}

/// Where a chat view sends its history and gets the reply from.
pub trait PromptRelay {
    fn relay(
        &self,
        messages: Vec<ChatMessage>,
    ) -> impl Future<Output = Result<ChatMessage, RelayFailure>> + Send;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SubmitStatus {
    #[default]
    Idle,
    Submitting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// Shown under the prompt field.
    FormError(String),
    /// Transient failure notification.
    Toast(String),
}

/// One successful round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub user: ChatMessage,
    pub assistant: ChatMessage,
}

/// A validated submission waiting to be sent.
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    user_message: ChatMessage,
    outgoing: Vec<ChatMessage>,
}

impl PendingSubmission {
    /// The history sent upstream: the displayed log plus the new prompt.
    pub fn outgoing(&self) -> &[ChatMessage] {
        &self.outgoing
    }

    pub async fn send<R: PromptRelay>(self, relay: &R) -> Result<Exchange, SubmitError> {
        let assistant = relay.relay(self.outgoing).await?;
        Ok(Exchange {
            user: self.user_message,
            assistant,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatSession {
    log: ChatLog,
    status: SubmitStatus,
    notice: Option<Notice>,
    /// Prompt text to put back in the input after a rejected or failed
    /// submission.
    draft: String,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_log(log: ChatLog) -> Self {
        Self {
            log,
            ..Self::default()
        }
    }

    pub fn log(&self) -> &ChatLog {
        &self.log
    }

    pub fn status(&self) -> SubmitStatus {
        self.status
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn with_draft(self, draft: impl Into<String>) -> Self {
        Self {
            draft: draft.into(),
            ..self
        }
    }

    pub fn is_loading(&self) -> bool {
        self.status == SubmitStatus::Submitting
    }

    /// The prompt input and the submit button are disabled while loading.
    pub fn submit_disabled(&self) -> bool {
        self.is_loading()
    }

    /// Validate `input` and move to `Submitting`. The displayed log is not
    /// touched until the outcome is resolved.
    pub fn begin_submit(&self, input: &str) -> Result<(Self, PendingSubmission), SubmitError> {
        if self.is_loading() {
            return Err(SubmitError::InFlight);
        }
        let user_message = ChatMessage::user(Prompt::parse(input)?.into_inner());
        let outgoing = self.log.appended([user_message.clone()]).0;

        let submitting = Self {
            log: self.log.clone(),
            status: SubmitStatus::Submitting,
            notice: None,
            draft: String::new(),
        };
        Ok((submitting, PendingSubmission { user_message, outgoing }))
    }

    /// Fold the outcome of a submission into the next state. Only a
    /// successful exchange changes the log.
    pub fn resolve(&self, outcome: Result<Exchange, SubmitError>) -> Self {
        let notice = match outcome {
            Ok(Exchange { user, assistant }) => {
                return Self {
                    log: self.log.appended([user, assistant]),
                    status: SubmitStatus::Idle,
                    notice: None,
                    draft: String::new(),
                };
            }
            Err(SubmitError::InFlight) => return self.clone(),
            Err(SubmitError::Invalid(e)) => Notice::FormError(e.to_string()),
            Err(SubmitError::Relay(failure)) => {
                tracing::warn!(%failure, "prompt submission failed");
                Notice::Toast(FAILURE_TOAST.to_string())
            }
        };

        Self {
            log: self.log.clone(),
            status: SubmitStatus::Idle,
            notice: Some(notice),
            draft: self.draft.clone(),
        }
    }

    /// Run one full submit cycle against `relay`. The input is kept as the
    /// draft unless the exchange succeeded.
    pub async fn submit<R: PromptRelay>(&self, input: &str, relay: &R) -> Self {
        let next = match self.begin_submit(input) {
            Ok((submitting, pending)) => {
                let outcome = pending.send(relay).await;
                submitting.resolve(outcome)
            }
            Err(e) => self.resolve(Err(e)),
        };
        if next.notice().is_some() {
            next.with_draft(input)
        } else {
            next
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageRole;
    use std::sync::Mutex;

    struct FakeRelay {
        reply: Result<ChatMessage, RelayFailure>,
        received: Mutex<Vec<Vec<ChatMessage>>>,
    }

    impl FakeRelay {
        fn answering(content: &str) -> Self {
            Self {
                reply: Ok(ChatMessage::assistant(content)),
                received: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(RelayFailure::new("OpenAI API Key not configured.")),
                received: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<Vec<ChatMessage>> {
            self.received.lock().unwrap().clone()
        }
    }

    impl PromptRelay for FakeRelay {
        async fn relay(&self, messages: Vec<ChatMessage>) -> Result<ChatMessage, RelayFailure> {
            self.received.lock().unwrap().push(messages);
            self.reply.clone()
        }
    }

    #[tokio::test]
    async fn successful_submit_appends_user_then_assistant() {
        let relay = FakeRelay::answering("```rust\nfn reverse(s: &str) -> String { s.chars().rev().collect() }\n```");
        let view = ChatSession::new()
            .submit("Write a function that reverses a string", &relay)
            .await;

        let log = view.log().messages();
        assert_eq!(log.len(), 2);
        assert_eq!(log[0], ChatMessage::user("Write a function that reverses a string"));
        assert_eq!(log[1].role, MessageRole::Assistant);
        assert!(log[1].content.starts_with("```rust"));
        assert_eq!(view.status(), SubmitStatus::Idle);
        assert!(view.notice().is_none());
        assert_eq!(view.draft(), "");
    }

    #[tokio::test]
    async fn outgoing_history_includes_new_prompt() {
        let relay = FakeRelay::answering("second answer");
        let earlier = ChatLog::from(vec![ChatMessage::user("first"), ChatMessage::assistant("first answer")]);
        let view = ChatSession::from_log(earlier.clone()).submit("second", &relay).await;

        let calls = relay.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0], earlier.appended([ChatMessage::user("second")]).messages());
        assert_eq!(view.log().len(), 4);
        assert_eq!(view.log().messages()[3], ChatMessage::assistant("second answer"));
    }

    #[tokio::test]
    async fn failed_submit_keeps_log_and_shows_toast() {
        let relay = FakeRelay::failing();
        let start = ChatSession::from_log(ChatLog::from(vec![ChatMessage::user("hi")]));
        let view = start.submit("again", &relay).await;

        assert_eq!(view.log(), start.log());
        assert_eq!(view.notice(), Some(&Notice::Toast(FAILURE_TOAST.to_string())));
        assert!(!view.is_loading());
        assert_eq!(view.draft(), "again");
    }

    #[tokio::test]
    async fn empty_prompt_never_reaches_relay() {
        let relay = FakeRelay::answering("unused");
        let view = ChatSession::new().submit("   ", &relay).await;

        assert!(relay.calls().is_empty());
        assert!(view.log().is_empty());
        assert_eq!(view.notice(), Some(&Notice::FormError("Prompt is required.".into())));
    }

    #[test]
    fn submitting_view_refuses_second_submission() {
        let (submitting, pending) = ChatSession::new().begin_submit("one").unwrap();
        assert!(submitting.is_loading());
        assert!(submitting.submit_disabled());
        assert_eq!(pending.outgoing(), &[ChatMessage::user("one")]);

        let second = submitting.begin_submit("two");
        assert!(matches!(second, Err(SubmitError::InFlight)));
        assert_eq!(submitting.resolve(Err(SubmitError::InFlight)), submitting);
    }

    #[test]
    fn log_renders_newest_first_and_round_trips_through_form_field() {
        let log = ChatLog::from(vec![ChatMessage::user("q"), ChatMessage::assistant("a")]);
        let order: Vec<&str> = log.newest_first().map(|m| m.content.as_str()).collect();
        assert_eq!(order, ["a", "q"]);

        assert_eq!(ChatLog::from_json(&log.to_json().unwrap()).unwrap(), log);
        assert!(ChatLog::from_json("").unwrap().is_empty());
        assert!(ChatLog::from_json("{oops").is_err());
    }
}
