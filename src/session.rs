//! The conversation session.
//!
//! A [`Session`] owns the conversation history and drives one turn at a time
//! against a [`ChatProvider`]. The history always starts with the system
//! message and only ever holds complete turns: a user message immediately
//! followed by the assistant's reply. When a turn fails, the user message that
//! was tentatively appended is removed again, so the session can be used for
//! further turns as if the failed one never happened.

use crate::args::SessionConfig;
use crate::chat::{Message, Role};
use crate::providers::{self, ChatProvider, ChatRequest};

/// Why a turn failed
#[derive(thiserror::Error, Debug)]
pub(crate) enum TurnError {
    /// The endpoint answered with a non-success status
    #[error("endpoint returned HTTP {status}: {body}")]
    Endpoint { status: u16, body: String },

    /// The exchange itself failed: no connection, a timeout or an
    /// undecodable body
    #[error("request failed: {0}")]
    Transport(#[source] providers::Error),

    /// The response carried an explicit error object
    #[error(
        "API error: {message} (type: {}, code: {})",
        .typ.as_deref().unwrap_or("none"),
        .code.as_deref().unwrap_or("none")
    )]
    Api {
        message: String,
        typ: Option<String>,
        code: Option<String>,
    },

    /// The response decoded but carried no choices
    #[error("the endpoint returned an empty response, raw response: {body}")]
    EmptyResponse { body: String },

    #[error("the session has been terminated")]
    Terminated,
}

impl From<providers::Error> for TurnError {
    fn from(value: providers::Error) -> Self {
        match value {
            providers::Error::Status { status, body } => TurnError::Endpoint { status, body },
            value => TurnError::Transport(value),
        }
    }
}

impl TurnError {
    /// Whether submitting the same text again may succeed
    pub(crate) fn is_retryable(&self) -> bool {
        match self {
            TurnError::Endpoint { status, .. } => providers::is_transient_status(*status),
            TurnError::Transport(err) => err.is_transient(),
            TurnError::EmptyResponse { .. } => true,
            TurnError::Api { .. } | TurnError::Terminated => false,
        }
    }
}

/// A user message which has been appended to the history but not yet
/// answered. Unless the turn is committed, the history is truncated back to
/// where it was when the guard is dropped. This also covers turns that are
/// abandoned while awaiting the endpoint.
struct PendingTurn<'h> {
    history: &'h mut Vec<Message>,
    mark: usize,
    committed: bool,
}

impl<'h> PendingTurn<'h> {
    fn begin(history: &'h mut Vec<Message>, message: Message) -> PendingTurn<'h> {
        let mark = history.len();

        history.push(message);

        PendingTurn {
            history,
            mark,
            committed: false,
        }
    }

    fn messages(&self) -> &[Message] {
        self.history.as_slice()
    }

    fn commit(mut self, reply: Message) {
        self.history.push(reply);
        self.committed = true;
    }
}

impl Drop for PendingTurn<'_> {
    fn drop(&mut self) {
        if !self.committed {
            tracing::debug!(
                discarded = self.history.len() - self.mark,
                "rolling back failed turn"
            );

            self.history.truncate(self.mark);
        }
    }
}

pub(crate) struct Session {
    config: SessionConfig,
    history: Vec<Message>,
    provider: Option<Box<dyn ChatProvider>>,
}

impl Session {
    /// Starts a conversation containing only the system prompt. The provider
    /// is not contacted until the first turn.
    pub(crate) fn new(config: SessionConfig, provider: Box<dyn ChatProvider>) -> Session {
        let history = vec![Message::system(config.system_prompt.clone())];

        Session {
            config,
            history,
            provider: Some(provider),
        }
    }

    pub(crate) fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The conversation so far, oldest message first
    pub(crate) fn history(&self) -> &[Message] {
        &self.history
    }

    /// Sends `user_text` along with the whole conversation and returns the
    /// reply. On success, the history grows by the user message and the
    /// reply. On failure, the history is left as it was.
    pub(crate) async fn submit(&mut self, user_text: &str) -> Result<String, TurnError> {
        let provider = self.provider.as_deref().ok_or(TurnError::Terminated)?;

        let turn = PendingTurn::begin(&mut self.history, Message::user(user_text.to_string()));

        let request = ChatRequest {
            model: &self.config.model,
            messages: turn.messages(),
            temperature: Some(self.config.temperature),
        };

        let completion = provider.complete(&request).await?;
        let response = completion.response;

        if let Some(error) = response.error {
            return Err(TurnError::Api {
                message: error.message,
                typ: error.typ,
                code: error.code,
            });
        }

        let reply = match response.choices.and_then(|choices| choices.into_iter().next()) {
            Some(choice) => choice.message,
            None => {
                return Err(TurnError::EmptyResponse {
                    body: completion.body,
                })
            }
        };

        if reply.role != Role::Assistant {
            tracing::warn!(role = %reply.role, "reply was not authored by the assistant");
        }

        let content = reply.content.clone();

        turn.commit(reply);

        tracing::debug!(messages = self.history.len(), "turn completed");

        Ok(content)
    }

    /// Forgets every turn, keeping only the system message
    pub(crate) fn reset(&mut self) {
        self.history.truncate(1);
    }

    /// Releases the provider. Later calls have no effect.
    pub(crate) fn terminate(&mut self) {
        if self.provider.take().is_some() {
            tracing::debug!("session terminated");
        }
    }
}
