//! Traits and type definitions for chat completions.
//!
//! The interface to the completion endpoint is provided by the [`ChatProvider`]
//! trait. A provider takes a [`ChatRequest`], which carries the entire
//! conversation, performs a single round trip and returns the decoded
//! [`ChatResponse`] along with the raw body it was decoded from.
//!
//! ## Error Handling
//!
//! A provider only reports failures of the exchange itself: the request could
//! not be sent, the endpoint answered with a non-success status, or the body
//! could not be decoded. A well-formed response that carries an `error` object
//! or no choices is still a successful exchange; interpreting it is up to the
//! caller.

mod apireq;
mod openai;

pub(crate) use self::openai::OpenAIProvider;

use async_trait::async_trait;
use serde::{Deserialize, Deserializer, Serialize};

use crate::chat::Message;

#[derive(thiserror::Error, Debug)]
pub(crate) enum Error {
    /// The endpoint URL could not be formed from the API base
    #[error("invalid endpoint")]
    InvalidEndpoint(
        #[from]
        #[source]
        url::ParseError,
    ),

    /// Some issue with sending the request or receiving the body
    #[error("{}", .0)]
    RequestFailed(
        #[from]
        #[source]
        apireq::ReqwestError,
    ),

    /// The endpoint answered with a non-success status
    #[error("endpoint returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// The body of a successful response was not a chat response
    #[error("failed to decode the response: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        body: String,
    },
}

impl Error {
    /// Whether the failure is likely to go away if the request is repeated
    pub(crate) fn is_transient(&self) -> bool {
        match self {
            Error::RequestFailed(err) => err.is_transient(),
            Error::Status { status, .. } => is_transient_status(*status),
            Error::InvalidEndpoint(_) | Error::Decode { .. } => false,
        }
    }
}

/// Timeouts, conflicts, rate limits and server errors
pub(crate) fn is_transient_status(status: u16) -> bool {
    matches!(status, 408 | 409 | 429 | 500..=599)
}

/// The body of a `/chat/completions` request
#[derive(Serialize, Debug)]
pub(crate) struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
}

#[derive(Deserialize, Debug)]
pub(crate) struct Choice {
    pub message: Message,
}

/// An error object embedded in a chat response
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub(crate) struct ApiErrorPayload {
    pub message: String,
    #[serde(rename = "type", default)]
    pub typ: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub code: Option<String>,
}

/// The body of a `/chat/completions` response. Unknown fields are ignored.
#[derive(Deserialize, Debug, Default)]
pub(crate) struct ChatResponse {
    #[serde(default)]
    pub choices: Option<Vec<Choice>>,
    #[serde(default)]
    pub error: Option<ApiErrorPayload>,
}

/// Some endpoints send error codes as numbers, others as strings.
fn string_or_number<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<Option<String>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;

    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(code)) => Some(code),
        Some(other) => Some(other.to_string()),
    })
}

/// A completed exchange with the endpoint
#[derive(Debug)]
pub(crate) struct Completion {
    /// The decoded response
    pub response: ChatResponse,
    /// The raw response body, kept for diagnostics
    pub body: String,
}

impl Completion {
    pub(crate) fn from_body(body: String) -> Result<Completion, Error> {
        match serde_json::from_str(&body) {
            Ok(response) => Ok(Completion { response, body }),
            Err(source) => Err(Error::Decode { source, body }),
        }
    }
}

/// A trait implemented by chat completion endpoints.
#[async_trait]
pub(crate) trait ChatProvider: Send + Sync {
    /// Sends the request and waits for the complete response.
    async fn complete(&self, request: &ChatRequest<'_>) -> Result<Completion, Error>;
}
