//! Wrapper around Reqwest's error type to facilitate exclusive matching

use std::error::Error as StdError;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ErrorKind {
    BuildFailed,
    ConnectFailed,
    BodyFailed,
    RedirectPolicyViolated,
    TimedOut,
    UnknownReqwestError,
}

#[derive(Debug)]
pub(crate) struct Error {
    kind: ErrorKind,
    source: reqwest::Error,
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::new(err)
    }
}

impl Error {
    pub(crate) fn new(err: reqwest::Error) -> Error {
        let kind = if err.is_builder() {
            ErrorKind::BuildFailed
        } else if err.is_timeout() {
            ErrorKind::TimedOut
        } else if err.is_connect() {
            ErrorKind::ConnectFailed
        } else if err.is_redirect() {
            ErrorKind::RedirectPolicyViolated
        } else if err.is_body() || err.is_decode() {
            ErrorKind::BodyFailed
        } else {
            ErrorKind::UnknownReqwestError
        };

        Error { kind, source: err }
    }

    pub(crate) fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Connection failures and timeouts may succeed on a second attempt
    pub(crate) fn is_transient(&self) -> bool {
        matches!(self.kind(), ErrorKind::ConnectFailed | ErrorKind::TimedOut)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            ErrorKind::BuildFailed => write!(f, "failed to build the request"),
            ErrorKind::ConnectFailed => write!(f, "connection failed"),
            ErrorKind::BodyFailed => write!(f, "failed to read the response body"),
            ErrorKind::RedirectPolicyViolated => write!(f, "redirect policy violated"),
            ErrorKind::TimedOut => write!(f, "timed out"),
            ErrorKind::UnknownReqwestError => write!(f, "unknown reqwest error"),
        }
    }
}

impl StdError for Error {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.source)
    }
}
