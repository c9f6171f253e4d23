//! Error taxonomy for the streaming parser.
//!
//! Two kinds only: [`ParserError::BadRequest`] is peer-attributable and always leaves the
//! parser shut down; [`ParserError::InvalidState`] is programmer-attributable and indicates
//! a parser operation was invoked somewhere it cannot be (e.g. after the message terminated).

use std::error::Error as StdError;
use std::fmt;

/// The result type threaded through every parser operation.
pub type Result<T> = std::result::Result<T, ParserError>;

/// A fatal parse failure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserError {
    /// The peer sent something the parser cannot accept. The connection must be abandoned;
    /// the parser has already shut down by the time this variant reaches the caller.
    BadRequest(String),
    /// A parser operation was invoked in a state where it is not legal to invoke it (e.g.
    /// `parse_headers` after the header phase has already reached `End`).
    InvalidState(String),
}

impl ParserError {
    pub(crate) fn bad_request(reason: impl Into<String>) -> Self {
        ParserError::BadRequest(reason.into())
    }

    pub(crate) fn invalid_state(reason: impl Into<String>) -> Self {
        ParserError::InvalidState(reason.into())
    }
}

impl fmt::Display for ParserError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParserError::BadRequest(reason) => write!(f, "bad request: {}", reason),
            ParserError::InvalidState(reason) => write!(f, "invalid parser state: {}", reason),
        }
    }
}

impl StdError for ParserError {}
