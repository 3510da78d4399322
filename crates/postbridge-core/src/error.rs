//! Shared error type across postbridge crates.

use thiserror::Error;

use crate::protocol::MessageType;

/// Stable error codes. These strings travel across the boundary as the
/// `type` field of error reports, so they must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// Inbound data did not parse as an envelope.
    Malformed,
    /// Raw channel send/receive failure.
    Transport,
    /// A registered handler failed.
    HandlerError,
    /// No response arrived before the deadline.
    Timeout,
    /// Too many requests in flight.
    Overloaded,
    /// The bus went away while a request was waiting.
    Closed,
    /// A typed request got a reply of another message type.
    UnexpectedReply,
    /// Invalid configuration.
    BadConfig,
    /// Internal error.
    Internal,
}

impl ErrorCode {
    /// String representation used on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::Malformed => "MALFORMED",
            ErrorCode::Transport => "TRANSPORT",
            ErrorCode::HandlerError => "HANDLER_ERROR",
            ErrorCode::Timeout => "TIMEOUT",
            ErrorCode::Overloaded => "OVERLOADED",
            ErrorCode::Closed => "CLOSED",
            ErrorCode::UnexpectedReply => "UNEXPECTED_REPLY",
            ErrorCode::BadConfig => "BAD_CONFIG",
            ErrorCode::Internal => "INTERNAL",
        }
    }
}

/// Shared result type.
pub type Result<T> = std::result::Result<T, BridgeError>;

/// Unified error type used by core and bus.
#[derive(Debug, Clone, Error)]
pub enum BridgeError {
    #[error("malformed envelope: {0}")]
    Malformed(String),
    #[error("transport: {0}")]
    Transport(String),
    #[error("handler failed: {0}")]
    Handler(String),
    #[error("request timeout for message type: {message_type} after {timeout_ms}ms")]
    Timeout {
        message_type: MessageType,
        timeout_ms: u64,
    },
    #[error("too many pending requests (limit {limit})")]
    Overloaded { limit: usize },
    #[error("bus closed")]
    Closed,
    #[error("unexpected reply: expected {expected}, got {got}")]
    UnexpectedReply {
        expected: MessageType,
        got: MessageType,
    },
    #[error("bad config: {0}")]
    BadConfig(String),
    #[error("internal: {0}")]
    Internal(String),
}

impl BridgeError {
    /// Map to the stable wire code.
    pub fn code(&self) -> ErrorCode {
        match self {
            BridgeError::Malformed(_) => ErrorCode::Malformed,
            BridgeError::Transport(_) => ErrorCode::Transport,
            BridgeError::Handler(_) => ErrorCode::HandlerError,
            BridgeError::Timeout { .. } => ErrorCode::Timeout,
            BridgeError::Overloaded { .. } => ErrorCode::Overloaded,
            BridgeError::Closed => ErrorCode::Closed,
            BridgeError::UnexpectedReply { .. } => ErrorCode::UnexpectedReply,
            BridgeError::BadConfig(_) => ErrorCode::BadConfig,
            BridgeError::Internal(_) => ErrorCode::Internal,
        }
    }

    /// Wrap anything displayable as a handler failure.
    pub fn handler(reason: impl std::fmt::Display) -> Self {
        BridgeError::Handler(reason.to_string())
    }
}
