use std::str::FromStr;

use thiserror::Error;

/// Error types for the SQS listener.
///
/// Construction-time variants are programming errors and are returned
/// immediately. Runtime variants raised while polling are classified by
/// [`SqsListenerError::kind`] and never stop the poll loop.
#[derive(Debug, Error)]
pub enum SqsListenerError {
    /// A configuration value could not be parsed or is out of range.
    #[error("invalid configuration `{key}`: {reason}")]
    InvalidConfig { key: String, reason: String },

    /// A handler was built without a routing tag.
    #[error("message type cannot be empty")]
    MissingMessageType,

    /// Two handlers were registered for the same (case-insensitive) tag.
    #[error("a handler is already registered for message type `{0}`")]
    DuplicateMessageType(String),

    #[error("a queue client is required to build the listener")]
    MissingClient,

    #[error("a queue url is required to build the listener")]
    MissingQueueUrl,

    /// Pulling a batch from the queue failed.
    #[error("failed to receive messages from `{queue_url}`: {reason}")]
    ReceiveError {
        queue_url: String,
        kind: ErrorKind,
        reason: String,
    },

    #[error("failed to delete message from `{queue_url}`: {reason}")]
    DeleteError {
        queue_url: String,
        kind: ErrorKind,
        reason: String,
    },

    #[error("failed to send message to `{queue_url}`: {reason}")]
    SendError {
        queue_url: String,
        kind: ErrorKind,
        reason: String,
    },

    #[error("listener for `{0}` has already been started")]
    AlreadyStarted(String),

    #[error("listener for `{0}` has been stopped and cannot be restarted")]
    AlreadyStopped(String),

    /// A handler panicked while handling a message.
    #[error("handler for message type `{message_type}` panicked: {reason}")]
    HandlerPanicked {
        message_type: String,
        reason: String,
    },

    /// Failure raised by a message handler.
    #[error("{0}")]
    GenericError(#[from] GenericError),
}

/// Whether retrying the failed operation may succeed without intervention.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Network, timeout or throttling style failures.
    Transient,
    /// Rejections that will repeat until the configuration or backend changes.
    Permanent,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Transient => write!(f, "transient"),
            ErrorKind::Permanent => write!(f, "permanent"),
        }
    }
}

impl SqsListenerError {
    /// Classifies the error for retry decisions.
    pub fn kind(&self) -> ErrorKind {
        match self {
            SqsListenerError::ReceiveError { kind, .. }
            | SqsListenerError::DeleteError { kind, .. }
            | SqsListenerError::SendError { kind, .. } => *kind,
            _ => ErrorKind::Permanent,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

/// Generic error type for failures raised by handlers.
#[derive(Debug, Error)]
pub struct GenericError(String);

impl GenericError {
    /// Creates a new `GenericError` with the provided message.
    pub fn new(message: String) -> Self {
        GenericError(message)
    }
}

impl std::fmt::Display for GenericError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for GenericError {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(GenericError::new(s.to_string()))
    }
}

impl From<String> for GenericError {
    fn from(s: String) -> Self {
        GenericError::new(s)
    }
}

impl From<&str> for GenericError {
    fn from(s: &str) -> Self {
        GenericError::new(s.to_string())
    }
}
