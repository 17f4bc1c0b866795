use std::fmt;
use std::future::Future;
use std::marker::PhantomData;

use async_trait::async_trait;

use crate::errors::SqsListenerError;
use crate::message::Message;

/// Routing tag of a handler, compared case-insensitively against the
/// `MessageType` attribute of incoming messages.
///
/// Case is folded one character at a time (upper-case, then lower-case), so
/// `"İ"` matches `"i"` and `"ς"` matches `"Σ"`. Characters whose case mapping
/// expands to several characters, such as `'ß'`, are compared as they are.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MessageType {
    value: String,
    normalized: String,
}

impl MessageType {
    /// Creates a routing tag. Empty or blank tags are rejected.
    pub fn new(value: impl Into<String>) -> Result<Self, SqsListenerError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(SqsListenerError::MissingMessageType);
        }
        let normalized = normalize(&value);
        Ok(MessageType { value, normalized })
    }

    pub fn as_str(&self) -> &str {
        &self.value
    }

    /// Case-folded form used as the registry key.
    pub fn normalized(&self) -> &str {
        &self.normalized
    }

    /// True when the message carries a `MessageType` attribute equal,
    /// ignoring case, to this tag. An absent message never matches.
    pub fn matches(&self, message: Option<&Message>) -> bool {
        let Some(message) = message else {
            return false;
        };
        match message.message_type() {
            Some(value) => normalize(value) == self.normalized,
            None => false,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

pub(crate) fn normalize(value: &str) -> String {
    value.chars().map(fold_case).collect()
}

fn fold_case(c: char) -> char {
    let upper = single(c.to_uppercase()).unwrap_or(c);
    upper.to_lowercase().next().unwrap_or(upper)
}

fn single(mut chars: impl Iterator<Item = char>) -> Option<char> {
    let first = chars.next()?;
    chars.next().is_none().then_some(first)
}

/// Handles messages of one message type.
///
/// Errors returned from [`MessageHandler::handle`] leave the message on the
/// queue, so handlers should tolerate seeing the same message again once its
/// visibility timeout expires.
#[async_trait]
pub trait MessageHandler: Send + Sync {
    /// The message type this handler is bound to.
    fn message_type(&self) -> &MessageType;

    /// Determines whether the supplied message can be handled by this handler.
    fn can_handle(&self, message: &Message) -> bool {
        self.message_type().matches(Some(message))
    }

    /// Processes an accepted message.
    async fn handle(&self, message: &Message) -> Result<(), SqsListenerError>;
}

/// A [`MessageHandler`] built from an async function and a shared resource
/// cloned into every call.
///
/// # Type Parameters
///
/// * `F` - The message handler function type
/// * `Fut` - The future returned by the handler function
/// * `TShared` - The type of shared resources passed to the handler
pub struct FnHandler<F, Fut, TShared>
where
    F: Fn(Message, TShared) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), SqsListenerError>> + Send + 'static,
    TShared: Send + Sync + Clone + 'static,
{
    message_type: MessageType,
    handler_fn: F,
    shared_resources: TShared,
    _future: PhantomData<fn() -> Fut>,
}

impl<F, Fut, TShared> FnHandler<F, Fut, TShared>
where
    F: Fn(Message, TShared) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), SqsListenerError>> + Send + 'static,
    TShared: Send + Sync + Clone + 'static,
{
    /// Creates a handler for `message_type`.
    ///
    /// # Errors
    ///
    /// Returns [`SqsListenerError::MissingMessageType`] when `message_type`
    /// is empty.
    pub fn new(
        message_type: &str,
        handler_fn: F,
        shared_resources: TShared,
    ) -> Result<Self, SqsListenerError> {
        Ok(FnHandler {
            message_type: MessageType::new(message_type)?,
            handler_fn,
            shared_resources,
            _future: PhantomData,
        })
    }
}

#[async_trait]
impl<F, Fut, TShared> MessageHandler for FnHandler<F, Fut, TShared>
where
    F: Fn(Message, TShared) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), SqsListenerError>> + Send + 'static,
    TShared: Send + Sync + Clone + 'static,
{
    fn message_type(&self) -> &MessageType {
        &self.message_type
    }

    async fn handle(&self, message: &Message) -> Result<(), SqsListenerError> {
        (self.handler_fn)(message.clone(), self.shared_resources.clone()).await
    }
}

impl<F, Fut, TShared> fmt::Debug for FnHandler<F, Fut, TShared>
where
    F: Fn(Message, TShared) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), SqsListenerError>> + Send + 'static,
    TShared: Send + Sync + Clone + 'static,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnHandler")
            .field("message_type", &self.message_type)
            .finish_non_exhaustive()
    }
}
