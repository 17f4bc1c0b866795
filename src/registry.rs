use std::collections::HashMap;
use std::sync::Arc;

use crate::errors::SqsListenerError;
use crate::handler::{MessageHandler, normalize};
use crate::message::Message;

/// Handlers keyed by their normalized message type.
///
/// Each tag routes to exactly one handler; registering a second handler for
/// a tag that differs only in case is rejected.
#[derive(Default, Clone)]
pub struct HandlerRegistry {
    handlers: HashMap<String, Arc<dyn MessageHandler>>,
}

impl HandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a handler.
    ///
    /// # Errors
    ///
    /// Returns [`SqsListenerError::DuplicateMessageType`] when another handler
    /// is already bound to the same tag.
    pub fn register(&mut self, handler: Arc<dyn MessageHandler>) -> Result<(), SqsListenerError> {
        let message_type = handler.message_type();
        let key = message_type.normalized().to_string();
        if self.handlers.contains_key(&key) {
            return Err(SqsListenerError::DuplicateMessageType(
                message_type.as_str().to_string(),
            ));
        }
        self.handlers.insert(key, handler);
        Ok(())
    }

    /// Builder-style variant of [`HandlerRegistry::register`].
    pub fn with_handler<H>(mut self, handler: H) -> Result<Self, SqsListenerError>
    where
        H: MessageHandler + 'static,
    {
        self.register(Arc::new(handler))?;
        Ok(self)
    }

    /// Finds the handler willing to accept `message`.
    pub fn resolve(&self, message: &Message) -> Option<&Arc<dyn MessageHandler>> {
        let message_type = message.message_type()?;
        self.handlers
            .get(&normalize(message_type))
            .filter(|handler| handler.can_handle(message))
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Registered tags, in no particular order.
    pub fn message_types(&self) -> impl Iterator<Item = &str> {
        self.handlers.values().map(|h| h.message_type().as_str())
    }
}

impl std::fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerRegistry")
            .field("message_types", &self.message_types().collect::<Vec<_>>())
            .finish()
    }
}
