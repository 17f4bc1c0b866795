use std::any::Any;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::{debug, error};

use crate::errors::SqsListenerError;
use crate::message::Message;
use crate::registry::HandlerRegistry;

/// Result of routing one message.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// A handler accepted the message and finished without error.
    Handled,
    /// No handler accepted the message.
    Refused,
    /// The accepting handler returned an error or panicked.
    Failed(SqsListenerError),
}

impl DispatchOutcome {
    /// Only successfully handled messages may be deleted.
    pub fn should_delete(&self) -> bool {
        matches!(self, DispatchOutcome::Handled)
    }
}

/// Routes `message` to the single handler that accepts it and runs it.
///
/// Handler failures are logged with the full message diagnostics and
/// returned as [`DispatchOutcome::Failed`]; they never propagate further.
/// A panicking handler is reported as [`SqsListenerError::HandlerPanicked`].
pub async fn dispatch(registry: &HandlerRegistry, message: &Message) -> DispatchOutcome {
    let Some(handler) = registry.resolve(message) else {
        debug!(
            message_id = %message.message_id,
            message_type = message.message_type().unwrap_or_default(),
            "Message refused."
        );
        return DispatchOutcome::Refused;
    };

    debug!(
        message_id = %message.message_id,
        handler = %handler.message_type(),
        "Message accepted."
    );

    match AssertUnwindSafe(handler.handle(message)).catch_unwind().await {
        Ok(Ok(())) => DispatchOutcome::Handled,
        Ok(Err(e)) => {
            error!(
                message_id = %message.message_id,
                error = %e,
                "An error occurred while processing the following message:{}",
                message.diagnostics()
            );
            DispatchOutcome::Failed(e)
        }
        Err(panic) => {
            let reason = panic_message(&*panic);
            error!(
                message_id = %message.message_id,
                panic = %reason,
                "Handler panicked while processing the following message:{}",
                message.diagnostics()
            );
            DispatchOutcome::Failed(SqsListenerError::HandlerPanicked {
                message_type: handler.message_type().to_string(),
                reason,
            })
        }
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown panic".to_string()
    }
}
