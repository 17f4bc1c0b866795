//! Helpers for sending messages that an [`SqsListener`](crate::listener::SqsListener)
//! routes by their `MessageType` attribute.

use std::collections::HashMap;

use tracing::debug;

use crate::client::QueueClient;
use crate::errors::SqsListenerError;
use crate::handler::MessageType;
use crate::message::{ATTR_MESSAGE_TYPE, MessageAttribute};

/// Sends `body` to `queue_url` tagged with `message_type`.
pub async fn dispatch<C>(
    client: &C,
    queue_url: &str,
    message_type: &str,
    body: &str,
) -> Result<(), SqsListenerError>
where
    C: QueueClient + ?Sized,
{
    dispatch_delayed(client, queue_url, message_type, body, 0).await
}

/// Like [`dispatch`], hiding the message from receivers for `delay_seconds`.
pub async fn dispatch_delayed<C>(
    client: &C,
    queue_url: &str,
    message_type: &str,
    body: &str,
    delay_seconds: i32,
) -> Result<(), SqsListenerError>
where
    C: QueueClient + ?Sized,
{
    let message_type = MessageType::new(message_type)?;
    if !(0..=900).contains(&delay_seconds) {
        return Err(SqsListenerError::InvalidConfig {
            key: "delay_seconds".to_string(),
            reason: "must be between 0 and 900".to_string(),
        });
    }

    client
        .send(
            queue_url,
            body,
            &message_attributes(&message_type),
            delay_seconds,
        )
        .await?;

    debug!(queue_url, message_type = %message_type, delay_seconds, "Message dispatched");
    Ok(())
}

fn message_attributes(message_type: &MessageType) -> HashMap<String, MessageAttribute> {
    HashMap::from([(
        ATTR_MESSAGE_TYPE.to_string(),
        MessageAttribute::string(message_type.as_str()),
    )])
}
