use std::collections::HashMap;
use std::fmt;

use aws_sdk_sqs::types::{Message as SqsMessage, MessageAttributeValue};

use crate::errors::SqsListenerError;

/// Message attribute name that identifies the message type.
pub const ATTR_MESSAGE_TYPE: &str = "MessageType";

/// Data type used for string message attributes.
pub const STRING_DATA_TYPE: &str = "String";

/// A single message attribute: its SQS data type and string value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MessageAttribute {
    pub data_type: String,
    pub string_value: Option<String>,
}

impl MessageAttribute {
    /// Creates a `String` typed attribute.
    pub fn string(value: impl Into<String>) -> Self {
        MessageAttribute {
            data_type: STRING_DATA_TYPE.to_string(),
            string_value: Some(value.into()),
        }
    }

    pub(crate) fn to_sqs(&self) -> Result<MessageAttributeValue, SqsListenerError> {
        MessageAttributeValue::builder()
            .data_type(&self.data_type)
            .set_string_value(self.string_value.clone())
            .build()
            .map_err(|e| SqsListenerError::InvalidConfig {
                key: "message_attributes".to_string(),
                reason: e.to_string(),
            })
    }
}

impl From<&MessageAttributeValue> for MessageAttribute {
    fn from(value: &MessageAttributeValue) -> Self {
        MessageAttribute {
            data_type: value.data_type().to_string(),
            string_value: value.string_value().map(str::to_string),
        }
    }
}

impl fmt::Display for MessageAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}({})",
            self.data_type,
            self.string_value.as_deref().unwrap_or("")
        )
    }
}

/// A message received from a queue.
///
/// The receipt handle is only valid until the message is deleted or its
/// visibility timeout expires.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    pub message_id: String,
    pub receipt_handle: String,
    pub md5_of_body: String,
    pub body: String,
    pub attributes: HashMap<String, MessageAttribute>,
}

impl Message {
    /// Value of the reserved `MessageType` attribute, if present.
    pub fn message_type(&self) -> Option<&str> {
        self.attributes
            .get(ATTR_MESSAGE_TYPE)
            .and_then(|attr| attr.string_value.as_deref())
    }

    /// Sets the reserved `MessageType` attribute.
    pub fn with_message_type(mut self, message_type: impl Into<String>) -> Self {
        self.attributes.insert(
            ATTR_MESSAGE_TYPE.to_string(),
            MessageAttribute::string(message_type),
        );
        self
    }

    /// Multi-line description used when handling a message fails.
    pub fn diagnostics(&self) -> Diagnostics<'_> {
        Diagnostics(self)
    }
}

impl From<&SqsMessage> for Message {
    fn from(msg: &SqsMessage) -> Self {
        let attributes = msg
            .message_attributes()
            .map(|attrs| {
                attrs
                    .iter()
                    .map(|(name, value)| (name.clone(), MessageAttribute::from(value)))
                    .collect()
            })
            .unwrap_or_default();

        Message {
            message_id: msg.message_id().unwrap_or_default().to_string(),
            receipt_handle: msg.receipt_handle().unwrap_or_default().to_string(),
            md5_of_body: msg.md5_of_body().unwrap_or_default().to_string(),
            body: msg.body().unwrap_or_default().to_string(),
            attributes,
        }
    }
}

/// Display adapter returned by [`Message::diagnostics`].
pub struct Diagnostics<'a>(&'a Message);

impl fmt::Display for Diagnostics<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let msg = self.0;
        write!(f, "\n\tMessageId:     {}", msg.message_id)?;
        write!(f, "\n\tReceiptHandle: {}", msg.receipt_handle)?;
        write!(f, "\n\tMD5OfBody:     {}", msg.md5_of_body)?;
        write!(f, "\n\tBody:          {}", msg.body)?;

        let mut names: Vec<&String> = msg.attributes.keys().collect();
        names.sort();
        for name in names {
            write!(f, "\n\tAttribute:")?;
            write!(f, "\n\t\tName:  {}", name)?;
            write!(f, "\n\t\tValue: {}", msg.attributes[name])?;
        }
        Ok(())
    }
}
