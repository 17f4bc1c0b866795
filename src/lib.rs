//! # SQS Listener
//!
//! An asynchronous AWS SQS listener that polls one queue, routes each
//! message to the handler registered for its `MessageType` attribute and
//! deletes the message once that handler succeeds.
//!
//! ## Features
//!
//! - Background poll loop on tokio with cooperative cancellation
//! - Trait-based handlers plus closure handlers with shared resources
//! - Case-insensitive routing on the `MessageType` message attribute
//! - Messages are deleted only after successful handling
//! - Continue-on-error semantics: one failing message never aborts a batch
//! - Health flag with fixed backoff on receive failures
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use rs_sqs_listener::{
//!     client::create_sqs_client_from_env,
//!     handler::FnHandler,
//!     listener::SqsListener,
//!     message::Message,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = create_sqs_client_from_env().await;
//!     let shared_data = "shared state".to_string();
//!
//!     let handler = FnHandler::new(
//!         "OrderPlaced",
//!         |message: Message, shared: String| async move {
//!             println!("Processing message: {} with shared: {}", message.body, shared);
//!             Ok(())
//!         },
//!         shared_data,
//!     )?;
//!
//!     let mut listener = SqsListener::builder()
//!         .client(client)
//!         .queue_url("https://sqs.region.amazonaws.com/account/queue-name")
//!         .handler(handler)
//!         .build()?;
//!
//!     listener.start()?;
//!     tokio::signal::ctrl_c().await?;
//!     listener.shutdown().await;
//!
//!     Ok(())
//! }
//! ```

pub mod client;
pub mod dispatch;
pub mod errors;
pub mod handler;
pub mod listener;
pub mod message;
pub mod publisher;
pub mod registry;

pub use errors::{ErrorKind, GenericError, SqsListenerError};
pub use handler::{FnHandler, MessageHandler, MessageType};
pub use listener::SqsListener;
pub use message::Message;
