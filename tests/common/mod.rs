#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use rs_sqs_listener::client::QueueClient;
use rs_sqs_listener::errors::{ErrorKind, SqsListenerError};
use rs_sqs_listener::listener::config::{ListenerConfig, ReceiveConfig};
use rs_sqs_listener::message::{Message, MessageAttribute};
use tokio::sync::{Mutex, mpsc};
use tracing::field::{Field, Visit};
use tracing::subscriber::DefaultGuard;
use tracing::{Event, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

pub const TEST_QUEUE_URL: &str = "test-queue-url";

pub type ReceiveResult = Result<Vec<Message>, SqsListenerError>;

/// In-memory queue whose receive calls block until the test scripts the
/// next response, so every poll-loop iteration is driven explicitly.
pub struct ScriptedQueue {
    responses: Mutex<mpsc::UnboundedReceiver<ReceiveResult>>,
    receive_calls: AtomicUsize,
    deleted: std::sync::Mutex<Vec<String>>,
}

/// Test-side handle for feeding a [`ScriptedQueue`].
pub struct Script {
    tx: mpsc::UnboundedSender<ReceiveResult>,
}

impl Script {
    pub fn batch(&self, messages: Vec<Message>) {
        self.tx.send(Ok(messages)).expect("queue dropped");
    }

    pub fn fail(&self) {
        self.tx
            .send(Err(SqsListenerError::ReceiveError {
                queue_url: TEST_QUEUE_URL.to_string(),
                kind: ErrorKind::Transient,
                reason: "Simulated SQS exception".to_string(),
            }))
            .expect("queue dropped");
    }
}

pub fn scripted_queue() -> (Arc<ScriptedQueue>, Script) {
    let (tx, rx) = mpsc::unbounded_channel();
    let queue = ScriptedQueue {
        responses: Mutex::new(rx),
        receive_calls: AtomicUsize::new(0),
        deleted: std::sync::Mutex::new(Vec::new()),
    };
    (Arc::new(queue), Script { tx })
}

impl ScriptedQueue {
    pub fn receive_calls(&self) -> usize {
        self.receive_calls.load(Ordering::SeqCst)
    }

    pub fn deleted(&self) -> Vec<String> {
        self.deleted.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueueClient for ScriptedQueue {
    async fn receive(&self, _queue_url: &str, _config: &ReceiveConfig) -> ReceiveResult {
        self.receive_calls.fetch_add(1, Ordering::SeqCst);
        let mut responses = self.responses.lock().await;
        match responses.recv().await {
            Some(response) => response,
            None => std::future::pending().await,
        }
    }

    async fn delete(&self, _queue_url: &str, receipt_handle: &str) -> Result<(), SqsListenerError> {
        self.deleted.lock().unwrap().push(receipt_handle.to_string());
        Ok(())
    }

    async fn send(
        &self,
        _queue_url: &str,
        _body: &str,
        _attributes: &HashMap<String, MessageAttribute>,
        _delay_seconds: i32,
    ) -> Result<(), SqsListenerError> {
        Ok(())
    }
}

pub fn message(receipt_handle: &str, message_type: &str) -> Message {
    Message {
        message_id: format!("id-{receipt_handle}"),
        receipt_handle: receipt_handle.to_string(),
        md5_of_body: "d41d8cd98f00b204e9800998ecf8427e".to_string(),
        body: format!("body of {receipt_handle}"),
        ..Default::default()
    }
    .with_message_type(message_type)
}

pub fn fast_config(backoff: Duration) -> ListenerConfig {
    ListenerConfig {
        backoff,
        ..Default::default()
    }
}

/// Polls `condition` until it holds, panicking after two seconds.
pub async fn wait_for<F>(what: &str, condition: F)
where
    F: Fn() -> bool,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !condition() {
        if tokio::time::Instant::now() > deadline {
            panic!("timed out waiting for {what}");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Records the message of every tracing event emitted while installed.
#[derive(Clone, Default)]
pub struct LogEvents {
    messages: Arc<std::sync::Mutex<Vec<String>>>,
}

impl LogEvents {
    /// Number of recorded events whose message starts with `prefix`.
    pub fn count(&self, prefix: &str) -> usize {
        self.messages
            .lock()
            .unwrap()
            .iter()
            .filter(|message| message.starts_with(prefix))
            .count()
    }
}

struct MessageVisitor(Option<String>);

impl Visit for MessageVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = Some(format!("{value:?}"));
        }
    }
}

impl<S: Subscriber> Layer<S> for LogEvents {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = MessageVisitor(None);
        event.record(&mut visitor);
        if let Some(message) = visitor.0 {
            self.messages.lock().unwrap().push(message);
        }
    }
}

/// Installs a [`LogEvents`] recorder as the default subscriber of the current
/// thread. `#[tokio::test]` runs spawned tasks on that same thread, so the
/// listener's events are captured as well.
pub fn capture_logs() -> (LogEvents, DefaultGuard) {
    let events = LogEvents::default();
    let subscriber = tracing_subscriber::registry().with(events.clone());
    let guard = tracing::subscriber::set_default(subscriber);
    (events, guard)
}
