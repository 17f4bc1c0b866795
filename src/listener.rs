use std::sync::Arc;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, error, info_span};

use crate::client::QueueClient;
use crate::errors::SqsListenerError;
use crate::handler::MessageHandler;
use crate::registry::HandlerRegistry;

pub mod config;
pub mod health;
mod poll;

use config::ListenerConfig;
use health::{HealthState, ListenerHealth, SqsListenerHealthCheck};
use poll::PollLoop;

/// Listens to one queue and routes every received message to the handler
/// registered for its `MessageType`.
///
/// Messages are deleted only after their handler succeeds. Receive failures
/// mark the listener unhealthy and are retried after a fixed backoff until
/// the listener is stopped.
///
/// A listener is started at most once; after [`SqsListener::stop`] it cannot
/// be restarted.
pub struct SqsListener<C: QueueClient = aws_sdk_sqs::Client> {
    client: Arc<C>,
    queue_url: String,
    registry: Arc<HandlerRegistry>,
    config: ListenerConfig,
    health: Arc<HealthState>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl<C: QueueClient> SqsListener<C> {
    /// Creates a listener for `queue_url`.
    ///
    /// # Arguments
    ///
    /// * `client` - The queue client, possibly shared with a publisher
    /// * `queue_url` - The URL of the queue to listen to
    /// * `registry` - Handlers the received messages are routed to
    /// * `config` - Receive parameters and retry backoff
    ///
    /// # Errors
    ///
    /// Returns [`SqsListenerError::MissingQueueUrl`] for an empty URL and
    /// [`SqsListenerError::InvalidConfig`] when `config` is out of range.
    pub fn new(
        client: Arc<C>,
        queue_url: &str,
        registry: HandlerRegistry,
        config: ListenerConfig,
    ) -> Result<Self, SqsListenerError> {
        if queue_url.trim().is_empty() {
            return Err(SqsListenerError::MissingQueueUrl);
        }
        config.validate()?;

        Ok(SqsListener {
            client,
            queue_url: queue_url.to_string(),
            registry: Arc::new(registry),
            config,
            health: Arc::new(HealthState::default()),
            cancel: CancellationToken::new(),
            task: None,
        })
    }

    /// Starts a [`ListenerBuilder`]. The client type is usually inferred
    /// from [`ListenerBuilder::client`].
    pub fn builder() -> ListenerBuilder<C> {
        ListenerBuilder::new()
    }

    /// Spawns the background poll loop on the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns [`SqsListenerError::AlreadyStarted`] when called twice and
    /// [`SqsListenerError::AlreadyStopped`] after [`SqsListener::stop`].
    pub fn start(&mut self) -> Result<(), SqsListenerError> {
        if self.cancel.is_cancelled() {
            return Err(SqsListenerError::AlreadyStopped(self.queue_url.clone()));
        }
        if self.task.is_some() {
            return Err(SqsListenerError::AlreadyStarted(self.queue_url.clone()));
        }

        let poll = PollLoop {
            client: self.client.clone(),
            queue_url: self.queue_url.clone(),
            registry: self.registry.clone(),
            health: self.health.clone(),
            config: self.config.clone(),
            cancel: self.cancel.clone(),
        };
        let span = info_span!("sqs_listener", queue_url = %self.queue_url);
        self.task = Some(tokio::spawn(poll.run().instrument(span)));
        Ok(())
    }

    /// Signals the poll loop to stop without waiting for it to exit.
    ///
    /// An in-flight receive or backoff sleep is abandoned immediately; a
    /// message that is being handled is finished first.
    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Waits for the poll loop to exit. Returns immediately when the
    /// listener was never started.
    pub async fn wait(&mut self) {
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                error!(queue_url = %self.queue_url, error = %e, "Listener task ended abnormally");
            }
        }
    }

    /// Stops the listener and waits for the poll loop to exit.
    pub async fn shutdown(&mut self) {
        self.stop();
        self.wait().await;
    }

    /// Returns `true` while the poll loop task is alive.
    ///
    /// This is `false` before [`SqsListener::start`] and once the loop has
    /// exited after [`SqsListener::stop`]. Handler failures and receive
    /// errors never end the loop, so they do not affect it.
    pub fn is_running(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Last known health of the queue. Eventually consistent: it reflects the
    /// outcome of the most recent receive, not a live check.
    pub fn is_healthy(&self) -> bool {
        self.health.is_healthy()
    }

    /// The queue this listener polls.
    pub fn queue_url(&self) -> &str {
        &self.queue_url
    }

    /// A health check reporting this listener's state with the queue URL.
    pub fn health_check(&self) -> SqsListenerHealthCheck<'_, Self> {
        SqsListenerHealthCheck::new(self)
    }
}

impl<C: QueueClient> ListenerHealth for SqsListener<C> {
    fn is_healthy(&self) -> bool {
        self.health.is_healthy()
    }

    fn queue_url(&self) -> &str {
        &self.queue_url
    }
}

impl<C: QueueClient> Drop for SqsListener<C> {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

impl<C: QueueClient> std::fmt::Debug for SqsListener<C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqsListener")
            .field("queue_url", &self.queue_url)
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("healthy", &self.is_healthy())
            .field("running", &self.is_running())
            .finish()
    }
}

/// Builder for [`SqsListener`].
///
/// Handler registration errors are kept until [`ListenerBuilder::build`] so
/// calls can be chained.
///
/// # Example
///
/// ```rust,no_run
/// use rs_sqs_listener::client::create_sqs_client_from_env;
/// use rs_sqs_listener::handler::FnHandler;
/// use rs_sqs_listener::listener::SqsListener;
/// use rs_sqs_listener::listener::config::ListenerConfig;
/// use rs_sqs_listener::message::Message;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut listener = SqsListener::builder()
///         .client(create_sqs_client_from_env().await)
///         .queue_url("https://sqs.region.amazonaws.com/account/queue-name")
///         .config(ListenerConfig::from_env()?)
///         .handler(FnHandler::new(
///             "OrderPlaced",
///             |message: Message, _: ()| async move {
///                 println!("order: {}", message.body);
///                 Ok(())
///             },
///             (),
///         )?)
///         .build()?;
///
///     listener.start()?;
///     Ok(())
/// }
/// ```
pub struct ListenerBuilder<C: QueueClient> {
    client: Option<Arc<C>>,
    queue_url: Option<String>,
    registry: HandlerRegistry,
    config: ListenerConfig,
    error: Option<SqsListenerError>,
}

impl<C: QueueClient> Default for ListenerBuilder<C> {
    fn default() -> Self {
        ListenerBuilder {
            client: None,
            queue_url: None,
            registry: HandlerRegistry::new(),
            config: ListenerConfig::default(),
            error: None,
        }
    }
}

impl<C: QueueClient> ListenerBuilder<C> {
    /// Creates an empty builder with the default [`ListenerConfig`].
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the queue client the listener takes ownership of.
    ///
    /// # Arguments
    ///
    /// * `client` - Any [`QueueClient`], usually an `aws_sdk_sqs::Client`
    pub fn client(self, client: C) -> Self {
        self.shared_client(Arc::new(client))
    }

    /// Uses a client that is also used elsewhere, e.g. by a publisher.
    pub fn shared_client(mut self, client: Arc<C>) -> Self {
        self.client = Some(client);
        self
    }

    /// Sets the URL of the queue to listen to. Required.
    pub fn queue_url(mut self, queue_url: &str) -> Self {
        self.queue_url = Some(queue_url.to_string());
        self
    }

    /// Overrides the receive parameters and backoff.
    ///
    /// The configuration is validated by [`ListenerBuilder::build`].
    pub fn config(mut self, config: ListenerConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a handler for its message type.
    ///
    /// # Arguments
    ///
    /// * `handler` - The handler, e.g. a [`FnHandler`](crate::handler::FnHandler)
    ///
    /// A handler whose message type is already registered (ignoring case)
    /// makes [`ListenerBuilder::build`] fail with
    /// [`SqsListenerError::DuplicateMessageType`].
    pub fn handler<H>(self, handler: H) -> Self
    where
        H: MessageHandler + 'static,
    {
        self.shared_handler(Arc::new(handler))
    }

    /// Registers a handler that is shared with other listeners.
    pub fn shared_handler(mut self, handler: Arc<dyn MessageHandler>) -> Self {
        if let Err(e) = self.registry.register(handler) {
            self.error.get_or_insert(e);
        }
        self
    }

    /// Replaces the handlers registered so far.
    pub fn registry(mut self, registry: HandlerRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Builds the listener. Nothing is polled until [`SqsListener::start`].
    ///
    /// # Errors
    ///
    /// Returns the first handler registration error, then
    /// [`SqsListenerError::MissingClient`] or
    /// [`SqsListenerError::MissingQueueUrl`] when either was not set, or
    /// [`SqsListenerError::InvalidConfig`] for an out-of-range configuration.
    pub fn build(self) -> Result<SqsListener<C>, SqsListenerError> {
        if let Some(e) = self.error {
            return Err(e);
        }
        let client = self.client.ok_or(SqsListenerError::MissingClient)?;
        let queue_url = self.queue_url.ok_or(SqsListenerError::MissingQueueUrl)?;
        SqsListener::new(client, &queue_url, self.registry, self.config)
    }
}
