use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::client::QueueClient;
use crate::dispatch::{DispatchOutcome, dispatch};
use crate::errors::SqsListenerError;
use crate::listener::config::ListenerConfig;
use crate::listener::health::HealthState;
use crate::message::Message;
use crate::registry::HandlerRegistry;

/// Everything the background task owns while polling one queue.
pub(crate) struct PollLoop<C: QueueClient> {
    pub(crate) client: Arc<C>,
    pub(crate) queue_url: String,
    pub(crate) registry: Arc<HandlerRegistry>,
    pub(crate) health: Arc<HealthState>,
    pub(crate) config: ListenerConfig,
    pub(crate) cancel: CancellationToken,
}

/// Counts for one processed batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BatchSummary {
    pub(crate) deleted: usize,
    pub(crate) refused: usize,
    pub(crate) failed: usize,
}

impl<C: QueueClient> PollLoop<C> {
    /// Runs until the cancellation token fires.
    pub(crate) async fn run(self) {
        info!(queue_url = %self.queue_url, "Start listening to queue");

        while !self.cancel.is_cancelled() {
            let received = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => break,
                received = self.client.receive(&self.queue_url, &self.config.receive) => received,
            };

            match received {
                Ok(messages) => {
                    self.process_messages(&messages).await;
                    self.handle_recovery();
                }
                Err(e) => {
                    if !self.handle_queue_error(&e).await {
                        break;
                    }
                }
            }
        }

        info!(queue_url = %self.queue_url, "Stop listening to queue");
    }

    /// Dispatches every message of the batch in receipt order, deleting the
    /// ones that were handled successfully.
    pub(crate) async fn process_messages(&self, messages: &[Message]) -> BatchSummary {
        debug!(count = messages.len(), "Received messages");

        let mut summary = BatchSummary::default();
        for (i, message) in messages.iter().enumerate() {
            debug!("Processing message {} of {}", i + 1, messages.len());

            match dispatch(&self.registry, message).await {
                DispatchOutcome::Handled => {
                    if self.delete_message(message, i, messages.len()).await {
                        summary.deleted += 1;
                    }
                }
                DispatchOutcome::Refused => summary.refused += 1,
                DispatchOutcome::Failed(_) => summary.failed += 1,
            }
        }
        summary
    }

    async fn delete_message(&self, message: &Message, index: usize, total: usize) -> bool {
        match self
            .client
            .delete(&self.queue_url, &message.receipt_handle)
            .await
        {
            Ok(()) => {
                debug!(
                    queue_url = %self.queue_url,
                    "Message {} of {} is processed and deleted from queue",
                    index + 1,
                    total
                );
                true
            }
            Err(e) => {
                error!(
                    message_id = %message.message_id,
                    error = %e,
                    kind = %e.kind(),
                    "Error deleting message:{}",
                    message.diagnostics()
                );
                false
            }
        }
    }

    fn handle_recovery(&self) {
        if self.health.mark_healthy() {
            info!(queue_url = %self.queue_url, "Queue recovered from error condition");
        }
    }

    /// Records the failure and waits out the backoff. Returns `false` when
    /// the listener was cancelled during the wait.
    async fn handle_queue_error(&self, e: &SqsListenerError) -> bool {
        let backoff_ms = self.config.backoff.as_millis();
        if self.health.mark_unhealthy() {
            error!(
                queue_url = %self.queue_url,
                error = %e,
                kind = %e.kind(),
                "An error occurred while listening to queue, waiting {} ms before retrying...",
                backoff_ms
            );
        } else {
            warn!(
                queue_url = %self.queue_url,
                error = %e,
                kind = %e.kind(),
                "Retry failed while listening to queue, waiting {} ms before retrying...",
                backoff_ms
            );
        }

        self.sleep_or_cancel(self.config.backoff).await
    }

    async fn sleep_or_cancel(&self, duration: Duration) -> bool {
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => false,
            _ = tokio::time::sleep(duration) => true,
        }
    }
}
