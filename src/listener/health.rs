use std::sync::atomic::{AtomicBool, Ordering};

/// Healthy flag shared between the poll loop (single writer) and any number
/// of readers.
#[derive(Debug)]
pub struct HealthState {
    healthy: AtomicBool,
}

impl Default for HealthState {
    fn default() -> Self {
        HealthState {
            healthy: AtomicBool::new(true),
        }
    }
}

impl HealthState {
    pub fn is_healthy(&self) -> bool {
        self.healthy.load(Ordering::Acquire)
    }

    /// Marks the queue unhealthy. Returns `true` only for the first failure
    /// after a healthy period.
    pub fn mark_unhealthy(&self) -> bool {
        self.healthy
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Marks the queue healthy. Returns `true` only when recovering from an
    /// unhealthy period.
    pub fn mark_healthy(&self) -> bool {
        self.healthy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Read-only view a health check needs from a listener.
pub trait ListenerHealth {
    fn is_healthy(&self) -> bool;

    fn queue_url(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy(String),
}

/// Health check reporting on one listener's queue.
pub struct SqsListenerHealthCheck<'a, L: ListenerHealth> {
    listener: &'a L,
}

impl<'a, L: ListenerHealth> SqsListenerHealthCheck<'a, L> {
    pub fn new(listener: &'a L) -> Self {
        SqsListenerHealthCheck { listener }
    }

    pub fn check(&self) -> HealthStatus {
        if self.listener.is_healthy() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy(format!(
                "There is a problem with the SQS listener for queue: {}",
                self.listener.queue_url()
            ))
        }
    }
}
