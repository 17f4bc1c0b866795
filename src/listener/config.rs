use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::SqsListenerError;

/// Fixed delay between consecutive failed receive attempts.
pub const DEFAULT_BACKOFF: Duration = Duration::from_millis(5000);

/// Parameters of each receive request.
///
/// # Fields
/// - `max_number_of_messages`: The maximum number of messages to receive in a single request (1-10).
/// - `wait_time_seconds`: The wait time for long polling, in seconds (0-20).
/// - `visibility_timeout`: Overrides the queue's visibility timeout for received messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiveConfig {
    pub max_number_of_messages: i32,
    pub wait_time_seconds: i32,
    pub visibility_timeout: Option<i32>,
}

impl Default for ReceiveConfig {
    fn default() -> Self {
        ReceiveConfig {
            max_number_of_messages: 10,
            wait_time_seconds: 20,
            visibility_timeout: None,
        }
    }
}

/// Configuration of an [`SqsListener`](crate::listener::SqsListener).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerConfig {
    pub receive: ReceiveConfig,

    /// How long to wait after a failed receive before retrying.
    pub backoff: Duration,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        ListenerConfig {
            receive: ReceiveConfig::default(),
            backoff: DEFAULT_BACKOFF,
        }
    }
}

pub const ENV_MAX_MESSAGES: &str = "SQS_LISTENER_MAX_MESSAGES";
pub const ENV_WAIT_TIME_SECONDS: &str = "SQS_LISTENER_WAIT_TIME_SECONDS";
pub const ENV_VISIBILITY_TIMEOUT: &str = "SQS_LISTENER_VISIBILITY_TIMEOUT";
pub const ENV_BACKOFF_MS: &str = "SQS_LISTENER_BACKOFF_MS";

impl ListenerConfig {
    /// Reads overrides from `SQS_LISTENER_*` environment variables, keeping
    /// the default for every variable that is not set.
    pub fn from_env() -> Result<Self, SqsListenerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> Result<Self, SqsListenerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = ListenerConfig::default();

        if let Some(value) = parse(&lookup, ENV_MAX_MESSAGES)? {
            config.receive.max_number_of_messages = value;
        }
        if let Some(value) = parse(&lookup, ENV_WAIT_TIME_SECONDS)? {
            config.receive.wait_time_seconds = value;
        }
        if let Some(value) = parse(&lookup, ENV_VISIBILITY_TIMEOUT)? {
            config.receive.visibility_timeout = Some(value);
        }
        if let Some(value) = parse::<u64, _>(&lookup, ENV_BACKOFF_MS)? {
            config.backoff = Duration::from_millis(value);
        }

        config.validate()?;
        Ok(config)
    }

    /// Checks the receive parameters against the limits SQS accepts.
    pub fn validate(&self) -> Result<(), SqsListenerError> {
        let receive = &self.receive;
        if !(1..=10).contains(&receive.max_number_of_messages) {
            return Err(invalid(ENV_MAX_MESSAGES, "must be between 1 and 10"));
        }
        if !(0..=20).contains(&receive.wait_time_seconds) {
            return Err(invalid(ENV_WAIT_TIME_SECONDS, "must be between 0 and 20"));
        }
        if receive.visibility_timeout.is_some_and(|v| v < 0) {
            return Err(invalid(ENV_VISIBILITY_TIMEOUT, "must not be negative"));
        }
        Ok(())
    }
}

fn parse<T, F>(lookup: &F, key: &str) -> Result<Option<T>, SqsListenerError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| invalid(key, &e.to_string())),
    }
}

fn invalid(key: &str, reason: &str) -> SqsListenerError {
    SqsListenerError::InvalidConfig {
        key: key.to_string(),
        reason: reason.to_string(),
    }
}
