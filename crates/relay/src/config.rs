//! Runtime configuration shared by the webhook receiver and the consumer.
//!
//! Read once at startup and injected; nothing else in the workspace reads the
//! environment. [`RelayConfig::from_lookup`] takes the lookup function as a
//! parameter so defaults can be tested without touching the process
//! environment.

use std::net::SocketAddr;

use serde::Serialize;

use crate::{QueueName, RelayError, TopicName};

/// Environment variable naming the SNS topic.
pub const ENV_TOPIC: &str = "SNSTOPIC";
/// Environment variable naming the SQS queue.
pub const ENV_QUEUE: &str = "SQSQUEUE";
/// Environment variable naming the AWS region.
pub const ENV_REGION: &str = "AWS_REGION";
/// Environment variable overriding the r10k executable.
pub const ENV_R10K_BIN: &str = "R10K_BIN";
/// Environment variable overriding the webhook listen address.
pub const ENV_WEBHOOK_BIND: &str = "WEBHOOK_BIND";

const DEFAULT_TOPIC: &str = "r10k-webhook-staging";
const DEFAULT_REGION: &str = "us-east-1";
const DEFAULT_R10K_BIN: &str = "r10k";
const DEFAULT_WEBHOOK_BIND: &str = "0.0.0.0:8080";

/// Resolved relay configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RelayConfig {
    /// Topic push events are published to and the queue subscribes to.
    pub topic: TopicName,
    /// This host's queue. Defaults to `<topic>-<hostname>`; `None` when
    /// neither `SQSQUEUE` nor the hostname is known. Only the consumer needs
    /// it (see [`RelayConfig::require_queue`]).
    pub queue: Option<QueueName>,
    /// AWS region for both SNS and SQS.
    pub region: String,
    /// Path or name of the r10k executable.
    pub r10k_bin: String,
    /// Listen address for the standalone webhook server.
    pub webhook_bind: SocketAddr,
}

impl RelayConfig {
    /// Loads configuration from the process environment.
    pub fn from_env(hostname: &str) -> Result<Self, RelayError> {
        Self::from_lookup(|key| std::env::var(key).ok(), hostname)
    }

    /// Loads configuration through `lookup`, applying defaults for unset or
    /// empty variables.
    ///
    /// `hostname` is only used to build the default queue name.
    pub fn from_lookup<F>(lookup: F, hostname: &str) -> Result<Self, RelayError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let topic_raw = get(ENV_TOPIC).unwrap_or_else(|| DEFAULT_TOPIC.to_string());
        let topic = TopicName::new(topic_raw.trim()).ok_or_else(|| config_error("topic name is empty"))?;

        let queue = match get(ENV_QUEUE) {
            Some(queue) => QueueName::new(queue.trim()),
            None if hostname.is_empty() => None,
            None => QueueName::new(format!("{topic}-{}", queue_safe(hostname))),
        };

        let region = get(ENV_REGION).unwrap_or_else(|| DEFAULT_REGION.to_string());
        let r10k_bin = get(ENV_R10K_BIN).unwrap_or_else(|| DEFAULT_R10K_BIN.to_string());

        let bind_raw = get(ENV_WEBHOOK_BIND).unwrap_or_else(|| DEFAULT_WEBHOOK_BIND.to_string());
        let webhook_bind = bind_raw
            .parse()
            .map_err(|e| config_error(format!("{ENV_WEBHOOK_BIND}='{bind_raw}': {e}")))?;

        Ok(Self {
            topic,
            queue,
            region,
            r10k_bin,
            webhook_bind,
        })
    }

    /// Returns the consumer's queue name.
    ///
    /// # Errors
    ///
    /// [`RelayError::Configuration`] if `SQSQUEUE` is unset and no hostname
    /// was available to build the default.
    pub fn require_queue(&self) -> Result<&QueueName, RelayError> {
        self.queue
            .as_ref()
            .ok_or_else(|| config_error(format!("{ENV_QUEUE} is unset and the hostname is unknown")))
    }
}

/// SQS queue names allow only alphanumerics, `-` and `_`; fully-qualified
/// hostnames contain dots.
fn queue_safe(hostname: &str) -> String {
    hostname
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
        .collect()
}

fn config_error(message: impl Into<String>) -> RelayError {
    RelayError::Configuration {
        message: message.into(),
    }
}
