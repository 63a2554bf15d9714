//! Error types for the relay's port traits.
//!
//! Each port (publisher, queue, deployer) has its own error type so that the
//! caller can tell *where* a failure happened. Infrastructure crates map their
//! SDK-specific errors into these; the domain never sees an SDK type.
//!
//! None of these errors carry a retry policy: the relay performs no retries of
//! its own. Redelivery is entirely the queue's business (visibility timeout).

use thiserror::Error;

/// The event publisher could not deliver a push event to the topic.
///
/// Produced by: topic provisioning (`CreateTopic`) or the publish call itself.
/// The webhook reports this to GitHub as a failed delivery.
#[derive(Debug, Error)]
pub enum PublishError {
    /// The push event could not be serialized.
    #[error("failed to serialize push event: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The topic could not be created or resolved.
    #[error("failed to provision topic '{topic}': {message}")]
    Provisioning {
        /// Name of the topic that was being created.
        topic: String,
        /// Transport error description.
        message: String,
    },

    /// The publish call failed.
    #[error("failed to publish to '{topic}': {message}")]
    Delivery {
        /// ARN or name of the target topic.
        topic: String,
        /// Transport error description.
        message: String,
    },
}

/// A queue operation failed.
#[derive(Debug, Error)]
pub enum QueueError {
    /// The long-poll receive call failed.
    #[error("failed to receive from queue: {0}")]
    Receive(String),

    /// Deleting a processed message failed; it will be redelivered once its
    /// visibility timeout expires.
    #[error("failed to acknowledge message: {0}")]
    Acknowledge(String),

    /// The queue returned a message without an id, body, or receipt handle.
    #[error("queue returned an incomplete message: missing {0}")]
    IncompleteMessage(&'static str),
}

/// The deployment tool could not be launched.
///
/// A tool that *runs* and fails is not an error here: deployment outcomes are
/// not observed.
#[derive(Debug, Error)]
pub enum DeployError {
    /// The command could not be spawned or waited on.
    #[error("failed to run '{command}': {source}")]
    Spawn {
        /// The command line that was attempted.
        command: String,
        /// Underlying OS error.
        #[source]
        source: std::io::Error,
    },
}

/// Configuration errors raised while assembling [`crate::RelayConfig`] or
/// deriving resource addresses from it.
#[derive(Debug, Error)]
pub enum RelayError {
    /// A configuration value was empty or malformed.
    #[error("configuration error: {message}")]
    Configuration {
        /// Description of the configuration problem.
        message: String,
    },

    /// A queue ARN did not have the shape `arn:<partition>:sqs:<region>:<account>:<name>`.
    #[error("not an SQS queue ARN: '{0}'")]
    InvalidQueueArn(String),
}
