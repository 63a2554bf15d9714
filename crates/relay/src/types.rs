//! Message types that travel through the relay.
//!
//! A [`PushEvent`] is produced by the webhook receiver, published to the topic
//! as JSON, and consumed exactly once per delivery by the dispatch loop. The
//! queue does not deliver the published JSON directly: SNS wraps it in a
//! notification envelope whose `Message` field holds the original payload as
//! a JSON *string*. [`PushEvent::from_notification`] unwraps both layers.

use serde::{Deserialize, Serialize};

use crate::{MessageId, ReceiptHandle};

// ---------------------------------------------------------------------------
// Push event
// ---------------------------------------------------------------------------

/// The normalized form of a GitHub push delivery.
///
/// Only the three fields the consumer needs survive normalization; the rest of
/// GitHub's (large) push payload is discarded at the webhook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushEvent {
    /// Short repository name (e.g. `"puppet-soe"`), not `owner/name`.
    pub repo_name: String,
    /// Repository URL as reported by GitHub.
    pub repo_url: String,
    /// E-mail address of the user who pushed.
    pub user: String,
}

impl PushEvent {
    /// Serializes the event into the JSON body published to the topic.
    pub fn to_message(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Decodes an event from the raw body of a queue message.
    ///
    /// The body is an SNS notification envelope; its `Message` field is itself
    /// a JSON document containing the published [`PushEvent`].
    pub fn from_notification(body: &str) -> Result<Self, DecodeError> {
        let envelope: Notification<'_> =
            serde_json::from_str(body).map_err(DecodeError::Envelope)?;
        serde_json::from_str(&envelope.message).map_err(DecodeError::Payload)
    }
}

impl std::fmt::Display for PushEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({}) pushed by {}", self.repo_name, self.repo_url, self.user)
    }
}

/// The subset of an SNS notification envelope the consumer reads.
#[derive(Debug, Deserialize)]
struct Notification<'a> {
    #[serde(rename = "Message", borrow)]
    message: std::borrow::Cow<'a, str>,
}

/// Failure to unwrap a queue message body into a [`PushEvent`].
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// The outer notification envelope is not JSON or lacks a `Message` field.
    #[error("malformed notification envelope: {0}")]
    Envelope(#[source] serde_json::Error),

    /// The inner `Message` string is not a valid push event.
    #[error("malformed push event payload: {0}")]
    Payload(#[source] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Queue message
// ---------------------------------------------------------------------------

/// A message received from the queue, owned by the dispatch loop for one
/// processing cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueMessage {
    /// Queue-assigned message identifier (stable across redeliveries).
    pub id: MessageId,
    /// Raw transport body; decode with [`PushEvent::from_notification`].
    pub body: String,
    /// Handle used to acknowledge (delete) this particular delivery.
    pub receipt_handle: ReceiptHandle,
}
