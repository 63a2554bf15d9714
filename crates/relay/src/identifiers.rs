//! Newtype identifiers for the AWS resources and messages the relay touches.
//!
//! Every name or handle that crosses a service boundary is wrapped in a
//! distinct newtype. This prevents accidentally passing (for example) a
//! [`QueueName`] where a [`TopicName`] is expected, or a [`ReceiptHandle`]
//! where a [`MessageId`] is expected, even though all are strings under the
//! hood.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Macro for String-wrapped newtypes.
// Generates: struct, new() returning Option<Self>, as_str(), Display.
// ---------------------------------------------------------------------------
macro_rules! string_id {
    (
        $(#[$attr:meta])*
        $name:ident
    ) => {
        $(#[$attr])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            /// Creates a new identifier, returning `None` if the value is empty.
            pub fn new(value: impl Into<String>) -> Option<Self> {
                let v = value.into();
                if v.is_empty() { None } else { Some(Self(v)) }
            }

            /// Returns the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }
    };
}

// ---------------------------------------------------------------------------
// Resource names (configuration)
// ---------------------------------------------------------------------------

string_id! {
    /// Name of the SNS topic push events are published to (e.g. `"r10k-webhook-staging"`).
    TopicName
}

string_id! {
    /// Name of the per-host SQS queue subscribed to the topic.
    ///
    /// By convention one queue exists per deploying host, so every host
    /// receives every push event.
    QueueName
}

// ---------------------------------------------------------------------------
// Resource addresses (assigned by AWS)
// ---------------------------------------------------------------------------

string_id! {
    /// The queue's URL as returned by `CreateQueue`; every SQS call is addressed by it.
    QueueUrl
}

string_id! {
    /// Amazon Resource Name of the SQS queue
    /// (e.g. `"arn:aws:sqs:us-east-1:123456789012:r10k-webhook-staging-puppet01"`).
    QueueArn
}

string_id! {
    /// Amazon Resource Name of the SNS topic.
    ///
    /// Derived from the [`QueueArn`] by [`crate::arn::topic_arn_for_queue`]
    /// rather than looked up, so no list-topics permission is needed.
    TopicArn
}

// ---------------------------------------------------------------------------
// Message handles
// ---------------------------------------------------------------------------

string_id! {
    /// Identifier assigned to a message by the topic (on publish) or the
    /// queue (on receive).
    MessageId
}

string_id! {
    /// Opaque token returned with a received message; required to delete it.
    ///
    /// Receipt handles change on every delivery, so a redelivered message has
    /// a different handle to the one seen on the previous attempt.
    ReceiptHandle
}
