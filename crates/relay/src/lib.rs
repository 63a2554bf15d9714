//! Core domain for the r10k relay.
//!
//! This crate contains the push-event model, the module routing policy, the
//! topic ARN derivation, the shared configuration, and the port traits the
//! infrastructure crates implement. It never talks to AWS or spawns a
//! process itself.
//!
//! ## Architectural Layer
//!
//! **Business logic + port definitions.** This crate has no I/O dependencies.
//! It defines *what* is needed; infrastructure crates define *how* to supply it.
//!
//! ## Module Layout
//!
//! | Module | Contents |
//! |--------|----------|
//! | [`identifiers`] | Newtype resource names and message handles (`TopicName`, `QueueArn`, etc.) |
//! | [`types`] | `PushEvent`, `QueueMessage`, and notification decoding |
//! | [`routing`] | Module-name inference and `DeployPlan` selection |
//! | [`arn`] | Topic ARN derivation and the queue access policy |
//! | [`config`] | `RelayConfig` and its environment defaults |
//! | [`ports`] | `EventPublisher`, `MessageQueue`, `Deployer` |
//! | [`errors`] | Error types for each port |

pub mod arn;
pub mod config;
pub mod errors;
pub mod identifiers;
pub mod ports;
pub mod routing;
pub mod types;

// Re-export everything at the crate root for ergonomic usage by downstream crates.
pub use arn::{queue_access_policy, topic_arn_for_queue};
pub use config::RelayConfig;
pub use errors::{DeployError, PublishError, QueueError, RelayError};
pub use identifiers::{MessageId, QueueArn, QueueName, QueueUrl, ReceiptHandle, TopicArn, TopicName};
pub use ports::{Deployer, EventPublisher, MessageQueue};
pub use routing::{module_candidate, plan_deployment, DeployPlan, ModuleName};
pub use types::{DecodeError, PushEvent, QueueMessage};
