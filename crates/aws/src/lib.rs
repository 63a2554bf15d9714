//! r10k relay AWS adapter.
//!
//! Implements the messaging ports defined in the [`relay`] crate using the
//! official AWS SDK:
//!
//! - [`SnsPublisher`] implements [`relay::EventPublisher`]: creates the topic
//!   if absent and publishes the push event JSON.
//! - [`SqsQueue`] implements [`relay::MessageQueue`]: long-polls one message
//!   at a time and deletes it on acknowledgement.
//! - [`bootstrap_subscription`] provisions the consumer's queue and subscribes
//!   it to the topic at startup.
//!
//! ## Architectural Layer
//!
//! **Infrastructure.** This crate must not contain domain rules. ARN
//! derivation and the access policy document come from [`relay::arn`]; only
//! the SDK calls live here.
//!
//! ## Credentials
//!
//! Credentials and endpoints are resolved by `aws-config`'s default provider
//! chain (environment, profile, instance metadata). Only the region is taken
//! from [`relay::RelayConfig`].

mod bootstrap;
mod error;
mod publisher;
mod queue;

pub use bootstrap::{
    bootstrap_subscription, bootstrap_with_clients, Subscription, LONG_POLL_SECONDS,
    VISIBILITY_TIMEOUT_SECONDS,
};
pub use error::AwsError;
pub use publisher::SnsPublisher;
pub use queue::SqsQueue;

use aws_config::{BehaviorVersion, Region, SdkConfig};

/// Loads the shared SDK configuration for `region`.
pub async fn load_sdk_config(region: &str) -> SdkConfig {
    aws_config::defaults(BehaviorVersion::latest())
        .region(Region::new(region.to_string()))
        .load()
        .await
}
