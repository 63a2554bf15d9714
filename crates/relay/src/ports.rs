//! Port traits implemented by the infrastructure crates.
//!
//! | Trait | Implemented by | Test double |
//! |-------|----------------|-------------|
//! | [`EventPublisher`] | `aws::SnsPublisher` | in-memory recorder |
//! | [`MessageQueue`] | `aws::SqsQueue` | in-memory queue |
//! | [`Deployer`] | `r10k::R10kDeployer` | recording deployer |
//!
//! All traits are object-safe (`async_trait`) so the composition root can
//! hold them as `Arc<dyn ...>`.

use async_trait::async_trait;

use crate::{DeployError, MessageId, ModuleName, PublishError, PushEvent, QueueError, QueueMessage, ReceiptHandle};

/// Hands normalized push events to the topic.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes `event`, creating the topic first if it does not exist.
    ///
    /// Exactly one attempt is made; the caller sees the first failure.
    async fn publish(&self, event: &PushEvent) -> Result<MessageId, PublishError>;
}

/// The consumer's view of its queue.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Long-polls for at most one message.
    ///
    /// Returns `Ok(None)` when the wait elapses with nothing delivered; that is
    /// a normal empty cycle, not an error.
    async fn receive(&self) -> Result<Option<QueueMessage>, QueueError>;

    /// Deletes a delivery so it is not redelivered.
    async fn acknowledge(&self, receipt: &ReceiptHandle) -> Result<(), QueueError>;
}

/// Runs the deployment tool.
///
/// Fire-and-forget: implementations wait for the tool to exit but do not
/// report whether the deployment succeeded. Only a failure to launch the tool
/// is an error.
#[async_trait]
pub trait Deployer: Send + Sync {
    /// Deploys every environment and all of their modules.
    async fn deploy_all(&self) -> Result<(), DeployError>;

    /// Deploys a single module across all environments.
    async fn deploy_module(&self, module: &ModuleName) -> Result<(), DeployError>;
}
