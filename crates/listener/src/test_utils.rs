//! In-memory doubles for the relay's ports, shared by the listener tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use relay::{
    DeployError, Deployer, EventPublisher, MessageId, MessageQueue, ModuleName, PublishError,
    PushEvent, QueueError, QueueMessage, ReceiptHandle,
};

// ─── Payloads ───

/// A trimmed-down GitHub push delivery body.
pub fn push_payload(repo_name: &str, pusher_email: &str) -> serde_json::Value {
    serde_json::json!({
        "ref": "refs/heads/production",
        "before": "0".repeat(40),
        "after": "a".repeat(40),
        "repository": {
            "id": 1296269,
            "name": repo_name,
            "full_name": format!("example/{repo_name}"),
            "url": format!("https://github.com/example/{repo_name}"),
        },
        "pusher": {
            "name": "ops",
            "email": pusher_email,
        },
    })
}

/// Wraps `event` the way SNS does when delivering to SQS.
pub fn notification_body(event: &PushEvent) -> String {
    serde_json::json!({
        "Type": "Notification",
        "MessageId": "95df01b4-ee98-5cb9-9903-4c221d41eb5e",
        "TopicArn": "arn:aws:sns:us-east-1:123456789012:r10k-webhook-staging",
        "Message": event.to_message().expect("serialize push event"),
        "Timestamp": "2016-05-01T00:00:00.000Z",
    })
    .to_string()
}

pub fn push_event(repo_name: &str) -> PushEvent {
    PushEvent {
        repo_name: repo_name.to_string(),
        repo_url: format!("https://github.com/example/{repo_name}"),
        user: "ops@example.com".to_string(),
    }
}

// ─── Publisher ───

#[derive(Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<PushEvent>>,
}

impl RecordingPublisher {
    pub fn published(&self) -> Vec<PushEvent> {
        self.published.lock().expect("lock").clone()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish(&self, event: &PushEvent) -> Result<MessageId, PublishError> {
        let mut published = self.published.lock().expect("lock");
        published.push(event.clone());
        Ok(MessageId::new(format!("msg-{}", published.len())).expect("non-empty"))
    }
}

pub struct FailingPublisher;

#[async_trait]
impl EventPublisher for FailingPublisher {
    async fn publish(&self, _event: &PushEvent) -> Result<MessageId, PublishError> {
        Err(PublishError::Delivery {
            topic: "arn:aws:sns:us-east-1:123456789012:r10k-webhook-staging".to_string(),
            message: "AuthorizationError".to_string(),
        })
    }
}

// ─── Queue ───

/// A queue that returns immediately when empty instead of long-polling.
///
/// Publishing through it (as an [`EventPublisher`]) wraps the event in an SNS
/// envelope, so it stands in for the whole topic → queue path.
#[derive(Default)]
pub struct InMemoryQueue {
    pending: Mutex<VecDeque<QueueMessage>>,
    acknowledged: Mutex<Vec<ReceiptHandle>>,
    failures: Mutex<VecDeque<QueueError>>,
    sent: Mutex<usize>,
}

impl InMemoryQueue {
    pub fn push_body(&self, body: impl Into<String>) -> ReceiptHandle {
        let n = {
            let mut sent = self.sent.lock().expect("lock");
            *sent += 1;
            *sent
        };
        let receipt = ReceiptHandle::new(format!("receipt-{n}")).expect("non-empty");
        self.pending.lock().expect("lock").push_back(QueueMessage {
            id: MessageId::new(format!("message-{n}")).expect("non-empty"),
            body: body.into(),
            receipt_handle: receipt.clone(),
        });
        receipt
    }

    pub fn push_event(&self, event: &PushEvent) -> ReceiptHandle {
        self.push_body(notification_body(event))
    }

    /// Makes the next receive fail with `error`.
    pub fn fail_next_receive(&self, error: QueueError) {
        self.failures.lock().expect("lock").push_back(error);
    }

    pub fn acknowledged(&self) -> Vec<ReceiptHandle> {
        self.acknowledged.lock().expect("lock").clone()
    }

    pub fn pending(&self) -> usize {
        self.pending.lock().expect("lock").len()
    }
}

#[async_trait]
impl MessageQueue for InMemoryQueue {
    async fn receive(&self) -> Result<Option<QueueMessage>, QueueError> {
        if let Some(error) = self.failures.lock().expect("lock").pop_front() {
            return Err(error);
        }
        Ok(self.pending.lock().expect("lock").pop_front())
    }

    async fn acknowledge(&self, receipt: &ReceiptHandle) -> Result<(), QueueError> {
        self.acknowledged.lock().expect("lock").push(receipt.clone());
        Ok(())
    }
}

#[async_trait]
impl EventPublisher for InMemoryQueue {
    async fn publish(&self, event: &PushEvent) -> Result<MessageId, PublishError> {
        let receipt = self.push_event(event);
        Ok(MessageId::new(receipt.as_str()).expect("non-empty"))
    }
}

// ─── Deployer ───

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Deployment {
    All,
    Module(String),
}

#[derive(Default)]
pub struct RecordingDeployer {
    deployments: Mutex<Vec<Deployment>>,
}

impl RecordingDeployer {
    pub fn deployments(&self) -> Vec<Deployment> {
        self.deployments.lock().expect("lock").clone()
    }
}

#[async_trait]
impl Deployer for RecordingDeployer {
    async fn deploy_all(&self) -> Result<(), DeployError> {
        self.deployments.lock().expect("lock").push(Deployment::All);
        Ok(())
    }

    async fn deploy_module(&self, module: &ModuleName) -> Result<(), DeployError> {
        self.deployments
            .lock()
            .expect("lock")
            .push(Deployment::Module(module.as_str().to_string()));
        Ok(())
    }
}

/// A deployer whose tool is never found.
pub struct MissingToolDeployer;

#[async_trait]
impl Deployer for MissingToolDeployer {
    async fn deploy_all(&self) -> Result<(), DeployError> {
        Err(not_found("r10k deploy environment -p --verbose info"))
    }

    async fn deploy_module(&self, module: &ModuleName) -> Result<(), DeployError> {
        Err(not_found(&format!("r10k deploy module {module} --verbose info")))
    }
}

fn not_found(command: &str) -> DeployError {
    DeployError::Spawn {
        command: command.to_string(),
        source: std::io::Error::new(std::io::ErrorKind::NotFound, "No such file or directory"),
    }
}
