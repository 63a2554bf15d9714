use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_sns::error::DisplayErrorContext;
use aws_sdk_sns::Client;
use relay::{EventPublisher, MessageId, PublishError, PushEvent, TopicName};
use tracing::{debug, instrument};

/// Publishes push events to an SNS topic.
///
/// `CreateTopic` is idempotent and returns the ARN of an existing topic, so
/// it doubles as the name-to-ARN lookup and no list permission is needed. It
/// is called on every publish; the receiver is short-lived (one Lambda
/// invocation per delivery) and pushes are infrequent.
#[derive(Debug, Clone)]
pub struct SnsPublisher {
    client: Client,
    topic: TopicName,
}

impl SnsPublisher {
    /// Creates a publisher for `topic` using the shared SDK configuration.
    pub fn new(sdk_config: &SdkConfig, topic: TopicName) -> Self {
        Self {
            client: Client::new(sdk_config),
            topic,
        }
    }

    /// Creates a publisher from an already-configured client.
    pub fn from_client(client: Client, topic: TopicName) -> Self {
        Self { client, topic }
    }
}

#[async_trait]
impl EventPublisher for SnsPublisher {
    #[instrument(skip(self, event), fields(topic = %self.topic, repo = %event.repo_name))]
    async fn publish(&self, event: &PushEvent) -> Result<MessageId, PublishError> {
        let body = event.to_message()?;

        let created = self
            .client
            .create_topic()
            .name(self.topic.as_str())
            .send()
            .await
            .map_err(|e| PublishError::Provisioning {
                topic: self.topic.to_string(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        let topic_arn = created
            .topic_arn()
            .ok_or_else(|| PublishError::Provisioning {
                topic: self.topic.to_string(),
                message: "CreateTopic returned no topic ARN".to_string(),
            })?
            .to_string();
        debug!(topic_arn = %topic_arn, "Resolved topic");

        let published = self
            .client
            .publish()
            .topic_arn(&topic_arn)
            .message(body)
            .send()
            .await
            .map_err(|e| PublishError::Delivery {
                topic: topic_arn.clone(),
                message: DisplayErrorContext(&e).to_string(),
            })?;

        published
            .message_id()
            .and_then(MessageId::new)
            .ok_or_else(|| PublishError::Delivery {
                topic: topic_arn,
                message: "Publish returned no message id".to_string(),
            })
    }
}
