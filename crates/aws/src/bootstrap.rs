use aws_config::SdkConfig;
use aws_sdk_sqs::types::QueueAttributeName;
use relay::{queue_access_policy, topic_arn_for_queue, QueueArn, QueueUrl, RelayConfig, TopicArn};
use tracing::{info, instrument};

use crate::{AwsError, SqsQueue};

/// Long-poll wait for every receive, in seconds (the SQS maximum).
pub const LONG_POLL_SECONDS: i32 = 20;

/// How long a received message stays hidden from other receivers, in seconds.
///
/// Must exceed the longest r10k run, otherwise a message still being deployed
/// is handed out again.
pub const VISIBILITY_TIMEOUT_SECONDS: i32 = 1800;

/// The provisioned queue and the addresses it was wired up with.
#[derive(Debug, Clone)]
pub struct Subscription {
    /// Queue handle for the dispatch loop.
    pub queue: SqsQueue,
    /// ARN of the queue.
    pub queue_arn: QueueArn,
    /// ARN of the topic the queue is subscribed to.
    pub topic_arn: TopicArn,
}

/// Ensures the consumer's queue exists, subscribes it to the topic, and
/// restricts delivery to that topic.
///
/// Steps, each fatal on failure:
///
/// 1. `CreateQueue` with a 20s receive wait and 1800s visibility timeout
///    (returns the existing queue if attributes match);
/// 2. `GetQueueAttributes` for the queue ARN, from which the topic ARN is
///    derived;
/// 3. `Subscribe` the queue to the topic;
/// 4. `SetQueueAttributes` with a policy allowing only the topic to send.
///
/// No partial-state recovery is attempted; every step is idempotent, so a
/// restarted process simply runs them again.
pub async fn bootstrap_subscription(
    sdk_config: &SdkConfig,
    config: &RelayConfig,
) -> Result<Subscription, AwsError> {
    bootstrap_with_clients(
        aws_sdk_sqs::Client::new(sdk_config),
        aws_sdk_sns::Client::new(sdk_config),
        config,
    )
    .await
}

/// [`bootstrap_subscription`] over already-configured clients.
#[instrument(skip_all, fields(topic = %config.topic))]
pub async fn bootstrap_with_clients(
    sqs: aws_sdk_sqs::Client,
    sns: aws_sdk_sns::Client,
    config: &RelayConfig,
) -> Result<Subscription, AwsError> {
    let queue_name = config.require_queue()?;
    info!(queue = %queue_name, "Ensuring queue exists");

    let created = sqs
        .create_queue()
        .queue_name(queue_name.as_str())
        .attributes(QueueAttributeName::ReceiveMessageWaitTimeSeconds, LONG_POLL_SECONDS.to_string())
        .attributes(QueueAttributeName::VisibilityTimeout, VISIBILITY_TIMEOUT_SECONDS.to_string())
        .send()
        .await
        .map_err(|e| sqs_error("CreateQueue", &e))?;
    let queue_url = created
        .queue_url()
        .and_then(QueueUrl::new)
        .ok_or(AwsError::MissingField {
            operation: "CreateQueue",
            field: "QueueUrl",
        })?;
    info!(queue_url = %queue_url, "Queue ready");

    let attributes = sqs
        .get_queue_attributes()
        .queue_url(queue_url.as_str())
        .attribute_names(QueueAttributeName::QueueArn)
        .send()
        .await
        .map_err(|e| sqs_error("GetQueueAttributes", &e))?;
    let queue_arn = attributes
        .attributes()
        .and_then(|attrs| attrs.get(&QueueAttributeName::QueueArn))
        .and_then(QueueArn::new)
        .ok_or(AwsError::MissingField {
            operation: "GetQueueAttributes",
            field: "QueueArn",
        })?;

    let topic_arn = topic_arn_for_queue(&queue_arn, &config.topic)?;
    info!(queue_arn = %queue_arn, topic_arn = %topic_arn, "Subscribing queue to topic");

    let subscribed = sns
        .subscribe()
        .topic_arn(topic_arn.as_str())
        .protocol("sqs")
        .endpoint(queue_arn.as_str())
        .send()
        .await
        .map_err(|e| AwsError::Sns {
            operation: "Subscribe",
            message: aws_sdk_sns::error::DisplayErrorContext(&e).to_string(),
        })?;
    info!(
        subscription_arn = subscribed.subscription_arn().unwrap_or("pending confirmation"),
        "Subscription active"
    );

    info!("Attaching queue policy allowing delivery from the topic");
    sqs.set_queue_attributes()
        .queue_url(queue_url.as_str())
        .attributes(QueueAttributeName::Policy, queue_access_policy(&queue_arn, &topic_arn))
        .send()
        .await
        .map_err(|e| sqs_error("SetQueueAttributes", &e))?;

    Ok(Subscription {
        queue: SqsQueue::new(sqs, queue_url),
        queue_arn,
        topic_arn,
    })
}

fn sqs_error<E>(operation: &'static str, err: &E) -> AwsError
where
    E: std::error::Error,
{
    AwsError::Sqs {
        operation,
        message: aws_sdk_sqs::error::DisplayErrorContext(err).to_string(),
    }
}
