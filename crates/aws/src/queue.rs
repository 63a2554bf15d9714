use async_trait::async_trait;
use aws_sdk_sqs::error::DisplayErrorContext;
use aws_sdk_sqs::types::Message;
use aws_sdk_sqs::Client;
use relay::{MessageId, MessageQueue, QueueError, QueueMessage, QueueUrl, ReceiptHandle};
use tracing::{debug, instrument};

use crate::LONG_POLL_SECONDS;

/// The consumer's SQS queue.
///
/// Obtained from [`crate::bootstrap_subscription`], which guarantees the queue
/// exists and is subscribed before the first receive.
#[derive(Debug, Clone)]
pub struct SqsQueue {
    client: Client,
    url: QueueUrl,
}

impl SqsQueue {
    /// Wraps an existing queue.
    pub fn new(client: Client, url: QueueUrl) -> Self {
        Self { client, url }
    }

    /// The queue URL every call is addressed to.
    pub fn url(&self) -> &QueueUrl {
        &self.url
    }
}

#[async_trait]
impl MessageQueue for SqsQueue {
    #[instrument(skip(self), fields(queue = %self.url))]
    async fn receive(&self) -> Result<Option<QueueMessage>, QueueError> {
        let output = self
            .client
            .receive_message()
            .queue_url(self.url.as_str())
            .max_number_of_messages(1)
            .wait_time_seconds(LONG_POLL_SECONDS)
            .send()
            .await
            .map_err(|e| QueueError::Receive(DisplayErrorContext(&e).to_string()))?;

        match output.messages().first() {
            Some(message) => to_queue_message(message).map(Some),
            None => {
                debug!("Long-poll elapsed with no message");
                Ok(None)
            }
        }
    }

    #[instrument(skip(self, receipt), fields(queue = %self.url))]
    async fn acknowledge(&self, receipt: &ReceiptHandle) -> Result<(), QueueError> {
        self.client
            .delete_message()
            .queue_url(self.url.as_str())
            .receipt_handle(receipt.as_str())
            .send()
            .await
            .map_err(|e| QueueError::Acknowledge(DisplayErrorContext(&e).to_string()))?;
        Ok(())
    }
}

/// Converts an SDK message into the relay's envelope.
///
/// An empty body is kept (it fails decoding later and is left for
/// redelivery); a missing id or receipt handle is an error because the
/// message could never be acknowledged.
fn to_queue_message(message: &Message) -> Result<QueueMessage, QueueError> {
    let id = message
        .message_id()
        .and_then(MessageId::new)
        .ok_or(QueueError::IncompleteMessage("message id"))?;
    let receipt_handle = message
        .receipt_handle()
        .and_then(ReceiptHandle::new)
        .ok_or(QueueError::IncompleteMessage("receipt handle"))?;

    Ok(QueueMessage {
        id,
        body: message.body().unwrap_or_default().to_string(),
        receipt_handle,
    })
}

#[cfg(test)]
mod tests {
    use aws_sdk_sqs::operation::delete_message::DeleteMessageOutput;
    use aws_sdk_sqs::operation::receive_message::ReceiveMessageOutput;
    use aws_smithy_mocks::{mock, mock_client, RuleMode};

    use super::*;

    const QUEUE_URL: &str = "https://sqs.us-east-1.amazonaws.com/123456789012/r10k-webhook-staging-puppet01";

    fn queue_url() -> QueueUrl {
        QueueUrl::new(QUEUE_URL).expect("non-empty")
    }

    #[tokio::test]
    async fn receive_long_polls_for_one_message() {
        let receive = mock!(Client::receive_message)
            .match_requests(|req| {
                req.queue_url() == Some(QUEUE_URL)
                    && req.max_number_of_messages() == Some(1)
                    && req.wait_time_seconds() == Some(LONG_POLL_SECONDS)
            })
            .then_output(|| {
                ReceiveMessageOutput::builder()
                    .messages(
                        Message::builder()
                            .message_id("m-1")
                            .receipt_handle("rh-1")
                            .body("{}")
                            .build(),
                    )
                    .build()
            });
        let queue = SqsQueue::new(mock_client!(aws_sdk_sqs, RuleMode::MatchAny, [&receive]), queue_url());

        let message = queue.receive().await.expect("receive").expect("a message");

        assert_eq!(message.id.as_str(), "m-1");
        assert_eq!(message.receipt_handle.as_str(), "rh-1");
        assert_eq!(receive.num_calls(), 1);
    }

    #[tokio::test]
    async fn empty_long_poll_is_not_an_error() {
        let receive = mock!(Client::receive_message)
            .then_output(|| ReceiveMessageOutput::builder().build());
        let queue = SqsQueue::new(mock_client!(aws_sdk_sqs, RuleMode::MatchAny, [&receive]), queue_url());

        assert!(queue.receive().await.expect("receive").is_none());
    }

    #[tokio::test]
    async fn acknowledge_deletes_by_receipt_handle() {
        let delete = mock!(Client::delete_message)
            .match_requests(|req| req.queue_url() == Some(QUEUE_URL) && req.receipt_handle() == Some("rh-1"))
            .then_output(|| DeleteMessageOutput::builder().build());
        let queue = SqsQueue::new(mock_client!(aws_sdk_sqs, RuleMode::MatchAny, [&delete]), queue_url());

        queue
            .acknowledge(&ReceiptHandle::new("rh-1").expect("non-empty"))
            .await
            .expect("acknowledge");
        assert_eq!(delete.num_calls(), 1);
    }

    #[test]
    fn sdk_message_maps_to_envelope() {
        let message = Message::builder()
            .message_id("b6ff8b7d-1a3c-4c1f-9c43-0c4f4a7c2f10")
            .receipt_handle("AQEB-handle")
            .body(r#"{"Message":"{}"}"#)
            .build();

        let envelope = to_queue_message(&message).expect("complete message");
        assert_eq!(envelope.id.as_str(), "b6ff8b7d-1a3c-4c1f-9c43-0c4f4a7c2f10");
        assert_eq!(envelope.receipt_handle.as_str(), "AQEB-handle");
        assert_eq!(envelope.body, r#"{"Message":"{}"}"#);
    }

    #[test]
    fn missing_body_becomes_empty() {
        let message = Message::builder().message_id("id").receipt_handle("rh").build();
        assert_eq!(to_queue_message(&message).expect("complete").body, "");
    }

    #[test]
    fn missing_receipt_handle_is_rejected() {
        let message = Message::builder().message_id("id").body("{}").build();
        assert!(matches!(
            to_queue_message(&message),
            Err(QueueError::IncompleteMessage("receipt handle"))
        ));
    }
}
