//! Topic ARN derivation and the queue access policy.
//!
//! The consumer never looks its topic up: that would need permission to list
//! every topic in the account. Instead the topic ARN is computed from the
//! queue ARN, which lives in the same partition, region, and account:
//!
//! ```text
//! arn:aws:sqs:us-east-1:123456789012:r10k-webhook-staging-puppet01
//!         ^^^                        ^^^^^^^^^^^^^^^^^^^^^^^^^^^^^^
//! arn:aws:sns:us-east-1:123456789012:r10k-webhook-staging
//! ```

use std::sync::LazyLock;

use regex::Regex;
use serde_json::json;

use crate::{QueueArn, RelayError, TopicArn, TopicName};

static SERVICE_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":sqs:").expect("service pattern is valid"));

static RESOURCE_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r":[A-Za-z0-9_\-]*$").expect("resource pattern is valid"));

/// Derives the ARN of `topic` from the ARN of the queue subscribed to it.
///
/// Substitutes the `:sqs:` service segment with `:sns:` and replaces the final
/// path component with the topic name.
///
/// # Errors
///
/// [`RelayError::InvalidQueueArn`] if the ARN has no `:sqs:` segment or its
/// final component is not a plain queue name.
pub fn topic_arn_for_queue(queue_arn: &QueueArn, topic: &TopicName) -> Result<TopicArn, RelayError> {
    let arn = queue_arn.as_str();
    if !SERVICE_SEGMENT.is_match(arn) || !RESOURCE_SEGMENT.is_match(arn) {
        return Err(RelayError::InvalidQueueArn(arn.to_string()));
    }

    let swapped = SERVICE_SEGMENT.replace_all(arn, ":sns:");
    let replacement = format!(":{}", topic.as_str());
    let derived = RESOURCE_SEGMENT.replace(&swapped, regex::NoExpand(&replacement));

    TopicArn::new(derived.into_owned()).ok_or_else(|| RelayError::InvalidQueueArn(arn.to_string()))
}

/// Builds the queue policy that lets `topic_arn`, and nothing else, deliver to
/// `queue_arn`.
///
/// The principal is open; the `aws:SourceArn` condition is the only boundary.
pub fn queue_access_policy(queue_arn: &QueueArn, topic_arn: &TopicArn) -> String {
    json!({
        "Version": "2012-10-17",
        "Id": "SNStoSQS",
        "Statement": [
            {
                "Sid": "rule1",
                "Effect": "Allow",
                "Principal": "*",
                "Action": "sqs:*",
                "Resource": queue_arn.as_str(),
                "Condition": {
                    "ArnEquals": { "aws:SourceArn": topic_arn.as_str() }
                }
            }
        ]
    })
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn queue(arn: &str) -> QueueArn {
        QueueArn::new(arn).expect("non-empty")
    }

    fn topic(name: &str) -> TopicName {
        TopicName::new(name).expect("non-empty")
    }

    #[test]
    fn service_and_resource_segments_are_replaced() {
        let derived = topic_arn_for_queue(
            &queue("arn:aws:sqs:us-east-1:123456789012:r10k-webhook-staging-puppet01"),
            &topic("r10k-webhook-staging"),
        )
        .expect("derive");

        assert_eq!(derived.as_str(), "arn:aws:sns:us-east-1:123456789012:r10k-webhook-staging");
    }

    #[test]
    fn partition_and_region_are_preserved() {
        let derived = topic_arn_for_queue(
            &queue("arn:aws-cn:sqs:cn-north-1:000000000000:deploys"),
            &topic("pushes"),
        )
        .expect("derive");

        assert_eq!(derived.as_str(), "arn:aws-cn:sns:cn-north-1:000000000000:pushes");
    }

    #[test]
    fn topic_name_is_inserted_literally() {
        // `$` must not be read as a capture-group reference.
        let derived =
            topic_arn_for_queue(&queue("arn:aws:sqs:eu-west-1:1:q"), &topic("t$1")).expect("derive");
        assert_eq!(derived.as_str(), "arn:aws:sns:eu-west-1:1:t$1");
    }

    #[test]
    fn underscore_queue_names_are_accepted() {
        let derived = topic_arn_for_queue(
            &queue("arn:aws:sqs:us-east-1:123456789012:r10k-webhook-staging-puppet_01"),
            &topic("r10k-webhook-staging"),
        )
        .expect("derive");

        assert_eq!(derived.as_str(), "arn:aws:sns:us-east-1:123456789012:r10k-webhook-staging");
    }

    #[test]
    fn default_queue_for_underscore_hostname_resolves_a_topic() {
        let config =
            crate::RelayConfig::from_lookup(|_| None, "puppet_01").expect("config");
        let queue_name = config.require_queue().expect("queue");
        let queue_arn = queue(&format!("arn:aws:sqs:us-east-1:123456789012:{queue_name}"));

        let derived = topic_arn_for_queue(&queue_arn, &config.topic).expect("derive");
        assert_eq!(derived.as_str(), "arn:aws:sns:us-east-1:123456789012:r10k-webhook-staging");
    }

    #[test]
    fn non_sqs_arns_are_rejected() {
        let err = topic_arn_for_queue(&queue("arn:aws:s3:::bucket"), &topic("t")).unwrap_err();
        assert!(matches!(err, RelayError::InvalidQueueArn(_)));
    }

    #[test]
    fn fifo_queue_suffix_is_rejected() {
        // `.fifo` is outside the resource pattern, so the tail cannot be swapped.
        let err = topic_arn_for_queue(&queue("arn:aws:sqs:us-east-1:1:q.fifo"), &topic("t"))
            .unwrap_err();
        assert!(matches!(err, RelayError::InvalidQueueArn(_)));
    }

    #[test]
    fn policy_only_allows_the_topic() {
        let queue_arn = queue("arn:aws:sqs:us-east-1:1:q");
        let topic_arn = TopicArn::new("arn:aws:sns:us-east-1:1:t").expect("non-empty");
        let policy: serde_json::Value =
            serde_json::from_str(&queue_access_policy(&queue_arn, &topic_arn)).expect("json");

        assert_eq!(policy["Version"], "2012-10-17");
        assert_eq!(policy["Id"], "SNStoSQS");
        let statement = &policy["Statement"][0];
        assert_eq!(statement["Effect"], "Allow");
        assert_eq!(statement["Principal"], "*");
        assert_eq!(statement["Action"], "sqs:*");
        assert_eq!(statement["Resource"], "arn:aws:sqs:us-east-1:1:q");
        assert_eq!(
            statement["Condition"]["ArnEquals"]["aws:SourceArn"],
            "arn:aws:sns:us-east-1:1:t"
        );
        assert_eq!(policy["Statement"].as_array().map(Vec::len), Some(1));
    }
}
