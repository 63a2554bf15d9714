use thiserror::Error;

/// Failures while provisioning the queue subscription.
///
/// Every variant is fatal to consumer startup.
#[derive(Debug, Error)]
pub enum AwsError {
    /// An SQS API call failed.
    #[error("SQS {operation} failed: {message}")]
    Sqs {
        /// API operation name, e.g. `"CreateQueue"`.
        operation: &'static str,
        /// Error description including the SDK's source chain.
        message: String,
    },

    /// An SNS API call failed.
    #[error("SNS {operation} failed: {message}")]
    Sns {
        /// API operation name, e.g. `"Subscribe"`.
        operation: &'static str,
        /// Error description including the SDK's source chain.
        message: String,
    },

    /// A call succeeded but its response lacked a field we depend on.
    #[error("{operation} response is missing {field}")]
    MissingField {
        /// API operation name.
        operation: &'static str,
        /// Name of the absent field.
        field: &'static str,
    },

    /// The queue ARN could not be turned into a topic ARN.
    #[error(transparent)]
    Relay(#[from] relay::RelayError),
}
