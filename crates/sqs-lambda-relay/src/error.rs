//! Error types for the relay.
//!
//! Only [`ConfigurationError`] ever terminates [`crate::Relay::run`]. Every
//! other error here is contained within the settlement of the message that
//! produced it and handed to that mapping's completion observer.

use crate::dispatcher::InvocationReceipt;
use thiserror::Error;

/// Startup validation failure. Raised before any queue or invocation call.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "{reason}: mapping must be a non-empty list of mappings like \
     {{queueUrl: ..., functionName: ...}}, got {input}"
)]
pub struct ConfigurationError {
    /// Which rule the input broke.
    pub reason: String,
    /// The full offending input, rendered as JSON.
    pub input: String,
}

/// Failure reported by a queue service adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Receiving messages failed.
    #[error("receive from {queue_url} failed: {reason}")]
    Receive { queue_url: String, reason: String },

    /// Deleting a message failed.
    #[error("delete from {queue_url} failed: {reason}")]
    Delete { queue_url: String, reason: String },

    /// The message carries no handle to delete it with.
    #[error("message {message_id} has no receipt handle")]
    MissingReceiptHandle { message_id: String },
}

/// Failure reported by an invocation service adapter.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvocationError {
    /// The service answered but did not accept the invocation.
    #[error("invocation of {function_name} rejected with status {status_code}")]
    Rejected {
        function_name: String,
        status_code: i32,
    },

    /// The request never got a usable answer.
    #[error("invocation of {function_name} failed: {reason}")]
    Transport {
        function_name: String,
        reason: String,
    },
}

/// Failure of a single dispatch, caught at the dispatcher boundary.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// The message formatter panicked.
    #[error("message formatter panicked: {0}")]
    Formatter(String),

    /// The formatted payload could not be serialized.
    #[error("payload serialization failed: {0}")]
    Payload(#[from] serde_json::Error),

    /// The invocation service refused or failed the call.
    #[error(transparent)]
    Invocation(#[from] InvocationError),
}

/// Failure outcome of one message, as seen by the completion observer.
#[derive(Error, Debug)]
pub enum MessageError {
    /// The invocation itself failed.
    #[error("dispatch failed: {0}")]
    Dispatch(#[from] DispatchError),

    /// The invocation was accepted but the message could not be deleted.
    #[error("invocation of {} accepted but acknowledgment failed: {source}", .receipt.function_name)]
    Acknowledge {
        receipt: InvocationReceipt,
        #[source]
        source: QueueError,
    },
}

impl MessageError {
    /// The invocation receipt, if the invocation was accepted before failing.
    pub fn receipt(&self) -> Option<&InvocationReceipt> {
        match self {
            Self::Dispatch(_) => None,
            Self::Acknowledge { receipt, .. } => Some(receipt),
        }
    }
}

/// Top-level error for the binary and config loading.
#[derive(Error, Debug)]
pub enum RelayError {
    /// Mapping validation error
    #[error(transparent)]
    Config(#[from] ConfigurationError),

    /// IO error (config file)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file is not valid JSON for a mapping list
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for relay operations.
pub type RelayResult<T> = Result<T, RelayError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_error_message_carries_input() {
        let err = ConfigurationError {
            reason: "mapping list is empty".to_string(),
            input: "[]".to_string(),
        };
        let text = err.to_string();
        assert!(text.contains("must be a non-empty list of mappings"));
        assert!(text.ends_with("got []"));
    }

    #[test]
    fn test_acknowledge_error_exposes_receipt() {
        let err = MessageError::Acknowledge {
            receipt: InvocationReceipt {
                function_name: "worker".to_string(),
                message_id: "m-1".to_string(),
                status_code: 202,
            },
            source: QueueError::Delete {
                queue_url: "q".to_string(),
                reason: "throttled".to_string(),
            },
        };
        assert_eq!(err.receipt().map(|r| r.status_code), Some(202));
        assert!(err.to_string().contains("worker"));

        let dispatch = MessageError::from(DispatchError::Formatter("boom".to_string()));
        assert!(dispatch.receipt().is_none());
    }
}
