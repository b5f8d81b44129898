//! SQS and Lambda adapters for the service traits.

use crate::error::{InvocationError, QueueError};
use crate::message::QueueMessage;
use crate::service::{InvocationAccepted, InvocationService, QueueService, ReceiveRequest};
use async_trait::async_trait;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_lambda::primitives::Blob;
use aws_sdk_lambda::types::InvocationType;
use tracing::{debug, info, warn};

/// Load shared AWS configuration, optionally pinning the region.
pub async fn load_sdk_config(region: Option<String>) -> aws_config::SdkConfig {
    let mut loader = aws_config::defaults(BehaviorVersion::latest());
    if let Some(region) = region {
        loader = loader.region(Region::new(region));
    }
    let config = loader.load().await;
    info!(
        region = %config
            .region()
            .map(ToString::to_string)
            .unwrap_or_else(|| "<unset>".to_string()),
        "Loaded AWS configuration"
    );
    config
}

/// [`QueueService`] backed by Amazon SQS.
#[derive(Clone)]
pub struct SqsQueue {
    client: aws_sdk_sqs::Client,
}

impl SqsQueue {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_sqs::Client::new(config),
        }
    }

    pub fn from_client(client: aws_sdk_sqs::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl QueueService for SqsQueue {
    async fn receive_messages(
        &self,
        request: &ReceiveRequest,
    ) -> Result<Vec<QueueMessage>, QueueError> {
        let output = self
            .client
            .receive_message()
            .queue_url(&request.queue_url)
            .max_number_of_messages(to_i32(request.max_number_of_messages))
            .wait_time_seconds(to_i32(request.wait_time_seconds))
            .set_visibility_timeout(request.visibility_timeout.map(to_i32))
            .send()
            .await
            .map_err(|e| QueueError::Receive {
                queue_url: request.queue_url.clone(),
                reason: aws_sdk_sqs::error::DisplayErrorContext(&e).to_string(),
            })?;

        let messages: Vec<QueueMessage> = output
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|m| convert_message(&request.queue_url, m))
            .collect();

        debug!(
            queue_url = %request.queue_url,
            count = messages.len(),
            "Received messages"
        );
        Ok(messages)
    }

    async fn delete_message(
        &self,
        queue_url: &str,
        receipt_handle: &str,
    ) -> Result<(), QueueError> {
        self.client
            .delete_message()
            .queue_url(queue_url)
            .receipt_handle(receipt_handle)
            .send()
            .await
            .map_err(|e| QueueError::Delete {
                queue_url: queue_url.to_string(),
                reason: aws_sdk_sqs::error::DisplayErrorContext(&e).to_string(),
            })?;
        Ok(())
    }
}

/// Convert an SDK message. Messages without a receipt handle cannot be
/// acknowledged and are dropped.
fn convert_message(queue_url: &str, message: aws_sdk_sqs::types::Message) -> Option<QueueMessage> {
    let message_id = message.message_id.unwrap_or_default();
    let Some(receipt_handle) = message.receipt_handle else {
        warn!(queue_url, message_id = %message_id, "Dropping message without receipt handle");
        return None;
    };

    let attributes = message
        .attributes
        .unwrap_or_default()
        .into_iter()
        .map(|(name, value)| (name.as_str().to_string(), value))
        .collect();

    Some(QueueMessage {
        queue_url: queue_url.to_string(),
        message_id,
        receipt_handle,
        md5_of_body: message.md5_of_body,
        body: message.body.unwrap_or_default(),
        attributes,
    })
}

fn to_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

/// [`InvocationService`] backed by AWS Lambda `Event` invocations.
#[derive(Clone)]
pub struct LambdaInvoker {
    client: aws_sdk_lambda::Client,
}

impl LambdaInvoker {
    pub fn new(config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_lambda::Client::new(config),
        }
    }

    pub fn from_client(client: aws_sdk_lambda::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl InvocationService for LambdaInvoker {
    async fn invoke_async(
        &self,
        function_name: &str,
        payload: Vec<u8>,
    ) -> Result<InvocationAccepted, InvocationError> {
        let output = self
            .client
            .invoke()
            .function_name(function_name)
            .invocation_type(InvocationType::Event)
            .payload(Blob::new(payload))
            .send()
            .await
            .map_err(|e| InvocationError::Transport {
                function_name: function_name.to_string(),
                reason: aws_sdk_lambda::error::DisplayErrorContext(&e).to_string(),
            })?;

        let status_code = output.status_code();
        if !(200..300).contains(&status_code) {
            return Err(InvocationError::Rejected {
                function_name: function_name.to_string(),
                status_code,
            });
        }

        Ok(InvocationAccepted { status_code })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_sqs::types::{Message, MessageSystemAttributeName};

    #[test]
    fn test_convert_message_maps_fields() {
        let message = Message::builder()
            .message_id("m-1")
            .receipt_handle("rh-1")
            .body("hello")
            .md5_of_body("abc")
            .attributes(MessageSystemAttributeName::ApproximateReceiveCount, "3")
            .build();

        let converted = convert_message("https://sqs/q", message).unwrap();

        assert_eq!(converted.queue_url, "https://sqs/q");
        assert_eq!(converted.message_id, "m-1");
        assert_eq!(converted.receipt_handle, "rh-1");
        assert_eq!(converted.body, "hello");
        assert_eq!(converted.md5_of_body.as_deref(), Some("abc"));
        assert_eq!(
            converted.attributes.get("ApproximateReceiveCount").map(String::as_str),
            Some("3")
        );
    }

    #[test]
    fn test_convert_message_without_handle_is_dropped() {
        let message = Message::builder().message_id("m-1").body("hello").build();
        assert!(convert_message("q", message).is_none());
    }

    #[test]
    fn test_to_i32_saturates() {
        assert_eq!(to_i32(10), 10);
        assert_eq!(to_i32(u32::MAX), i32::MAX);
    }
}
