//! Deletes handled messages from their queue.

use crate::error::QueueError;
use crate::message::QueueMessage;
use crate::service::QueueService;
use std::sync::Arc;
use tracing::{debug, warn};

/// Removes a message from its originating queue so it is not redelivered.
#[derive(Clone)]
pub struct Acknowledger {
    queue: Arc<dyn QueueService>,
}

impl Acknowledger {
    pub fn new(queue: Arc<dyn QueueService>) -> Self {
        Self { queue }
    }

    /// Delete `message` using its receipt handle.
    pub async fn acknowledge(&self, message: &QueueMessage) -> Result<(), QueueError> {
        if message.receipt_handle.is_empty() {
            return Err(QueueError::MissingReceiptHandle {
                message_id: message.message_id.clone(),
            });
        }

        match self
            .queue
            .delete_message(&message.queue_url, &message.receipt_handle)
            .await
        {
            Ok(()) => {
                debug!(
                    message_id = %message.message_id,
                    queue_url = %message.queue_url,
                    "Message deleted"
                );
                Ok(())
            }
            Err(e) => {
                warn!(
                    message_id = %message.message_id,
                    queue_url = %message.queue_url,
                    error = %e,
                    "Failed to delete message"
                );
                Err(e)
            }
        }
    }
}
