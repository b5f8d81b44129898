//! Capabilities the relay consumes from the outside world.
//!
//! The relay never constructs clients itself. Both services are handed to
//! [`crate::Relay::new`] and shared by every reactor, so implementations
//! must be safe for concurrent use.

use crate::error::{InvocationError, QueueError};
use crate::message::QueueMessage;
use async_trait::async_trait;

/// Parameters for one poll of a queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiveRequest {
    /// Queue to poll.
    pub queue_url: String,
    /// Upper bound on messages returned.
    pub max_number_of_messages: u32,
    /// Long-poll wait. The call must not block longer than this.
    pub wait_time_seconds: u32,
    /// Visibility timeout applied to received messages, if overridden.
    pub visibility_timeout: Option<u32>,
}

/// Acknowledgment returned by the invocation service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvocationAccepted {
    /// Service status code (202 for an accepted asynchronous invocation).
    pub status_code: i32,
}

/// Source of messages.
#[async_trait]
pub trait QueueService: Send + Sync {
    /// Receive up to `max_number_of_messages` messages.
    ///
    /// An empty vector means the wait expired with nothing to deliver.
    async fn receive_messages(
        &self,
        request: &ReceiveRequest,
    ) -> Result<Vec<QueueMessage>, QueueError>;

    /// Delete a message from its queue.
    async fn delete_message(&self, queue_url: &str, receipt_handle: &str)
        -> Result<(), QueueError>;
}

/// Target of invocations.
#[async_trait]
pub trait InvocationService: Send + Sync {
    /// Request an asynchronous invocation.
    ///
    /// Success means the service accepted the request, not that the
    /// function finished.
    async fn invoke_async(
        &self,
        function_name: &str,
        payload: Vec<u8>,
    ) -> Result<InvocationAccepted, InvocationError>;
}
