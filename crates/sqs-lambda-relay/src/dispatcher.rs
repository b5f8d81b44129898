//! One message in, one asynchronous invocation out.

use crate::config::Mapping;
use crate::error::{DispatchError, MessageError};
use crate::message::QueueMessage;
use crate::service::InvocationService;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use tracing::{debug, warn};

/// Proof that an invocation was accepted for a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationReceipt {
    /// Function that accepted the invocation.
    pub function_name: String,
    /// Message the invocation was made for.
    pub message_id: String,
    /// Status reported by the invocation service.
    pub status_code: i32,
}

/// Final result of one message, as handed to the completion observer.
pub type Outcome = Result<InvocationReceipt, MessageError>;

/// Invokes the mapping's function for a message.
///
/// Never panics and never touches the queue. Every failure, including a
/// panicking formatter, comes back as a [`DispatchError`].
#[derive(Clone)]
pub struct Dispatcher {
    invoker: Arc<dyn InvocationService>,
}

impl Dispatcher {
    pub fn new(invoker: Arc<dyn InvocationService>) -> Self {
        Self { invoker }
    }

    /// Format the message, serialize it and request the invocation.
    pub async fn dispatch(
        &self,
        mapping: &Mapping,
        message: &QueueMessage,
    ) -> Result<InvocationReceipt, DispatchError> {
        let payload = format_payload(mapping, message)?;

        debug!(
            message_id = %message.message_id,
            function_name = %mapping.function_name,
            payload_len = payload.len(),
            "Invoking function"
        );

        let accepted = self
            .invoker
            .invoke_async(&mapping.function_name, payload)
            .await
            .map_err(|e| {
                warn!(
                    message_id = %message.message_id,
                    function_name = %mapping.function_name,
                    error = %e,
                    "Invocation failed"
                );
                e
            })?;

        Ok(InvocationReceipt {
            function_name: mapping.function_name.clone(),
            message_id: message.message_id.clone(),
            status_code: accepted.status_code,
        })
    }
}

/// Run the mapping's formatter and serialize the result.
fn format_payload(mapping: &Mapping, message: &QueueMessage) -> Result<Vec<u8>, DispatchError> {
    let formatter = &mapping.message_formatter;
    let value = catch_unwind(AssertUnwindSafe(|| formatter(message)))
        .map_err(|panic| DispatchError::Formatter(panic_message(panic.as_ref())))?;
    Ok(serde_json::to_vec(&value)?)
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
