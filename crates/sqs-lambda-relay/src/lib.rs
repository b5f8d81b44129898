//! SQS to Lambda relay: drains queues into asynchronous function invocations.
//!
//! For every configured mapping the relay runs a reactor that repeatedly
//! polls a queue, invokes the mapped function once per received message,
//! waits for the whole batch to settle, optionally deletes the messages
//! whose invocation was accepted, and reports each outcome to an observer.
//!
//! # Core Invariants
//!
//! 1. **Validate First**: an invalid mapping aborts startup before any I/O
//! 2. **Fan-Out**: every message in a batch is dispatched before any is awaited
//! 3. **Isolated Failures**: a failed message never affects its siblings or other mappings
//! 4. **Ack After Success**: a message is deleted only if its invocation was accepted
//! 5. **One Notification**: the observer sees each dispatched message exactly once
//!
//! # Architecture
//!
//! ```text
//! Queue --poll--> Reactor --invoke x N--> Function
//!   ^                |
//!   |____ delete ____|  (successes only, when enabled)
//! ```

pub mod acknowledger;
#[cfg(feature = "aws")]
pub mod aws;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod message;
pub mod reactor;
pub mod relay;
pub mod service;
pub mod settle;

#[cfg(test)]
mod tests;

pub use acknowledger::Acknowledger;
pub use config::{
    load_descriptors, parse_descriptors, validate_mappings, CompletionObserver, Mapping,
    MappingDescriptor, MessageFormatter, PayloadFormat, RunLimit,
};
pub use dispatcher::{Dispatcher, InvocationReceipt, Outcome};
pub use error::{
    ConfigurationError, DispatchError, InvocationError, MessageError, QueueError, RelayError,
    RelayResult,
};
pub use message::QueueMessage;
pub use reactor::{Reactor, ReactorReport, ReactorState};
pub use relay::{Relay, RelayReport};
pub use service::{InvocationAccepted, InvocationService, QueueService, ReceiveRequest};
pub use settle::{settle_all, Settlement};
