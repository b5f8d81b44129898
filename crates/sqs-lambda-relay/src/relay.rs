//! Runs one reactor per mapping and waits for all of them.

use crate::config::{validate_mappings, MappingDescriptor};
use crate::error::ConfigurationError;
use crate::reactor::{Reactor, ReactorReport, POLL_ERROR_PAUSE};
use crate::service::{InvocationService, QueueService};
use std::sync::Arc;
use std::time::Duration;
use futures_util::future::join_all;
use tracing::{error, info};

/// Reports of every reactor, in mapping order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RelayReport {
    pub reactors: Vec<ReactorReport>,
}

impl RelayReport {
    /// Messages received across all mappings.
    pub fn received(&self) -> u64 {
        self.reactors.iter().map(|r| r.received).sum()
    }

    /// Successful outcomes across all mappings.
    pub fn succeeded(&self) -> u64 {
        self.reactors.iter().map(|r| r.succeeded).sum()
    }

    /// Failed outcomes across all mappings.
    pub fn failed(&self) -> u64 {
        self.reactors.iter().map(|r| r.failed).sum()
    }
}

/// Bridges queues to functions.
///
/// Holds the queue and invocation capabilities shared by every reactor it
/// starts. Cheap to clone.
#[derive(Clone)]
pub struct Relay {
    queue: Arc<dyn QueueService>,
    invoker: Arc<dyn InvocationService>,
    poll_error_pause: Duration,
}

impl Relay {
    pub fn new(queue: Arc<dyn QueueService>, invoker: Arc<dyn InvocationService>) -> Self {
        Self {
            queue,
            invoker,
            poll_error_pause: POLL_ERROR_PAUSE,
        }
    }

    /// Override the pause every reactor takes after a failed poll.
    pub fn with_poll_error_pause(mut self, pause: Duration) -> Self {
        self.poll_error_pause = pause;
        self
    }

    /// Validate `descriptors`, then drain every mapping concurrently on the
    /// calling task.
    ///
    /// Returns once every reactor has reached its run limit, which is never
    /// if any mapping is unbounded. A [`ConfigurationError`] is returned
    /// before any queue or invocation call is made; message-level failures
    /// never end the run.
    pub async fn run(
        &self,
        descriptors: &[MappingDescriptor],
    ) -> Result<RelayReport, ConfigurationError> {
        let mappings = validate_mappings(descriptors).map_err(|e| {
            error!(error = %e, "Invalid mapping configuration");
            e
        })?;

        info!(mappings = mappings.len(), "Starting relay");

        // Reactors share the caller's task and are polled in mapping order.
        // A panicking reactor unwinds through here instead of being dropped.
        let reactors = mappings.into_iter().map(|mapping| {
            Reactor::new(
                Arc::new(mapping),
                self.queue.clone(),
                self.invoker.clone(),
            )
            .with_poll_error_pause(self.poll_error_pause)
            .run()
        });

        let report = RelayReport {
            reactors: join_all(reactors).await,
        };
        info!(
            received = report.received(),
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Relay finished"
        );
        Ok(report)
    }
}
