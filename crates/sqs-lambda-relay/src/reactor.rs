//! The per-mapping poll-dispatch-settle loop.

use crate::acknowledger::Acknowledger;
use crate::config::{Mapping, RunLimit};
use crate::dispatcher::{panic_message, Dispatcher, Outcome};
use crate::error::MessageError;
use crate::message::QueueMessage;
use crate::service::{InvocationService, QueueService};
use crate::settle::{settle_all, Settlement};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, info_span, warn, Instrument};

/// Pause after a failed poll before polling again.
pub const POLL_ERROR_PAUSE: Duration = Duration::from_secs(1);

/// Iteration bookkeeping for one reactor. Only its own loop mutates it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReactorState {
    iteration: u64,
    limit: RunLimit,
}

impl ReactorState {
    pub fn new(limit: RunLimit) -> Self {
        Self {
            iteration: 0,
            limit,
        }
    }

    /// Completed iterations.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    pub fn limit(&self) -> RunLimit {
        self.limit
    }

    /// Whether the run limit has been reached.
    pub fn is_done(&self) -> bool {
        self.limit.is_reached(self.iteration)
    }

    fn advance(&mut self) {
        self.iteration += 1;
    }
}

/// What a reactor did over its lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReactorReport {
    pub queue_url: String,
    pub function_name: String,
    /// Completed iterations, including ones whose poll failed.
    pub iterations: u64,
    /// Messages received across all polls.
    pub received: u64,
    /// Messages whose final outcome was a success.
    pub succeeded: u64,
    /// Messages whose final outcome was a failure.
    pub failed: u64,
    /// Messages deleted from the queue.
    pub acknowledged: u64,
    /// Polls that returned an error.
    pub poll_failures: u64,
}

/// Drains one mapping's queue into its function.
///
/// Each iteration polls once, dispatches every received message at the
/// same time, waits for all of them to settle, deletes the successes when
/// the mapping asks for it, and reports every outcome to the mapping's
/// observer in the order the messages were received.
pub struct Reactor {
    mapping: Arc<Mapping>,
    queue: Arc<dyn QueueService>,
    dispatcher: Dispatcher,
    acknowledger: Acknowledger,
    state: ReactorState,
    poll_error_pause: Duration,
}

impl Reactor {
    pub fn new(
        mapping: Arc<Mapping>,
        queue: Arc<dyn QueueService>,
        invoker: Arc<dyn InvocationService>,
    ) -> Self {
        let state = ReactorState::new(mapping.number_of_runs);
        Self {
            dispatcher: Dispatcher::new(invoker),
            acknowledger: Acknowledger::new(queue.clone()),
            mapping,
            queue,
            state,
            poll_error_pause: POLL_ERROR_PAUSE,
        }
    }

    /// Override the pause taken after a failed poll.
    pub fn with_poll_error_pause(mut self, pause: Duration) -> Self {
        self.poll_error_pause = pause;
        self
    }

    pub fn state(&self) -> &ReactorState {
        &self.state
    }

    /// Loop until the run limit is reached. Never returns for
    /// [`RunLimit::Unbounded`].
    pub async fn run(self) -> ReactorReport {
        let span = info_span!(
            "reactor",
            queue_url = %self.mapping.queue_url,
            function_name = %self.mapping.function_name,
        );
        self.run_loop().instrument(span).await
    }

    async fn run_loop(mut self) -> ReactorReport {
        info!(limit = ?self.state.limit(), "Starting reactor");

        let mut report = ReactorReport {
            queue_url: self.mapping.queue_url.clone(),
            function_name: self.mapping.function_name.clone(),
            ..Default::default()
        };

        while !self.state.is_done() {
            self.run_iteration(&mut report).await;
            self.state.advance();
            report.iterations = self.state.iteration();
        }

        info!(
            iterations = report.iterations,
            received = report.received,
            succeeded = report.succeeded,
            failed = report.failed,
            "Reactor finished"
        );
        report
    }

    /// Poll, dispatch, settle, acknowledge and report one batch.
    async fn run_iteration(&self, report: &mut ReactorReport) {
        let iteration = self.state.iteration();

        let messages = match self
            .queue
            .receive_messages(&self.mapping.receive_request())
            .await
        {
            Ok(messages) => messages,
            Err(e) => {
                warn!(iteration, error = %e, "Poll failed");
                report.poll_failures += 1;
                tokio::time::sleep(self.poll_error_pause).await;
                return;
            }
        };

        report.received += messages.len() as u64;
        if messages.is_empty() {
            debug!(iteration, "No messages available");
            return;
        }

        debug!(iteration, received = messages.len(), "Dispatching batch");
        let outcomes = self.dispatch_and_settle(&messages).await;

        let mut succeeded = 0u64;
        for outcome in &outcomes {
            if outcome.is_ok() {
                succeeded += 1;
            }
            self.notify(outcome);
        }
        let failed = outcomes.len() as u64 - succeeded;

        report.succeeded += succeeded;
        report.failed += failed;
        if self.mapping.delete_message {
            report.acknowledged += succeeded;
        }

        info!(iteration, succeeded, failed, "Batch settled");
    }

    /// Dispatch every message concurrently and wait for all of them.
    ///
    /// Outcomes line up with `messages`. With acknowledgment enabled, a
    /// message's outcome is final only after its delete has settled too.
    async fn dispatch_and_settle(&self, messages: &[QueueMessage]) -> Vec<Outcome> {
        let dispatched = settle_all(
            messages
                .iter()
                .map(|message| self.dispatcher.dispatch(&self.mapping, message)),
        )
        .await;

        if !self.mapping.delete_message {
            return dispatched
                .into_iter()
                .map(|settlement| settlement.into_result().map_err(MessageError::from))
                .collect();
        }

        let acknowledged = settle_all(dispatched.into_iter().zip(messages).map(
            |(settlement, message)| async move {
                let receipt = match settlement {
                    Settlement::Fulfilled(receipt) => receipt,
                    Settlement::Rejected(e) => return Err(MessageError::Dispatch(e)),
                };
                match self.acknowledger.acknowledge(message).await {
                    Ok(()) => Ok(receipt),
                    Err(source) => Err(MessageError::Acknowledge { receipt, source }),
                }
            },
        ))
        .await;

        acknowledged.into_iter().map(Settlement::into_result).collect()
    }

    /// Hand one outcome to the observer. A panicking observer is logged
    /// and otherwise ignored.
    fn notify(&self, outcome: &Outcome) {
        let observer = &self.mapping.on_completion;
        if let Err(panic) = catch_unwind(AssertUnwindSafe(|| observer(outcome))) {
            warn!(
                panic = %panic_message(panic.as_ref()),
                "Completion observer panicked"
            );
        }
    }
}
