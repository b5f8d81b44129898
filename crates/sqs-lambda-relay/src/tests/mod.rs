//! Integration tests for the relay.
//!
//! - `harness.rs`    - Mock queue, mock Lambda and observer recorder
//! - `validation.rs` - I. Startup Validation (Rules 1-4)
//! - `runs.rs`       - II. Run Limits & Fan-Out (Rules 5-10)
//! - `ack.rs`        - III. Acknowledgment (Rules 11-15)
//! - `formatter.rs`  - IV. Payload Formatting (Rules 16-19)
//! - `isolation.rs`  - V. Failure Isolation (Rules 20-23)
//! - `observer.rs`   - VI. Completion Observer (Rules 24-28)

mod isolation;
