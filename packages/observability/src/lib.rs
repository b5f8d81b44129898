//! # Observability
//!
//! Logging bootstrap shared by the relay binaries.
//!
//! Services are **log producers**. They call `observability::init()` once at
//! startup and use standard `tracing` macros everywhere else. Where the lines
//! end up (a terminal, a log collector reading stdout) is decided here.
//!
//! ## Usage
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init("sqs-lambda-relay");
//!
//!     tracing::info!("service started");
//! }
//! ```
//!
//! Or with configuration:
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init_with_config(observability::LogConfig {
//!         service_name: "sqs-lambda-relay".into(),
//!         default_level: "debug".into(),
//!         format: observability::LogFormat::Json,
//!     });
//! }
//! ```

use std::str::FromStr;

/// Output encoding for log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// Single-line human readable output.
    #[default]
    Compact,
    /// One JSON object per line, for log collectors.
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "compact" | "text" => Ok(Self::Compact),
            "json" | "jsonl" => Ok(Self::Json),
            other => Err(format!("unknown log format: {other}")),
        }
    }
}

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service (e.g., "sqs-lambda-relay").
    /// Logged once when the subscriber is installed.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Output encoding.
    pub format: LogFormat,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            format: LogFormat::Compact,
        }
    }
}

/// Initialize the observability layer with default settings.
///
/// ```rust,ignore
/// fn main() {
///     observability::init("my-service");
///     tracing::info!("ready");
/// }
/// ```
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize the observability layer with custom configuration.
///
/// Calling this more than once is harmless: the second global subscriber
/// install fails and is ignored.
pub fn init_with_config(config: LogConfig) {
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = env_filter(&config.default_level);

    let result = match config.format {
        LogFormat::Compact => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .compact()
            .finish()
            .try_init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(true)
            .json()
            .flatten_event(true)
            .with_current_span(true)
            .finish()
            .try_init(),
    };

    if result.is_ok() {
        tracing::debug!(service = %config.service_name, "logging initialized");
    }
}

/// Build the level filter, preferring `RUST_LOG` when it is set and valid.
fn env_filter(default_level: &str) -> tracing_subscriber::EnvFilter {
    tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level))
}

/// Re-export tracing macros for convenience.
/// Services can use `observability::info!()` or `tracing::info!()`.
pub use tracing::{debug, error, info, instrument, trace, warn};

/// Re-export Level for advanced filtering.
pub use tracing::Level;
