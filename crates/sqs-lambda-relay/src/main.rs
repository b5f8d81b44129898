//! Relay binary entry point.
//!
//! Usage: sqs-lambda-relay --config <mappings.json> [--region <region>]
//!
//! The config file holds either a JSON array of mappings or an object with a
//! `mappings` array. Each mapping needs at least `queueUrl` and
//! `functionName`.

use anyhow::Context;
use clap::Parser;
use observability::LogFormat;
use sqs_lambda_relay::aws::{load_sdk_config, LambdaInvoker, SqsQueue};
use sqs_lambda_relay::{load_descriptors, validate_mappings, Relay};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

/// Drain SQS queues into asynchronous Lambda invocations.
#[derive(Parser, Debug)]
#[command(name = "sqs-lambda-relay")]
#[command(about = "Drain SQS queues into asynchronous Lambda invocations")]
struct Args {
    /// Path to the JSON mapping file.
    #[arg(long, env = "RELAY_CONFIG")]
    config: PathBuf,

    /// AWS region. Falls back to the SDK's default resolution.
    #[arg(long, env = "AWS_REGION")]
    region: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log output format (compact, json)
    #[arg(long, default_value = "compact")]
    log_format: LogFormat,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    observability::init_with_config(observability::LogConfig {
        service_name: "sqs-lambda-relay".into(),
        default_level: args.log_level.clone(),
        format: args.log_format,
    });

    info!("Relay starting...");

    let descriptors = load_descriptors(&args.config)
        .with_context(|| format!("failed to load mappings from {}", args.config.display()))?;

    // Fail before touching AWS if the file is unusable.
    validate_mappings(&descriptors)?;

    let sdk_config = load_sdk_config(args.region).await;
    let relay = Relay::new(
        Arc::new(SqsQueue::new(&sdk_config)),
        Arc::new(LambdaInvoker::new(&sdk_config)),
    );

    info!(
        config = %args.config.display(),
        mappings = descriptors.len(),
        "Configuration loaded"
    );

    let ctrl_c = tokio::signal::ctrl_c();

    tokio::select! {
        result = relay.run(&descriptors) => {
            match result {
                Ok(report) => info!(
                    received = report.received(),
                    succeeded = report.succeeded(),
                    failed = report.failed(),
                    "All mappings finished"
                ),
                Err(e) => {
                    error!(error = %e, "Relay exited with error");
                    return Err(e.into());
                }
            }
        }
        _ = ctrl_c => {
            info!("Received shutdown signal, exiting...");
        }
    }

    Ok(())
}
