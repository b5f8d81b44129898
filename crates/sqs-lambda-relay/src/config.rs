//! Mapping configuration.
//!
//! A [`MappingDescriptor`] is what an embedder or a config file supplies.
//! [`validate_mappings`] checks the whole list at once and turns it into
//! fully defaulted [`Mapping`]s; nothing runs unless every entry is valid.

use crate::dispatcher::Outcome;
use crate::error::{ConfigurationError, RelayResult};
use crate::message::QueueMessage;
use crate::service::ReceiveRequest;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// Messages requested per poll when a mapping does not say.
pub const DEFAULT_MAX_NUMBER_OF_MESSAGES: u32 = 5;

/// Long-poll wait when a mapping does not say.
pub const DEFAULT_WAIT_TIME_SECONDS: u32 = 5;

/// Turns a received message into the JSON payload sent to the function.
pub type MessageFormatter = Arc<dyn Fn(&QueueMessage) -> serde_json::Value + Send + Sync>;

/// Notified once per settled message.
pub type CompletionObserver = Arc<dyn Fn(&Outcome) + Send + Sync>;

/// Named formatters available to config files, where closures are not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PayloadFormat {
    /// The whole message object.
    #[default]
    Message,
    /// Only the body, as a JSON string.
    Body,
    /// The body parsed as JSON, or the raw string if it does not parse.
    BodyJson,
}

impl PayloadFormat {
    /// The formatter implementing this format.
    pub fn formatter(self) -> MessageFormatter {
        match self {
            Self::Message => identity_formatter(),
            Self::Body => Arc::new(|msg: &QueueMessage| serde_json::Value::String(msg.body.clone())),
            Self::BodyJson => Arc::new(|msg: &QueueMessage| {
                serde_json::from_str(&msg.body)
                    .unwrap_or_else(|_| serde_json::Value::String(msg.body.clone()))
            }),
        }
    }
}

/// The default formatter: the message unchanged.
pub fn identity_formatter() -> MessageFormatter {
    Arc::new(|msg: &QueueMessage| msg.to_json())
}

/// The default observer: does nothing.
pub fn noop_observer() -> CompletionObserver {
    Arc::new(|_: &Outcome| {})
}

/// How many poll-dispatch-settle iterations a reactor performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunLimit {
    /// Stop after this many iterations. Zero performs none.
    Bounded(u64),
    /// Never stop.
    #[default]
    Unbounded,
}

impl RunLimit {
    /// Whether `completed` iterations exhaust this limit.
    pub fn is_reached(&self, completed: u64) -> bool {
        match self {
            Self::Bounded(limit) => completed >= *limit,
            Self::Unbounded => false,
        }
    }
}

impl From<Option<u64>> for RunLimit {
    fn from(runs: Option<u64>) -> Self {
        runs.map_or(Self::Unbounded, Self::Bounded)
    }
}

/// One queue-to-function mapping as supplied by the caller.
///
/// Every field is optional so that incomplete input can be reported rather
/// than rejected by the type system; [`validate_mappings`] enforces the
/// required ones.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingDescriptor {
    /// Queue to drain. Required.
    #[serde(default, alias = "QueueUrl", skip_serializing_if = "Option::is_none")]
    pub queue_url: Option<String>,

    /// Function to invoke per message. Required.
    #[serde(default, alias = "FunctionName", skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,

    #[serde(
        default,
        alias = "MaxNumberOfMessages",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_number_of_messages: Option<u32>,

    #[serde(default, alias = "WaitTimeSeconds", skip_serializing_if = "Option::is_none")]
    pub wait_time_seconds: Option<u32>,

    #[serde(default, alias = "VisibilityTimeout", skip_serializing_if = "Option::is_none")]
    pub visibility_timeout: Option<u32>,

    /// Iteration limit; absent means run forever.
    #[serde(default, alias = "NumberOfRuns", skip_serializing_if = "Option::is_none")]
    pub number_of_runs: Option<u64>,

    /// Delete each message once its invocation is accepted.
    #[serde(default, alias = "DeleteMessage", skip_serializing_if = "Option::is_none")]
    pub delete_message: Option<bool>,

    /// Named formatter, used when `message_formatter` is not set.
    #[serde(default, alias = "PayloadFormat", skip_serializing_if = "Option::is_none")]
    pub payload_format: Option<PayloadFormat>,

    #[serde(skip)]
    pub message_formatter: Option<MessageFormatter>,

    #[serde(skip)]
    pub on_completion: Option<CompletionObserver>,
}

impl MappingDescriptor {
    /// A descriptor with the two required fields set.
    pub fn new(queue_url: impl Into<String>, function_name: impl Into<String>) -> Self {
        Self {
            queue_url: Some(queue_url.into()),
            function_name: Some(function_name.into()),
            ..Default::default()
        }
    }

    pub fn with_number_of_runs(mut self, runs: u64) -> Self {
        self.number_of_runs = Some(runs);
        self
    }

    pub fn with_delete_message(mut self, delete: bool) -> Self {
        self.delete_message = Some(delete);
        self
    }

    pub fn with_max_number_of_messages(mut self, max: u32) -> Self {
        self.max_number_of_messages = Some(max);
        self
    }

    pub fn with_formatter<F>(mut self, formatter: F) -> Self
    where
        F: Fn(&QueueMessage) -> serde_json::Value + Send + Sync + 'static,
    {
        self.message_formatter = Some(Arc::new(formatter));
        self
    }

    pub fn with_observer<F>(mut self, observer: F) -> Self
    where
        F: Fn(&Outcome) + Send + Sync + 'static,
    {
        self.on_completion = Some(Arc::new(observer));
        self
    }

    /// Why this descriptor is unusable, if it is.
    fn problem(&self) -> Option<&'static str> {
        if is_blank(&self.queue_url) {
            return Some("missing queueUrl");
        }
        if is_blank(&self.function_name) {
            return Some("missing functionName");
        }
        if self.max_number_of_messages == Some(0) {
            return Some("maxNumberOfMessages must be positive");
        }
        None
    }
}

fn is_blank(value: &Option<String>) -> bool {
    value.as_deref().map_or(true, str::is_empty)
}

impl fmt::Debug for MappingDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappingDescriptor")
            .field("queue_url", &self.queue_url)
            .field("function_name", &self.function_name)
            .field("max_number_of_messages", &self.max_number_of_messages)
            .field("wait_time_seconds", &self.wait_time_seconds)
            .field("visibility_timeout", &self.visibility_timeout)
            .field("number_of_runs", &self.number_of_runs)
            .field("delete_message", &self.delete_message)
            .field("payload_format", &self.payload_format)
            .field("message_formatter", &self.message_formatter.is_some())
            .field("on_completion", &self.on_completion.is_some())
            .finish()
    }
}

/// A validated mapping with every default applied.
#[derive(Clone)]
pub struct Mapping {
    pub queue_url: String,
    pub function_name: String,
    pub max_number_of_messages: u32,
    pub wait_time_seconds: u32,
    pub visibility_timeout: Option<u32>,
    pub message_formatter: MessageFormatter,
    pub number_of_runs: RunLimit,
    pub delete_message: bool,
    pub on_completion: CompletionObserver,
}

impl Mapping {
    /// The poll request this mapping issues every iteration.
    pub fn receive_request(&self) -> ReceiveRequest {
        ReceiveRequest {
            queue_url: self.queue_url.clone(),
            max_number_of_messages: self.max_number_of_messages,
            wait_time_seconds: self.wait_time_seconds,
            visibility_timeout: self.visibility_timeout,
        }
    }

    /// Apply defaults to a descriptor that already passed validation.
    fn from_valid(descriptor: &MappingDescriptor) -> Self {
        let message_formatter = descriptor.message_formatter.clone().unwrap_or_else(|| {
            descriptor.payload_format.unwrap_or_default().formatter()
        });

        Self {
            queue_url: descriptor.queue_url.clone().unwrap_or_default(),
            function_name: descriptor.function_name.clone().unwrap_or_default(),
            max_number_of_messages: descriptor
                .max_number_of_messages
                .unwrap_or(DEFAULT_MAX_NUMBER_OF_MESSAGES),
            wait_time_seconds: descriptor
                .wait_time_seconds
                .unwrap_or(DEFAULT_WAIT_TIME_SECONDS),
            visibility_timeout: descriptor.visibility_timeout,
            message_formatter,
            number_of_runs: descriptor.number_of_runs.into(),
            delete_message: descriptor.delete_message.unwrap_or(false),
            on_completion: descriptor.on_completion.clone().unwrap_or_else(noop_observer),
        }
    }
}

impl fmt::Debug for Mapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mapping")
            .field("queue_url", &self.queue_url)
            .field("function_name", &self.function_name)
            .field("max_number_of_messages", &self.max_number_of_messages)
            .field("wait_time_seconds", &self.wait_time_seconds)
            .field("visibility_timeout", &self.visibility_timeout)
            .field("number_of_runs", &self.number_of_runs)
            .field("delete_message", &self.delete_message)
            .finish_non_exhaustive()
    }
}

/// Validate every descriptor and apply defaults.
///
/// Fails on the first problem found, carrying the complete input so the
/// caller can see what was wrong. No mapping is returned unless all pass.
pub fn validate_mappings(
    descriptors: &[MappingDescriptor],
) -> Result<Vec<Mapping>, ConfigurationError> {
    if descriptors.is_empty() {
        return Err(configuration_error("mapping list is empty", descriptors));
    }

    if let Some((index, reason)) = descriptors
        .iter()
        .enumerate()
        .find_map(|(i, d)| d.problem().map(|reason| (i, reason)))
    {
        return Err(configuration_error(
            &format!("mapping {index}: {reason}"),
            descriptors,
        ));
    }

    let mappings: Vec<Mapping> = descriptors.iter().map(Mapping::from_valid).collect();
    debug!(count = mappings.len(), "Validated mappings");
    Ok(mappings)
}

fn configuration_error(reason: &str, descriptors: &[MappingDescriptor]) -> ConfigurationError {
    let input = serde_json::to_string(descriptors).unwrap_or_else(|_| format!("{descriptors:?}"));
    ConfigurationError {
        reason: reason.to_string(),
        input,
    }
}

/// Shapes accepted for a mapping config file.
#[derive(Deserialize)]
#[serde(untagged)]
enum MappingFile {
    List(Vec<MappingDescriptor>),
    Wrapped { mappings: Vec<MappingDescriptor> },
}

/// Parse descriptors from JSON: either an array or `{"mappings": [...]}`.
pub fn parse_descriptors(json: &str) -> RelayResult<Vec<MappingDescriptor>> {
    let descriptors = match serde_json::from_str(json)? {
        MappingFile::List(list) => list,
        MappingFile::Wrapped { mappings } => mappings,
    };
    Ok(descriptors)
}

/// Read and parse a mapping config file.
pub fn load_descriptors(path: &Path) -> RelayResult<Vec<MappingDescriptor>> {
    let contents = std::fs::read_to_string(path)?;
    let descriptors = parse_descriptors(&contents)?;
    debug!(path = %path.display(), count = descriptors.len(), "Loaded mapping file");
    Ok(descriptors)
}
