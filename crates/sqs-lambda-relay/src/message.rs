//! Messages received from a queue.

use serde::Serialize;
use std::collections::BTreeMap;

/// A message read from a queue.
///
/// Serializes with the queue service's own field names (`MessageId`,
/// `ReceiptHandle`, `Body`, ...), which is the shape the default formatter
/// hands to the invoked function.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueueMessage {
    /// Queue the message was received from.
    #[serde(skip)]
    pub queue_url: String,

    /// Queue-assigned message ID.
    pub message_id: String,

    /// Handle used to delete the message after processing.
    pub receipt_handle: String,

    /// MD5 digest of the body, when the queue reports one.
    #[serde(rename = "MD5OfBody", skip_serializing_if = "Option::is_none")]
    pub md5_of_body: Option<String>,

    /// Raw message body.
    pub body: String,

    /// System attributes returned with the message.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl QueueMessage {
    /// Create a message with no digest and no attributes.
    pub fn new(
        queue_url: impl Into<String>,
        message_id: impl Into<String>,
        receipt_handle: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            queue_url: queue_url.into(),
            message_id: message_id.into(),
            receipt_handle: receipt_handle.into(),
            md5_of_body: None,
            body: body.into(),
            attributes: BTreeMap::new(),
        }
    }

    /// The message as a JSON object, without its queue URL.
    pub fn to_json(&self) -> serde_json::Value {
        let mut object = serde_json::Map::new();
        object.insert("MessageId".into(), self.message_id.clone().into());
        object.insert("ReceiptHandle".into(), self.receipt_handle.clone().into());
        if let Some(md5) = &self.md5_of_body {
            object.insert("MD5OfBody".into(), md5.clone().into());
        }
        object.insert("Body".into(), self.body.clone().into());
        if !self.attributes.is_empty() {
            let attributes = self
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
                .collect();
            object.insert("Attributes".into(), serde_json::Value::Object(attributes));
        }
        serde_json::Value::Object(object)
    }
}
