//! Raw CMS documents and rich-text flattening

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A document as returned by the content API
///
/// Only the envelope is typed. The `data` bag keeps whatever shape the
/// document type defines and is read through the field accessors below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawDocument {
    /// CMS-internal identifier
    #[serde(default)]
    pub id: String,

    /// Human-readable unique identifier used in URLs
    #[serde(default)]
    pub uid: Option<String>,

    /// Custom type of the document (e.g. "post")
    #[serde(rename = "type", default)]
    pub document_type: String,

    #[serde(default)]
    pub tags: Vec<String>,

    /// ISO-8601 timestamp of the first publication
    #[serde(default)]
    pub first_publication_date: Option<String>,

    /// ISO-8601 timestamp of the latest publication
    #[serde(default)]
    pub last_publication_date: Option<String>,

    #[serde(default)]
    pub lang: Option<String>,

    /// Typed and rich-text fields
    #[serde(default)]
    pub data: Value,
}

impl RawDocument {
    /// Create an empty document of the given type
    pub fn new(document_type: &str) -> Self {
        Self {
            id: String::new(),
            uid: None,
            document_type: document_type.to_string(),
            tags: Vec::new(),
            first_publication_date: None,
            last_publication_date: None,
            lang: None,
            data: Value::Object(Default::default()),
        }
    }

    /// Raw value of a data field
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.get(name).filter(|v| !v.is_null())
    }

    /// Plain text of a key-text or rich-text field, empty when absent
    pub fn text_field(&self, name: &str) -> String {
        self.field(name).map(plain_text).unwrap_or_default()
    }

    /// URL of an image or link field (`{ "url": ... }`)
    pub fn url_field(&self, name: &str) -> Option<String> {
        self.field(name)
            .and_then(|v| v.get("url"))
            .and_then(Value::as_str)
            .map(str::to_string)
    }
}

/// Plain-text rendering of a text value
///
/// Key-text fields are bare strings. Rich-text fields are arrays of blocks
/// whose `text` runs are joined with a single space. Anything else renders
/// as the empty string.
pub fn plain_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Array(blocks) => blocks
            .iter()
            .filter_map(block_text)
            .collect::<Vec<_>>()
            .join(" "),
        Value::Object(_) => block_text(value).unwrap_or_default().to_string(),
        _ => String::new(),
    }
}

/// One plain string per rich-text block, in document order
pub fn block_texts(value: &Value) -> Vec<String> {
    match value {
        Value::Array(blocks) => blocks
            .iter()
            .map(|block| block_text(block).unwrap_or_default().to_string())
            .collect(),
        Value::Null => Vec::new(),
        other => vec![plain_text(other)],
    }
}

fn block_text(block: &Value) -> Option<&str> {
    match block {
        Value::String(s) => Some(s.as_str()),
        Value::Object(fields) => fields.get("text").and_then(Value::as_str),
        _ => None,
    }
}
