//! Knowledge entries waiting to be mined, and the request parsing shared by
//! every submission surface.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ValidationError;
use crate::types::EntryId;

/// Free-form metadata attached to an entry. Key order is not significant.
pub type Metadata = serde_json::Map<String, Value>;

/// A pending knowledge entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entry {
    pub entry_id: EntryId,
    pub topic: String,
    pub content: String,
    pub metadata: Metadata,
    pub links: Vec<u64>,
}

impl Entry {
    /// Assign a fresh id to a validated draft.
    pub fn from_draft(draft: EntryDraft) -> Self {
        Self {
            entry_id: EntryId::generate(),
            topic: draft.topic,
            content: draft.content,
            metadata: draft.metadata,
            links: draft.links,
        }
    }
}

/// The fields of an entry before it is queued.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntryDraft {
    pub topic: String,
    pub content: String,
    pub metadata: Metadata,
    pub links: Vec<u64>,
}

impl EntryDraft {
    pub fn new(
        topic: impl Into<String>,
        content: impl Into<String>,
        metadata: Metadata,
        links: Vec<u64>,
    ) -> Self {
        Self {
            topic: topic.into(),
            content: content.into(),
            metadata,
            links,
        }
    }

    /// Parse a submission body such as `{"topic", "content", "metadata", "links"}`.
    ///
    /// All four fields are required. `metadata` must be an object and `links`
    /// an array of non-negative integers.
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let object = body.as_object().ok_or(ValidationError::InvalidField {
            field: "body",
            reason: "expected a JSON object".into(),
        })?;

        let field = |name: &'static str| object.get(name).ok_or(ValidationError::MissingField(name));

        let topic = match field("topic")? {
            Value::String(s) => s.clone(),
            other => return Err(wrong_type("topic", "a string", other)),
        };

        let content = match field("content")? {
            Value::String(s) => s.clone(),
            other => return Err(wrong_type("content", "a string", other)),
        };

        let metadata = match field("metadata")? {
            Value::Object(m) => m.clone(),
            other => return Err(wrong_type("metadata", "an object", other)),
        };

        let links = match field("links")? {
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_u64().ok_or_else(|| ValidationError::InvalidField {
                        field: "links",
                        reason: format!("{} is not a block index", item),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            other => return Err(wrong_type("links", "an array", other)),
        };

        Ok(Self {
            topic,
            content,
            metadata,
            links,
        })
    }

    /// Reject a topic that is empty or only whitespace.
    ///
    /// Not part of the default submission checks; see
    /// `LedgerConfig::require_topic`.
    pub fn require_topic(&self) -> Result<(), ValidationError> {
        if self.topic.trim().is_empty() {
            return Err(ValidationError::BlankTopic);
        }
        Ok(())
    }
}

fn wrong_type(field: &'static str, expected: &str, got: &Value) -> ValidationError {
    let kind = match got {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    };
    ValidationError::InvalidField {
        field,
        reason: format!("expected {}, got {}", expected, kind),
    }
}

/// Parse metadata typed into a text field.
///
/// Blank input yields empty metadata.
pub fn parse_metadata(text: &str) -> Result<Metadata, ValidationError> {
    if text.trim().is_empty() {
        return Ok(Metadata::new());
    }
    match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(m)) => Ok(m),
        Ok(other) => Err(wrong_type("metadata", "an object", &other)),
        Err(e) => Err(ValidationError::InvalidField {
            field: "metadata",
            reason: e.to_string(),
        }),
    }
}

/// Parse a comma-separated list of block indices.
///
/// Items that are not plain non-negative integers are skipped.
pub fn parse_link_list(text: &str) -> Vec<u64> {
    text.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty() && item.bytes().all(|b| b.is_ascii_digit()))
        .filter_map(|item| item.parse().ok())
        .collect()
}
