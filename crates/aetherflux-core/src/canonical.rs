//! Canonical CBOR encoding for deterministic hashing.
//!
//! This module implements RFC 8949 Core Deterministic Encoding with one
//! fixed choice for floats:
//! - Map keys sorted by encoded byte comparison (nested metadata included)
//! - Integers use smallest valid encoding
//! - Definite lengths only
//! - Floats always encoded as IEEE-754 binary64 (`0xfb`)
//!
//! The same block fields always produce the same bytes regardless of the
//! order metadata keys were inserted in. CBOR items are self-delimiting, so
//! distinct field tuples never share an encoding.

use ciborium::value::Value;
use serde_json::{Map as JsonMap, Number, Value as JsonValue};

use crate::block::Block;
use crate::entry::Metadata;
use crate::error::CoreError;

/// Block field keys.
mod keys {
    pub const INDEX: &str = "index";
    pub const TIMESTAMP: &str = "timestamp";
    pub const TOPIC: &str = "topic";
    pub const CONTENT: &str = "content";
    pub const METADATA: &str = "metadata";
    pub const LINKS: &str = "links";
    pub const PREVIOUS_HASH: &str = "previous_hash";
    pub const NONCE: &str = "nonce";
    pub const HASH: &str = "hash";
}

/// Encode the hashed fields of a block (everything except `hash`).
pub fn canonical_block_bytes(block: &Block) -> Vec<u8> {
    encode_cbor_value_canonical(&Value::Map(block_entries(block)))
}

/// Encode a full block record, `hash` included.
///
/// This is the binary storage form of a block.
pub fn canonical_record_bytes(block: &Block) -> Vec<u8> {
    let mut entries = block_entries(block);
    entries.push((text(keys::HASH), Value::Text(block.hash.clone())));
    encode_cbor_value_canonical(&Value::Map(entries))
}

/// Encode an arbitrary JSON value canonically.
pub fn canonical_value_bytes(value: &JsonValue) -> Vec<u8> {
    encode_cbor_value_canonical(&json_to_cbor(value))
}

/// Canonical bytes of a block split around the nonce value.
///
/// The search loop only re-encodes the nonce instead of the whole block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NonceTemplate {
    prefix: Vec<u8>,
    suffix: Vec<u8>,
}

impl NonceTemplate {
    /// Build the template from a block's current fields.
    pub fn new(block: &Block) -> Self {
        let entries = block_entries(block);
        let sorted = sort_entries(&entries);
        let nonce_key = encode_cbor_value_canonical(&text(keys::NONCE));

        let mut prefix = Vec::new();
        let mut suffix = Vec::new();
        encode_uint(&mut prefix, 5, sorted.len() as u64);

        let mut past_nonce = false;
        for (key_bytes, value) in sorted {
            if past_nonce {
                suffix.extend_from_slice(&key_bytes);
                encode_value_to(&mut suffix, value);
            } else if key_bytes == nonce_key {
                prefix.extend_from_slice(&key_bytes);
                past_nonce = true;
            } else {
                prefix.extend_from_slice(&key_bytes);
                encode_value_to(&mut prefix, value);
            }
        }

        Self { prefix, suffix }
    }

    /// Write the canonical bytes for `nonce` into `buf`, replacing its contents.
    pub fn write_with_nonce(&self, nonce: u64, buf: &mut Vec<u8>) {
        buf.clear();
        buf.extend_from_slice(&self.prefix);
        encode_uint(buf, 0, nonce);
        buf.extend_from_slice(&self.suffix);
    }

    /// Canonical bytes for `nonce`.
    pub fn bytes_with_nonce(&self, nonce: u64) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.prefix.len() + self.suffix.len() + 9);
        self.write_with_nonce(nonce, &mut buf);
        buf
    }
}

/// Decode a block from its canonical record bytes.
///
/// Input that is not byte-for-byte canonical is rejected, which also catches
/// trailing garbage and unknown keys.
pub fn decode_block_record(bytes: &[u8]) -> Result<Block, CoreError> {
    let value: Value =
        ciborium::from_reader(bytes).map_err(|e| CoreError::DecodingError(e.to_string()))?;

    let map = match &value {
        Value::Map(m) => m,
        _ => return Err(CoreError::MalformedRecord("expected map".into())),
    };

    let get = |key: &'static str| -> Result<&Value, CoreError> {
        map.iter()
            .find(|(k, _)| matches!(k, Value::Text(s) if s == key))
            .map(|(_, v)| v)
            .ok_or_else(|| CoreError::MalformedRecord(format!("missing {}", key)))
    };

    let index = as_u64(get(keys::INDEX)?, keys::INDEX)?;

    let timestamp = match get(keys::TIMESTAMP)? {
        Value::Float(f) => *f,
        _ => return Err(CoreError::MalformedRecord("timestamp must be a float".into())),
    };

    let topic = as_text(get(keys::TOPIC)?, keys::TOPIC)?;
    let content = as_text(get(keys::CONTENT)?, keys::CONTENT)?;

    let metadata = match cbor_to_json(get(keys::METADATA)?)? {
        JsonValue::Object(m) => m,
        _ => return Err(CoreError::MalformedRecord("metadata must be a map".into())),
    };

    let links = match get(keys::LINKS)? {
        Value::Array(items) => items
            .iter()
            .map(|item| as_u64(item, keys::LINKS))
            .collect::<Result<Vec<_>, _>>()?,
        _ => return Err(CoreError::MalformedRecord("links must be an array".into())),
    };

    let previous_hash = as_text(get(keys::PREVIOUS_HASH)?, keys::PREVIOUS_HASH)?;
    let nonce = as_u64(get(keys::NONCE)?, keys::NONCE)?;
    let hash = as_text(get(keys::HASH)?, keys::HASH)?;

    let block = Block {
        index,
        timestamp,
        topic,
        content,
        metadata,
        links,
        previous_hash,
        nonce,
        hash,
    };

    if canonical_record_bytes(&block) != bytes {
        return Err(CoreError::NonCanonical);
    }

    Ok(block)
}

/// Build the map entries for all hashed fields of a block.
fn block_entries(block: &Block) -> Vec<(Value, Value)> {
    vec![
        (text(keys::INDEX), Value::Integer(block.index.into())),
        (text(keys::TIMESTAMP), Value::Float(block.timestamp)),
        (text(keys::TOPIC), Value::Text(block.topic.clone())),
        (text(keys::CONTENT), Value::Text(block.content.clone())),
        (text(keys::METADATA), metadata_to_cbor(&block.metadata)),
        (
            text(keys::LINKS),
            Value::Array(block.links.iter().map(|l| Value::Integer((*l).into())).collect()),
        ),
        (text(keys::PREVIOUS_HASH), Value::Text(block.previous_hash.clone())),
        (text(keys::NONCE), Value::Integer(block.nonce.into())),
    ]
}

fn text(s: &str) -> Value {
    Value::Text(s.to_string())
}

fn metadata_to_cbor(metadata: &Metadata) -> Value {
    Value::Map(
        metadata
            .iter()
            .map(|(k, v)| (Value::Text(k.clone()), json_to_cbor(v)))
            .collect(),
    )
}

/// Convert a JSON value to CBOR, keeping the integer/float distinction.
fn json_to_cbor(value: &JsonValue) -> Value {
    match value {
        JsonValue::Null => Value::Null,
        JsonValue::Bool(b) => Value::Bool(*b),
        JsonValue::Number(n) => {
            if let Some(u) = n.as_u64() {
                Value::Integer(u.into())
            } else if let Some(i) = n.as_i64() {
                Value::Integer(i.into())
            } else if let Some(f) = n.as_f64() {
                Value::Float(f)
            } else {
                Value::Text(n.to_string())
            }
        }
        JsonValue::String(s) => Value::Text(s.clone()),
        JsonValue::Array(items) => Value::Array(items.iter().map(json_to_cbor).collect()),
        JsonValue::Object(m) => metadata_to_cbor(m),
    }
}

/// Convert CBOR produced by [`json_to_cbor`] back to JSON.
fn cbor_to_json(value: &Value) -> Result<JsonValue, CoreError> {
    match value {
        Value::Null => Ok(JsonValue::Null),
        Value::Bool(b) => Ok(JsonValue::Bool(*b)),
        Value::Integer(i) => {
            let n: i128 = (*i).into();
            if n >= 0 {
                u64::try_from(n)
                    .map(|u| JsonValue::Number(u.into()))
                    .map_err(|_| CoreError::MalformedRecord(format!("integer out of range: {}", n)))
            } else {
                i64::try_from(n)
                    .map(|i| JsonValue::Number(i.into()))
                    .map_err(|_| CoreError::MalformedRecord(format!("integer out of range: {}", n)))
            }
        }
        Value::Float(f) => Number::from_f64(*f)
            .map(JsonValue::Number)
            .ok_or_else(|| CoreError::MalformedRecord(format!("non-finite float: {}", f))),
        Value::Text(s) => Ok(JsonValue::String(s.clone())),
        Value::Array(items) => items
            .iter()
            .map(cbor_to_json)
            .collect::<Result<Vec<_>, _>>()
            .map(JsonValue::Array),
        Value::Map(entries) => {
            let mut map = JsonMap::new();
            for (k, v) in entries {
                match k {
                    Value::Text(key) => {
                        map.insert(key.clone(), cbor_to_json(v)?);
                    }
                    _ => return Err(CoreError::MalformedRecord("map keys must be text".into())),
                }
            }
            Ok(JsonValue::Object(map))
        }
        _ => Err(CoreError::MalformedRecord("unsupported CBOR item".into())),
    }
}

fn as_u64(value: &Value, field: &'static str) -> Result<u64, CoreError> {
    match value {
        Value::Integer(i) => {
            let n: i128 = (*i).into();
            u64::try_from(n)
                .map_err(|_| CoreError::MalformedRecord(format!("{} out of range: {}", field, n)))
        }
        _ => Err(CoreError::MalformedRecord(format!("{} must be an integer", field))),
    }
}

fn as_text(value: &Value, field: &'static str) -> Result<String, CoreError> {
    match value {
        Value::Text(s) => Ok(s.clone()),
        _ => Err(CoreError::MalformedRecord(format!("{} must be text", field))),
    }
}

/// Encode a CBOR Value to canonical bytes.
fn encode_cbor_value_canonical(value: &Value) -> Vec<u8> {
    let mut buf = Vec::new();
    encode_value_to(&mut buf, value);
    buf
}

/// Recursively encode a CBOR value.
fn encode_value_to(buf: &mut Vec<u8>, value: &Value) {
    match value {
        Value::Integer(i) => encode_integer(buf, *i),
        Value::Float(f) => {
            buf.push(0xfb);
            buf.extend_from_slice(&f.to_bits().to_be_bytes());
        }
        Value::Bytes(b) => {
            encode_uint(buf, 2, b.len() as u64);
            buf.extend_from_slice(b);
        }
        Value::Text(s) => {
            encode_uint(buf, 3, s.len() as u64);
            buf.extend_from_slice(s.as_bytes());
        }
        Value::Array(arr) => {
            encode_uint(buf, 4, arr.len() as u64);
            for item in arr {
                encode_value_to(buf, item);
            }
        }
        Value::Map(entries) => encode_map_canonical(buf, entries),
        Value::Bool(b) => buf.push(if *b { 0xf5 } else { 0xf4 }),
        Value::Null => buf.push(0xf6),
        _ => unreachable!("canonical encoder only receives values built in this module"),
    }
}

/// Encode a CBOR integer (major types 0 and 1).
fn encode_integer(buf: &mut Vec<u8>, i: ciborium::value::Integer) {
    let n: i128 = i.into();

    if n >= 0 {
        encode_uint(buf, 0, n as u64);
    } else {
        // CBOR encodes -1 as 0, -2 as 1, etc.
        encode_uint(buf, 1, (-1 - n) as u64);
    }
}

/// Encode an unsigned integer with the given major type.
fn encode_uint(buf: &mut Vec<u8>, major: u8, n: u64) {
    let mt = major << 5;
    if n < 24 {
        buf.push(mt | (n as u8));
    } else if n <= 0xff {
        buf.push(mt | 24);
        buf.push(n as u8);
    } else if n <= 0xffff {
        buf.push(mt | 25);
        buf.extend_from_slice(&(n as u16).to_be_bytes());
    } else if n <= 0xffff_ffff {
        buf.push(mt | 26);
        buf.extend_from_slice(&(n as u32).to_be_bytes());
    } else {
        buf.push(mt | 27);
        buf.extend_from_slice(&n.to_be_bytes());
    }
}

/// Pair each entry with its encoded key, sorted by those bytes.
fn sort_entries(entries: &[(Value, Value)]) -> Vec<(Vec<u8>, &Value)> {
    let mut pairs: Vec<(Vec<u8>, &Value)> = entries
        .iter()
        .map(|(k, v)| (encode_cbor_value_canonical(k), v))
        .collect();
    pairs.sort_by(|a, b| a.0.cmp(&b.0));
    pairs
}

/// Encode a map canonically (major type 5).
fn encode_map_canonical(buf: &mut Vec<u8>, entries: &[(Value, Value)]) {
    let sorted = sort_entries(entries);
    encode_uint(buf, 5, sorted.len() as u64);
    for (key_bytes, value) in sorted {
        buf.extend_from_slice(&key_bytes);
        encode_value_to(buf, value);
    }
}
