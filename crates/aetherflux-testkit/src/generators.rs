//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::{Number, Value};

use aetherflux_core::{Block, BlockBuilder, ContentHasher, Metadata};

/// Generate text, non-ASCII included.
pub fn text() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9 .,-]{0,24}",
        "\\PC{0,16}",
        Just("Ångström ≈ 10⁻¹⁰ m".to_string()),
        Just("光の速さ".to_string()),
    ]
}

/// Generate a metadata key.
pub fn key() -> impl Strategy<Value = String> {
    prop_oneof!["[a-z_]{1,10}", "\\PC{1,6}"]
}

/// Generate a finite float.
pub fn finite_f64() -> impl Strategy<Value = f64> {
    any::<f64>().prop_filter("finite", |f| f.is_finite())
}

/// Generate a JSON scalar that survives the canonical encoding.
pub fn json_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<u64>().prop_map(|n| Value::Number(n.into())),
        any::<i64>().prop_map(|n| Value::Number(n.into())),
        finite_f64().prop_map(|f| Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null)),
        text().prop_map(Value::String),
    ]
}

/// Generate an arbitrary JSON value up to a few levels deep.
pub fn json_value() -> impl Strategy<Value = Value> {
    json_leaf().prop_recursive(4, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::Array),
            prop::collection::btree_map(key(), inner, 0..6)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

/// Generate block metadata.
pub fn metadata() -> impl Strategy<Value = Metadata> {
    prop::collection::btree_map(key(), json_value(), 0..6).prop_map(|m| m.into_iter().collect())
}

/// Generate a timestamp in seconds, fractional part included.
pub fn timestamp() -> impl Strategy<Value = f64> {
    (0u32..=4_000_000_000u32, 0u32..1000u32).prop_map(|(s, ms)| s as f64 + ms as f64 / 1000.0)
}

/// Generate a lowercase hex digest.
pub fn hex_hash() -> impl Strategy<Value = String> {
    any::<[u8; 32]>().prop_map(hex::encode)
}

/// Generate a list of block links.
pub fn links() -> impl Strategy<Value = Vec<u64>> {
    prop::collection::vec(0u64..10_000, 0..8)
}

/// Parameters for generating a block.
#[derive(Debug, Clone)]
pub struct BlockParams {
    pub index: u64,
    pub timestamp: f64,
    pub topic: String,
    pub content: String,
    pub metadata: Metadata,
    pub links: Vec<u64>,
    pub previous_hash: String,
    pub nonce: u64,
}

impl Arbitrary for BlockParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (
            0u64..=1_000_000u64, // index
            timestamp(),
            text(),
            text(),
            metadata(),
            links(),
            hex_hash(),
            any::<u64>(), // nonce
        )
            .prop_map(
                |(index, timestamp, topic, content, metadata, links, previous_hash, nonce)| {
                    BlockParams {
                        index,
                        timestamp,
                        topic,
                        content,
                        metadata,
                        links,
                        previous_hash,
                        nonce,
                    }
                },
            )
            .boxed()
    }
}

/// Seal a block from parameters.
pub fn block_from_params(params: &BlockParams, hasher: &dyn ContentHasher) -> Block {
    BlockBuilder::new(params.index, params.previous_hash.clone())
        .timestamp(params.timestamp)
        .topic(params.topic.clone())
        .content(params.content.clone())
        .metadata(params.metadata.clone())
        .links(params.links.clone())
        .nonce(params.nonce)
        .seal(hasher)
}
