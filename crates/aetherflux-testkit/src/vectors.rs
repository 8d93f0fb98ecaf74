//! Golden test vectors for deterministic verification.
//!
//! These vectors pin the canonical block encoding and its SHA-256 digest, so
//! any change to key ordering, integer widths or float encoding shows up as a
//! failure here rather than as unreadable chain files.

use serde_json::{json, Value};

use aetherflux_core::{canonical_block_bytes, Block, BlockBuilder, ContentHasher, Sha256Hasher};

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    pub index: u64,
    pub timestamp: f64,
    pub topic: &'static str,
    pub content: &'static str,
    /// Metadata as a JSON object.
    pub metadata: Value,
    pub links: Vec<u64>,
    pub previous_hash: &'static str,
    pub nonce: u64,
    /// Expected canonical bytes of the hashed fields (hex).
    pub expected_canonical: &'static str,
    /// Expected SHA-256 block hash (hex).
    pub expected_sha256: &'static str,
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "Genesis block",
            index: 0,
            timestamp: 1_736_870_400.0, // 2025-01-14T16:00:00Z
            topic: "Genesis",
            content: "Origin of AetherFlux",
            metadata: json!({}),
            links: vec![],
            previous_hash: "0",
            nonce: 0,
            expected_canonical: concat!(
                "a865696e64657800656c696e6b7380656e6f6e63650065746f70696367",
                "47656e6573697367636f6e74656e74744f726967696e206f6620416574",
                "686572466c7578686d65746164617461a06974696d657374616d70fb41",
                "d9e1a2800000006d70726576696f75735f686173686130",
            ),
            expected_sha256: "c1066b961eb2c87a849718df519b1f054c435acdce8794c84c0c076cc3513fd7",
        },
        GoldenVector {
            name: "Entry with mixed metadata",
            index: 1,
            timestamp: 1_736_870_401.25,
            topic: "Photosynthesis",
            content: "Light becomes sugar.",
            metadata: json!({
                "source": "botany",
                "tags": ["biology", "energy"],
                "confidence": 0.75,
                "year": 1779
            }),
            links: vec![0],
            previous_hash: "00a1b2c3",
            nonce: 4242,
            expected_canonical: concat!(
                "a865696e64657801656c696e6b738100656e6f6e636519109265746f70",
                "69636e50686f746f73796e74686573697367636f6e74656e74744c6967",
                "6874206265636f6d65732073756761722e686d65746164617461a46474",
                "616773826762696f6c6f677966656e6572677964796561721906f36673",
                "6f7572636566626f74616e796a636f6e666964656e6365fb3fe8000000",
                "0000006974696d657374616d70fb41d9e1a2805000006d70726576696f",
                "75735f68617368683030613162326333",
            ),
            expected_sha256: "bb3fbe719f325ffcc607614ae5c157f0333e861686624f645ba2b0b67d74f564",
        },
        GoldenVector {
            name: "Non-ASCII text, nested metadata, wide nonce",
            index: 7,
            timestamp: 0.5,
            topic: "Ångström",
            content: "光の速さ ≈ 3×10⁸ m/s",
            metadata: json!({
                "nested": {"deep": {"deeper": [null, true, false, -12]}},
                "zeta": "ω",
                "a": 1.0
            }),
            links: vec![1, 3, 5],
            previous_hash: "000ffe",
            nonce: (1 << 32) + 1,
            expected_canonical: concat!(
                "a865696e64657807656c696e6b7383010305656e6f6e63651b00000001",
                "0000000165746f7069636ac3856e67737472c3b66d67636f6e74656e74",
                "781de58589e381aee9809fe3819520e289882033c3973130e281b8206d",
                "2f73686d65746164617461a36161fb3ff0000000000000647a65746162",
                "cf89666e6573746564a16464656570a16664656570657284f6f5f42b69",
                "74696d657374616d70fb3fe00000000000006d70726576696f75735f68",
                "61736866303030666665",
            ),
            expected_sha256: "29917f8b0e3df81d053923e38123323707ff644192c0c764807d785da332c151",
        },
    ]
}

/// Build the block described by a vector.
pub fn block_from_vector(vector: &GoldenVector, hasher: &dyn ContentHasher) -> Block {
    BlockBuilder::new(vector.index, vector.previous_hash)
        .timestamp(vector.timestamp)
        .topic(vector.topic)
        .content(vector.content)
        .metadata(vector.metadata.as_object().cloned().unwrap_or_default())
        .links(vector.links.clone())
        .nonce(vector.nonce)
        .seal(hasher)
}

/// Check every vector against its expected encoding and digest.
///
/// Returns `(name, matches, canonical_hex, sha256_hex)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let block = block_from_vector(v, &Sha256Hasher);
            let canonical = hex::encode(canonical_block_bytes(&block));
            let digest = block.hash().to_string();

            let matches = canonical == v.expected_canonical && digest == v.expected_sha256;
            (v.name.to_string(), matches, canonical, digest)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vectors_match() {
        for (name, matches, canonical, digest) in verify_all_vectors() {
            assert!(
                matches,
                "vector '{}' produced canonical {} with hash {}",
                name, canonical, digest
            );
        }
    }

    #[test]
    fn test_vectors_are_deterministic() {
        for vector in all_vectors() {
            let b1 = block_from_vector(&vector, &Sha256Hasher);
            let b2 = block_from_vector(&vector, &Sha256Hasher);

            assert_eq!(
                canonical_block_bytes(&b1),
                canonical_block_bytes(&b2),
                "vector '{}' produced different canonical bytes",
                vector.name
            );
            assert_eq!(b1.hash(), b2.hash());
        }
    }
}
