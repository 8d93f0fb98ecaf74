//! Strong type definitions for the AetherFlux ledger.
//!
//! Identifiers and tunables are newtypes to prevent misuse at compile time.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};
use uuid::Uuid;

use crate::error::CoreError;

/// Identifier assigned to a knowledge entry when it is submitted.
///
/// Random (UUID v4). Collisions are treated as impossible.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub Uuid);

impl EntryId {
    /// Generate a fresh random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the underlying UUID.
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryId({})", self.0)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntryId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl From<Uuid> for EntryId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Proof-of-work difficulty: the number of leading `'0'` characters a block
/// hash must carry in its lowercase hex form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Difficulty(u32);

impl Difficulty {
    /// Hex characters in a 256-bit digest.
    pub const MAX: u32 = 64;

    /// Default difficulty of the ledger.
    pub const DEFAULT: Self = Self(3);

    /// Create a difficulty, rejecting values longer than a digest.
    pub fn new(zeros: u32) -> Result<Self, CoreError> {
        if zeros > Self::MAX {
            return Err(CoreError::InvalidDifficulty(zeros));
        }
        Ok(Self(zeros))
    }

    /// Number of leading zeros required.
    pub const fn zeros(self) -> u32 {
        self.0
    }

    /// Check whether a hex digest meets this difficulty.
    pub fn is_met_by(self, hash: &str) -> bool {
        let zeros = self.0 as usize;
        hash.len() >= zeros && hash.bytes().take(zeros).all(|b| b == b'0')
    }

    /// Expected number of hash evaluations to find a solution (16^zeros).
    pub fn expected_attempts(self) -> f64 {
        16f64.powi(self.0 as i32)
    }
}

impl Default for Difficulty {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u32> for Difficulty {
    type Error = CoreError;

    fn try_from(zeros: u32) -> Result<Self, Self::Error> {
        Self::new(zeros)
    }
}

impl From<Difficulty> for u32 {
    fn from(d: Difficulty) -> Self {
        d.0
    }
}

/// Current wall-clock time as floating-point seconds since the Unix epoch.
pub fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_id_string_roundtrip() {
        let id = EntryId::generate();
        let parsed: EntryId = id.to_string().parse().unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_entry_ids_are_unique() {
        let a = EntryId::generate();
        let b = EntryId::generate();
        assert_ne!(a, b);
    }

    #[test]
    fn test_entry_id_serializes_as_string() {
        let id = EntryId::generate();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id));
    }

    #[test]
    fn test_difficulty_bounds() {
        assert!(Difficulty::new(0).is_ok());
        assert!(Difficulty::new(64).is_ok());
        assert!(matches!(Difficulty::new(65), Err(CoreError::InvalidDifficulty(65))));
    }

    #[test]
    fn test_difficulty_prefix() {
        let d = Difficulty::new(3).unwrap();
        assert!(d.is_met_by("000abc"));
        assert!(d.is_met_by("0000ff"));
        assert!(!d.is_met_by("00a000"));
        assert!(!d.is_met_by("00"));
        assert!(Difficulty::new(0).unwrap().is_met_by("ffff"));
    }

    #[test]
    fn test_difficulty_default() {
        assert_eq!(Difficulty::default().zeros(), 3);
        assert_eq!(Difficulty::DEFAULT.expected_attempts(), 4096.0);
    }

    #[test]
    fn test_now_secs_is_recent() {
        // 2020-01-01T00:00:00Z
        assert!(now_secs() > 1_577_836_800.0);
    }
}
