use std::sync::{Arc, RwLock};

use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

/// The process wide canonical pointers, shared between the fork choice engine and build jobs.
pub type SharedHeads = Arc<RwLock<CanonicalHeads>>;

/// Selected block header info
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockInfo {
    pub hash: B256,
    #[serde(with = "quantity")]
    pub number: u64,
    pub parent_hash: B256,
    #[serde(with = "quantity")]
    pub timestamp: u64,
}

impl BlockInfo {
    /// Creates a new [BlockInfo]
    pub fn new(hash: B256, number: u64, parent_hash: B256, timestamp: u64) -> Self {
        Self {
            hash,
            number,
            parent_hash,
            timestamp,
        }
    }

    /// Returns true if this block has no parent, i.e. it is a genesis block.
    pub fn is_genesis(&self) -> bool {
        self.number == 0
    }
}

/// The canonical head, safe and finalized block pointers of the chain.
///
/// `safe` and `finalized` stay unset until the consensus layer first reports
/// a non-zero hash for them.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CanonicalHeads {
    pub head: BlockInfo,
    pub safe: Option<BlockInfo>,
    pub finalized: Option<BlockInfo>,
}

impl CanonicalHeads {
    /// Creates a pointer triple rooted at the given block, with safe and finalized unset.
    pub fn from_genesis(genesis: BlockInfo) -> Self {
        Self {
            head: genesis,
            safe: None,
            finalized: None,
        }
    }

    /// Hash of the safe block, or zero if unset.
    pub fn safe_hash(&self) -> B256 {
        self.safe.map(|b| b.hash).unwrap_or_default()
    }

    /// Hash of the finalized block, or zero if unset.
    pub fn finalized_hash(&self) -> B256 {
        self.finalized.map(|b| b.hash).unwrap_or_default()
    }
}

/// Serde helpers for `0x`-prefixed hex quantities as used on the JSON-RPC wire.
pub mod quantity {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &u64, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("{:#x}", value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
        let s = String::deserialize(deserializer)?;
        let digits = s
            .strip_prefix("0x")
            .ok_or_else(|| D::Error::custom(format!("quantity missing 0x prefix: {s}")))?;
        u64::from_str_radix(digits, 16).map_err(D::Error::custom)
    }
}
