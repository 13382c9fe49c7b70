use alloy_primitives::B256;
use eyre::Result;
use serde::{de::DeserializeOwned, Deserialize, Serialize};

/// Tree holding imported blocks, keyed by hash.
pub(crate) const BLOCKS_TREE: &str = "blocks";
/// Tree holding rejected blocks, keyed by hash.
pub(crate) const BAD_BLOCKS_TREE: &str = "bad_blocks";
/// Tree holding the canonical pointers.
pub(crate) const FORKCHOICE_TREE: &str = "forkchoice";

pub(crate) const HEAD_KEY: &str = "HEAD";
pub(crate) const SAFE_KEY: &str = "SAFE";
pub(crate) const FINALIZED_KEY: &str = "FINALIZED";

/// A block the block processor rejected.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BadBlock {
    /// The rejected block hash
    pub hash: B256,
    /// The most recent valid block on the rejected block's branch, if known
    pub latest_valid_ancestor: Option<B256>,
    /// Why the block was rejected
    pub reason: String,
}

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<sled::IVec> {
    Ok(sled::IVec::from(serde_json::to_vec(value)?))
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: sled::IVec) -> Result<T> {
    Ok(serde_json::from_slice(bytes.as_ref())?)
}
