use alloy_primitives::B256;
use serde::{Deserialize, Serialize};

use super::{PayloadId, PayloadStatus};

/// The result of a fork choice update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForkChoiceUpdate {
    /// Payload status.
    /// Note: values of the status field in the context of this method are restricted to the following subset: VALID, INVALID, SYNCING.
    pub payload_status: PayloadStatus,
    /// 8 byte identifier of the payload build process or null
    pub payload_id: Option<PayloadId>,
}

impl ForkChoiceUpdate {
    pub fn new(payload_status: PayloadStatus) -> Self {
        Self {
            payload_status,
            payload_id: None,
        }
    }

    pub fn with_payload_id(mut self, id: PayloadId) -> Self {
        self.payload_id = Some(id);
        self
    }
}

/// ## ForkchoiceStateV1
///
/// Note: [ForkchoiceState::safe_block_hash] and [ForkchoiceState::finalized_block_hash] fields are allowed to have
/// 0x0000000000000000000000000000000000000000000000000000000000000000 value unless transition block is finalized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForkchoiceState {
    /// 32 byte block hash of the head of the canonical chain
    pub head_block_hash: B256,
    /// 32 byte "safe" block hash of the canonical chain under certain synchrony and honesty assumptions
    /// This value MUST be either equal to or an ancestor of headBlockHash
    pub safe_block_hash: B256,
    /// 32 byte block hash of the most recent finalized block
    pub finalized_block_hash: B256,
}

/// A [ForkchoiceState] as received over the wire, before validation.
///
/// Every hash is required, but a malformed request may omit any of them. The validator
/// checks them in field order and turns a complete parameter into a [ForkchoiceState].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForkchoiceStateParam {
    pub head_block_hash: Option<B256>,
    pub safe_block_hash: Option<B256>,
    pub finalized_block_hash: Option<B256>,
}

impl From<ForkchoiceState> for ForkchoiceStateParam {
    fn from(state: ForkchoiceState) -> Self {
        Self {
            head_block_hash: Some(state.head_block_hash),
            safe_block_hash: Some(state.safe_block_hash),
            finalized_block_hash: Some(state.finalized_block_hash),
        }
    }
}
