use std::fmt;

use alloy_primitives::{Address, Bytes, B256, B64, U256};
use serde::{Deserialize, Serialize};

use crate::common::quantity;

/// ## PayloadAttributesV1..V3
///
/// Attributes for the payload the consensus layer wants built on top of the new head.
/// `withdrawals` were added in V2 (Shanghai) and `parent_beacon_block_root` in V3 (Cancun);
/// which of them a request must carry is decided by the protocol version it arrived on.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadAttributes {
    /// 64 bit value for the timestamp field of the new payload.
    #[serde(with = "quantity")]
    pub timestamp: u64,
    /// 32 byte value for the prevRandao field of the new payload.
    pub prev_randao: B256,
    /// 20 bytes suggested value for the feeRecipient field of the new payload.
    pub suggested_fee_recipient: Address,
    /// Withdrawals to be processed in the new payload.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub withdrawals: Option<Vec<Withdrawal>>,
    /// Root of the parent beacon block.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_beacon_block_root: Option<B256>,
}

/// ## WithdrawalV1
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Withdrawal {
    #[serde(with = "quantity")]
    pub index: u64,
    #[serde(with = "quantity")]
    pub validator_index: u64,
    pub address: Address,
    /// Amount in Gwei.
    #[serde(with = "quantity")]
    pub amount: u64,
}

/// ## PayloadIdV1
///
/// 8 byte identifier of a payload build process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PayloadId(pub B64);

impl PayloadId {
    pub fn new(id: [u8; 8]) -> Self {
        Self(B64::from(id))
    }
}

impl fmt::Display for PayloadId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// ## PayloadStatusV1
///
/// The status of a payload, or of a fork choice update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PayloadStatus {
    #[serde(flatten)]
    pub status: PayloadStatusEnum,
    /// 32 Bytes - the hash of the most recent valid block in the branch defined by payload and its ancestors
    pub latest_valid_hash: Option<B256>,
}

impl PayloadStatus {
    pub fn valid(latest_valid_hash: B256) -> Self {
        Self {
            status: PayloadStatusEnum::Valid,
            latest_valid_hash: Some(latest_valid_hash),
        }
    }

    pub fn invalid(latest_valid_hash: Option<B256>, validation_error: impl Into<String>) -> Self {
        Self {
            status: PayloadStatusEnum::Invalid {
                validation_error: validation_error.into(),
            },
            latest_valid_hash,
        }
    }

    pub fn syncing() -> Self {
        Self {
            status: PayloadStatusEnum::Syncing,
            latest_valid_hash: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self.status, PayloadStatusEnum::Valid)
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self.status, PayloadStatusEnum::Invalid { .. })
    }

    pub fn is_syncing(&self) -> bool {
        matches!(self.status, PayloadStatusEnum::Syncing)
    }

    /// Returns the validation error if the status is invalid.
    pub fn validation_error(&self) -> Option<&str> {
        match &self.status {
            PayloadStatusEnum::Invalid { validation_error } => Some(validation_error),
            _ => None,
        }
    }
}

/// The status of the payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PayloadStatusEnum {
    /// The fork choice was applied and the head is valid.
    Valid,
    /// The head, or its relationship to safe and finalized, is invalid.
    Invalid {
        #[serde(rename = "validationError")]
        validation_error: String,
    },
    /// One of the blocks is not known yet.
    Syncing,
    /// The payload was accepted but not processed. Never returned for fork choice updates.
    Accepted,
}

impl PayloadStatusEnum {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadStatusEnum::Valid => "VALID",
            PayloadStatusEnum::Invalid { .. } => "INVALID",
            PayloadStatusEnum::Syncing => "SYNCING",
            PayloadStatusEnum::Accepted => "ACCEPTED",
        }
    }
}

impl fmt::Display for PayloadStatusEnum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A candidate block produced by a payload builder.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuiltPayload {
    pub parent_hash: B256,
    pub fee_recipient: Address,
    pub prev_randao: B256,
    #[serde(with = "quantity")]
    pub block_number: u64,
    #[serde(with = "quantity")]
    pub timestamp: u64,
    pub block_hash: B256,
    pub transactions: Vec<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub withdrawals: Option<Vec<Withdrawal>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_beacon_block_root: Option<B256>,
    /// Fees the block pays to the fee recipient, in Wei.
    pub block_value: U256,
    /// Improvement round of the build job that produced this payload, starting at 0.
    #[serde(skip)]
    pub iteration: u64,
}
