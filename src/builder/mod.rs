//! ## Payload Building
//!
//! Builds candidate blocks on top of the canonical head when the consensus layer
//! asks for one through the payload attributes of a fork choice update. The
//! [BuildCoordinator] runs each request as a background job that keeps improving
//! its best payload until it is retrieved, cancelled or times out.

use std::time::Duration;

use alloy_primitives::{keccak256, U256};
use async_trait::async_trait;
use eyre::Result;
use serde::{Deserialize, Serialize};

use crate::{
    common::BlockInfo,
    engine::{BuiltPayload, PayloadAttributes, PayloadId},
};

/// Build job scheduling
mod coordinator;
pub use coordinator::{BuildCoordinator, MAX_PAYLOAD_JOBS};

/// Everything a builder needs for one build iteration.
#[derive(Debug, Clone)]
pub struct BuildArguments {
    pub id: PayloadId,
    pub parent: BlockInfo,
    pub attributes: PayloadAttributes,
    /// Improvement round, starting at 0
    pub iteration: u64,
}

/// Produces candidate payloads. Implemented by the transaction selection layer.
#[async_trait]
pub trait PayloadBuilder: Send + Sync + 'static {
    async fn build(&self, args: BuildArguments) -> Result<BuiltPayload>;
}

/// Builds a block with no transactions.
///
/// Used when no transaction source is wired in, so that `getPayload` always has
/// something valid to return.
#[derive(Debug, Default, Clone, Copy)]
pub struct EmptyPayloadBuilder;

#[async_trait]
impl PayloadBuilder for EmptyPayloadBuilder {
    async fn build(&self, args: BuildArguments) -> Result<BuiltPayload> {
        let BuildArguments {
            parent,
            attributes,
            iteration,
            ..
        } = args;

        let block_number = parent.number + 1;
        let block_hash = keccak256(
            [
                parent.hash.as_slice(),
                &block_number.to_be_bytes(),
                &attributes.timestamp.to_be_bytes(),
                attributes.prev_randao.as_slice(),
                attributes.suggested_fee_recipient.as_slice(),
                attributes
                    .parent_beacon_block_root
                    .unwrap_or_default()
                    .as_slice(),
            ]
            .concat(),
        );

        Ok(BuiltPayload {
            parent_hash: parent.hash,
            fee_recipient: attributes.suggested_fee_recipient,
            prev_randao: attributes.prev_randao,
            block_number,
            timestamp: attributes.timestamp,
            block_hash,
            transactions: Vec::new(),
            withdrawals: attributes.withdrawals,
            parent_beacon_block_root: attributes.parent_beacon_block_root,
            block_value: U256::ZERO,
            iteration,
        })
    }
}

/// Timing of build jobs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuilderConfig {
    /// Pause between improvement rounds
    pub interval_ms: u64,
    /// Time after which a job stops improving its payload
    pub deadline_ms: u64,
}

/// Longest interval or deadline a job honours; larger configured values are clamped.
pub const MAX_BUILD_TIME_MS: u64 = 60 * 60 * 1000;

impl BuilderConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms.min(MAX_BUILD_TIME_MS))
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms.min(MAX_BUILD_TIME_MS))
    }
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            interval_ms: 500,
            deadline_ms: 12_000,
        }
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{Address, B256};

    use super::*;

    fn args(iteration: u64) -> BuildArguments {
        BuildArguments {
            id: PayloadId::new([1; 8]),
            parent: BlockInfo::new(B256::with_last_byte(4), 3, B256::with_last_byte(3), 36),
            attributes: PayloadAttributes {
                timestamp: 48,
                prev_randao: B256::with_last_byte(0xaa),
                suggested_fee_recipient: Address::with_last_byte(0xbb),
                withdrawals: Some(vec![]),
                parent_beacon_block_root: Some(B256::with_last_byte(0xcc)),
            },
            iteration,
        }
    }

    #[tokio::test]
    async fn test_empty_payload_extends_parent() {
        let payload = EmptyPayloadBuilder.build(args(0)).await.unwrap();
        assert_eq!(payload.parent_hash, B256::with_last_byte(4));
        assert_eq!(payload.block_number, 4);
        assert_eq!(payload.timestamp, 48);
        assert_eq!(payload.fee_recipient, Address::with_last_byte(0xbb));
        assert_eq!(payload.withdrawals, Some(vec![]));
        assert!(payload.transactions.is_empty());
        assert_ne!(payload.block_hash, B256::ZERO);
    }

    #[tokio::test]
    async fn test_empty_payload_hash_ignores_iteration() {
        let first = EmptyPayloadBuilder.build(args(0)).await.unwrap();
        let second = EmptyPayloadBuilder.build(args(5)).await.unwrap();
        assert_eq!(first.block_hash, second.block_hash);
        assert_eq!(second.iteration, 5);
    }

    #[test]
    fn test_builder_config_defaults() {
        let config: BuilderConfig = serde_json::from_str(r#"{"interval_ms": 100}"#).unwrap();
        assert_eq!(config.interval(), Duration::from_millis(100));
        assert_eq!(config.deadline(), Duration::from_secs(12));

        let config = BuilderConfig {
            interval_ms: u64::MAX,
            deadline_ms: u64::MAX,
        };
        assert_eq!(config.interval(), Duration::from_secs(3600));
        assert_eq!(config.deadline(), Duration::from_secs(3600));
    }
}
