//! Fork choice parameter validation.
//!
//! Pure checks run before any chain state is touched, so they may run in parallel
//! with each other and with an in-flight fork choice update.

use crate::hardforks::HardforkSchedule;

use super::{
    EngineApiError, EngineApiResult, ForkchoiceState, ForkchoiceStateParam, PayloadAttributes,
    ProtocolVersion,
};

/// Validates a fork choice request for protocol version `V`.
///
/// Checks run in a fixed order and the first failure wins: the three block hashes,
/// the attribute fields `V` requires, then the fork `V` requires at the payload timestamp.
pub fn validate_request<V: ProtocolVersion>(
    schedule: &HardforkSchedule,
    state: &ForkchoiceStateParam,
    attributes: Option<&PayloadAttributes>,
) -> EngineApiResult<ForkchoiceState> {
    let state = validate_parameter(state)?;

    if let Some(attributes) = attributes {
        validate_attributes::<V>(attributes)?;
        validate_fork_supported::<V>(schedule, attributes.timestamp)?;
    }

    Ok(state)
}

/// Checks that every block hash is present, in head, safe, finalized order.
pub fn validate_parameter(state: &ForkchoiceStateParam) -> EngineApiResult<ForkchoiceState> {
    let head_block_hash = state
        .head_block_hash
        .ok_or_else(|| EngineApiError::InvalidParams("Missing head block hash".to_string()))?;
    let safe_block_hash = state
        .safe_block_hash
        .ok_or_else(|| EngineApiError::InvalidParams("Missing safe block hash".to_string()))?;
    let finalized_block_hash = state
        .finalized_block_hash
        .ok_or_else(|| EngineApiError::InvalidParams("Missing finalized block hash".to_string()))?;

    Ok(ForkchoiceState {
        head_block_hash,
        safe_block_hash,
        finalized_block_hash,
    })
}

/// Checks the attribute fields protocol version `V` adds on top of V1.
pub fn validate_attributes<V: ProtocolVersion>(
    attributes: &PayloadAttributes,
) -> EngineApiResult<()> {
    match V::REQUIRED_ATTRIBUTES
        .iter()
        .find(|field| !field.is_present(attributes))
    {
        Some(field) => Err(EngineApiError::InvalidParams(
            field.missing_message().to_string(),
        )),
        None => Ok(()),
    }
}

/// Checks that the fork protocol version `V` requires is active at `timestamp`.
pub fn validate_fork_supported<V: ProtocolVersion>(
    schedule: &HardforkSchedule,
    timestamp: u64,
) -> EngineApiResult<()> {
    let Some(fork) = V::REQUIRED_FORK else {
        return Ok(());
    };

    match schedule.milestone_for(fork.name()) {
        Some(milestone) if timestamp >= milestone.timestamp => Ok(()),
        Some(milestone) => Err(EngineApiError::UnsupportedFork(format!(
            "{} configured to start at timestamp: {}",
            fork, milestone.timestamp
        ))),
        None => Err(EngineApiError::UnsupportedFork(format!(
            "Configuration error, no schedule for {} fork set",
            fork
        ))),
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::B256;

    use super::*;
    use crate::{
        engine::{Withdrawal, V1, V2, V3},
        hardforks::HardforkMilestone,
    };

    fn cancun_schedule() -> HardforkSchedule {
        HardforkSchedule::new([
            HardforkMilestone::new("Shanghai", 1681338455),
            HardforkMilestone::new("Cancun", 1710000000),
        ])
    }

    fn full_state() -> ForkchoiceStateParam {
        ForkchoiceStateParam {
            head_block_hash: Some(B256::with_last_byte(3)),
            safe_block_hash: Some(B256::with_last_byte(2)),
            finalized_block_hash: Some(B256::with_last_byte(1)),
        }
    }

    fn v3_attributes(timestamp: u64) -> PayloadAttributes {
        PayloadAttributes {
            timestamp,
            withdrawals: Some(vec![Withdrawal::default()]),
            parent_beacon_block_root: Some(B256::with_last_byte(9)),
            ..Default::default()
        }
    }

    fn invalid_params(msg: &str) -> EngineApiError {
        EngineApiError::InvalidParams(msg.to_string())
    }

    #[test]
    fn missing_hashes_are_reported_in_order() {
        let schedule = cancun_schedule();

        let state = ForkchoiceStateParam::default();
        assert_eq!(
            validate_request::<V3>(&schedule, &state, None),
            Err(invalid_params("Missing head block hash"))
        );

        let state = ForkchoiceStateParam {
            head_block_hash: Some(B256::ZERO),
            ..Default::default()
        };
        assert_eq!(
            validate_request::<V3>(&schedule, &state, None),
            Err(invalid_params("Missing safe block hash"))
        );

        let state = ForkchoiceStateParam {
            finalized_block_hash: None,
            ..full_state()
        };
        assert_eq!(
            validate_request::<V3>(&schedule, &state, None),
            Err(invalid_params("Missing finalized block hash"))
        );
    }

    #[test]
    fn missing_hash_wins_over_unsupported_fork() {
        let state = ForkchoiceStateParam {
            safe_block_hash: None,
            ..full_state()
        };
        let result =
            validate_request::<V3>(&HardforkSchedule::default(), &state, Some(&v3_attributes(0)));
        assert_eq!(result, Err(invalid_params("Missing safe block hash")));
    }

    #[test]
    fn unconfigured_fork_rejects_any_timestamp() {
        let schedule = HardforkSchedule::new([HardforkMilestone::new("Shanghai", 0)]);
        for timestamp in [0, 1710000000, u64::MAX] {
            assert_eq!(
                validate_request::<V3>(&schedule, &full_state(), Some(&v3_attributes(timestamp))),
                Err(EngineApiError::UnsupportedFork(
                    "Configuration error, no schedule for Cancun fork set".to_string()
                ))
            );
        }
    }

    #[test]
    fn timestamp_before_milestone_is_unsupported() {
        let result = validate_request::<V3>(
            &cancun_schedule(),
            &full_state(),
            Some(&v3_attributes(1709999999)),
        );
        assert_eq!(
            result,
            Err(EngineApiError::UnsupportedFork(
                "Cancun configured to start at timestamp: 1710000000".to_string()
            ))
        );
    }

    #[test]
    fn timestamp_at_or_after_milestone_passes() {
        for timestamp in [1710000000, 1710000001] {
            let state = validate_request::<V3>(
                &cancun_schedule(),
                &full_state(),
                Some(&v3_attributes(timestamp)),
            )
            .unwrap();
            assert_eq!(state.head_block_hash, B256::with_last_byte(3));
        }
    }

    #[test]
    fn no_attributes_means_no_fork_gate() {
        assert!(validate_request::<V3>(&HardforkSchedule::default(), &full_state(), None).is_ok());
    }

    #[test]
    fn v3_requires_beacon_root_after_withdrawals() {
        let attributes = PayloadAttributes {
            timestamp: 1710000001,
            ..Default::default()
        };
        assert_eq!(
            validate_request::<V3>(&cancun_schedule(), &full_state(), Some(&attributes)),
            Err(invalid_params("Missing withdrawals"))
        );

        let attributes = PayloadAttributes {
            parent_beacon_block_root: None,
            ..v3_attributes(1710000001)
        };
        assert_eq!(
            validate_request::<V3>(&cancun_schedule(), &full_state(), Some(&attributes)),
            Err(invalid_params("Missing parent beacon block root"))
        );
    }

    #[test]
    fn v2_is_gated_on_shanghai() {
        let attributes = PayloadAttributes {
            timestamp: 1681338454,
            withdrawals: Some(vec![]),
            ..Default::default()
        };
        assert_eq!(
            validate_request::<V2>(&cancun_schedule(), &full_state(), Some(&attributes)),
            Err(EngineApiError::UnsupportedFork(
                "Shanghai configured to start at timestamp: 1681338455".to_string()
            ))
        );
    }

    #[test]
    fn v1_accepts_plain_attributes_without_schedule() {
        let attributes = PayloadAttributes::default();
        assert!(
            validate_request::<V1>(&HardforkSchedule::default(), &full_state(), Some(&attributes))
                .is_ok()
        );
    }
}
