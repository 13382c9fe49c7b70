use std::sync::{Arc, RwLock};

use eyre::Result;

use crate::{
    backend::ChainStore,
    builder::{BuildCoordinator, BuilderConfig, PayloadBuilder},
    common::{CanonicalHeads, SharedHeads},
    engine::{
        validate_request, BuiltPayload, EngineApiError, EngineApiResult, ForkChoiceUpdate,
        ForkchoiceState, ForkchoiceStateParam, PayloadAttributes, PayloadId, PayloadStatus,
        ProtocolVersion,
    },
    hardforks::HardforkSchedule,
    telemetry::metrics,
};

use super::{ForkchoiceHash, HeadResolution, HeadResolver};

/// The `engine_forkchoiceUpdated` state machine.
///
/// Owns the canonical pointers and the build coordinator. Every protocol version
/// runs through [ForkchoiceEngine::forkchoice_updated]; versions differ only in
/// what they validate.
#[derive(Debug)]
pub struct ForkchoiceEngine<C: ChainStore, B: PayloadBuilder> {
    chain: Arc<C>,
    schedule: Arc<HardforkSchedule>,
    heads: SharedHeads,
    coordinator: BuildCoordinator<B>,
}

impl<C: ChainStore, B: PayloadBuilder> ForkchoiceEngine<C, B> {
    /// Creates an engine starting from the pointers persisted in `chain`.
    pub fn new(
        chain: Arc<C>,
        schedule: Arc<HardforkSchedule>,
        builder: Arc<B>,
        config: BuilderConfig,
    ) -> Result<Self> {
        let current = chain
            .canonical()?
            .ok_or_else(|| eyre::eyre!("chain store has no canonical head"))?;
        update_head_metrics(&current);

        let heads = Arc::new(RwLock::new(current));
        let coordinator = BuildCoordinator::new(builder, heads.clone(), config);
        Ok(Self {
            chain,
            schedule,
            heads,
            coordinator,
        })
    }

    /// Applies a fork choice update received on protocol version `V`.
    ///
    /// Malformed requests are errors. Well formed requests always get a payload
    /// status, `INVALID` included.
    pub async fn forkchoice_updated<V: ProtocolVersion>(
        &self,
        state: ForkchoiceStateParam,
        attributes: Option<PayloadAttributes>,
    ) -> EngineApiResult<ForkChoiceUpdate> {
        let result = self.handle::<V>(state, attributes);

        let label = match &result {
            Ok(update) => update.payload_status.status.as_str().to_string(),
            Err(err) => err.kind().to_string(),
        };
        metrics::FORKCHOICE_RESPONSES
            .with_label_values(&[label.as_str()])
            .inc();

        result
    }

    fn handle<V: ProtocolVersion>(
        &self,
        state: ForkchoiceStateParam,
        attributes: Option<PayloadAttributes>,
    ) -> EngineApiResult<ForkChoiceUpdate> {
        let state = validate_request::<V>(&self.schedule, &state, attributes.as_ref())?;

        let heads = match self.apply(&state) {
            Ok(HeadResolution::Resolved(heads)) => heads,
            Ok(HeadResolution::Unknown(which)) => {
                tracing::debug!(target: "tiller", method = V::METHOD, "{} block unknown, syncing", which);
                return Ok(ForkChoiceUpdate::new(PayloadStatus::syncing()));
            }
            Ok(HeadResolution::InvalidAncestry {
                latest_valid_hash,
                reason,
            }) => {
                tracing::warn!(target: "tiller", head = %state.head_block_hash, "invalid fork choice: {}", reason);
                return Ok(ForkChoiceUpdate::new(PayloadStatus::invalid(
                    latest_valid_hash,
                    reason,
                )));
            }
            Err(err) => {
                tracing::error!(target: "tiller", head = %state.head_block_hash, "fork choice failed: {:?}", err);
                return Ok(ForkChoiceUpdate::new(PayloadStatus::invalid(
                    None,
                    format!("internal error: {}", err),
                )));
            }
        };

        let update = ForkChoiceUpdate::new(PayloadStatus::valid(heads.head.hash));
        let Some(attributes) = attributes else {
            return Ok(update);
        };

        if attributes.timestamp <= heads.head.timestamp {
            return Err(EngineApiError::InvalidPayloadAttributes(format!(
                "timestamp {} is not after head timestamp {}",
                attributes.timestamp, heads.head.timestamp
            )));
        }

        if !self.is_head(&heads) {
            tracing::debug!(target: "tiller", head = %heads.head.hash, "head replaced before build start");
            return Ok(update);
        }

        match self.coordinator.start_build(heads.head, attributes) {
            Ok(id) => Ok(update.with_payload_id(id)),
            Err(err) => {
                tracing::warn!(target: "tiller", head = %heads.head.hash, "failed to start payload build: {:?}", err);
                Ok(update)
            }
        }
    }

    /// Resolves `state` and, if it resolves, makes it canonical.
    ///
    /// Runs entirely under the write lock. The store is written before the in memory
    /// pointers, so a failed write leaves both untouched.
    fn apply(&self, state: &ForkchoiceState) -> Result<HeadResolution> {
        let mut current = self
            .heads
            .write()
            .map_err(|_| eyre::eyre!("lock poisoned"))?;

        let new = match HeadResolver::new(self.chain.as_ref()).resolve(state)? {
            HeadResolution::Resolved(new) => new,
            other => return Ok(other),
        };

        if let Some(invalid) = self.check_finality(&current, &new)? {
            return Ok(invalid);
        }

        if *current != new {
            self.chain.set_canonical(&new)?;
            *current = new;

            tracing::info!(
                target: "tiller",
                head = %new.head.hash,
                number = new.head.number,
                safe = %new.safe_hash(),
                finalized = %new.finalized_hash(),
                "updated fork choice"
            );
            update_head_metrics(&new);
        }

        Ok(HeadResolution::Resolved(new))
    }

    /// Rejects updates that would move finality backwards or unset it.
    fn check_finality(
        &self,
        current: &CanonicalHeads,
        new: &CanonicalHeads,
    ) -> Result<Option<HeadResolution>> {
        let Some(finalized) = current.finalized else {
            return Ok(None);
        };

        let Some(new_finalized) = new.finalized else {
            return Ok(Some(HeadResolution::InvalidAncestry {
                latest_valid_hash: Some(finalized.hash),
                reason: "finalized block hash cannot be zero once set".to_string(),
            }));
        };
        if new.safe.is_none() {
            return Ok(Some(HeadResolution::InvalidAncestry {
                latest_valid_hash: Some(new_finalized.hash),
                reason: "safe block hash cannot be zero once finalized is set".to_string(),
            }));
        }

        match self.chain.is_ancestor(&finalized, &new_finalized)? {
            Some(true) => Ok(None),
            None => Ok(Some(HeadResolution::Unknown(ForkchoiceHash::Finalized))),
            Some(false) => {
                let common = self.chain.common_ancestor(&finalized, &new_finalized)?;
                Ok(Some(HeadResolution::InvalidAncestry {
                    latest_valid_hash: common.map(|b| b.hash),
                    reason: format!(
                        "finalized block {} does not descend from finalized block {}",
                        new_finalized.hash, finalized.hash
                    ),
                }))
            }
        }
    }

    fn is_head(&self, heads: &CanonicalHeads) -> bool {
        self.heads
            .read()
            .map(|current| current.head.hash == heads.head.hash)
            .unwrap_or(false)
    }

    /// Returns the best payload of a build job started by a fork choice update.
    pub async fn get_payload(&self, id: PayloadId) -> EngineApiResult<BuiltPayload> {
        self.coordinator
            .retrieve(&id)
            .await
            .ok_or(EngineApiError::UnknownPayload)
    }

    /// A snapshot of the canonical pointers.
    pub fn heads(&self) -> Result<CanonicalHeads> {
        self.heads
            .read()
            .map(|heads| *heads)
            .map_err(|_| eyre::eyre!("lock poisoned"))
    }

    pub fn coordinator(&self) -> &BuildCoordinator<B> {
        &self.coordinator
    }

    pub fn schedule(&self) -> &HardforkSchedule {
        &self.schedule
    }

    pub fn chain(&self) -> &C {
        &self.chain
    }
}

fn update_head_metrics(heads: &CanonicalHeads) {
    metrics::HEAD_BLOCK.set(heads.head.number as i64);
    metrics::SAFE_BLOCK.set(heads.safe.map(|b| b.number as i64).unwrap_or_default());
    metrics::FINALIZED_BLOCK.set(heads.finalized.map(|b| b.number as i64).unwrap_or_default());
}

#[cfg(test)]
mod tests {
    use alloy_primitives::B256;

    use super::*;
    use crate::{
        backend::Database,
        builder::EmptyPayloadBuilder,
        common::BlockInfo,
        engine::{V1, V3},
        hardforks::HardforkMilestone,
    };

    fn hash(n: u8) -> B256 {
        B256::with_last_byte(n)
    }

    /// genesis(1) <- a1(2) <- a2(3) <- a3(4), with timestamps 12 apart
    fn engine() -> ForkchoiceEngine<Database, EmptyPayloadBuilder> {
        let db = Database::temporary().unwrap();
        db.init_genesis(BlockInfo::new(hash(1), 0, B256::ZERO, 0)).unwrap();
        db.insert_block(BlockInfo::new(hash(2), 1, hash(1), 12)).unwrap();
        db.insert_block(BlockInfo::new(hash(3), 2, hash(2), 24)).unwrap();
        db.insert_block(BlockInfo::new(hash(4), 3, hash(3), 36)).unwrap();

        let schedule = HardforkSchedule::new([
            HardforkMilestone::new("Shanghai", 0),
            HardforkMilestone::new("Cancun", 0),
        ]);
        ForkchoiceEngine::new(
            Arc::new(db),
            Arc::new(schedule),
            Arc::new(EmptyPayloadBuilder),
            BuilderConfig::default(),
        )
        .unwrap()
    }

    fn state(head: u8, safe: u8, finalized: u8) -> ForkchoiceStateParam {
        let h = |n: u8| Some(if n == 0 { B256::ZERO } else { hash(n) });
        ForkchoiceStateParam {
            head_block_hash: h(head),
            safe_block_hash: h(safe),
            finalized_block_hash: h(finalized),
        }
    }

    #[tokio::test]
    async fn test_valid_update_moves_pointers() {
        let engine = engine();
        let update = engine
            .forkchoice_updated::<V1>(state(4, 3, 2), None)
            .await
            .unwrap();

        assert_eq!(update.payload_status, PayloadStatus::valid(hash(4)));
        assert_eq!(update.payload_id, None);

        let heads = engine.heads().unwrap();
        assert_eq!(heads.head.hash, hash(4));
        assert_eq!(heads.safe_hash(), hash(3));
        assert_eq!(heads.finalized_hash(), hash(2));
        assert_eq!(engine.chain().canonical().unwrap(), Some(heads));
    }

    #[tokio::test]
    async fn test_finalized_cannot_be_unset() {
        let engine = engine();
        engine
            .forkchoice_updated::<V1>(state(4, 3, 2), None)
            .await
            .unwrap();

        let update = engine
            .forkchoice_updated::<V1>(state(4, 0, 0), None)
            .await
            .unwrap();
        assert!(update.payload_status.is_invalid());
        assert_eq!(engine.heads().unwrap().finalized_hash(), hash(2));
    }

    #[tokio::test]
    async fn test_finalized_cannot_regress() {
        let engine = engine();
        engine
            .forkchoice_updated::<V1>(state(4, 3, 3), None)
            .await
            .unwrap();

        let update = engine
            .forkchoice_updated::<V1>(state(4, 3, 2), None)
            .await
            .unwrap();
        assert!(update.payload_status.is_invalid());
        assert_eq!(update.payload_status.latest_valid_hash, Some(hash(2)));
        assert_eq!(engine.heads().unwrap().finalized_hash(), hash(3));
    }

    #[tokio::test]
    async fn test_attributes_start_build() {
        let engine = engine();
        let attributes = PayloadAttributes {
            timestamp: 48,
            withdrawals: Some(vec![]),
            parent_beacon_block_root: Some(hash(9)),
            ..Default::default()
        };
        let update = engine
            .forkchoice_updated::<V3>(state(4, 0, 0), Some(attributes))
            .await
            .unwrap();

        let id = update.payload_id.unwrap();
        assert_eq!(engine.coordinator().current_for_parent(&hash(4)), Some(id));
        let payload = engine.get_payload(id).await.unwrap();
        assert_eq!(payload.parent_hash, hash(4));
        assert_eq!(payload.block_number, 4);
    }

    #[tokio::test]
    async fn test_stale_attributes_timestamp() {
        let engine = engine();
        let attributes = PayloadAttributes {
            timestamp: 36,
            ..Default::default()
        };
        let result = engine
            .forkchoice_updated::<V1>(state(4, 0, 0), Some(attributes))
            .await;

        assert!(matches!(
            result,
            Err(EngineApiError::InvalidPayloadAttributes(_))
        ));
        // the head update itself is kept
        assert_eq!(engine.heads().unwrap().head.hash, hash(4));
        assert_eq!(engine.coordinator().active_jobs(), 0);
    }

    #[tokio::test]
    async fn test_unknown_payload() {
        let engine = engine();
        assert_eq!(
            engine.get_payload(PayloadId::new([7; 8])).await,
            Err(EngineApiError::UnknownPayload)
        );
    }
}
