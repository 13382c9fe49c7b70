use std::{net::SocketAddr, sync::Arc};

use crate::{
    backend::ChainStore,
    builder::PayloadBuilder,
    engine::{
        BuiltPayload, EngineApiError, ForkChoiceUpdate, ForkchoiceStateParam, PayloadAttributes,
        PayloadId, CAPABILITIES, V1, V2, V3,
    },
    forkchoice::ForkchoiceEngine,
};

use eyre::Result;

use jsonrpsee::{
    core::{async_trait, Error},
    proc_macros::rpc,
    server::{ServerBuilder, ServerHandle},
    types::error::{CallError, ErrorObject},
};

/// The fork choice methods of the `engine` namespace, as called by a consensus client.
#[rpc(server, namespace = "engine")]
pub trait EngineRpc {
    /// Updates the fork choice, optionally starting a payload build. Paris.
    #[method(name = "forkchoiceUpdatedV1")]
    async fn fork_choice_updated_v1(
        &self,
        state: ForkchoiceStateParam,
        attributes: Option<PayloadAttributes>,
    ) -> Result<ForkChoiceUpdate, Error>;

    /// Like V1, with withdrawals in the payload attributes. Shanghai.
    #[method(name = "forkchoiceUpdatedV2")]
    async fn fork_choice_updated_v2(
        &self,
        state: ForkchoiceStateParam,
        attributes: Option<PayloadAttributes>,
    ) -> Result<ForkChoiceUpdate, Error>;

    /// Like V2, with the parent beacon block root in the payload attributes. Cancun.
    #[method(name = "forkchoiceUpdatedV3")]
    async fn fork_choice_updated_v3(
        &self,
        state: ForkchoiceStateParam,
        attributes: Option<PayloadAttributes>,
    ) -> Result<ForkChoiceUpdate, Error>;

    /// Returns the best payload built so far for `payload_id`.
    #[method(name = "getPayloadV1")]
    async fn get_payload_v1(&self, payload_id: PayloadId) -> Result<BuiltPayload, Error>;

    #[method(name = "getPayloadV2")]
    async fn get_payload_v2(&self, payload_id: PayloadId) -> Result<BuiltPayload, Error>;

    #[method(name = "getPayloadV3")]
    async fn get_payload_v3(&self, payload_id: PayloadId) -> Result<BuiltPayload, Error>;

    /// Returns the engine methods this node serves.
    #[method(name = "exchangeCapabilities")]
    async fn exchange_capabilities(&self, capabilities: Vec<String>) -> Result<Vec<String>, Error>;
}

/// The engine RPC server, a thin adapter over [ForkchoiceEngine]
#[derive(Debug)]
pub struct EngineRpcImpl<C: ChainStore, B: PayloadBuilder> {
    engine: Arc<ForkchoiceEngine<C, B>>,
}

impl<C: ChainStore, B: PayloadBuilder> EngineRpcImpl<C, B> {
    pub fn new(engine: Arc<ForkchoiceEngine<C, B>>) -> Self {
        Self { engine }
    }
}

#[async_trait]
impl<C: ChainStore, B: PayloadBuilder> EngineRpcServer for EngineRpcImpl<C, B> {
    async fn fork_choice_updated_v1(
        &self,
        state: ForkchoiceStateParam,
        attributes: Option<PayloadAttributes>,
    ) -> Result<ForkChoiceUpdate, Error> {
        convert_err(self.engine.forkchoice_updated::<V1>(state, attributes).await)
    }

    async fn fork_choice_updated_v2(
        &self,
        state: ForkchoiceStateParam,
        attributes: Option<PayloadAttributes>,
    ) -> Result<ForkChoiceUpdate, Error> {
        convert_err(self.engine.forkchoice_updated::<V2>(state, attributes).await)
    }

    async fn fork_choice_updated_v3(
        &self,
        state: ForkchoiceStateParam,
        attributes: Option<PayloadAttributes>,
    ) -> Result<ForkChoiceUpdate, Error> {
        convert_err(self.engine.forkchoice_updated::<V3>(state, attributes).await)
    }

    async fn get_payload_v1(&self, payload_id: PayloadId) -> Result<BuiltPayload, Error> {
        convert_err(self.engine.get_payload(payload_id).await)
    }

    async fn get_payload_v2(&self, payload_id: PayloadId) -> Result<BuiltPayload, Error> {
        convert_err(self.engine.get_payload(payload_id).await)
    }

    async fn get_payload_v3(&self, payload_id: PayloadId) -> Result<BuiltPayload, Error> {
        convert_err(self.engine.get_payload(payload_id).await)
    }

    async fn exchange_capabilities(&self, capabilities: Vec<String>) -> Result<Vec<String>, Error> {
        tracing::debug!(target: "tiller", "consensus client capabilities: {:?}", capabilities);
        Ok(CAPABILITIES.iter().map(|m| m.to_string()).collect())
    }
}

/// Converts an [EngineApiError] into a JSON-RPC error object carrying its code
fn convert_err<T>(res: std::result::Result<T, EngineApiError>) -> Result<T, Error> {
    res.map_err(|err| {
        Error::Call(CallError::Custom(ErrorObject::owned(
            err.code(),
            err.to_string(),
            None::<()>,
        )))
    })
}

/// Starts the engine RPC server on `addr`.
///
/// Returns the bound address, which differs from `addr` when port 0 was requested,
/// and the handle that stops the server.
pub async fn run_server<C: ChainStore, B: PayloadBuilder>(
    addr: SocketAddr,
    engine: Arc<ForkchoiceEngine<C, B>>,
) -> Result<(SocketAddr, ServerHandle)> {
    let server = ServerBuilder::default().build(addr).await?;
    let addr = server.local_addr()?;
    let handle = server.start(EngineRpcImpl::new(engine).into_rpc())?;
    tracing::info!(target: "tiller", "engine rpc server started at {}", addr);

    Ok((addr, handle))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_objects_carry_engine_codes() {
        let err = convert_err::<()>(Err(EngineApiError::UnsupportedFork(
            "Cancun configured to start at timestamp: 1710000000".to_string(),
        )))
        .unwrap_err();

        let Error::Call(CallError::Custom(object)) = err else {
            panic!("expected a custom call error");
        };
        assert_eq!(object.code(), -38005);
        assert_eq!(
            object.message(),
            "Cancun configured to start at timestamp: 1710000000"
        );
    }

    #[test]
    fn test_unknown_payload_message() {
        let err = convert_err::<()>(Err(EngineApiError::UnknownPayload)).unwrap_err();
        let Error::Call(CallError::Custom(object)) = err else {
            panic!("expected a custom call error");
        };
        assert_eq!(object.code(), -38001);
        assert_eq!(object.message(), "Unknown payload");
    }
}
