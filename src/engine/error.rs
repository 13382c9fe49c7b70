use std::fmt;

use thiserror::Error;

use super::params::{
    INVALID_PARAMS_CODE, INVALID_PAYLOAD_ATTRIBUTES_CODE, UNKNOWN_PAYLOAD_CODE,
    UNSUPPORTED_FORK_CODE,
};

/// The Engine API result type
pub type EngineApiResult<Ok> = Result<Ok, EngineApiError>;

/// A malformed or unsupported engine API request.
///
/// Fork choices that are well formed but rejected by the chain are not errors; they
/// are successful responses carrying an `INVALID` or `SYNCING` payload status.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineApiError {
    /// A required parameter is missing or malformed.
    #[error("{0}")]
    InvalidParams(String),
    /// The request targets a fork that is not active at the payload timestamp.
    #[error("{0}")]
    UnsupportedFork(String),
    /// The forkchoice state was applied but the payload attributes are unusable.
    #[error("Invalid payload attributes: {0}")]
    InvalidPayloadAttributes(String),
    /// Unknown payload requested.
    #[error("Unknown payload")]
    UnknownPayload,
}

impl EngineApiError {
    pub fn kind(&self) -> RpcErrorKind {
        match self {
            EngineApiError::InvalidParams(_) => RpcErrorKind::InvalidParams,
            EngineApiError::UnsupportedFork(_) => RpcErrorKind::UnsupportedFork,
            EngineApiError::InvalidPayloadAttributes(_) => RpcErrorKind::InvalidPayloadAttributes,
            EngineApiError::UnknownPayload => RpcErrorKind::UnknownPayload,
        }
    }

    /// The JSON-RPC error code for this error.
    pub fn code(&self) -> i32 {
        self.kind().code()
    }
}

/// Stable error kinds exposed to the consensus layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcErrorKind {
    InvalidParams,
    UnknownPayload,
    InvalidPayloadAttributes,
    UnsupportedFork,
}

impl RpcErrorKind {
    pub fn code(&self) -> i32 {
        match self {
            RpcErrorKind::InvalidParams => INVALID_PARAMS_CODE,
            RpcErrorKind::UnknownPayload => UNKNOWN_PAYLOAD_CODE,
            RpcErrorKind::InvalidPayloadAttributes => INVALID_PAYLOAD_ATTRIBUTES_CODE,
            RpcErrorKind::UnsupportedFork => UNSUPPORTED_FORK_CODE,
        }
    }
}

impl fmt::Display for RpcErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RpcErrorKind::InvalidParams => "INVALID_PARAMS",
            RpcErrorKind::UnknownPayload => "UNKNOWN_PAYLOAD",
            RpcErrorKind::InvalidPayloadAttributes => "INVALID_PAYLOAD_ATTRIBUTES",
            RpcErrorKind::UnsupportedFork => "UNSUPPORTED_FORK",
        };
        f.write_str(name)
    }
}
