//! Engine Parameters.

/// The default engine api authentication port.
pub const DEFAULT_AUTH_PORT: u16 = 8551;

/// The forkchoice updated method strings
pub const ENGINE_FORKCHOICE_UPDATED_V1: &str = "engine_forkchoiceUpdatedV1";
pub const ENGINE_FORKCHOICE_UPDATED_V2: &str = "engine_forkchoiceUpdatedV2";
pub const ENGINE_FORKCHOICE_UPDATED_V3: &str = "engine_forkchoiceUpdatedV3";

/// The get payload method strings
pub const ENGINE_GET_PAYLOAD_V1: &str = "engine_getPayloadV1";
pub const ENGINE_GET_PAYLOAD_V2: &str = "engine_getPayloadV2";
pub const ENGINE_GET_PAYLOAD_V3: &str = "engine_getPayloadV3";

/// Methods reported by `engine_exchangeCapabilities`.
pub const CAPABILITIES: &[&str] = &[
    ENGINE_FORKCHOICE_UPDATED_V1,
    ENGINE_FORKCHOICE_UPDATED_V2,
    ENGINE_FORKCHOICE_UPDATED_V3,
    ENGINE_GET_PAYLOAD_V1,
    ENGINE_GET_PAYLOAD_V2,
    ENGINE_GET_PAYLOAD_V3,
];

/// JSON-RPC invalid method parameters.
pub const INVALID_PARAMS_CODE: i32 = -32602;
/// Payload does not exist or is not available.
pub const UNKNOWN_PAYLOAD_CODE: i32 = -38001;
/// Payload attributes are invalid or inconsistent.
pub const INVALID_PAYLOAD_ATTRIBUTES_CODE: i32 = -38003;
/// Payload belongs to a fork that is not supported.
pub const UNSUPPORTED_FORK_CODE: i32 = -38005;
