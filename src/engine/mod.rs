//! ## Engine API
//!
//! Types and request validation for the fork choice half of the
//! [Ethereum Engine API](https://github.com/ethereum/execution-apis/tree/main/src/engine),
//! as served by the execution layer to a consensus client.

/// Payload Types
mod payload;
pub use payload::*;

/// Forkchoice Types
mod types;
pub use types::*;

/// Engine API errors
mod error;
pub use error::*;

/// Engine API method names and error codes
pub mod params;
pub use params::*;

/// Protocol versions of `engine_forkchoiceUpdated`
mod version;
pub use version::*;

/// Request validation
pub mod validation;
pub use validation::validate_request;
