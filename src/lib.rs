/// Common types and functions
pub mod common;

/// Hard fork activation schedule
pub mod hardforks;

/// Engine API types, errors and request validation
pub mod engine;

/// Chain storage and the canonical pointers
pub mod backend;

/// Payload build jobs
pub mod builder;

/// The `engine_forkchoiceUpdated` state machine
pub mod forkchoice;

/// Configuration management
pub mod config;

/// Application telemetry and logging
pub mod telemetry;

/// RPC module to host the engine rpc server
pub mod rpc;

/// Binary version info
pub mod version;
