//! Telemetry module
//!
//! This module encompasses telemetry and logging.
//! Core components are described below.
//!
//! ### Logging
//!
//! Logging is constructed using the [tracing](https://crates.io/crates/tracing) crate.
//! The `tracing` crate is a framework for instrumenting Rust programs to collect
//! structured, event-based diagnostic information. You can use the [crate::telemetry::init] function
//! to initialize a global logger, passing in a boolean `verbose` parameter and an optional
//! directory for a rolling log file. This function will return an error if a logger has
//! already been initialized.
//!
//! ### Metrics
//!
//! Metrics are collected using the [prometheus](https://crates.io/crates/prometheus) crate
//! and served by [prometheus_exporter](https://crates.io/crates/prometheus_exporter).

pub mod logging;
pub use logging::{
    get_env_filter, init, init_subscriber, AnsiTermLayer, AnsiVisitor, LOG_FILE_NAME_PREFIX,
};

pub mod metrics;
pub use metrics::{
    init as init_metrics, FINALIZED_BLOCK, FORKCHOICE_RESPONSES, HEAD_BLOCK, PAYLOAD_JOBS,
    SAFE_BLOCK,
};

mod shutdown;
pub use shutdown::register_shutdown;

/// Contains common telemetry and logging types.
/// Re-exports [tracing] and [tracing_subscriber] items.
pub mod prelude {
    pub use super::*;
    pub use tracing::{debug, error, info, span, trace, warn, Level};
    pub use tracing_subscriber::{fmt, prelude::*};
}
