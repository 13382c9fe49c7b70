//! Prometheus Metrics Module.

use std::net::SocketAddr;

use eyre::Result;
use lazy_static::lazy_static;
use prometheus_exporter::{
    prometheus::{register_int_counter_vec, register_int_gauge, IntCounterVec, IntGauge},
    start,
};

lazy_static! {
    /// Tracks the block number of the canonical head.
    pub static ref HEAD_BLOCK: IntGauge =
        register_int_gauge!("head_block", "canonical head number").unwrap();
    /// Tracks the block number considered to be the safe head.
    pub static ref SAFE_BLOCK: IntGauge =
        register_int_gauge!("safe_block", "safe head number").unwrap();
    /// Tracks the block number of the most recent finalized head.
    pub static ref FINALIZED_BLOCK: IntGauge =
        register_int_gauge!("finalized_block", "finalized head number").unwrap();
    /// Number of payload build jobs still improving their payload
    pub static ref PAYLOAD_JOBS: IntGauge =
        register_int_gauge!("payload_jobs", "active payload build jobs").unwrap();
    /// Fork choice responses, by payload status or error kind
    pub static ref FORKCHOICE_RESPONSES: IntCounterVec = register_int_counter_vec!(
        "forkchoice_responses",
        "fork choice update responses",
        &["status"]
    )
    .unwrap();
}

/// Starts the metrics server on the given port
pub fn init(port: u16) -> Result<()> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    match start(addr) {
        Ok(_) => Ok(()),
        Err(e) => Err(eyre::eyre!("failed to start metrics server: {}", e)),
    }
}
