//! Engine API protocol versions.
//!
//! Versions of `engine_forkchoiceUpdated` differ only in which payload attribute
//! fields they require and which hard fork must be active at the payload timestamp.
//! Everything else is shared, so each version is a zero sized marker type carrying
//! those two facts.

use crate::hardforks::Hardfork;

use super::{
    PayloadAttributes, ENGINE_FORKCHOICE_UPDATED_V1, ENGINE_FORKCHOICE_UPDATED_V2,
    ENGINE_FORKCHOICE_UPDATED_V3,
};

/// A version of the `engine_forkchoiceUpdated` method.
pub trait ProtocolVersion: Send + Sync + 'static {
    /// The JSON-RPC method name.
    const METHOD: &'static str;
    /// The fork that must be active at the payload timestamp, if any.
    const REQUIRED_FORK: Option<Hardfork>;
    /// Payload attribute fields required in addition to the V1 set, in check order.
    const REQUIRED_ATTRIBUTES: &'static [AttributeField];
}

/// Paris.
#[derive(Debug, Clone, Copy)]
pub struct V1;

/// Shanghai, adds withdrawals.
#[derive(Debug, Clone, Copy)]
pub struct V2;

/// Cancun, adds the parent beacon block root.
#[derive(Debug, Clone, Copy)]
pub struct V3;

impl ProtocolVersion for V1 {
    const METHOD: &'static str = ENGINE_FORKCHOICE_UPDATED_V1;
    const REQUIRED_FORK: Option<Hardfork> = None;
    const REQUIRED_ATTRIBUTES: &'static [AttributeField] = &[];
}

impl ProtocolVersion for V2 {
    const METHOD: &'static str = ENGINE_FORKCHOICE_UPDATED_V2;
    const REQUIRED_FORK: Option<Hardfork> = Some(Hardfork::Shanghai);
    const REQUIRED_ATTRIBUTES: &'static [AttributeField] = &[AttributeField::Withdrawals];
}

impl ProtocolVersion for V3 {
    const METHOD: &'static str = ENGINE_FORKCHOICE_UPDATED_V3;
    const REQUIRED_FORK: Option<Hardfork> = Some(Hardfork::Cancun);
    const REQUIRED_ATTRIBUTES: &'static [AttributeField] = &[
        AttributeField::Withdrawals,
        AttributeField::ParentBeaconBlockRoot,
    ];
}

/// Payload attribute fields introduced after V1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttributeField {
    Withdrawals,
    ParentBeaconBlockRoot,
}

impl AttributeField {
    pub fn is_present(&self, attributes: &PayloadAttributes) -> bool {
        match self {
            AttributeField::Withdrawals => attributes.withdrawals.is_some(),
            AttributeField::ParentBeaconBlockRoot => attributes.parent_beacon_block_root.is_some(),
        }
    }

    pub fn missing_message(&self) -> &'static str {
        match self {
            AttributeField::Withdrawals => "Missing withdrawals",
            AttributeField::ParentBeaconBlockRoot => "Missing parent beacon block root",
        }
    }
}
