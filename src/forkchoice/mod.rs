//! ## Fork Choice
//!
//! Keeps the canonical head, safe and finalized pointers in line with the fork
//! choice directives of the consensus layer.
//!
//! A request is validated, its hashes are resolved against the [ChainStore](crate::backend::ChainStore),
//! and if they resolve to a consistent chain the pointers move atomically. Unknown
//! blocks answer `SYNCING`, inconsistent ones `INVALID`.

/// Hash to block resolution
mod resolver;
pub use resolver::{ForkchoiceHash, HeadResolution, HeadResolver};

/// The fork choice state machine
mod engine;
pub use engine::ForkchoiceEngine;
