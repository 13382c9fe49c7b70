use std::fmt::Display;

use alloy_primitives::B256;
use eyre::Result;

use crate::{
    backend::ChainStore,
    common::{BlockInfo, CanonicalHeads},
    engine::ForkchoiceState,
};

/// Which of the three fork choice hashes a resolution refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForkchoiceHash {
    Head,
    Safe,
    Finalized,
}

impl Display for ForkchoiceHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Head => "head",
            Self::Safe => "safe",
            Self::Finalized => "finalized",
        };
        write!(f, "{}", name)
    }
}

/// Outcome of resolving a [ForkchoiceState] against the chain store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadResolution {
    /// A referenced block is not known locally yet
    Unknown(ForkchoiceHash),
    /// The requested pointers can never become canonical
    InvalidAncestry {
        latest_valid_hash: Option<B256>,
        reason: String,
    },
    /// All referenced blocks are known and consistently ordered
    Resolved(CanonicalHeads),
}

impl HeadResolution {
    fn invalid(latest_valid_hash: Option<B256>, reason: impl Into<String>) -> Self {
        Self::InvalidAncestry {
            latest_valid_hash,
            reason: reason.into(),
        }
    }
}

/// Resolves fork choice hashes to stored blocks.
///
/// Read only: resolving the same state twice against the same store gives the same answer.
#[derive(Debug)]
pub struct HeadResolver<'a, C: ChainStore> {
    chain: &'a C,
}

impl<'a, C: ChainStore> HeadResolver<'a, C> {
    pub fn new(chain: &'a C) -> Self {
        Self { chain }
    }

    pub fn resolve(&self, state: &ForkchoiceState) -> Result<HeadResolution> {
        if state.head_block_hash.is_zero() {
            return Ok(HeadResolution::invalid(
                None,
                "Received zero hash as forkchoice head",
            ));
        }

        if let Some(bad) = self.chain.bad_block(&state.head_block_hash)? {
            return Ok(HeadResolution::invalid(
                bad.latest_valid_ancestor,
                format!("links to previously rejected block: {}", bad.reason),
            ));
        }

        let Some(head) = self.chain.block_by_hash(&state.head_block_hash)? else {
            return Ok(HeadResolution::Unknown(ForkchoiceHash::Head));
        };
        let safe = match self.lookup(&state.safe_block_hash)? {
            Lookup::Unset => None,
            Lookup::Known(block) => Some(block),
            Lookup::Missing => return Ok(HeadResolution::Unknown(ForkchoiceHash::Safe)),
        };
        let finalized = match self.lookup(&state.finalized_block_hash)? {
            Lookup::Unset => None,
            Lookup::Known(block) => Some(block),
            Lookup::Missing => return Ok(HeadResolution::Unknown(ForkchoiceHash::Finalized)),
        };

        let pairs = [
            (finalized, Some(head), ForkchoiceHash::Finalized, ForkchoiceHash::Head),
            (safe, Some(head), ForkchoiceHash::Safe, ForkchoiceHash::Head),
            (finalized, safe, ForkchoiceHash::Finalized, ForkchoiceHash::Safe),
        ];
        for (ancestor, descendant, a, d) in pairs {
            let (Some(ancestor), Some(descendant)) = (ancestor, descendant) else {
                continue;
            };
            match self.chain.is_ancestor(&ancestor, &descendant)? {
                Some(true) => {}
                // gap in the stored chain below the descendant, still syncing
                None => return Ok(HeadResolution::Unknown(d)),
                Some(false) => {
                    let common = self.chain.common_ancestor(&ancestor, &descendant)?;
                    return Ok(HeadResolution::invalid(
                        common.map(|b| b.hash),
                        format!(
                            "{} block {} is not an ancestor of {} block {}",
                            a, ancestor.hash, d, descendant.hash
                        ),
                    ));
                }
            }
        }

        Ok(HeadResolution::Resolved(CanonicalHeads {
            head,
            safe,
            finalized,
        }))
    }

    /// Looks up a safe or finalized hash, where zero means unset.
    fn lookup(&self, hash: &B256) -> Result<Lookup> {
        if hash.is_zero() {
            return Ok(Lookup::Unset);
        }
        Ok(match self.chain.block_by_hash(hash)? {
            Some(block) => Lookup::Known(block),
            None => Lookup::Missing,
        })
    }
}

enum Lookup {
    Unset,
    Known(BlockInfo),
    Missing,
}
