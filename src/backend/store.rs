use alloy_primitives::B256;
use eyre::Result;

use crate::common::{BlockInfo, CanonicalHeads};

use super::BadBlock;

/// Storage the fork choice engine reads blocks from and persists canonical pointers to.
///
/// Implementations only need to provide block lookup and pointer persistence; the
/// ancestry helpers walk parent hashes through [ChainStore::block_by_hash].
pub trait ChainStore: Send + Sync + 'static {
    /// Returns a fully imported block by hash.
    fn block_by_hash(&self, hash: &B256) -> Result<Option<BlockInfo>>;

    /// Returns the record of a block the block processor rejected, if any.
    fn bad_block(&self, _hash: &B256) -> Result<Option<BadBlock>> {
        Ok(None)
    }

    /// Atomically replaces the persisted head, safe and finalized pointers.
    fn set_canonical(&self, heads: &CanonicalHeads) -> Result<()>;

    /// Loads the persisted pointers, if any were ever written.
    fn canonical(&self) -> Result<Option<CanonicalHeads>>;

    /// Walks back from `block` to its ancestor at height `number`.
    ///
    /// Returns `None` if `number` is above `block` or the walk reaches a block whose
    /// parent is not stored.
    fn ancestor_at(&self, block: &BlockInfo, number: u64) -> Result<Option<BlockInfo>> {
        let mut current = *block;
        while current.number > number {
            match self.parent_of(&current)? {
                Some(parent) => current = parent,
                None => return Ok(None),
            }
        }
        Ok((current.number == number).then_some(current))
    }

    /// Returns whether `ancestor` is `descendant` or one of its ancestors.
    ///
    /// Returns `None` when the walk from `descendant` hits a block whose parent is not
    /// stored, since the answer is then undecided until the gap is filled.
    fn is_ancestor(&self, ancestor: &BlockInfo, descendant: &BlockInfo) -> Result<Option<bool>> {
        if ancestor.number > descendant.number {
            return Ok(Some(false));
        }
        Ok(self
            .ancestor_at(descendant, ancestor.number)?
            .map(|block| block.hash == ancestor.hash))
    }

    /// Returns the deepest block both `a` and `b` descend from (or are).
    fn common_ancestor(&self, a: &BlockInfo, b: &BlockInfo) -> Result<Option<BlockInfo>> {
        let height = a.number.min(b.number);
        let (Some(mut a), Some(mut b)) = (self.ancestor_at(a, height)?, self.ancestor_at(b, height)?)
        else {
            return Ok(None);
        };

        while a.hash != b.hash {
            match (self.parent_of(&a)?, self.parent_of(&b)?) {
                (Some(pa), Some(pb)) => {
                    a = pa;
                    b = pb;
                }
                _ => return Ok(None),
            }
        }
        Ok(Some(a))
    }

    /// Returns the parent of `block`, or `None` at genesis or a gap in storage.
    fn parent_of(&self, block: &BlockInfo) -> Result<Option<BlockInfo>> {
        if block.is_genesis() {
            return Ok(None);
        }
        match self.block_by_hash(&block.parent_hash)? {
            Some(parent) if parent.number + 1 == block.number => Ok(Some(parent)),
            Some(parent) => eyre::bail!(
                "block {} at height {} has parent at height {}",
                block.hash,
                block.number,
                parent.number
            ),
            None => Ok(None),
        }
    }
}
