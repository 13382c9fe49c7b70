use alloy_primitives::B256;
use eyre::Result;
use std::path::Path;
use uuid::Uuid;

use crate::common::{BlockInfo, CanonicalHeads};

use super::{types::*, ChainStore};

/// [sled](sled) backed chain storage.
///
/// Holds the block headers the resolver walks, the bad block registry, and the
/// persisted canonical pointers.
#[derive(Debug, Clone)]
pub struct Database {
    /// Internal [sled](sled) db
    db: sled::Db,
    blocks: sled::Tree,
    bad_blocks: sled::Tree,
    forkchoice: sled::Tree,
}

impl Database {
    /// Opens the database at `path`, falling back to a fresh temporary location if
    /// the given one cannot be used.
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let db = match sled::open(path.as_ref()) {
            Ok(db) => db,
            Err(e) => {
                tracing::error!("Failed to open database at {:?}: {}", path.as_ref(), e);
                let new_loc = Self::fallback_location();
                tracing::debug!("Optimistically creating new database at {}", new_loc);
                sled::open(new_loc)?
            }
        };
        Self::from_db(db)
    }

    /// Creates a database that is removed when dropped.
    pub fn temporary() -> Result<Self> {
        Self::from_db(sled::Config::new().temporary(true).open()?)
    }

    /// Gets a random location to use as a fallback
    pub fn fallback_location() -> String {
        format!("/tmp/tiller/{}", Uuid::new_v4())
    }

    fn from_db(db: sled::Db) -> Result<Self> {
        Ok(Self {
            blocks: db.open_tree(BLOCKS_TREE)?,
            bad_blocks: db.open_tree(BAD_BLOCKS_TREE)?,
            forkchoice: db.open_tree(FORKCHOICE_TREE)?,
            db,
        })
    }

    /// Stores `genesis` and, on first start, roots the canonical pointers at it.
    ///
    /// Returns the pointers the engine should start from.
    pub fn init_genesis(&self, genesis: BlockInfo) -> Result<CanonicalHeads> {
        self.insert_block(genesis)?;
        match self.canonical()? {
            Some(heads) => Ok(heads),
            None => {
                let heads = CanonicalHeads::from_genesis(genesis);
                self.set_canonical(&heads)?;
                Ok(heads)
            }
        }
    }

    /// Records a fully imported block.
    pub fn insert_block(&self, block: BlockInfo) -> Result<()> {
        self.blocks.insert(block.hash.as_slice(), encode(&block)?)?;
        Ok(())
    }

    /// Records a block the block processor rejected.
    pub fn insert_bad_block(&self, bad: BadBlock) -> Result<()> {
        self.bad_blocks.insert(bad.hash.as_slice(), encode(&bad)?)?;
        Ok(())
    }

    /// Clear wipes a database sled location.
    ///
    /// ## Warning
    ///
    /// Be careful when using this function, as it will delete all data.
    pub fn clear(&self) -> Result<()> {
        self.blocks.clear()?;
        self.bad_blocks.clear()?;
        self.forkchoice.clear()?;
        Ok(())
    }

    /// Flushes the database to disk asynchronously.
    ///
    /// Returns the number of bytes flushed during this call.
    pub async fn flush_async(&self) -> Result<usize> {
        self.db.flush_async().await.map_err(|e| eyre::eyre!(e))
    }
}

impl ChainStore for Database {
    fn block_by_hash(&self, hash: &B256) -> Result<Option<BlockInfo>> {
        self.blocks.get(hash.as_slice())?.map(decode).transpose()
    }

    fn bad_block(&self, hash: &B256) -> Result<Option<BadBlock>> {
        self.bad_blocks.get(hash.as_slice())?.map(decode).transpose()
    }

    fn set_canonical(&self, heads: &CanonicalHeads) -> Result<()> {
        let mut batch = sled::Batch::default();
        batch.insert(HEAD_KEY, encode(&heads.head)?);
        match &heads.safe {
            Some(safe) => batch.insert(SAFE_KEY, encode(safe)?),
            None => batch.remove(SAFE_KEY),
        }
        match &heads.finalized {
            Some(finalized) => batch.insert(FINALIZED_KEY, encode(finalized)?),
            None => batch.remove(FINALIZED_KEY),
        }
        self.forkchoice.apply_batch(batch)?;
        Ok(())
    }

    fn canonical(&self) -> Result<Option<CanonicalHeads>> {
        let Some(head) = self.forkchoice.get(HEAD_KEY)? else {
            return Ok(None);
        };

        Ok(Some(CanonicalHeads {
            head: decode(head)?,
            safe: self.forkchoice.get(SAFE_KEY)?.map(decode).transpose()?,
            finalized: self.forkchoice.get(FINALIZED_KEY)?.map(decode).transpose()?,
        }))
    }
}
