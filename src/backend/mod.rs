#![warn(missing_debug_implementations)]
#![deny(rustdoc::broken_intra_doc_links)]

//! # Chain Store
//!
//! The block store the fork choice engine resolves hashes against, together with
//! the persisted head, safe and finalized pointers.
//!
//! ## Example
//!
//! ```rust
//! use alloy_primitives::B256;
//! use tiller::backend::{ChainStore, Database};
//! use tiller::common::BlockInfo;
//!
//! let db = Database::temporary().unwrap();
//! let genesis = BlockInfo::new(B256::with_last_byte(1), 0, B256::ZERO, 0);
//! let heads = db.init_genesis(genesis).unwrap();
//! assert_eq!(heads.head, genesis);
//! assert_eq!(db.canonical().unwrap(), Some(heads));
//! ```

/// Chain store trait
mod store;
pub use store::ChainStore;

/// Core Backend Types
mod types;
pub use types::BadBlock;

/// Core Backend Database
mod database;
pub use database::Database;

#[cfg(test)]
mod tests {
    use alloy_primitives::B256;

    use super::*;
    use crate::common::{BlockInfo, CanonicalHeads};

    fn hash(n: u8) -> B256 {
        B256::with_last_byte(n)
    }

    /// genesis(1) <- a1(2) <- a2(3) <- a3(4)
    ///            <- b1(12) <- b2(13)
    fn forked_db() -> Database {
        let db = Database::temporary().unwrap();
        db.insert_block(BlockInfo::new(hash(1), 0, B256::ZERO, 0)).unwrap();
        db.insert_block(BlockInfo::new(hash(2), 1, hash(1), 12)).unwrap();
        db.insert_block(BlockInfo::new(hash(3), 2, hash(2), 24)).unwrap();
        db.insert_block(BlockInfo::new(hash(4), 3, hash(3), 36)).unwrap();
        db.insert_block(BlockInfo::new(hash(12), 1, hash(1), 13)).unwrap();
        db.insert_block(BlockInfo::new(hash(13), 2, hash(12), 25)).unwrap();
        db
    }

    fn block(db: &Database, n: u8) -> BlockInfo {
        db.block_by_hash(&hash(n)).unwrap().unwrap()
    }

    #[test]
    fn test_canonical_round_trip() {
        let db = forked_db();
        assert_eq!(db.canonical().unwrap(), None);

        let heads = CanonicalHeads {
            head: block(&db, 4),
            safe: Some(block(&db, 3)),
            finalized: Some(block(&db, 2)),
        };
        db.set_canonical(&heads).unwrap();
        assert_eq!(db.canonical().unwrap(), Some(heads));

        let heads = CanonicalHeads::from_genesis(block(&db, 1));
        db.set_canonical(&heads).unwrap();
        assert_eq!(db.canonical().unwrap(), Some(heads));
    }

    #[test]
    fn test_init_genesis_keeps_existing_pointers() {
        let db = forked_db();
        let genesis = block(&db, 1);
        assert_eq!(db.init_genesis(genesis).unwrap().head, genesis);

        let heads = CanonicalHeads::from_genesis(block(&db, 4));
        db.set_canonical(&heads).unwrap();
        assert_eq!(db.init_genesis(genesis).unwrap(), heads);
    }

    #[test]
    fn test_ancestry() {
        let db = forked_db();
        let genesis = block(&db, 1);
        let a1 = block(&db, 2);
        let a3 = block(&db, 4);
        let b2 = block(&db, 13);

        assert_eq!(db.is_ancestor(&genesis, &a3).unwrap(), Some(true));
        assert_eq!(db.is_ancestor(&a1, &a3).unwrap(), Some(true));
        assert_eq!(db.is_ancestor(&a3, &a3).unwrap(), Some(true));
        assert_eq!(db.is_ancestor(&a3, &a1).unwrap(), Some(false));
        assert_eq!(db.is_ancestor(&a1, &b2).unwrap(), Some(false));

        assert_eq!(db.common_ancestor(&a3, &b2).unwrap(), Some(genesis));
        assert_eq!(db.common_ancestor(&a1, &a3).unwrap(), Some(a1));
        assert_eq!(db.ancestor_at(&a3, 1).unwrap(), Some(a1));
        assert_eq!(db.ancestor_at(&a1, 3).unwrap(), None);
    }

    #[test]
    fn test_missing_parent_ends_walk() {
        let db = Database::temporary().unwrap();
        let orphan = BlockInfo::new(hash(7), 5, hash(6), 60);
        db.insert_block(orphan).unwrap();
        assert_eq!(db.ancestor_at(&orphan, 0).unwrap(), None);

        let genesis = BlockInfo::new(hash(1), 0, B256::ZERO, 0);
        db.insert_block(genesis).unwrap();
        assert_eq!(db.is_ancestor(&genesis, &orphan).unwrap(), None);
        assert_eq!(db.is_ancestor(&orphan, &genesis).unwrap(), Some(false));
    }

    #[test]
    fn test_bad_blocks() {
        let db = forked_db();
        assert_eq!(db.bad_block(&hash(4)).unwrap(), None);

        let bad = BadBlock {
            hash: hash(99),
            latest_valid_ancestor: Some(hash(4)),
            reason: "state root mismatch".to_string(),
        };
        db.insert_bad_block(bad.clone()).unwrap();
        assert_eq!(db.bad_block(&hash(99)).unwrap(), Some(bad));

        db.clear().unwrap();
        assert_eq!(db.bad_block(&hash(99)).unwrap(), None);
        assert_eq!(db.block_by_hash(&hash(1)).unwrap(), None);
    }
}
