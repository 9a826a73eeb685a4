//! In-memory `Store` implementation used by the sync engine's own test
//! suite. Not a second production backend — a test double, the same role
//! ethrex's `store_db/in_memory.rs` plays for its rollup store.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use chain_common::types::{Block, BlockHeader};
use ethereum_types::{H256, U256};

use crate::{Receipts, StateUpdate, Store, StoreError};

#[derive(Default, Clone, Debug)]
pub struct InMemoryStore(Arc<Mutex<Inner>>);

#[derive(Default, Debug)]
struct Inner {
    blocks_by_number: HashMap<u64, Block>,
    total_difficulty_by_hash: HashMap<H256, U256>,
    nodes: HashMap<H256, Vec<u8>>,
    best_block_number: u64,
    unconfirmed: Option<Vec<Block>>,
    fast_sync_done: bool,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds the store with a genesis-like block so `checkHeaders`' parent
    /// lookups have something to find. Test helper only.
    pub fn seed(&self, block: Block, total_difficulty: U256) {
        let mut inner = self.0.lock().expect("lock poisoned");
        inner.best_block_number = block.number();
        inner
            .total_difficulty_by_hash
            .insert(block.hash(), total_difficulty);
        inner.blocks_by_number.insert(block.number(), block);
        inner.fast_sync_done = true;
    }
}

#[async_trait::async_trait]
impl Store for InMemoryStore {
    async fn best_block_number(&self) -> Result<u64, StoreError> {
        Ok(self.0.lock().expect("lock poisoned").best_block_number)
    }

    async fn total_difficulty_by_hash(&self, hash: H256) -> Result<Option<U256>, StoreError> {
        Ok(self
            .0
            .lock()
            .expect("lock poisoned")
            .total_difficulty_by_hash
            .get(&hash)
            .copied())
    }

    async fn block_header_by_number(
        &self,
        number: u64,
    ) -> Result<Option<BlockHeader>, StoreError> {
        Ok(self
            .0
            .lock()
            .expect("lock poisoned")
            .blocks_by_number
            .get(&number)
            .map(|b| b.header.clone()))
    }

    async fn block_by_number(&self, number: u64) -> Result<Option<Block>, StoreError> {
        Ok(self
            .0
            .lock()
            .expect("lock poisoned")
            .blocks_by_number
            .get(&number)
            .cloned())
    }

    async fn save_new_block(
        &self,
        block: Block,
        _state_update: StateUpdate,
        _receipts: Receipts,
        total_difficulty: U256,
    ) -> Result<(), StoreError> {
        let mut inner = self.0.lock().expect("lock poisoned");
        inner.best_block_number = inner.best_block_number.max(block.number());
        inner
            .total_difficulty_by_hash
            .insert(block.hash(), total_difficulty);
        inner.blocks_by_number.insert(block.number(), block);
        Ok(())
    }

    async fn switch_to_with_unconfirmed(&self) -> Result<(), StoreError> {
        let mut inner = self.0.lock().expect("lock poisoned");
        let staged = inner.unconfirmed.take().ok_or(StoreError::NothingUnconfirmed)?;
        for block in staged {
            inner.best_block_number = inner.best_block_number.max(block.number());
            inner.blocks_by_number.insert(block.number(), block);
        }
        Ok(())
    }

    async fn clear_unconfirmed(&self) -> Result<(), StoreError> {
        self.0.lock().expect("lock poisoned").unconfirmed = None;
        Ok(())
    }

    async fn put_node(&self, hash: H256, data: Vec<u8>) -> Result<(), StoreError> {
        self.0.lock().expect("lock poisoned").nodes.insert(hash, data);
        Ok(())
    }

    async fn fast_sync_done(&self) -> Result<bool, StoreError> {
        Ok(self.0.lock().expect("lock poisoned").fast_sync_done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_common::types::BlockBody;

    fn header(number: u64, hash: u8, parent: u8, difficulty: u64) -> BlockHeader {
        BlockHeader {
            number,
            hash: H256::from_low_u64_be(hash as u64),
            parent_hash: H256::from_low_u64_be(parent as u64),
            difficulty: U256::from(difficulty),
            gas_used: 0,
            gas_limit: 30_000_000,
            timestamp: 0,
        }
    }

    #[tokio::test]
    async fn save_and_read_round_trips() {
        let store = InMemoryStore::new();
        let block = Block {
            header: header(1, 1, 0, 10),
            body: BlockBody::default(),
        };
        store
            .save_new_block(
                block.clone(),
                StateUpdate::default(),
                Receipts::default(),
                U256::from(10),
            )
            .await
            .expect("save");

        assert_eq!(store.best_block_number().await.unwrap(), 1);
        assert_eq!(
            store.block_by_number(1).await.unwrap().map(|b| b.hash()),
            Some(block.hash())
        );
        assert_eq!(
            store.total_difficulty_by_hash(block.hash()).await.unwrap(),
            Some(U256::from(10))
        );
    }

    #[tokio::test]
    async fn clear_unconfirmed_without_staging_is_a_noop() {
        let store = InMemoryStore::new();
        store.clear_unconfirmed().await.expect("clear");
    }

    #[tokio::test]
    async fn switch_to_with_unconfirmed_without_staging_errors() {
        let store = InMemoryStore::new();
        assert!(store.switch_to_with_unconfirmed().await.is_err());
    }
}
