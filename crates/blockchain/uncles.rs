use std::{
    collections::HashSet,
    fmt::Debug,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use chain_common::types::BlockHeader;
use ethereum_types::H256;

fn read(lock: &RwLock<HashSet<H256>>) -> RwLockReadGuard<'_, HashSet<H256>> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write(lock: &RwLock<HashSet<H256>>) -> RwLockWriteGuard<'_, HashSet<H256>> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The uncle (ommer) pool. A displaced branch head is offered here instead
/// of discarded (`spec.md` §4.3, §4.6); a block's header and all of its own
/// uncles are removed from here once that block is persisted (`spec.md`
/// §4.5).
#[async_trait::async_trait]
pub trait UnclePool: Debug + Send + Sync {
    async fn add(&self, headers: Vec<BlockHeader>);
    async fn remove(&self, headers: &[BlockHeader]);
}

#[derive(Debug, Default, Clone)]
pub struct Uncles(Arc<RwLock<HashSet<H256>>>);

impl Uncles {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, hash: H256) -> bool {
        read(&self.0).contains(&hash)
    }

    pub fn len(&self) -> usize {
        read(&self.0).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait::async_trait]
impl UnclePool for Uncles {
    async fn add(&self, headers: Vec<BlockHeader>) {
        let mut uncles = write(&self.0);
        for header in headers {
            uncles.insert(header.hash());
        }
    }

    async fn remove(&self, headers: &[BlockHeader]) {
        let mut uncles = write(&self.0);
        for header in headers {
            uncles.remove(&header.hash());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::U256;

    fn header(hash: u8) -> BlockHeader {
        BlockHeader {
            number: 1,
            hash: H256::from_low_u64_be(hash as u64),
            parent_hash: H256::zero(),
            difficulty: U256::from(1),
            gas_used: 0,
            gas_limit: 30_000_000,
            timestamp: 0,
        }
    }

    #[tokio::test]
    async fn a_displaced_head_can_be_added_and_cleared() {
        let uncles = Uncles::new();
        uncles.add(vec![header(1)]).await;
        assert!(uncles.contains(H256::from_low_u64_be(1)));

        uncles.remove(&[header(1)]).await;
        assert!(uncles.is_empty());
    }
}
