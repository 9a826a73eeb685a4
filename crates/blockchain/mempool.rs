use std::{
    collections::HashSet,
    fmt::Debug,
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use chain_common::types::Transaction;
use ethereum_types::H256;

fn read(lock: &RwLock<HashSet<H256>>) -> RwLockReadGuard<'_, HashSet<H256>> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write(lock: &RwLock<HashSet<H256>>) -> RwLockWriteGuard<'_, HashSet<H256>> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// The pending-transaction pool the engine reinjects displaced
/// transactions into on a committed reorg (`spec.md` §4.3, §4.6) and prunes
/// from on every successfully executed block (`spec.md` §4.5).
#[async_trait::async_trait]
pub trait PendingTxPool: Debug + Send + Sync {
    async fn add(&self, txs: Vec<Transaction>);
    async fn remove(&self, txs: &[Transaction]);
}

#[derive(Debug, Default, Clone)]
pub struct Mempool(Arc<RwLock<HashSet<H256>>>);

impl Mempool {
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
impl PendingTxPool for Mempool {
    async fn add(&self, txs: Vec<Transaction>) {
        let mut pool = write(&self.0);
        for tx in txs {
            pool.insert(tx.hash);
        }
    }

    async fn remove(&self, txs: &[Transaction]) {
        let mut pool = write(&self.0);
        for tx in txs {
            pool.remove(&tx.hash);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(hash: u8) -> Transaction {
        Transaction {
            hash: H256::from_low_u64_be(hash as u64),
            payload: vec![],
        }
    }

    #[tokio::test]
    async fn add_then_remove() {
        let pool = Mempool::new();
        pool.add(vec![tx(1), tx(2)]).await;
        assert_eq!(pool.len(), 2);
        assert!(pool.contains(H256::from_low_u64_be(1)));

        pool.remove(&[tx(1)]).await;
        assert_eq!(pool.len(), 1);
        assert!(!pool.contains(H256::from_low_u64_be(1)));
    }

    #[tokio::test]
    async fn reinjecting_a_displaced_transaction_is_idempotent() {
        let pool = Mempool::new();
        pool.add(vec![tx(1)]).await;
        pool.add(vec![tx(1)]).await;
        assert_eq!(pool.len(), 1);
    }
}
