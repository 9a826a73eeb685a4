//! The Executor Pipeline (`spec.md` §4.5): a sequential fold over a batch
//! of blocks. No parallelism is possible across blocks in the same batch —
//! the ledger's running total difficulty and persisted state from block
//! *i* are preconditions for block *i+1*.

use chain_blockchain::{ChainError, Ledger};
use chain_blockchain::{PendingTxPool, UnclePool};
use chain_common::types::{Block, NewBlock};
use chain_storage::Store;
use ethereum_types::U256;

/// `(lastGoodTd, successes, Option<error>)` from `spec.md` §4.5. On error,
/// `successes` holds every block persisted before the failing one —
/// subsequent blocks in the batch are never attempted.
pub struct ExecutionOutcome {
    pub last_td: U256,
    pub successes: Vec<NewBlock>,
    pub error: Option<ChainError>,
}

pub async fn execute_blocks(
    ledger: &dyn Ledger,
    store: &dyn Store,
    mempool: &dyn PendingTxPool,
    uncles: &dyn UnclePool,
    blocks: Vec<Block>,
    parent_td: U256,
) -> ExecutionOutcome {
    let mut td = parent_td;
    let mut successes = Vec::with_capacity(blocks.len());

    for block in blocks {
        let outcome = match ledger.execute_block(&block).await {
            Ok(outcome) => outcome,
            Err(err) => {
                return ExecutionOutcome {
                    last_td: td,
                    successes,
                    error: Some(ChainError::from(err)),
                };
            }
        };

        td += block.header.difficulty;

        if let Err(err) = store
            .save_new_block(block.clone(), outcome.world, outcome.receipts, td)
            .await
        {
            return ExecutionOutcome {
                last_td: td,
                successes,
                error: Some(ChainError::from(err)),
            };
        }

        mempool.remove(&block.body.transactions).await;
        let mut displaced_from_uncles = block.body.uncles.clone();
        displaced_from_uncles.push(block.header.clone());
        uncles.remove(&displaced_from_uncles).await;

        successes.push(NewBlock {
            block,
            total_difficulty: td,
        });
    }

    ExecutionOutcome {
        last_td: td,
        successes,
        error: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_blockchain::error::BlockExecutionError;
    use chain_blockchain::memory::MockLedger;
    use chain_blockchain::mempool::Mempool;
    use chain_blockchain::uncles::Uncles;
    use chain_common::types::{BlockBody, BlockHeader};
    use chain_storage::memory::InMemoryStore;
    use ethereum_types::H256;

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
    async fn executes_sequentially_and_carries_td_forward() {
        let ledger = MockLedger::new();
        let store = InMemoryStore::new();
        let mempool = Mempool::new();
        let uncles = Uncles::new();
        let blocks = vec![
            Block {
                header: header(1, 1, 0, 10),
                body: BlockBody::default(),
            },
            Block {
                header: header(2, 2, 1, 20),
                body: BlockBody::default(),
            },
        ];

        let outcome = execute_blocks(&ledger, &store, &mempool, &uncles, blocks, U256::from(100)).await;

        assert!(outcome.error.is_none());
        assert_eq!(outcome.successes.len(), 2);
        assert_eq!(outcome.last_td, U256::from(130));
        assert_eq!(store.best_block_number().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn halts_on_first_failure_and_keeps_the_persisted_prefix() {
        let ledger = MockLedger::new();
        let store = InMemoryStore::new();
        let mempool = Mempool::new();
        let uncles = Uncles::new();
        let bad_hash = H256::from_low_u64_be(2);
        ledger.fail_block(
            bad_hash,
            BlockExecutionError::Failed {
                block_number: 2,
                message: "boom".into(),
            },
        );
        let blocks = vec![
            Block {
                header: header(1, 1, 0, 10),
                body: BlockBody::default(),
            },
            Block {
                header: header(2, 2, 1, 20),
                body: BlockBody::default(),
            },
            Block {
                header: header(3, 3, 2, 30),
                body: BlockBody::default(),
            },
        ];

        let outcome = execute_blocks(&ledger, &store, &mempool, &uncles, blocks, U256::from(0)).await;

        assert_eq!(outcome.successes.len(), 1);
        assert!(outcome.error.is_some());
        assert_eq!(store.best_block_number().await.unwrap(), 1);
    }
}
