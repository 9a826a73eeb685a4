//! Test doubles for [`Ledger`]. Not a second execution engine — a way to
//! script execution outcomes (success, a given error class) for the sync
//! engine's own tests without pulling in a real EVM.

use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex},
};

use chain_common::types::Block;
use ethereum_types::H256;

use crate::{BlockExecutionError, BlockExecutionOutcome, Ledger, ValidationError};

#[derive(Debug, Default, Clone)]
pub struct MockLedger {
    /// Per-block-hash canned execution results, consumed once.
    results: Arc<Mutex<HashMap<H256, Result<BlockExecutionOutcome, BlockExecutionError>>>>,
    /// If set, `validate_blocks_before_execution` truncates the input to
    /// this many blocks and returns the given error.
    validation_failure: Arc<Mutex<Option<(usize, ValidationError)>>>,
    pub executed: Arc<Mutex<VecDeque<H256>>>,
}

impl MockLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_block(&self, hash: H256, err: BlockExecutionError) {
        self.results.lock().expect("lock poisoned").insert(hash, Err(err));
    }

    pub fn fail_validation_after(&self, valid_count: usize, err: ValidationError) {
        *self.validation_failure.lock().expect("lock poisoned") = Some((valid_count, err));
    }
}

#[async_trait::async_trait]
impl Ledger for MockLedger {
    async fn execute_block(
        &self,
        block: &Block,
    ) -> Result<BlockExecutionOutcome, BlockExecutionError> {
        self.executed
            .lock()
            .expect("lock poisoned")
            .push_back(block.hash());
        match self.results.lock().expect("lock poisoned").remove(&block.hash()) {
            Some(result) => result,
            None => Ok(BlockExecutionOutcome::default()),
        }
    }

    async fn validate_blocks_before_execution(
        &self,
        blocks: &[Block],
    ) -> (Vec<Block>, Option<ValidationError>) {
        match self.validation_failure.lock().expect("lock poisoned").take() {
            Some((valid_count, err)) => {
                let valid_count = valid_count.min(blocks.len());
                (blocks[..valid_count].to_vec(), Some(err))
            }
            None => (blocks.to_vec(), None),
        }
    }
}
