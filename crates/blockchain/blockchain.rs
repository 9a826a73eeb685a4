//! Ledger interface and the pending-tx / uncle pools the sync engine
//! replays transactions into and demotes discarded blocks to. See
//! `spec.md` §6 ("Ledger", "Pools").
//!
//! The actual EVM/state-transition logic is out of scope (`spec.md` §1);
//! this crate only types the contract the sync engine calls through.

pub mod error;
pub mod mempool;
pub mod uncles;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

use std::fmt::Debug;

use chain_common::types::Block;
use chain_storage::{Receipts, StateUpdate};

pub use error::{BlockExecutionError, ChainError, ValidationError};
pub use mempool::PendingTxPool;
pub use uncles::UnclePool;

/// `stats` carries execution telemetry that the engine logs but never acts
/// on — see `spec.md` §6.
#[derive(Debug, Clone, Default)]
pub struct ExecutionStats {
    pub db_read_time_perc: f64,
    pub parallel_rate: f64,
    pub cache_hit_rate: f64,
    pub cache_read_count: u64,
}

#[derive(Debug, Clone, Default)]
pub struct BlockExecutionOutcome {
    pub world: StateUpdate,
    pub gas_used: u64,
    pub receipts: Receipts,
    pub stats: ExecutionStats,
}

// We need async_trait because the stabilized feature lacks support for
// object safety (i.e. dyn Ledger).
#[async_trait::async_trait]
pub trait Ledger: Debug + Send + Sync {
    async fn execute_block(
        &self,
        block: &Block,
    ) -> Result<BlockExecutionOutcome, BlockExecutionError>;

    /// Returns the longest valid prefix of `blocks` and, if validation
    /// stopped early, the error that halted it. The prefix (which may be
    /// the whole input, or empty) is what the caller should still attempt
    /// to execute.
    async fn validate_blocks_before_execution(
        &self,
        blocks: &[Block],
    ) -> (Vec<Block>, Option<ValidationError>);
}
