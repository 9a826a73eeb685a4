use ethereum_types::H256;
use thiserror::Error;

/// Class 4 and 5 errors from `spec.md` §7: missing state node is
/// recoverable by fetching the node and retrying the same block, anything
/// else is peer-attributable and carries the block number that failed.
#[derive(Debug, Error)]
pub enum BlockExecutionError {
    #[error("missing state trie node {hash:#x}")]
    MissingStateNode { hash: H256 },
    #[error("block {block_number} failed to execute: {message}")]
    Failed { block_number: u64, message: String },
}

/// Class 7: a structural problem with a batch of blocks, attributable to
/// whichever peer served them.
#[derive(Debug, Error)]
#[error("block validation failed: {0}")]
pub struct ValidationError(pub String);

#[derive(Debug, Error)]
pub enum ChainError {
    #[error("parent state not found for block {0}")]
    ParentStateNotFound(u64),
    #[error(transparent)]
    Execution(#[from] BlockExecutionError),
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Store(#[from] chain_storage::StoreError),
}
