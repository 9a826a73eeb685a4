//! Storage interface: the on-disk chain state the sync engine persists to
//! and reads from, but never owns. See `spec.md` §6 and §3 ("Persisted
//! state").
//!
//! The engine only ever mutates this state through [`Store`]; the concrete
//! backend (its locking, its atomicity guarantees for [`Store::save_new_block`])
//! is that backend's own responsibility, not the sync engine's.

pub mod error;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

use std::fmt::Debug;

use chain_common::types::{Block, BlockHeader};
use ethereum_types::{H256, U256};

pub use error::StoreError;

/// Opaque state diff produced by executing a block. The sync engine never
/// inspects its contents; it only threads it from the ledger to the store.
#[derive(Debug, Clone, Default)]
pub struct StateUpdate(pub Vec<u8>);

/// Opaque per-block receipts, as produced by the ledger and persisted
/// alongside the block.
#[derive(Debug, Clone, Default)]
pub struct Receipts(pub Vec<u8>);

// We need async_trait because the stabilized feature lacks support for
// object safety (i.e. dyn Store).
#[async_trait::async_trait]
pub trait Store: Debug + Send + Sync {
    /// The local canonical head's block number.
    async fn best_block_number(&self) -> Result<u64, StoreError>;

    async fn total_difficulty_by_hash(&self, hash: H256) -> Result<Option<U256>, StoreError>;

    async fn block_header_by_number(
        &self,
        number: u64,
    ) -> Result<Option<BlockHeader>, StoreError>;

    async fn block_by_number(&self, number: u64) -> Result<Option<Block>, StoreError>;

    /// Atomically persists a block, its post-execution state diff, its
    /// receipts, and its total difficulty. A crash between this returning
    /// and the caller broadcasting the block must leave a consistent chain.
    async fn save_new_block(
        &self,
        block: Block,
        state_update: StateUpdate,
        receipts: Receipts,
        total_difficulty: U256,
    ) -> Result<(), StoreError>;

    /// Marks the unconfirmed staging area (populated by a reorg in
    /// progress) as the new canonical view.
    async fn switch_to_with_unconfirmed(&self) -> Result<(), StoreError>;

    /// Discards the unconfirmed staging area. Called when a reorg commits
    /// on top of a chain that was already `isUnderReorg`.
    async fn clear_unconfirmed(&self) -> Result<(), StoreError>;

    /// Writes a single state trie node, fetched to satisfy a
    /// `MissingStateNode` execution error.
    async fn put_node(&self, hash: H256, data: Vec<u8>) -> Result<(), StoreError>;

    async fn fast_sync_done(&self) -> Result<bool, StoreError>;
}
