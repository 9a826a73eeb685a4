use ethereum_types::H256;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("block header not found for number {0}")]
    HeaderNotFound(u64),
    #[error("total difficulty not found for block hash {0:#x}")]
    MissingTotalDifficulty(H256),
    #[error("unconfirmed staging area is empty, nothing to clear")]
    NothingUnconfirmed,
    #[error("state trie node {0:#x} not found")]
    MissingNode(H256),
    #[error("backend error: {0}")]
    Backend(String),
}
