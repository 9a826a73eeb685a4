//! Domain types shared by the storage, ledger, peer, and sync crates.
//!
//! These are plain data types with no behavior of their own — the engine
//! that gives them meaning lives in `chain-sync`.

pub mod types;

pub use ethereum_types::{H256, U256};
pub use types::{Block, BlockBody, BlockHeader, NewBlock, PeerInfo};
