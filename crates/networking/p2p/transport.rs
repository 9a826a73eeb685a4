//! The seam onto the peer-to-peer wire transport and handshake layer,
//! which `spec.md` §1 explicitly places out of scope. A real node plugs in
//! its RLPx (or equivalent) connection pool here; this crate only needs
//! the three request shapes the Request Driver issues.

use std::fmt::Debug;

use chain_common::types::{BlockBody, BlockHeader};
use ethereum_types::H256;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashOrNumber {
    Number(u64),
    Hash(H256),
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("peer sent a malformed or invalid response")]
    Malformed,
    #[error("transport failure: {0}")]
    Failed(String),
}

/// Raw wire operations against a single already-handshaked peer. No
/// timeout or peer-selection logic lives here — that is [`crate::PeerHandler`]'s
/// job; this trait is a dumb pipe.
#[async_trait::async_trait]
pub trait Transport: Debug + Send + Sync {
    async fn get_block_headers(
        &self,
        peer_id: H256,
        start: HashOrNumber,
        count: u64,
        skip: u64,
        reverse: bool,
    ) -> Result<Vec<BlockHeader>, TransportError>;

    async fn get_block_bodies(
        &self,
        peer_id: H256,
        hashes: &[H256],
    ) -> Result<Vec<BlockBody>, TransportError>;

    async fn get_node_data(
        &self,
        peer_id: H256,
        hash: H256,
    ) -> Result<Vec<u8>, TransportError>;
}
