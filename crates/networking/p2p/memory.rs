//! Test doubles for [`Transport`]. A real node supplies its RLPx
//! connection pool; this scripts canned wire responses for the Request
//! Driver's own tests.

use std::sync::{Arc, Mutex};

use chain_common::types::{BlockBody, BlockHeader};
use ethereum_types::H256;

use crate::transport::{HashOrNumber, Transport, TransportError};

#[derive(Debug, Default)]
pub struct StubTransport {
    pub headers: Option<Vec<BlockHeader>>,
    pub bodies: Option<Vec<BlockBody>>,
    pub node_data: Option<Vec<u8>>,
    pub fail_with_malformed: bool,
    pub fail_with_transport_error: bool,
    pub requests_seen: Mutex<Vec<H256>>,
}

#[async_trait::async_trait]
impl Transport for StubTransport {
    async fn get_block_headers(
        &self,
        peer_id: H256,
        _start: HashOrNumber,
        _count: u64,
        _skip: u64,
        _reverse: bool,
    ) -> Result<Vec<BlockHeader>, TransportError> {
        self.requests_seen.lock().expect("lock poisoned").push(peer_id);
        if self.fail_with_malformed {
            return Err(TransportError::Malformed);
        }
        if self.fail_with_transport_error {
            return Err(TransportError::Failed("connection reset".into()));
        }
        Ok(self.headers.clone().unwrap_or_default())
    }

    async fn get_block_bodies(
        &self,
        peer_id: H256,
        _hashes: &[H256],
    ) -> Result<Vec<BlockBody>, TransportError> {
        self.requests_seen.lock().expect("lock poisoned").push(peer_id);
        if self.fail_with_malformed {
            return Err(TransportError::Malformed);
        }
        if self.fail_with_transport_error {
            return Err(TransportError::Failed("connection reset".into()));
        }
        Ok(self.bodies.clone().unwrap_or_default())
    }

    async fn get_node_data(
        &self,
        peer_id: H256,
        _hash: H256,
    ) -> Result<Vec<u8>, TransportError> {
        self.requests_seen.lock().expect("lock poisoned").push(peer_id);
        if self.fail_with_malformed {
            return Err(TransportError::Malformed);
        }
        self.node_data.clone().ok_or(TransportError::Failed("no node data".into()))
    }
}

pub type SharedStubTransport = Arc<StubTransport>;
