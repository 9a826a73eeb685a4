//! The Request Driver (`spec.md` §4.2): issues header, body, and
//! state-node requests with timeouts, and turns the response into the
//! three-way outcome the Header/Body Processors drive off of.

use std::{collections::HashSet, sync::Arc, time::Duration};

use chain_common::types::{BlockBody, BlockHeader};
use ethereum_types::H256;
use thiserror::Error;

pub use crate::transport::HashOrNumber;
use crate::{peer_table::PeerTable, transport::Transport, transport::TransportError};

/// 10s fixed timeout for state-node refetches (`spec.md` §4.2).
pub const NODE_DATA_TIMEOUT: Duration = Duration::from_secs(10);

/// Amortizes per-body deserialization latency (`spec.md` §4.2).
pub const PER_BODY_TIMEOUT_MS: u64 = 100;

#[derive(Debug, Error)]
pub enum PeerHandlerError {
    #[error("no usable peer available")]
    NoUsablePeer,
    #[error("peer {peer_id:#x} sent a malformed or invalid response")]
    PeerMisbehaved { peer_id: H256 },
    #[error("peer {peer_id:#x} timed out")]
    Timeout { peer_id: H256 },
    #[error("transport failure with peer {peer_id:#x}: {message}")]
    Transport { peer_id: H256, message: String },
}

#[derive(Debug, Clone)]
pub struct PeerHandler {
    pub peer_table: PeerTable,
    transport: Arc<dyn Transport>,
}

impl PeerHandler {
    pub fn new(peer_table: PeerTable, transport: Arc<dyn Transport>) -> Self {
        Self {
            peer_table,
            transport,
        }
    }

    /// `requestHeaders(peer, start, count, skip, reverse) → Option<BlockHeadersResponse>`,
    /// `Ok(None)` meaning "no usable peer" (schedule a delayed resume per
    /// `spec.md` §7 class 3), `Ok(Some((peer, _)))` a usable response
    /// (the responding peer is returned alongside it, since the Header
    /// Processor's `ProcessBlockHeaders(peer, headers)` event needs it),
    /// and `Err` the two blacklist-worthy classes.
    pub async fn request_headers(
        &self,
        start: HashOrNumber,
        count: u64,
        skip: u64,
        reverse: bool,
        timeout: Duration,
    ) -> Result<Option<(H256, Vec<BlockHeader>)>, PeerHandlerError> {
        let Some(peer_id) = self.peer_table.select_peer() else {
            return Ok(None);
        };
        match tokio::time::timeout(
            timeout,
            self.transport
                .get_block_headers(peer_id, start, count, skip, reverse),
        )
        .await
        {
            Ok(Ok(headers)) => {
                self.peer_table.reset_blacklist_count(peer_id);
                Ok(Some((peer_id, headers)))
            }
            Ok(Err(TransportError::Malformed)) => {
                Err(PeerHandlerError::PeerMisbehaved { peer_id })
            }
            Ok(Err(TransportError::Failed(message))) => {
                Err(PeerHandlerError::Transport { peer_id, message })
            }
            Err(_elapsed) => Err(PeerHandlerError::Timeout { peer_id }),
        }
    }

    /// `requestBodies(peer, hashes) → Option<BlockBodiesResponse>`. Timeout
    /// is `syncRequestTimeout + 100ms * |hashes|`.
    pub async fn request_bodies(
        &self,
        hashes: &[H256],
        sync_request_timeout: Duration,
    ) -> Result<Option<(H256, Vec<BlockBody>)>, PeerHandlerError> {
        let Some(peer_id) = self.peer_table.select_peer() else {
            return Ok(None);
        };
        let timeout =
            sync_request_timeout + Duration::from_millis(PER_BODY_TIMEOUT_MS * hashes.len() as u64);
        match tokio::time::timeout(timeout, self.transport.get_block_bodies(peer_id, hashes)).await
        {
            Ok(Ok(bodies)) => {
                self.peer_table.reset_blacklist_count(peer_id);
                Ok(Some((peer_id, bodies)))
            }
            Ok(Err(TransportError::Malformed)) => {
                Err(PeerHandlerError::PeerMisbehaved { peer_id })
            }
            Ok(Err(TransportError::Failed(message))) => {
                Err(PeerHandlerError::Transport { peer_id, message })
            }
            Err(_elapsed) => Err(PeerHandlerError::Timeout { peer_id }),
        }
    }

    /// `requestNodeData(peer, hash) → Option<NodeDataResponse>`. Only
    /// considers peers outside `node_error_peers` (the `NodeOkPeer`
    /// variant of the Peer Selector).
    pub async fn request_node_data(
        &self,
        hash: H256,
        node_error_peers: &HashSet<H256>,
    ) -> Result<Option<Vec<u8>>, PeerHandlerError> {
        let Some(peer_id) = self.peer_table.select_node_ok_peer(node_error_peers) else {
            return Ok(None);
        };
        match tokio::time::timeout(
            NODE_DATA_TIMEOUT,
            self.transport.get_node_data(peer_id, hash),
        )
        .await
        {
            Ok(Ok(data)) => {
                self.peer_table.reset_blacklist_count(peer_id);
                Ok(Some(data))
            }
            Ok(Err(TransportError::Malformed)) => {
                Err(PeerHandlerError::PeerMisbehaved { peer_id })
            }
            Ok(Err(TransportError::Failed(message))) => {
                Err(PeerHandlerError::Transport { peer_id, message })
            }
            Err(_elapsed) => Err(PeerHandlerError::Timeout { peer_id }),
        }
    }

    pub fn blacklist_peer(&self, peer_id: H256, reason: &str, force: bool) {
        self.peer_table.blacklist(peer_id, reason, force);
    }
}

impl PeerHandlerError {
    /// The peer to blame, when the error class carries one. `NoUsablePeer`
    /// never reaches here since the request functions return `Ok(None)`
    /// for it instead.
    pub fn peer_id(&self) -> Option<H256> {
        match self {
            PeerHandlerError::NoUsablePeer => None,
            PeerHandlerError::PeerMisbehaved { peer_id }
            | PeerHandlerError::Timeout { peer_id }
            | PeerHandlerError::Transport { peer_id, .. } => Some(*peer_id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::StubTransport;
    use chain_common::types::PeerInfo;
    use ethereum_types::U256;

    fn header(number: u64, hash: u8, parent: u8) -> BlockHeader {
        BlockHeader {
            number,
            hash: H256::from_low_u64_be(hash as u64),
            parent_hash: H256::from_low_u64_be(parent as u64),
            difficulty: U256::from(1),
            gas_used: 0,
            gas_limit: 30_000_000,
            timestamp: 0,
        }
    }

    fn handler_with_peer(transport: StubTransport) -> (PeerHandler, H256) {
        let table = PeerTable::new();
        let peer_id = H256::from_low_u64_be(1);
        table.upsert_peer(
            peer_id,
            PeerInfo {
                total_difficulty: U256::from(10),
                fork_accepted: true,
            },
        );
        (PeerHandler::new(table, Arc::new(transport)), peer_id)
    }

    #[tokio::test]
    async fn no_peer_returns_none_without_error() {
        let handler = PeerHandler::new(PeerTable::new(), Arc::new(StubTransport::default()));
        let result = handler
            .request_headers(HashOrNumber::Number(1), 1, 0, false, Duration::from_secs(1))
            .await
            .expect("should not error");
        assert!(result.is_none());
    }

    #[tokio::test]
    async fn successful_response_resets_blacklist_count() {
        let mut transport = StubTransport::default();
        transport.headers = Some(vec![header(1, 1, 0)]);
        let (handler, peer_id) = handler_with_peer(transport);
        handler.blacklist_peer(peer_id, "pretend misbehavior", false);
        assert!(handler.peer_table.is_blacklisted(peer_id));

        let (responder, headers) = handler
            .request_headers(HashOrNumber::Number(1), 1, 0, false, Duration::from_secs(1))
            .await
            .expect("should succeed")
            .expect("should have headers");
        assert_eq!(responder, peer_id);
        assert_eq!(headers.len(), 1);
        assert!(!handler.peer_table.is_blacklisted(peer_id));
    }

    #[tokio::test]
    async fn malformed_response_is_reported_for_blacklisting() {
        let mut transport = StubTransport::default();
        transport.fail_with_malformed = true;
        let (handler, peer_id) = handler_with_peer(transport);

        let err = handler
            .request_headers(HashOrNumber::Number(1), 1, 0, false, Duration::from_secs(1))
            .await
            .expect_err("should error");
        assert!(matches!(
            err,
            PeerHandlerError::PeerMisbehaved { peer_id: id } if id == peer_id
        ));
    }
}
