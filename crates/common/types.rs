use ethereum_types::{H256, U256};
use serde::{Deserialize, Serialize};

/// A block header as received from a peer. Immutable once received: the
/// `hash` field is fixed at construction time and never recomputed, since
/// the hashing scheme itself is delegated to the ledger/wire layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockHeader {
    pub number: u64,
    pub hash: H256,
    pub parent_hash: H256,
    pub difficulty: U256,
    pub gas_used: u64,
    pub gas_limit: u64,
    pub timestamp: u64,
}

impl BlockHeader {
    pub fn hash(&self) -> H256 {
        self.hash
    }
}

/// A transaction is opaque to the sync engine: it is only ever moved
/// between the pending-tx pool and a block body, never inspected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub hash: H256,
    pub payload: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct BlockBody {
    pub transactions: Vec<Transaction>,
    pub uncles: Vec<BlockHeader>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Block {
    pub header: BlockHeader,
    pub body: BlockBody,
}

impl Block {
    pub fn hash(&self) -> H256 {
        self.header.hash
    }

    pub fn number(&self) -> u64 {
        self.header.number
    }
}

/// The externally broadcast form of an accepted block: the block plus the
/// total difficulty of the chain ending at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBlock {
    pub block: Block,
    pub total_difficulty: U256,
}

/// What the engine knows about a handshaked peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerInfo {
    pub total_difficulty: U256,
    pub fork_accepted: bool,
}

impl PeerInfo {
    /// A peer is usable iff it accepted our fork-id and isn't blacklisted.
    /// Blacklisting itself is tracked by the peer table, not this struct.
    pub fn is_usable(&self) -> bool {
        self.fork_accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(number: u64, hash: u8, parent: u8) -> BlockHeader {
        BlockHeader {
            number,
            hash: H256::from_low_u64_be(hash as u64),
            parent_hash: H256::from_low_u64_be(parent as u64),
            difficulty: U256::from(10),
            gas_used: 0,
            gas_limit: 30_000_000,
            timestamp: 0,
        }
    }

    #[test]
    fn block_hash_delegates_to_header() {
        let h = header(1, 1, 0);
        let block = Block {
            header: h.clone(),
            body: BlockBody::default(),
        };
        assert_eq!(block.hash(), h.hash());
        assert_eq!(block.number(), 1);
    }

    #[test]
    fn peer_not_usable_without_fork_accept() {
        let peer = PeerInfo {
            total_difficulty: U256::from(1),
            fork_accepted: false,
        };
        assert!(!peer.is_usable());
    }
}
