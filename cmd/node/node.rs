mod cli;
mod initializers;

use std::sync::Arc;

use chain_blockchain::mempool::Mempool;
use chain_blockchain::memory::MockLedger;
use chain_blockchain::uncles::Uncles;
use chain_common::types::{Block, BlockBody, BlockHeader};
use chain_p2p::broadcaster::ChannelBroadcaster;
use chain_p2p::memory::StubTransport;
use chain_p2p::{PeerHandler, PeerTable};
use chain_storage::memory::InMemoryStore;
use clap::Parser;
use ethereum_types::{H256, U256};

use cli::Options;

/// A node binary wiring the sync engine to the reference collaborators
/// this workspace ships: an in-memory store, a no-op ledger, and a stub
/// wire transport. The real store, ledger, and transport are external
/// collaborators out of this crate's scope; swapping them in only
/// requires satisfying the `Store`, `Ledger`, and `Transport` traits.
#[tokio::main]
async fn main() -> eyre::Result<()> {
    let opts = Options::parse();
    initializers::init_tracing(&opts);

    let store = Arc::new(InMemoryStore::new());
    store.seed(genesis_block(), U256::zero());

    let peer_table = PeerTable::new();
    let peer_handler = PeerHandler::new(peer_table, Arc::new(StubTransport::default()));

    let handle = chain_sync::spawn(
        store,
        Arc::new(MockLedger::new()),
        peer_handler,
        Arc::new(Mempool::new()),
        Arc::new(Uncles::new()),
        Arc::new(ChannelBroadcaster::new()),
        opts.sync_config(),
    )
    .await?;

    tracing::info!("sync engine started, waiting for shutdown signal");
    tokio::signal::ctrl_c().await?;
    tracing::info!("shutting down");
    drop(handle);
    Ok(())
}

fn genesis_block() -> Block {
    Block {
        header: BlockHeader {
            number: 0,
            hash: H256::zero(),
            parent_hash: H256::zero(),
            difficulty: U256::zero(),
            gas_used: 0,
            gas_limit: 30_000_000,
            timestamp: 0,
        },
        body: BlockBody::default(),
    }
}
