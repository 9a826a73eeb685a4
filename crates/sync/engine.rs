//! The engine itself: a single-threaded cooperative actor (`spec.md` §5)
//! wired together as a [`GenServer`] — the same actor abstraction the
//! teacher codebase uses for its sequencer components. `WorkingHeaders`,
//! `isUnderReorg`, and `NodeErrorPeers` (`spec.md` §3) are owned
//! exclusively by this struct and mutated only from inside `handle_cast`.

use std::collections::HashSet;
use std::sync::Arc;

use chain_blockchain::{Ledger, PendingTxPool, UnclePool};
use chain_common::types::Block;
use chain_p2p::{Broadcaster, PeerHandler};
use chain_storage::Store;
use ethereum_types::H256;
use spawned_concurrency::messages::Unused;
use spawned_concurrency::tasks::{CastResponse, GenServer, GenServerHandle};
use tokio_util::sync::CancellationToken;

use crate::config::SyncConfig;
use crate::error::SyncError;
use crate::working_headers::WorkingHeaders;

/// All of this engine's external collaborators (`spec.md` §6), plus the
/// tuning knobs of §6's "Configuration".
pub struct SyncEngine {
    pub(crate) store: Arc<dyn Store>,
    pub(crate) ledger: Arc<dyn Ledger>,
    pub(crate) peer_handler: PeerHandler,
    pub(crate) mempool: Arc<dyn PendingTxPool>,
    pub(crate) uncles: Arc<dyn UnclePool>,
    pub(crate) broadcaster: Arc<dyn Broadcaster>,
    pub(crate) config: SyncConfig,

    pub(crate) working_headers: WorkingHeaders,
    pub(crate) under_reorg: bool,
    pub(crate) node_error_peers: HashSet<H256>,
    /// Structurally enforces "only one header-or-body request in flight
    /// per engine instance at a time" (`spec.md` §5): every request-issuing
    /// path checks this before spawning, and every response/timeout path
    /// that resolves an in-flight request clears it again.
    pub(crate) request_in_flight: bool,
    /// The dedup key for `scheduleResume` (`spec.md` §4.8): a newer
    /// schedule cancels the older one, the `L1Committer::schedule_commit`
    /// pattern.
    pub(crate) resume_token: Option<CancellationToken>,
}

#[derive(Debug, Clone)]
pub enum Message {
    ResumeRegularSyncTick,
    ProcessBlockHeaders { peer: H256, headers: Vec<chain_common::types::BlockHeader> },
    ProcessBlockBodies { peer: H256, bodies: Vec<chain_common::types::BlockBody> },
    MinedBlock(Block),
    ReceivedMessage { peer: H256, tag: String },
    /// Internal continuations — every asynchronous completion re-enters
    /// the mailbox as a tagged event rather than continuing inline
    /// (`spec.md` §9's "do not callback-chain").
    NoUsablePeer,
    ScheduleResume,
    NodeDataFetched { hash: H256, data: Option<Vec<u8>> },
    NodeDataFailed { peer: H256 },
}

#[derive(Debug, Clone)]
pub enum OutMessage {
    Ack,
}

impl SyncEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store: Arc<dyn Store>,
        ledger: Arc<dyn Ledger>,
        peer_handler: PeerHandler,
        mempool: Arc<dyn PendingTxPool>,
        uncles: Arc<dyn UnclePool>,
        broadcaster: Arc<dyn Broadcaster>,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            ledger,
            peer_handler,
            mempool,
            uncles,
            broadcaster,
            config,
            working_headers: WorkingHeaders::new(),
            under_reorg: false,
            node_error_peers: HashSet::new(),
            request_in_flight: false,
            resume_token: None,
        }
    }

    pub(crate) fn blacklist(&self, peer: H256, reason: &str, force: bool) {
        self.peer_handler.blacklist_peer(peer, reason, force);
    }

    /// Class 6 of `spec.md` §7: storage corruption. Logs and aborts rather
    /// than retrying, instead of silently limping on with a GenServer that
    /// looks alive but can no longer make progress.
    pub(crate) fn fatal(&self, reason: String) -> CastResponse {
        tracing::error!(reason = %reason, "sync engine invariant violated, aborting");
        std::process::exit(1)
    }

    async fn handle_mined_block(&mut self, block: Block) -> CastResponse {
        match self.store.best_block_number().await {
            Ok(best) if block.number() <= best => {
                tracing::debug!(number = block.number(), "ignoring already-persisted mined block");
            }
            Ok(_) => {
                // `spec.md` §9: `processMinedBlock` is commented out in the
                // source and left a stub here too.
                tracing::debug!(number = block.number(), "mined-block handling is not yet implemented");
            }
            Err(err) => {
                tracing::warn!(%err, "failed to read best block number while handling mined block");
            }
        }
        CastResponse::NoReply
    }
}

/// Starts the engine and fires its first `ResumeRegularSyncTick`.
pub async fn spawn(
    store: Arc<dyn Store>,
    ledger: Arc<dyn Ledger>,
    peer_handler: PeerHandler,
    mempool: Arc<dyn PendingTxPool>,
    uncles: Arc<dyn UnclePool>,
    broadcaster: Arc<dyn Broadcaster>,
    config: SyncConfig,
) -> Result<GenServerHandle<SyncEngine>, SyncError> {
    let state = SyncEngine::new(store, ledger, peer_handler, mempool, uncles, broadcaster, config);
    let handle = state.start();
    handle.clone().cast(Message::ResumeRegularSyncTick).await?;
    Ok(handle)
}

impl GenServer for SyncEngine {
    type CallMsg = Unused;
    type CastMsg = Message;
    type OutMsg = OutMessage;
    type Error = SyncError;

    async fn handle_cast(
        &mut self,
        message: Self::CastMsg,
        handle: &GenServerHandle<Self>,
    ) -> CastResponse {
        match message {
            Message::ResumeRegularSyncTick => self.do_resume(handle.clone()).await,
            Message::ScheduleResume => {
                self.request_in_flight = false;
                self.schedule_resume(handle.clone());
                CastResponse::NoReply
            }
            Message::NoUsablePeer => {
                self.request_in_flight = false;
                self.schedule_resume(handle.clone());
                CastResponse::NoReply
            }
            Message::ProcessBlockHeaders { peer, headers } => {
                self.request_in_flight = false;
                self.process_block_headers(handle.clone(), peer, headers).await
            }
            Message::ProcessBlockBodies { peer, bodies } => {
                self.request_in_flight = false;
                self.process_block_bodies(handle.clone(), peer, bodies).await
            }
            Message::NodeDataFetched { hash, data } => {
                self.request_in_flight = false;
                self.handle_node_data(handle.clone(), hash, data).await
            }
            Message::NodeDataFailed { peer } => {
                self.request_in_flight = false;
                self.node_error_peers.insert(peer);
                self.do_resume(handle.clone()).await
            }
            Message::MinedBlock(block) => self.handle_mined_block(block).await,
            Message::ReceivedMessage { peer, tag } => {
                tracing::debug!(%peer, tag = %tag, "received message");
                CastResponse::NoReply
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_blockchain::memory::MockLedger;
    use chain_blockchain::mempool::Mempool;
    use chain_blockchain::uncles::Uncles;
    use chain_common::types::{BlockBody, BlockHeader};
    use chain_p2p::memory::StubTransport;
    use chain_p2p::PeerTable;
    use chain_storage::memory::InMemoryStore;
    use ethereum_types::U256;
    use std::time::Duration;

    fn header(number: u64, hash: u8, parent: u8, difficulty: u64) -> BlockHeader {
        BlockHeader {
            number,
            hash: H256::from_low_u64_be(hash as u64),
            parent_hash: H256::from_low_u64_be(parent as u64),
            difficulty: U256::from(difficulty),
            gas_used: 0,
            gas_limit: 30_000_000,
            timestamp: 0,
        }
    }

    fn test_config() -> SyncConfig {
        SyncConfig {
            block_headers_per_request: 8,
            block_bodies_per_request: 8,
            block_resolve_depth: 8,
            sync_request_timeout: Duration::from_millis(200),
            check_for_new_block_interval: Duration::from_millis(50),
        }
    }

    #[tokio::test]
    async fn happy_tip_follow_persists_and_broadcasts() {
        let store = InMemoryStore::new();
        let genesis = Block {
            header: header(100, 100, 99, 1_000),
            body: BlockBody::default(),
        };
        store.seed(genesis, U256::from(1_000));

        let next_headers: Vec<BlockHeader> = (101..=103).map(|n| header(n, n as u8, (n - 1) as u8, 10)).collect();
        let next_bodies = vec![BlockBody::default(); next_headers.len()];

        let peer_table = PeerTable::new();
        let peer_id = H256::from_low_u64_be(1);
        peer_table.upsert_peer(
            peer_id,
            chain_common::types::PeerInfo {
                total_difficulty: U256::from(1_000),
                fork_accepted: true,
            },
        );
        let transport = StubTransport {
            headers: Some(next_headers),
            bodies: Some(next_bodies),
            ..Default::default()
        };
        let peer_handler = PeerHandler::new(peer_table, Arc::new(transport));

        let broadcaster = chain_p2p::broadcaster::ChannelBroadcaster::new();
        let mut broadcast_rx = broadcaster.subscribe();

        let handle = spawn(
            Arc::new(store.clone()),
            Arc::new(MockLedger::new()),
            peer_handler,
            Arc::new(Mempool::new()),
            Arc::new(Uncles::new()),
            Arc::new(broadcaster),
            test_config(),
        )
        .await
        .expect("spawn");
        let _ = handle;

        let broadcast = tokio::time::timeout(Duration::from_secs(2), broadcast_rx.recv())
            .await
            .expect("broadcast should arrive")
            .expect("channel open");
        assert_eq!(broadcast.len(), 3);
        assert_eq!(store.best_block_number().await.unwrap(), 103);
    }
}
