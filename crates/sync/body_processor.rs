//! The Body Processor and the driver of the Executor Pipeline
//! (`spec.md` §4.4). Pairs bodies with the prefix of `WorkingHeaders`,
//! pre-validates, then hands the valid prefix to [`crate::executor`].

use chain_blockchain::error::{BlockExecutionError, ChainError};
use chain_common::types::{Block, BlockBody, BlockHeader};
use ethereum_types::H256;
use spawned_concurrency::tasks::{CastResponse, GenServerHandle};

use crate::engine::{Message, SyncEngine};
use crate::executor;

impl SyncEngine {
    pub(crate) async fn process_block_bodies(
        &mut self,
        handle: GenServerHandle<Self>,
        peer: H256,
        bodies: Vec<BlockBody>,
    ) -> CastResponse {
        if bodies.is_empty() || self.working_headers.is_empty() {
            self.blacklist(peer, "empty body batch or no working headers", false);
            return self.do_resume(handle).await;
        }

        let headers: Vec<BlockHeader> = self.working_headers.iter().take(bodies.len()).cloned().collect();
        let paired: Vec<Block> = headers
            .into_iter()
            .zip(bodies)
            .map(|(header, body)| Block { header, body })
            .collect();

        let (valid_blocks, validation_error) = self.ledger.validate_blocks_before_execution(&paired).await;
        if valid_blocks.is_empty() {
            self.blacklist(peer, "block batch failed validation", false);
            return self.do_resume(handle).await;
        }

        let parent_hash = valid_blocks[0].header.parent_hash;
        let parent_td = match self.store.total_difficulty_by_hash(parent_hash).await {
            Ok(Some(td)) => td,
            Ok(None) => {
                return self.fatal(format!(
                    "missing total difficulty for parent {parent_hash:#x} of block {}",
                    valid_blocks[0].number()
                ));
            }
            Err(err) => return self.fatal(format!("failed to read parent total difficulty: {err}")),
        };

        let outcome = executor::execute_blocks(
            self.ledger.as_ref(),
            self.store.as_ref(),
            self.mempool.as_ref(),
            self.uncles.as_ref(),
            valid_blocks,
            parent_td,
        )
        .await;

        if !outcome.successes.is_empty() {
            self.broadcaster.publish(outcome.successes.clone()).await;
            self.working_headers.drop_front(outcome.successes.len());
        }

        match outcome.error {
            None => {
                if let Some(_validation_error) = validation_error {
                    self.blacklist(peer, "block batch failed validation", false);
                    self.do_resume(handle).await
                } else if self.working_headers.is_empty() {
                    self.schedule_resume(handle);
                    CastResponse::NoReply
                } else {
                    self.request_bodies(handle)
                }
            }
            Some(ChainError::Execution(BlockExecutionError::MissingStateNode { hash })) => {
                self.fetch_missing_node(handle, hash);
                CastResponse::NoReply
            }
            Some(ChainError::Store(err)) => self.fatal(format!("atomic block save failed: {err}")),
            Some(_other) => {
                self.blacklist(peer, "block execution failed", false);
                self.do_resume(handle).await
            }
        }
    }

    pub(crate) fn request_bodies(&mut self, handle: GenServerHandle<Self>) -> CastResponse {
        let headers: Vec<BlockHeader> = self
            .working_headers
            .iter()
            .take(self.config.block_bodies_per_request as usize)
            .cloned()
            .collect();

        if headers.is_empty() {
            self.schedule_resume(handle);
            return CastResponse::NoReply;
        }

        if self.request_in_flight {
            tracing::debug!("body request suppressed, one already in flight");
            return CastResponse::NoReply;
        }
        self.request_in_flight = true;

        let hashes: Vec<H256> = headers.iter().map(|h| h.hash()).collect();
        let peer_handler = self.peer_handler.clone();
        let timeout = self.config.sync_request_timeout;
        tokio::spawn(async move {
            let outcome = peer_handler.request_bodies(&hashes, timeout).await;
            let msg = match outcome {
                Ok(Some((peer, bodies))) => Message::ProcessBlockBodies { peer, bodies },
                Ok(None) => Message::NoUsablePeer,
                Err(err) => {
                    if let Some(peer_id) = err.peer_id() {
                        peer_handler.blacklist_peer(peer_id, &err.to_string(), false);
                    }
                    Message::ScheduleResume
                }
            };
            let _ = handle.cast(msg).await;
        });
        CastResponse::NoReply
    }

    /// Class 4 of `spec.md` §7: fetch the missing trie node from a
    /// node-healthy peer, then resume regardless of outcome — the next
    /// cycle either has the node and retries cleanly, or tries a different
    /// peer next time (`spec.md` §4.4).
    pub(crate) fn fetch_missing_node(&mut self, handle: GenServerHandle<Self>, hash: H256) {
        self.request_in_flight = true;
        let peer_handler = self.peer_handler.clone();
        let node_error_peers = self.node_error_peers.clone();
        tokio::spawn(async move {
            let outcome = peer_handler.request_node_data(hash, &node_error_peers).await;
            let msg = match outcome {
                Ok(Some(data)) => Message::NodeDataFetched { hash, data: Some(data) },
                Ok(None) => Message::NodeDataFetched { hash, data: None },
                Err(err) => match err.peer_id() {
                    Some(peer_id) => Message::NodeDataFailed { peer: peer_id },
                    None => Message::NodeDataFetched { hash, data: None },
                },
            };
            let _ = handle.cast(msg).await;
        });
    }

    pub(crate) async fn handle_node_data(
        &mut self,
        handle: GenServerHandle<Self>,
        hash: H256,
        data: Option<Vec<u8>>,
    ) -> CastResponse {
        if let Some(bytes) = data {
            if let Err(err) = self.store.put_node(hash, bytes).await {
                return self.fatal(format!("failed to persist fetched state node: {err}"));
            }
        }
        self.do_resume(handle).await
    }
}
