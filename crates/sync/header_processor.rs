//! The Header Processor (`spec.md` §4.3) — the central state machine.
//! Driven entirely by the `ProcessBlockHeaders(peer, headers)` event; see
//! the module doc on [`crate::engine`] for how responses re-enter here.

use chain_common::types::{Block, BlockHeader};
use chain_p2p::HashOrNumber;
use chain_storage::StoreError;
use ethereum_types::{H256, U256};
use spawned_concurrency::tasks::{CastResponse, GenServerHandle};

use crate::engine::{Message, SyncEngine};
use crate::reorg::{self, ReorgDecision};
use crate::working_headers::is_adjacent_chain;

async fn get_prev_blocks(
    store: &dyn chain_storage::Store,
    headers: &[BlockHeader],
) -> Result<Vec<Block>, StoreError> {
    let mut prefix = Vec::new();
    for header in headers {
        match store.block_by_number(header.number).await? {
            Some(block) => prefix.push(block),
            None => break,
        }
    }
    Ok(prefix)
}

impl SyncEngine {
    /// Dispatches on the four transitions of `spec.md` §4.3.
    pub(crate) async fn process_block_headers(
        &mut self,
        handle: GenServerHandle<Self>,
        peer: H256,
        headers: Vec<BlockHeader>,
    ) -> CastResponse {
        if self.working_headers.is_empty() {
            if headers.is_empty() {
                // Transition 1: nothing new, we are at tip.
                self.schedule_resume(handle);
                return CastResponse::NoReply;
            }
            // Transition 2: adopt wholesale.
            return self.do_process(handle, peer, headers).await;
        }

        // Transition 3: does the new batch's newest header join our
        // current front? `headers` is oldest-first, so its last element is
        // the one closest to the working chain.
        let joins_front = match (headers.last(), self.working_headers.head()) {
            (Some(last), Some(head)) => last.hash() == head.parent_hash,
            _ => false,
        };

        if joins_front {
            return self.do_process(handle, peer, headers).await;
        }

        // Transition 4: the peer did not serve the predecessor we asked for.
        self.blacklist(peer, "did not serve the requested predecessor", false);
        self.do_resume(handle).await
    }

    /// *doProcess*: `checkHeaders`, then branch on whether the batch
    /// extends the local chain (common prefix) or diverges from it.
    async fn do_process(
        &mut self,
        handle: GenServerHandle<Self>,
        peer: H256,
        headers: Vec<BlockHeader>,
    ) -> CastResponse {
        if !is_adjacent_chain(&headers) {
            self.blacklist(peer, "non-adjacent header batch", false);
            return self.do_resume(handle).await;
        }

        // Adopt/prepend now that the batch has passed `checkHeaders`.
        if self.working_headers.is_empty() {
            self.working_headers.adopt(headers.clone());
        } else {
            self.working_headers.prepend(headers.clone());
        }

        let first = headers[0].clone();
        let local_parent = match self
            .store
            .block_header_by_number(first.number.saturating_sub(1))
            .await
        {
            Ok(parent) => parent,
            Err(err) => return self.fatal(format!("failed to look up local parent header: {err}")),
        };

        let Some(local_parent) = local_parent else {
            self.blacklist(peer, "no local parent for header batch", false);
            return self.do_resume(handle).await;
        };

        if local_parent.hash() == first.parent_hash {
            self.handle_common_prefix(handle).await
        } else if self.under_reorg {
            // Already walking backward and still no join: the contested
            // branch goes deeper than `blockResolveDepth`.
            self.blacklist(peer, "fork-resolve backward walk did not rejoin", true);
            self.do_resume(handle).await
        } else {
            self.under_reorg = true;
            self.issue_backward_headers(handle, first.parent_hash);
            CastResponse::NoReply
        }
    }

    /// Decides commit/reject over the *entire* merged working chain, not
    /// just whichever batch last arrived — `self.working_headers` already
    /// holds the full contested branch by the time this runs, since
    /// `do_process` adopts or prepends into it before dispatching here.
    async fn handle_common_prefix(&mut self, handle: GenServerHandle<Self>) -> CastResponse {
        let working = self.working_headers.as_vec();
        let old_branch = match get_prev_blocks(self.store.as_ref(), &working).await {
            Ok(blocks) => blocks,
            Err(err) => return self.fatal(format!("failed to collect displaced branch: {err}")),
        };

        let old_td: U256 = old_branch.iter().fold(U256::zero(), |acc, b| acc + b.header.difficulty);
        let new_td: U256 = working.iter().fold(U256::zero(), |acc, h| acc + h.difficulty);

        match reorg::decide(old_td, new_td) {
            ReorgDecision::Commit => {
                if self.under_reorg {
                    if let Err(err) = self.store.clear_unconfirmed().await {
                        return self.fatal(format!("clear_unconfirmed failed mid-reorg: {err}"));
                    }
                }
                self.under_reorg = false;

                let displaced_txs = reorg::displaced_transactions(&old_branch);
                self.mempool.add(displaced_txs).await;
                if let Some(displaced_head) = old_branch.first() {
                    self.uncles.add(vec![displaced_head.header.clone()]).await;
                }

                self.request_bodies(handle)
            }
            ReorgDecision::Reject => {
                if let Some(head) = working.first() {
                    self.uncles.add(vec![head.clone()]).await;
                }
                self.under_reorg = false;
                self.do_resume(handle).await
            }
        }
    }

    /// ForkResolving: walk backward from the contested parent, bounded by
    /// `blockResolveDepth`. The response re-enters `process_block_headers`,
    /// where transition 3 re-attaches it.
    fn issue_backward_headers(&mut self, handle: GenServerHandle<Self>, parent_hash: H256) {
        if self.request_in_flight {
            tracing::debug!("backward header request suppressed, one already in flight");
            return;
        }
        self.request_in_flight = true;
        let peer_handler = self.peer_handler.clone();
        let depth = self.config.block_resolve_depth;
        let timeout = self.config.sync_request_timeout;
        tokio::spawn(async move {
            let outcome = peer_handler
                .request_headers(HashOrNumber::Hash(parent_hash), depth, 0, true, timeout)
                .await;
            let msg = match outcome {
                Ok(Some((peer, headers))) => Message::ProcessBlockHeaders { peer, headers },
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
    }
}
