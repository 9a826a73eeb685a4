//! The Scheduler (`spec.md` §4.8): `resumeRegularSync()`'s immediate tick
//! and `scheduleResume()`'s single-shot, self-cancelling timer, using
//! `send_after` the way `L1Committer::schedule_commit` does.

use chain_p2p::HashOrNumber;
use spawned_concurrency::tasks::{send_after, CastResponse, GenServerHandle};

use crate::engine::{Message, SyncEngine};

impl SyncEngine {
    /// Arms a single-shot timer that cancels and replaces any previously
    /// scheduled one (the dedup key `ResumeRegularSyncTask` of `spec.md`
    /// §4.8, one cancellation token standing in for it).
    pub(crate) fn schedule_resume(&mut self, handle: GenServerHandle<Self>) {
        if let Some(token) = self.resume_token.take() {
            token.cancel();
        }
        let delayed = send_after(
            self.config.check_for_new_block_interval,
            handle,
            Message::ResumeRegularSyncTick,
        );
        self.resume_token = Some(delayed.cancellation_token);
    }

    /// `resumeRegularSync()`: clears `WorkingHeaders` and issues a fresh
    /// forward header request starting just past the local tip
    /// (`spec.md` §4.8 — "on every resume tick, WorkingHeaders is cleared
    /// and a fresh header request is issued").
    pub(crate) async fn do_resume(&mut self, handle: GenServerHandle<Self>) -> CastResponse {
        if let Some(token) = self.resume_token.take() {
            token.cancel();
        }
        if self.request_in_flight {
            tracing::debug!("resume suppressed, a request is already in flight");
            return CastResponse::NoReply;
        }

        self.working_headers.clear();
        let best = match self.store.best_block_number().await {
            Ok(best) => best,
            Err(err) => return self.fatal(format!("failed to read best block number: {err}")),
        };

        self.request_in_flight = true;
        let peer_handler = self.peer_handler.clone();
        let count = self.config.block_headers_per_request;
        let timeout = self.config.sync_request_timeout;
        tokio::spawn(async move {
            let outcome = peer_handler
                .request_headers(HashOrNumber::Number(best + 1), count, 0, false, timeout)
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
        CastResponse::NoReply
    }
}
