//! The Peer Selector (`spec.md` §4.1): pick a peer for the next request
//! from among handshaked peers with higher total difficulty, biasing
//! towards the tip while tolerating one slow peer.

use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use chain_common::types::PeerInfo;
use ethereum_types::H256;
use rand::seq::SliceRandom;

/// A poisoned table means some other task panicked mid-mutation; the
/// `HashMap` itself is still structurally valid, so recover it rather than
/// taking the whole node down over peer bookkeeping.
fn read(lock: &RwLock<HashMap<H256, PeerEntry>>) -> RwLockReadGuard<'_, HashMap<H256, PeerEntry>> {
    lock.read().unwrap_or_else(|poisoned| poisoned.into_inner())
}

fn write(lock: &RwLock<HashMap<H256, PeerEntry>>) -> RwLockWriteGuard<'_, HashMap<H256, PeerEntry>> {
    lock.write().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// How many of the highest-difficulty usable peers to randomize among.
/// Biasing to the top preserves tip-freshness; randomizing among them
/// prevents hot-spotting a single peer and tolerates one slow peer at the
/// tip.
const TOP_K: usize = 3;

#[derive(Debug, Clone)]
struct PeerEntry {
    info: PeerInfo,
    blacklisted: bool,
}

#[derive(Debug, Default, Clone)]
pub struct PeerTable(Arc<RwLock<HashMap<H256, PeerEntry>>>);

impl PeerTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or updates a handshaked peer. Does not clear an existing
    /// blacklist — only `reset_blacklist_count` does that.
    pub fn upsert_peer(&self, peer_id: H256, info: PeerInfo) {
        let mut peers = write(&self.0);
        peers
            .entry(peer_id)
            .and_modify(|e| e.info = info)
            .or_insert(PeerEntry {
                info,
                blacklisted: false,
            });
    }

    pub fn remove_peer(&self, peer_id: H256) {
        write(&self.0).remove(&peer_id);
    }

    pub fn handshaked_peers(&self) -> HashMap<H256, PeerInfo> {
        read(&self.0).iter().map(|(id, entry)| (*id, entry.info)).collect()
    }

    /// A peer is usable iff `fork_accepted` is true and it is not
    /// blacklisted (`spec.md` §3).
    fn usable_peers(&self) -> Vec<(H256, PeerInfo)> {
        read(&self.0)
            .iter()
            .filter(|(_, entry)| entry.info.is_usable() && !entry.blacklisted)
            .map(|(id, entry)| (*id, entry.info))
            .collect()
    }

    /// Filter to usable peers, sort descending by total difficulty, take
    /// the top three, pick one uniformly at random.
    pub fn select_peer(&self) -> Option<H256> {
        select_top_k_random(self.usable_peers())
    }

    /// Same procedure over `usable_peers \ NodeErrorPeers`, used only for
    /// missing-state-node refetches (`spec.md` §4.1 "NodeOkPeer").
    pub fn select_node_ok_peer(&self, node_error_peers: &HashSet<H256>) -> Option<H256> {
        let candidates = self
            .usable_peers()
            .into_iter()
            .filter(|(id, _)| !node_error_peers.contains(id))
            .collect();
        select_top_k_random(candidates)
    }

    pub fn blacklist(&self, peer_id: H256, reason: &str, force: bool) {
        let mut peers = write(&self.0);
        if let Some(entry) = peers.get_mut(&peer_id) {
            entry.blacklisted = true;
        }
        tracing::warn!(%peer_id, reason, force, "blacklisting peer");
    }

    /// Emitted on every successful response to credit good behavior
    /// (`spec.md` §6).
    pub fn reset_blacklist_count(&self, peer_id: H256) {
        let mut peers = write(&self.0);
        if let Some(entry) = peers.get_mut(&peer_id) {
            entry.blacklisted = false;
        }
    }

    pub fn is_blacklisted(&self, peer_id: H256) -> bool {
        read(&self.0).get(&peer_id).map(|e| e.blacklisted).unwrap_or(false)
    }
}

fn select_top_k_random(mut candidates: Vec<(H256, PeerInfo)>) -> Option<H256> {
    candidates.sort_by(|a, b| b.1.total_difficulty.cmp(&a.1.total_difficulty));
    candidates.truncate(TOP_K);
    candidates
        .choose(&mut rand::thread_rng())
        .map(|(id, _)| *id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::U256;

    fn peer(td: u64) -> PeerInfo {
        PeerInfo {
            total_difficulty: U256::from(td),
            fork_accepted: true,
        }
    }

    #[test]
    fn selects_only_among_usable_peers() {
        let table = PeerTable::new();
        table.upsert_peer(H256::from_low_u64_be(1), peer(10));
        table.upsert_peer(
            H256::from_low_u64_be(2),
            PeerInfo {
                total_difficulty: U256::from(100),
                fork_accepted: false,
            },
        );

        // Only the fork-accepted peer is usable, regardless of TD.
        assert_eq!(table.select_peer(), Some(H256::from_low_u64_be(1)));
    }

    #[test]
    fn blacklisted_peer_is_excluded_until_reset() {
        let table = PeerTable::new();
        let peer_id = H256::from_low_u64_be(1);
        table.upsert_peer(peer_id, peer(10));
        table.blacklist(peer_id, "test", false);
        assert_eq!(table.select_peer(), None);

        table.reset_blacklist_count(peer_id);
        assert_eq!(table.select_peer(), Some(peer_id));
    }

    #[test]
    fn node_ok_peer_excludes_node_error_peers() {
        let table = PeerTable::new();
        let a = H256::from_low_u64_be(1);
        let b = H256::from_low_u64_be(2);
        table.upsert_peer(a, peer(10));
        table.upsert_peer(b, peer(20));

        let mut node_errors = HashSet::new();
        node_errors.insert(b);
        assert_eq!(table.select_node_ok_peer(&node_errors), Some(a));
    }

    #[test]
    fn empty_table_selects_nothing() {
        let table = PeerTable::new();
        assert_eq!(table.select_peer(), None);
    }
}
