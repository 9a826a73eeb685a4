//! `spec.md` §3: the engine's tentative in-memory chain segment, pending
//! body fetch and execution. The adjacency invariant is enforced on every
//! mutation rather than trusted by convention — see `spec.md` §8's
//! "after any `ProcessBlockHeaders` that returns control, `WorkingHeaders`
//! satisfies the adjacency invariant".

use std::collections::VecDeque;

use chain_common::types::BlockHeader;

/// Checks the invariant from `spec.md` §3: for all adjacent `(h_i,
/// h_{i+1})`, `h_i.hash == h_{i+1}.parentHash` and `h_i.number + 1 ==
/// h_{i+1}.number`.
pub fn is_adjacent_chain(headers: &[BlockHeader]) -> bool {
    headers
        .windows(2)
        .all(|pair| pair[0].hash() == pair[1].parent_hash && pair[0].number + 1 == pair[1].number)
}

#[derive(Debug, Default, Clone)]
pub struct WorkingHeaders(VecDeque<BlockHeader>);

impl WorkingHeaders {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn head(&self) -> Option<&BlockHeader> {
        self.0.front()
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockHeader> {
        self.0.iter()
    }

    pub fn as_vec(&self) -> Vec<BlockHeader> {
        self.0.iter().cloned().collect()
    }

    /// Adopts `headers` as the entire working chain (`spec.md` §4.3,
    /// transition 2). Caller is responsible for having already validated
    /// `is_adjacent_chain(&headers)`.
    pub fn adopt(&mut self, headers: Vec<BlockHeader>) {
        debug_assert!(is_adjacent_chain(&headers));
        self.0 = headers.into();
    }

    /// Prepends a backward-walked batch to the current front — the
    /// fork-resolve rejoin case (`spec.md` §4.3, transition 3):
    /// `WorkingHeaders := headers ++ WorkingHeaders`.
    pub fn prepend(&mut self, headers: Vec<BlockHeader>) {
        debug_assert!(is_adjacent_chain(&headers));
        let mut merged: VecDeque<BlockHeader> = headers.into();
        merged.append(&mut self.0);
        self.0 = merged;
    }

    /// Drops the first `count` headers from the front, once they have
    /// been successfully executed and persisted (`spec.md` §4.4).
    pub fn drop_front(&mut self, count: usize) {
        for _ in 0..count.min(self.0.len()) {
            self.0.pop_front();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethereum_types::{H256, U256};

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

    #[test]
    fn adopt_then_drop_front_preserves_adjacency() {
        let mut working = WorkingHeaders::new();
        working.adopt(vec![header(1, 1, 0), header(2, 2, 1), header(3, 3, 2)]);
        assert_eq!(working.len(), 3);

        working.drop_front(2);
        assert_eq!(working.len(), 1);
        assert_eq!(working.head().map(|h| h.number), Some(3));
    }

    #[test]
    fn prepend_joins_at_the_front() {
        let mut working = WorkingHeaders::new();
        working.adopt(vec![header(5, 5, 4)]);
        working.prepend(vec![header(3, 3, 2), header(4, 4, 3)]);

        let numbers: Vec<u64> = working.iter().map(|h| h.number).collect();
        assert_eq!(numbers, vec![3, 4, 5]);
        assert!(is_adjacent_chain(&working.as_vec()));
    }

    #[test]
    fn non_adjacent_batch_is_rejected_by_the_checker() {
        assert!(!is_adjacent_chain(&[header(1, 1, 0), header(3, 3, 2)]));
    }
}
