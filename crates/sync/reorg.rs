//! The Reorg Coordinator (`spec.md` §4.6): decides whether a divergent
//! branch replaces the local one, and what happens to what gets displaced.
//! Kept as pure decision/collection helpers; the actual store/pool/uncle
//! mutations are driven from [`crate::header_processor`], which owns the
//! async side effects and `isUnderReorg` bookkeeping.

use chain_common::types::{Block, Transaction};
use ethereum_types::U256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReorgDecision {
    Commit,
    Reject,
}

/// `spec.md` §4.3, §9: the comparison is strictly `newTd > oldTd`; the
/// `==` case is rejected, preserved from the open question in the source.
pub fn decide(old_td: U256, new_td: U256) -> ReorgDecision {
    if new_td > old_td {
        ReorgDecision::Commit
    } else {
        ReorgDecision::Reject
    }
}

/// Transactions carried by every displaced block, to be reinjected into
/// the pending pool before any new body is fetched (`spec.md` §4.6) —
/// they may still be valid on the new branch.
pub fn displaced_transactions(old_branch: &[Block]) -> Vec<Transaction> {
    old_branch
        .iter()
        .flat_map(|block| block.body.transactions.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equal_total_difficulty_is_rejected() {
        assert_eq!(decide(U256::from(10), U256::from(10)), ReorgDecision::Reject);
    }

    #[test]
    fn strictly_greater_commits() {
        assert_eq!(decide(U256::from(10), U256::from(11)), ReorgDecision::Commit);
    }

    #[test]
    fn lesser_is_rejected() {
        assert_eq!(decide(U256::from(10), U256::from(9)), ReorgDecision::Reject);
    }
}
