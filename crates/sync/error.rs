use thiserror::Error;

/// The error taxonomy of `spec.md` §7. Classes 1, 2, 5 and 7 (peer
/// protocol, timeout/transport, block-execution-other, and
/// validation-before-exec) are all peer-attributable and handled the same
/// way by the engine: blacklist and resume, so they are not split into
/// separate variants here — the caller already knows which one it is from
/// the [`chain_p2p::PeerHandlerError`] or [`chain_blockchain::ChainError`]
/// it is converting from. Class 3 (`NoUsablePeer`) and class 4
/// (`MissingStateNode`) are not errors at all in this engine's control
/// flow — they are handled as `Ok(None)` / a dedicated retry path, per
/// `spec.md` §4.2 and §4.4 — so they never reach `SyncError`.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error(transparent)]
    Store(#[from] chain_storage::StoreError),

    #[error(transparent)]
    Chain(#[from] chain_blockchain::ChainError),

    #[error(transparent)]
    Peer(#[from] chain_p2p::PeerHandlerError),

    /// Class 6: storage corruption. The process logs at `error!` and
    /// aborts rather than retrying — see `spec.md` §7.6.
    #[error("invariant violated: {0}")]
    Invariant(String),
}
