//! Peer bookkeeping, the Peer Selector, the Request Driver, and the
//! Broadcaster — `spec.md` §4.1, §4.2, §4.7.
//!
//! The RLPx wire transport and handshake themselves are out of scope
//! (`spec.md` §1): [`Transport`] is this crate's seam onto that external
//! collaborator.

pub mod broadcaster;
pub mod peer_handler;
pub mod peer_table;
pub mod transport;
#[cfg(any(test, feature = "test-utils"))]
pub mod memory;

pub use broadcaster::Broadcaster;
pub use peer_handler::{HashOrNumber, PeerHandler, PeerHandlerError};
pub use peer_table::PeerTable;
pub use transport::{Transport, TransportError};
