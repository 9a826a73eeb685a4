//! The Broadcaster (`spec.md` §4.7): publishes accepted blocks cluster-wide
//! on `NewBlockTopic`. Peer-aware "don't resend to a peer that already
//! knows this block" is a noted future optimization, not required here.

use std::fmt::Debug;

use chain_common::types::NewBlock;
use tokio::sync::broadcast;

pub const NEW_BLOCK_TOPIC_CAPACITY: usize = 256;

#[async_trait::async_trait]
pub trait Broadcaster: Debug + Send + Sync {
    async fn publish(&self, blocks: Vec<NewBlock>);
}

/// Minimal cluster-wide pub/sub stand-in: a broadcast channel any number of
/// subscribers can drain. The real cluster-wide mediator is an external
/// collaborator (`spec.md` §1); this is a workable default, not a mock.
#[derive(Debug, Clone)]
pub struct ChannelBroadcaster {
    sender: broadcast::Sender<Vec<NewBlock>>,
}

impl Default for ChannelBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

impl ChannelBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(NEW_BLOCK_TOPIC_CAPACITY);
        Self { sender }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Vec<NewBlock>> {
        self.sender.subscribe()
    }
}

#[async_trait::async_trait]
impl Broadcaster for ChannelBroadcaster {
    async fn publish(&self, blocks: Vec<NewBlock>) {
        // No subscribers is a normal, not an error, state.
        let _ = self.sender.send(blocks);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chain_common::types::{Block, BlockBody, BlockHeader};
    use ethereum_types::{H256, U256};

    fn new_block(number: u64) -> NewBlock {
        NewBlock {
            block: Block {
                header: BlockHeader {
                    number,
                    hash: H256::from_low_u64_be(number),
                    parent_hash: H256::from_low_u64_be(number - 1),
                    difficulty: U256::from(1),
                    gas_used: 0,
                    gas_limit: 30_000_000,
                    timestamp: 0,
                },
                body: BlockBody::default(),
            },
            total_difficulty: U256::from(number),
        }
    }

    #[tokio::test]
    async fn subscribers_receive_published_batches() {
        let broadcaster = ChannelBroadcaster::new();
        let mut rx = broadcaster.subscribe();

        broadcaster.publish(vec![new_block(1)]).await;

        let received = rx.recv().await.expect("should receive");
        assert_eq!(received.len(), 1);
        assert_eq!(received[0].block.number(), 1);
    }

    #[tokio::test]
    async fn publishing_with_no_subscribers_does_not_panic() {
        let broadcaster = ChannelBroadcaster::new();
        broadcaster.publish(vec![new_block(1)]).await;
    }
}
