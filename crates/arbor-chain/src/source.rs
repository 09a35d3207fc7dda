use async_trait::async_trait;

use arbor_types::BlockNumber;

use crate::error::ChainResult;
use crate::event::CommitmentEvent;

/// Inbound side of the chain: decoded commitment events in block order.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Current head of the chain.
    async fn latest_block(&self) -> ChainResult<BlockNumber>;

    /// Every commitment event in `[from, to]`, ordered by block.
    async fn fetch(&self, from: BlockNumber, to: BlockNumber) -> ChainResult<Vec<CommitmentEvent>>;
}
