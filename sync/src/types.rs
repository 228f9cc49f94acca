use std::fmt;

use serde::{Deserialize, Serialize};

pub type BlockHash = [u8; 32];

/// Sparse anchor point along a peer's chain: a block named by height and
/// hash, without the header itself.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct BlockIdentifier {
    pub hash: BlockHash,
    pub number: u64,
}

impl BlockIdentifier {
    pub fn new(hash: BlockHash, number: u64) -> Self {
        Self { hash, number }
    }
}

/// Minimal view of an externally defined block header. The engine reads
/// nothing beyond height and hash; parent linkage goes through the host's
/// sync information.
pub trait Header: Clone + fmt::Debug + Send + 'static {
    fn hash(&self) -> BlockHash;

    fn number(&self) -> u64;
}

pub fn short_hash(hash: &BlockHash) -> String {
    hex::encode(&hash[..4])
}
