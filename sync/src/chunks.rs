use serde::{Deserialize, Serialize};

use crate::error::{SyncError, SyncResult};
use crate::types::{BlockHash, BlockIdentifier};

/// One request unit: a run of `count` consecutive headers ending at the
/// block whose hash is `anchor_hash`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct ChunkDescriptor {
    pub anchor_hash: BlockHash,
    pub count: u32,
}

/// Owns the skeleton of a synchronization attempt and converts it into a
/// sequence of chunk descriptors, one adjacent identifier pair at a time.
#[derive(Debug)]
pub struct SkeletonDownloadHelper {
    chunk_size: u32,
    skeleton: Vec<BlockIdentifier>,
    connection_point: u64,
    next_link: usize,
    current: Option<ChunkDescriptor>,
}

impl SkeletonDownloadHelper {
    pub fn new(chunk_size: u32) -> Self {
        Self {
            chunk_size,
            skeleton: Vec::new(),
            connection_point: 0,
            next_link: 0,
            current: None,
        }
    }

    /// Installs the skeleton for one attempt and rewinds the chunk cursor to
    /// the first identifier pair. The skeleton is immutable afterwards.
    pub fn set_skeleton(
        &mut self,
        skeleton: Vec<BlockIdentifier>,
        connection_point: u64,
    ) -> SyncResult<()> {
        if skeleton.len() < 2 {
            return Err(SyncError::SkeletonTooShort(skeleton.len()));
        }
        if skeleton.windows(2).any(|pair| pair[0].number >= pair[1].number) {
            return Err(SyncError::SkeletonNotAscending);
        }
        self.skeleton = skeleton;
        self.connection_point = connection_point;
        self.next_link = 0;
        self.current = None;
        Ok(())
    }

    /// The descriptor most recently issued through `next_chunk`, if any.
    pub fn current_chunk(&self) -> Option<ChunkDescriptor> {
        self.current
    }

    pub fn has_next_chunk(&self) -> bool {
        self.next_link + 1 < self.skeleton.len()
    }

    /// Advances the cursor and returns the descriptor for the next adjacent
    /// identifier pair, lowest heights first.
    pub fn next_chunk(&mut self) -> SyncResult<ChunkDescriptor> {
        if !self.has_next_chunk() {
            return Err(SyncError::ChunksExhausted);
        }
        let lower = &self.skeleton[self.next_link];
        let upper = &self.skeleton[self.next_link + 1];
        let known_height = lower.number.max(self.connection_point);
        let count = upper
            .number
            .saturating_sub(known_height)
            .min(u64::from(self.chunk_size)) as u32;
        let chunk = ChunkDescriptor {
            anchor_hash: upper.hash,
            count,
        };
        self.current = Some(chunk);
        self.next_link += 1;
        Ok(chunk)
    }

    pub fn skeleton(&self) -> &[BlockIdentifier] {
        &self.skeleton
    }
}
