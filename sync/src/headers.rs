use std::mem;

use tracing::{info, warn};

use crate::chunks::SkeletonDownloadHelper;
use crate::config::SyncConfig;
use crate::error::SyncResult;
use crate::events::{SyncEventsHandler, SyncInformation};
use crate::state::SyncState;
use crate::types::{short_hash, BlockIdentifier, Header};

/// Downloads the header run covered by a discovered skeleton, chunk by
/// chunk, validating chain continuity as responses arrive.
///
/// Chunks are requested lowest heights first and each response arrives
/// newest-first: its first element must hash to the requested anchor, which
/// is also what ties consecutive chunks together. The pending queue grows
/// strictly ascending and is handed downstream only once every chunk has
/// been accepted; any inconsistency aborts the whole attempt instead.
pub struct DownloadingHeadersSyncState<H> {
    skeleton_helper: SkeletonDownloadHelper,
    pending_headers: Vec<H>,
}

impl<H: Header> DownloadingHeadersSyncState<H> {
    pub fn new(
        config: &SyncConfig,
        skeleton: Vec<BlockIdentifier>,
        connection_point: u64,
    ) -> SyncResult<Self> {
        let mut skeleton_helper = SkeletonDownloadHelper::new(config.chunk_size);
        skeleton_helper.set_skeleton(skeleton, connection_point)?;
        Ok(Self {
            skeleton_helper,
            pending_headers: Vec::new(),
        })
    }

    pub fn skeleton(&self) -> &[BlockIdentifier] {
        self.skeleton_helper.skeleton()
    }
}

impl<H: Header> SyncState<H> for DownloadingHeadersSyncState<H> {
    fn on_enter(&mut self, events: &mut dyn SyncEventsHandler<H>) {
        match self.skeleton_helper.next_chunk() {
            Ok(chunk) => events.request_headers(chunk),
            Err(err) => {
                // set_skeleton guarantees a first pair; reaching this means
                // the state was entered twice.
                warn!(%err, "no chunk available on entry");
                events.stop_syncing();
            }
        }
    }

    fn on_headers(
        &mut self,
        info: &dyn SyncInformation<H>,
        events: &mut dyn SyncEventsHandler<H>,
        chunk: Vec<H>,
    ) {
        let Some(expected) = self.skeleton_helper.current_chunk() else {
            warn!("block headers received with no outstanding request");
            events.stop_syncing();
            return;
        };
        if chunk.len() != expected.count as usize
            || chunk
                .first()
                .is_none_or(|first| first.hash() != expected.anchor_hash)
        {
            warn!(
                expected = expected.count,
                received = chunk.len(),
                anchor = %short_hash(&expected.anchor_hash),
                "invalid block headers response"
            );
            events.stop_syncing();
            return;
        }

        // Non-empty past the anchor check. The last element is the oldest
        // header of the chunk and connects to the run accepted so far.
        self.pending_headers.push(chunk[chunk.len() - 1].clone());

        for pair in chunk.windows(2).rev() {
            let (header, parent) = (&pair[0], &pair[1]);
            if !info.is_valid_parent_child(header, parent) {
                warn!(
                    number = header.number(),
                    hash = %short_hash(&header.hash()),
                    "header fails parent linkage check"
                );
                events.stop_syncing();
                return;
            }
            self.pending_headers.push(header.clone());
        }

        if self.skeleton_helper.has_next_chunk() {
            events.reset_timeout();
            match self.skeleton_helper.next_chunk() {
                Ok(chunk) => events.request_headers(chunk),
                Err(err) => {
                    warn!(%err, "chunk cursor out of step");
                    events.stop_syncing();
                }
            }
            return;
        }

        info!(
            headers = self.pending_headers.len(),
            "verified all header chunks"
        );
        events.start_body_download(mem::take(&mut self.pending_headers));
    }

    fn is_syncing(&self) -> bool {
        true
    }
}
