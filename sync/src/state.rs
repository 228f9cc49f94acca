use tracing::warn;

use crate::events::{SyncEventsHandler, SyncInformation};
use crate::types::Header;

/// Lifecycle shared by every synchronization state. The dispatcher owns one
/// state at a time and routes events to it; states never name their
/// successor, every transition out happens through a handler action.
pub trait SyncState<H: Header>: Send {
    fn on_enter(&mut self, _events: &mut dyn SyncEventsHandler<H>) {}

    fn on_headers(
        &mut self,
        _info: &dyn SyncInformation<H>,
        _events: &mut dyn SyncEventsHandler<H>,
        chunk: Vec<H>,
    ) {
        warn!(len = chunk.len(), "dropping unexpected block headers message");
    }

    fn on_timeout(&mut self, events: &mut dyn SyncEventsHandler<H>) {
        warn!("timed out waiting for peer response");
        events.stop_syncing();
    }

    fn is_syncing(&self) -> bool;
}

/// Resting state between synchronization attempts.
#[derive(Clone, Copy, Debug, Default)]
pub struct IdleSyncState;

impl IdleSyncState {
    pub fn new() -> Self {
        Self
    }
}

impl<H: Header> SyncState<H> for IdleSyncState {
    fn on_timeout(&mut self, _events: &mut dyn SyncEventsHandler<H>) {}

    fn is_syncing(&self) -> bool {
        false
    }
}
