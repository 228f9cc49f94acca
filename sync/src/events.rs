use crate::chunks::ChunkDescriptor;
use crate::types::Header;

/// Chain-context queries the engine delegates to its host.
pub trait SyncInformation<H: Header> {
    /// True when `header` is a direct child of `parent` on the candidate
    /// chain.
    fn is_valid_parent_child(&self, header: &H, parent: &H) -> bool;
}

/// Action surface of the synchronization machine. States effect everything
/// through this handler: issuing requests, aborting the attempt, advancing
/// to the next download stage. Peer scoring and banning on abort belong to
/// the implementor.
pub trait SyncEventsHandler<H: Header> {
    /// Asks the peer for the headers described by `chunk`.
    fn request_headers(&mut self, chunk: ChunkDescriptor);

    /// Aborts the current synchronization attempt.
    fn stop_syncing(&mut self);

    /// Hands a fully validated, ascending run of headers to body download.
    fn start_body_download(&mut self, headers: Vec<H>);

    /// Restarts the response deadline after a productive step.
    fn reset_timeout(&mut self);
}
