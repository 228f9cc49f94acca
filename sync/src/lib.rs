pub mod chunks;
pub mod config;
pub mod error;
pub mod events;
pub mod headers;
pub mod service;
pub mod state;
pub mod test_utils;
pub mod types;

pub use chunks::{ChunkDescriptor, SkeletonDownloadHelper};
pub use config::SyncConfig;
pub use error::{SyncError, SyncResult};
pub use events::{SyncEventsHandler, SyncInformation};
pub use headers::DownloadingHeadersSyncState;
pub use service::{SyncEvent, SyncService};
pub use state::{IdleSyncState, SyncState};
pub use types::{BlockHash, BlockIdentifier, Header};
