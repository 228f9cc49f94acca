use thiserror::Error;

#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum SyncError {
    #[error("skeleton needs at least two identifiers, got {0}")]
    SkeletonTooShort(usize),
    #[error("skeleton identifiers must increase strictly by number")]
    SkeletonNotAscending,
    #[error("no chunks left in skeleton")]
    ChunksExhausted,
}

pub type SyncResult<T> = Result<T, SyncError>;
