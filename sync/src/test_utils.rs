//! Deterministic fixtures shared by the unit and integration tests.

use crate::chunks::ChunkDescriptor;
use crate::events::{SyncEventsHandler, SyncInformation};
use crate::types::{BlockHash, BlockIdentifier, Header};

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct TestHeader {
    pub number: u64,
    pub hash: BlockHash,
    pub parent_hash: BlockHash,
}

impl Header for TestHeader {
    fn hash(&self) -> BlockHash {
        self.hash
    }

    fn number(&self) -> u64 {
        self.number
    }
}

pub fn test_hash(number: u64) -> BlockHash {
    let mut hash = [0xabu8; 32];
    hash[..8].copy_from_slice(&number.to_le_bytes());
    hash
}

/// Headers `1..=len`, chained onto a genesis block numbered zero.
pub fn header_chain(len: u64) -> Vec<TestHeader> {
    (1..=len)
        .map(|number| TestHeader {
            number,
            hash: test_hash(number),
            parent_hash: test_hash(number - 1),
        })
        .collect()
}

pub fn identifier_at(number: u64) -> BlockIdentifier {
    BlockIdentifier::new(test_hash(number), number)
}

/// Serves the run of headers a descriptor asks for, newest first.
pub fn chunk_response(chain: &[TestHeader], chunk: &ChunkDescriptor) -> Vec<TestHeader> {
    let anchor = chain
        .iter()
        .position(|header| header.hash == chunk.anchor_hash)
        .expect("anchor not part of the test chain");
    let start = anchor + 1 - chunk.count as usize;
    let mut headers = chain[start..=anchor].to_vec();
    headers.reverse();
    headers
}

/// Parent linkage check over the deterministic hash chain.
#[derive(Clone, Copy, Debug, Default)]
pub struct TestChain;

impl SyncInformation<TestHeader> for TestChain {
    fn is_valid_parent_child(&self, header: &TestHeader, parent: &TestHeader) -> bool {
        header.parent_hash == parent.hash && header.number == parent.number + 1
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum RecordedEvent {
    HeadersRequest(ChunkDescriptor),
    StoppedSyncing,
    BodyDownload(Vec<TestHeader>),
    TimeoutReset,
}

/// Events handler that records every action for later assertions.
#[derive(Debug, Default)]
pub struct RecordingEventsHandler {
    pub recorded: Vec<RecordedEvent>,
}

impl RecordingEventsHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> Vec<ChunkDescriptor> {
        self.recorded
            .iter()
            .filter_map(|ev| match ev {
                RecordedEvent::HeadersRequest(chunk) => Some(*chunk),
                _ => None,
            })
            .collect()
    }

    pub fn stopped(&self) -> bool {
        self.recorded.contains(&RecordedEvent::StoppedSyncing)
    }

    pub fn downloaded_headers(&self) -> Option<&[TestHeader]> {
        self.recorded.iter().find_map(|ev| match ev {
            RecordedEvent::BodyDownload(headers) => Some(headers.as_slice()),
            _ => None,
        })
    }
}

impl SyncEventsHandler<TestHeader> for RecordingEventsHandler {
    fn request_headers(&mut self, chunk: ChunkDescriptor) {
        self.recorded.push(RecordedEvent::HeadersRequest(chunk));
    }

    fn stop_syncing(&mut self) {
        self.recorded.push(RecordedEvent::StoppedSyncing);
    }

    fn start_body_download(&mut self, headers: Vec<TestHeader>) {
        self.recorded.push(RecordedEvent::BodyDownload(headers));
    }

    fn reset_timeout(&mut self) {
        self.recorded.push(RecordedEvent::TimeoutReset);
    }
}
