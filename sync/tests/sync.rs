use std::time::Duration;

use header_sync::test_utils::{
    chunk_response, header_chain, identifier_at, test_hash, TestChain, TestHeader,
};
use header_sync::{
    BlockIdentifier, ChunkDescriptor, SyncConfig, SyncEvent, SyncEventsHandler, SyncService,
};
use tokio::sync::mpsc;
use tokio::time::timeout;

#[derive(Debug)]
enum HostAction {
    HeadersRequest(ChunkDescriptor),
    Stopped,
    Bodies(Vec<TestHeader>),
}

/// Host-side events handler that forwards every action to the test over a
/// channel, standing in for the network and body-download layers.
struct ChannelEvents {
    actions: mpsc::UnboundedSender<HostAction>,
}

impl SyncEventsHandler<TestHeader> for ChannelEvents {
    fn request_headers(&mut self, chunk: ChunkDescriptor) {
        let _ = self.actions.send(HostAction::HeadersRequest(chunk));
    }

    fn stop_syncing(&mut self) {
        let _ = self.actions.send(HostAction::Stopped);
    }

    fn start_body_download(&mut self, headers: Vec<TestHeader>) {
        let _ = self.actions.send(HostAction::Bodies(headers));
    }

    fn reset_timeout(&mut self) {}
}

struct Harness {
    actions: mpsc::UnboundedReceiver<HostAction>,
    events_tx: mpsc::Sender<SyncEvent<TestHeader>>,
    handle: tokio::task::JoinHandle<()>,
}

fn start_dispatcher(config: SyncConfig) -> Harness {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
    let (actions_tx, actions) = mpsc::unbounded_channel();
    let (service, events_tx) = SyncService::new(
        config,
        TestChain,
        ChannelEvents {
            actions: actions_tx,
        },
    );
    let handle = service.spawn();
    Harness {
        actions,
        events_tx,
        handle,
    }
}

fn test_config() -> SyncConfig {
    SyncConfig {
        chunk_size: 4,
        timeout_waiting_request: Duration::from_millis(200),
    }
}

fn skeleton(numbers: &[u64]) -> Vec<BlockIdentifier> {
    numbers.iter().copied().map(identifier_at).collect()
}

async fn next_action(harness: &mut Harness) -> HostAction {
    timeout(Duration::from_secs(5), harness.actions.recv())
        .await
        .expect("dispatcher responded in time")
        .expect("dispatcher alive")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dispatcher_syncs_a_full_skeleton() {
    let mut harness = start_dispatcher(test_config());
    let chain = header_chain(8);

    harness
        .events_tx
        .send(SyncEvent::Start {
            skeleton: skeleton(&[0, 4, 8]),
            connection_point: 0,
        })
        .await
        .expect("dispatcher alive");

    let headers = loop {
        match next_action(&mut harness).await {
            HostAction::HeadersRequest(chunk) => {
                harness
                    .events_tx
                    .send(SyncEvent::Headers(chunk_response(&chain, &chunk)))
                    .await
                    .expect("dispatcher alive");
            }
            HostAction::Bodies(headers) => break headers,
            HostAction::Stopped => panic!("sync aborted unexpectedly"),
        }
    };

    let numbers: Vec<u64> = headers.iter().map(|h| h.number).collect();
    assert_eq!(numbers, (1..=8).collect::<Vec<u64>>());

    harness
        .events_tx
        .send(SyncEvent::Shutdown)
        .await
        .expect("dispatcher alive");
    harness.handle.await.expect("dispatcher task");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dispatcher_aborts_on_forged_anchor_and_recovers() {
    let mut harness = start_dispatcher(test_config());
    let chain = header_chain(4);

    harness
        .events_tx
        .send(SyncEvent::Start {
            skeleton: skeleton(&[0, 4]),
            connection_point: 0,
        })
        .await
        .expect("dispatcher alive");

    let HostAction::HeadersRequest(chunk) = next_action(&mut harness).await else {
        panic!("expected a headers request first");
    };
    let mut forged = chunk_response(&chain, &chunk);
    forged[0].hash = test_hash(999);
    harness
        .events_tx
        .send(SyncEvent::Headers(forged))
        .await
        .expect("dispatcher alive");

    assert!(matches!(
        next_action(&mut harness).await,
        HostAction::Stopped
    ));

    // The machine is idle again: a fresh attempt must run to completion.
    harness
        .events_tx
        .send(SyncEvent::Start {
            skeleton: skeleton(&[0, 4]),
            connection_point: 0,
        })
        .await
        .expect("dispatcher alive");
    let headers = loop {
        match next_action(&mut harness).await {
            HostAction::HeadersRequest(chunk) => {
                harness
                    .events_tx
                    .send(SyncEvent::Headers(chunk_response(&chain, &chunk)))
                    .await
                    .expect("dispatcher alive");
            }
            HostAction::Bodies(headers) => break headers,
            HostAction::Stopped => panic!("second attempt aborted"),
        }
    };
    assert_eq!(headers.len(), 4);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn dispatcher_aborts_a_stalled_attempt() {
    let mut harness = start_dispatcher(test_config());

    harness
        .events_tx
        .send(SyncEvent::Start {
            skeleton: skeleton(&[0, 4]),
            connection_point: 0,
        })
        .await
        .expect("dispatcher alive");

    let HostAction::HeadersRequest(_) = next_action(&mut harness).await else {
        panic!("expected a headers request first");
    };
    // Never answer: the response deadline must fire and abort the attempt.
    assert!(matches!(
        next_action(&mut harness).await,
        HostAction::Stopped
    ));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn start_during_an_active_attempt_is_ignored() {
    let mut harness = start_dispatcher(test_config());
    let chain = header_chain(8);

    harness
        .events_tx
        .send(SyncEvent::Start {
            skeleton: skeleton(&[0, 4, 8]),
            connection_point: 0,
        })
        .await
        .expect("dispatcher alive");

    let HostAction::HeadersRequest(first) = next_action(&mut harness).await else {
        panic!("expected a headers request first");
    };

    // A second discovery while downloading must not disturb the attempt.
    harness
        .events_tx
        .send(SyncEvent::Start {
            skeleton: skeleton(&[0, 4]),
            connection_point: 0,
        })
        .await
        .expect("dispatcher alive");

    harness
        .events_tx
        .send(SyncEvent::Headers(chunk_response(&chain, &first)))
        .await
        .expect("dispatcher alive");
    let headers = loop {
        match next_action(&mut harness).await {
            HostAction::HeadersRequest(chunk) => {
                harness
                    .events_tx
                    .send(SyncEvent::Headers(chunk_response(&chain, &chunk)))
                    .await
                    .expect("dispatcher alive");
            }
            HostAction::Bodies(headers) => break headers,
            HostAction::Stopped => panic!("sync aborted unexpectedly"),
        }
    };
    assert_eq!(headers.len(), 8);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn unusable_skeleton_is_reported_as_an_abort() {
    let mut harness = start_dispatcher(test_config());

    harness
        .events_tx
        .send(SyncEvent::Start {
            skeleton: skeleton(&[0]),
            connection_point: 0,
        })
        .await
        .expect("dispatcher alive");

    assert!(matches!(
        next_action(&mut harness).await,
        HostAction::Stopped
    ));
}
