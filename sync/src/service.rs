use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tracing::{debug, info, warn};

use crate::chunks::ChunkDescriptor;
use crate::config::SyncConfig;
use crate::events::{SyncEventsHandler, SyncInformation};
use crate::headers::DownloadingHeadersSyncState;
use crate::state::{IdleSyncState, SyncState};
use crate::types::{BlockIdentifier, Header};

const EVENT_BUFFER: usize = 64;

/// Events delivered to the dispatcher, one at a time.
#[derive(Debug)]
pub enum SyncEvent<H> {
    /// A skeleton was discovered upstream; begin downloading its headers.
    Start {
        skeleton: Vec<BlockIdentifier>,
        connection_point: u64,
    },
    /// One chunk response from the peer, newest header first.
    Headers(Vec<H>),
    /// Tear the dispatcher down.
    Shutdown,
}

/// Drives the synchronization states: owns the active state, delivers
/// channel events to it one at a time, and keeps the response deadline.
/// Terminal handler actions return the machine to idle; the host handler
/// receives every action unchanged.
pub struct SyncService<H, I, E> {
    config: SyncConfig,
    info: I,
    events: E,
    state: Box<dyn SyncState<H>>,
    rx: mpsc::Receiver<SyncEvent<H>>,
    deadline: Instant,
}

impl<H, I, E> SyncService<H, I, E>
where
    H: Header,
    I: SyncInformation<H>,
    E: SyncEventsHandler<H>,
{
    pub fn new(config: SyncConfig, info: I, events: E) -> (Self, mpsc::Sender<SyncEvent<H>>) {
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);
        let deadline = Instant::now() + config.timeout_waiting_request;
        let service = Self {
            config,
            info,
            events,
            state: Box::new(IdleSyncState::new()),
            rx,
            deadline,
        };
        (service, tx)
    }

    pub fn spawn(self) -> JoinHandle<()>
    where
        I: Send + 'static,
        E: Send + 'static,
    {
        tokio::spawn(self.run())
    }

    pub async fn run(mut self) {
        loop {
            let timeout = sleep_until(self.deadline);
            tokio::pin!(timeout);
            tokio::select! {
                maybe_event = self.rx.recv() => match maybe_event {
                    Some(SyncEvent::Start { skeleton, connection_point }) => {
                        self.start_downloading_headers(skeleton, connection_point);
                    }
                    Some(SyncEvent::Headers(chunk)) => self.deliver_headers(chunk),
                    Some(SyncEvent::Shutdown) | None => break,
                },
                _ = &mut timeout, if self.state.is_syncing() => self.deliver_timeout(),
            }
        }
        debug!("sync dispatcher stopped");
    }

    fn start_downloading_headers(&mut self, skeleton: Vec<BlockIdentifier>, connection_point: u64) {
        if self.state.is_syncing() {
            warn!("ignoring start request while a sync attempt is active");
            return;
        }
        match DownloadingHeadersSyncState::new(&self.config, skeleton, connection_point) {
            Ok(state) => {
                info!(connection_point, "starting header download");
                self.state = Box::new(state);
                self.arm_deadline();
                let outcome = {
                    let mut sink = EventSink::new(&mut self.events);
                    self.state.on_enter(&mut sink);
                    sink.outcome
                };
                self.settle(outcome);
            }
            Err(err) => {
                warn!(%err, "rejecting unusable skeleton");
                self.events.stop_syncing();
            }
        }
    }

    fn deliver_headers(&mut self, chunk: Vec<H>) {
        let outcome = {
            let mut sink = EventSink::new(&mut self.events);
            self.state.on_headers(&self.info, &mut sink, chunk);
            sink.outcome
        };
        self.settle(outcome);
    }

    fn deliver_timeout(&mut self) {
        let outcome = {
            let mut sink = EventSink::new(&mut self.events);
            self.state.on_timeout(&mut sink);
            sink.outcome
        };
        self.settle(outcome);
        if self.state.is_syncing() {
            // A state that survives its timeout gets a fresh window.
            self.arm_deadline();
        }
    }

    fn settle(&mut self, outcome: StepOutcome) {
        if outcome.finished {
            debug!("sync attempt finished, back to idle");
            self.state = Box::new(IdleSyncState::new());
            return;
        }
        if outcome.reset_requested {
            self.arm_deadline();
        }
    }

    fn arm_deadline(&mut self) {
        self.deadline = Instant::now() + self.config.timeout_waiting_request;
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct StepOutcome {
    finished: bool,
    reset_requested: bool,
}

/// Forwards state actions to the host handler while recording the ones the
/// dispatcher itself reacts to.
struct EventSink<'a, H: Header> {
    host: &'a mut dyn SyncEventsHandler<H>,
    outcome: StepOutcome,
}

impl<'a, H: Header> EventSink<'a, H> {
    fn new(host: &'a mut dyn SyncEventsHandler<H>) -> Self {
        Self {
            host,
            outcome: StepOutcome::default(),
        }
    }
}

impl<H: Header> SyncEventsHandler<H> for EventSink<'_, H> {
    fn request_headers(&mut self, chunk: ChunkDescriptor) {
        self.host.request_headers(chunk);
    }

    fn stop_syncing(&mut self) {
        self.outcome.finished = true;
        self.host.stop_syncing();
    }

    fn start_body_download(&mut self, headers: Vec<H>) {
        self.outcome.finished = true;
        self.host.start_body_download(headers);
    }

    fn reset_timeout(&mut self) {
        self.outcome.reset_requested = true;
        self.host.reset_timeout();
    }
}
