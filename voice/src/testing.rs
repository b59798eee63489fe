//! In-memory devices and connector for unit tests.

use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::device::{AudioOutput, DeviceError, Microphone, SourceId};
use crate::live::{ClientMessage, LiveError, LiveEvent, LiveLink, LiveSetup, RealtimeConnector};

// =============================================================================
// MICROPHONE
// =============================================================================

#[derive(Default)]
pub struct MicState {
    pub active: bool,
    pub starts: usize,
    pub stops: usize,
    pub sink: Option<mpsc::UnboundedSender<Vec<f32>>>,
}

pub struct FakeMic {
    pub state: Arc<Mutex<MicState>>,
    pub deny: bool,
}

impl FakeMic {
    pub fn new() -> (Self, Arc<Mutex<MicState>>) {
        let state = Arc::new(Mutex::new(MicState::default()));
        (Self { state: Arc::clone(&state), deny: false }, state)
    }

    pub fn denied() -> (Self, Arc<Mutex<MicState>>) {
        let (mut mic, state) = Self::new();
        mic.deny = true;
        (mic, state)
    }
}

impl Microphone for FakeMic {
    fn start(&mut self, blocks: mpsc::UnboundedSender<Vec<f32>>) -> Result<(), DeviceError> {
        if self.deny {
            return Err(DeviceError::PermissionDenied);
        }
        let mut state = self.state.lock().unwrap();
        state.active = true;
        state.starts += 1;
        state.sink = Some(blocks);
        Ok(())
    }

    fn stop(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.active = false;
        state.stops += 1;
        state.sink = None;
    }

    fn is_active(&self) -> bool {
        self.state.lock().unwrap().active
    }
}

// =============================================================================
// OUTPUT
// =============================================================================

#[derive(Default)]
pub struct OutputState {
    pub now: f64,
    pub open: bool,
    pub closed: bool,
    pub next_id: SourceId,
    /// (id, start, sample count)
    pub scheduled: Vec<(SourceId, f64, usize)>,
    pub stopped: Vec<SourceId>,
    pub ended: Option<mpsc::UnboundedSender<SourceId>>,
}

pub struct FakeOutput {
    pub state: Arc<Mutex<OutputState>>,
}

impl FakeOutput {
    pub fn new() -> (Self, Arc<Mutex<OutputState>>) {
        let state = Arc::new(Mutex::new(OutputState::default()));
        (Self { state: Arc::clone(&state) }, state)
    }
}

impl AudioOutput for FakeOutput {
    fn open(&mut self, ended: mpsc::UnboundedSender<SourceId>) -> Result<(), DeviceError> {
        let mut state = self.state.lock().unwrap();
        state.open = true;
        state.closed = false;
        state.ended = Some(ended);
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.state.lock().unwrap().now
    }

    fn schedule(&mut self, samples: Vec<f32>, _sample_rate: u32, start_at: f64) -> SourceId {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.scheduled.push((id, start_at, samples.len()));
        id
    }

    fn stop(&mut self, id: SourceId) {
        self.state.lock().unwrap().stopped.push(id);
    }

    fn close(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.open = false;
        state.closed = true;
        state.ended = None;
    }

    fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }
}

// =============================================================================
// CONNECTOR
// =============================================================================

/// Far end of a fake link: what the session sent, and a way to push server events.
pub struct RemoteEnd {
    pub sent: mpsc::Receiver<ClientMessage>,
    pub events: mpsc::Sender<LiveEvent>,
}

pub struct FakeConnector {
    pub remote: Mutex<Option<RemoteEnd>>,
    pub setups: Mutex<Vec<LiveSetup>>,
    pub fail: bool,
}

impl FakeConnector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self { remote: Mutex::new(None), setups: Mutex::new(Vec::new()), fail: false })
    }

    pub fn failing() -> Arc<Self> {
        Arc::new(Self { remote: Mutex::new(None), setups: Mutex::new(Vec::new()), fail: true })
    }

    pub fn take_remote(&self) -> RemoteEnd {
        self.remote.lock().unwrap().take().expect("session should have connected")
    }
}

#[async_trait::async_trait]
impl RealtimeConnector for FakeConnector {
    async fn connect(&self, setup: &LiveSetup) -> Result<LiveLink, LiveError> {
        self.setups.lock().unwrap().push(setup.clone());
        if self.fail {
            return Err(LiveError::Connect("handshake refused".into()));
        }
        let (out_tx, out_rx) = mpsc::channel(64);
        let (in_tx, in_rx) = mpsc::channel(64);
        *self.remote.lock().unwrap() = Some(RemoteEnd { sent: out_rx, events: in_tx });
        Ok(LiveLink { outbound: out_tx, inbound: in_rx })
    }
}
