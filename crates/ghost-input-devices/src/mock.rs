//! Mock backend for testing.
//!
//! Records every created node and every injected frame behind a clonable
//! observer handle, and lets tests script consumer-originated feedback
//! (rumble/LED) through a channel.

use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use ghost_input_types::{DeviceDefinition, FeedbackEvent, HidEvent};

use crate::backend::{Backend, BackendDevice, EventSink, FeedbackSource};
use crate::error::DeviceError;
use crate::lock;

/// One recorded injection frame (one `emit` call).
#[derive(Debug, Clone)]
pub struct RecordedFrame {
    pub node: usize,
    pub events: Vec<HidEvent>,
}

#[derive(Debug, Default)]
struct MockState {
    definitions: Vec<DeviceDefinition>,
    frames: Vec<RecordedFrame>,
}

/// Mock backend; every created node records into the same shared state.
pub struct MockBackend {
    state: Arc<Mutex<MockState>>,
    feedback_txs: Mutex<Vec<mpsc::Sender<FeedbackEvent>>>,
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl MockBackend {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState::default())),
            feedback_txs: Mutex::new(Vec::new()),
        }
    }

    /// Clonable observer handle for inspecting what devices did.
    pub fn handle(&self) -> MockBackendHandle {
        MockBackendHandle {
            state: Arc::clone(&self.state),
        }
    }

    /// Senders for pushing simulated hardware feedback, one per created
    /// node that requested a feedback source, in creation order.
    pub fn feedback_senders(&self) -> Vec<mpsc::Sender<FeedbackEvent>> {
        lock(&self.feedback_txs).clone()
    }
}

impl Backend for MockBackend {
    fn create(&self, def: &DeviceDefinition) -> Result<BackendDevice, DeviceError> {
        let mut state = lock(&self.state);
        let node = state.definitions.len();
        state.definitions.push(def.clone());
        drop(state);

        let wants_feedback = def.ff_rumble || def.class == ghost_input_types::DeviceClass::Gamepad;
        let feedback: Option<Box<dyn FeedbackSource>> = if wants_feedback {
            let (tx, rx) = mpsc::channel();
            lock(&self.feedback_txs).push(tx);
            Some(Box::new(MockFeedbackSource { rx }))
        } else {
            None
        };

        Ok(BackendDevice {
            sink: Box::new(MockSink {
                state: Arc::clone(&self.state),
                node,
            }),
            feedback,
            nodes: vec![format!("/dev/input/event{}", 100 + node)],
        })
    }
}

/// Clonable observer for [`MockBackend`].
#[derive(Clone)]
pub struct MockBackendHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockBackendHandle {
    /// Definitions of all created nodes, in creation order.
    pub fn definitions(&self) -> Vec<DeviceDefinition> {
        lock(&self.state).definitions.clone()
    }

    /// Every injected frame so far.
    pub fn frames(&self) -> Vec<RecordedFrame> {
        lock(&self.state).frames.clone()
    }

    /// All injected events, flattened across frames and nodes.
    pub fn events(&self) -> Vec<HidEvent> {
        lock(&self.state)
            .frames
            .iter()
            .flat_map(|f| f.events.iter().copied())
            .collect()
    }

    /// All injected events for one node.
    pub fn events_for(&self, node: usize) -> Vec<HidEvent> {
        lock(&self.state)
            .frames
            .iter()
            .filter(|f| f.node == node)
            .flat_map(|f| f.events.iter().copied())
            .collect()
    }

    /// Forget everything recorded so far.
    pub fn clear(&self) {
        lock(&self.state).frames.clear();
    }
}

struct MockSink {
    state: Arc<Mutex<MockState>>,
    node: usize,
}

impl EventSink for MockSink {
    fn emit(&mut self, events: &[HidEvent]) -> Result<(), DeviceError> {
        lock(&self.state).frames.push(RecordedFrame {
            node: self.node,
            events: events.to_vec(),
        });
        Ok(())
    }
}

struct MockFeedbackSource {
    rx: mpsc::Receiver<FeedbackEvent>,
}

impl FeedbackSource for MockFeedbackSource {
    fn poll(&mut self, timeout: Duration) -> Result<Option<FeedbackEvent>, DeviceError> {
        match self.rx.recv_timeout(timeout) {
            Ok(ev) => Ok(Some(ev)),
            Err(mpsc::RecvTimeoutError::Timeout) => Ok(None),
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                // Test dropped its sender; stay quiet until shutdown.
                std::thread::sleep(timeout);
                Ok(None)
            }
        }
    }
}
