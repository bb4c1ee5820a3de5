//! The OS-integration seam.
//!
//! A [`Backend`] instantiates one kernel-level virtual device node per
//! [`DeviceDefinition`] and hands back the two halves of its I/O: an
//! [`EventSink`] for injecting events and, for devices that receive
//! consumer-originated commands (rumble, LED), a [`FeedbackSource`] the
//! device's listener thread polls.
//!
//! The Linux implementation lives in [`crate::uinput`]; tests use
//! [`crate::mock`].

use std::time::Duration;

use ghost_input_types::{DeviceDefinition, FeedbackEvent, HidEvent};

use crate::error::DeviceError;

/// Injects batches of low-level events into one device node.
///
/// One `emit` call is one synchronization frame: the backend appends the
/// frame terminator the OS expects.
pub trait EventSink: Send {
    fn emit(&mut self, events: &[HidEvent]) -> Result<(), DeviceError>;
}

/// Blocking poll of hardware-originated events for one device node.
///
/// `poll` waits at most `timeout` and returns `Ok(None)` when nothing
/// arrived, so a listener thread can check for shutdown between calls.
pub trait FeedbackSource: Send {
    fn poll(&mut self, timeout: Duration) -> Result<Option<FeedbackEvent>, DeviceError>;
}

/// One created node: its event sink, its dev-node paths, and (when the
/// definition asks for feedback capabilities) the feedback side.
pub struct BackendDevice {
    pub sink: Box<dyn EventSink>,
    pub feedback: Option<Box<dyn FeedbackSource>>,
    /// OS device-node paths (`/dev/input/event*`), fixed at creation.
    pub nodes: Vec<String>,
}

/// Creates virtual device nodes.
pub trait Backend {
    fn create(&self, def: &DeviceDefinition) -> Result<BackendDevice, DeviceError>;
}
