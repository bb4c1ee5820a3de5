//! Virtual keyboard.
//!
//! Accepts Win32 virtual-key codes and translates them through
//! [`crate::keymap`]. Held keys are re-reported by a background repeat
//! thread, and `paste_utf` types arbitrary Unicode text through the
//! IBus-style `CTRL+SHIFT+U` hex-entry gesture.

use std::collections::{HashMap, HashSet};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, Weak};
use std::thread;
use std::time::Duration;

use ghost_input_types::keys;
use ghost_input_types::{DeviceClass, DeviceDefinition, HidEvent};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::backend::{Backend, EventSink};
use crate::error::DeviceError;
use crate::keymap::{hex_digit_vk, vk_to_key};
use crate::mouse::VIRTUAL_VENDOR_ID;
use crate::{lock, udev, VirtualDevice};

/// Keyboard construction parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyboardConfig {
    /// Interval between repeat reports for held keys.
    pub repeat_interval: Duration,
}

impl Default for KeyboardConfig {
    fn default() -> Self {
        Self {
            repeat_interval: Duration::from_millis(50),
        }
    }
}

fn keyboard_definition() -> DeviceDefinition {
    DeviceDefinition {
        vendor_id: VIRTUAL_VENDOR_ID,
        product_id: 0x0006,
        version: 0x0100,
        // The full KEY_* range; the translation layer decides what is
        // actually reachable.
        keys: (1..=248).collect(),
        ..DeviceDefinition::new("ghost-input Keyboard", DeviceClass::Keyboard)
    }
}

struct KeyboardState {
    sink: Box<dyn EventSink>,
    held: HashSet<u16>,
}

struct Shared {
    nodes: Vec<String>,
    udev_events: Vec<HashMap<String, String>>,
    state: Mutex<KeyboardState>,
    // Dropping the last handle disconnects the repeat thread's channel,
    // waking it for prompt exit.
    _repeat_tx: mpsc::Sender<()>,
}

/// A virtual keyboard. Clones are additional handles to the same device;
/// the repeat thread stops when the last handle drops.
#[derive(Clone)]
pub struct Keyboard {
    shared: Arc<Shared>,
}

impl Keyboard {
    pub fn new(backend: &dyn Backend) -> Result<Self, DeviceError> {
        Self::with_config(backend, KeyboardConfig::default())
    }

    pub fn with_config(backend: &dyn Backend, config: KeyboardConfig) -> Result<Self, DeviceError> {
        let def = keyboard_definition();
        let device = backend.create(&def)?;
        let udev_events = udev::udev_events(&def, &device.nodes);
        debug!(nodes = ?device.nodes, "created virtual keyboard");

        let (tx, rx) = mpsc::channel();
        let shared = Arc::new(Shared {
            nodes: device.nodes,
            udev_events,
            state: Mutex::new(KeyboardState {
                sink: device.sink,
                held: HashSet::new(),
            }),
            _repeat_tx: tx,
        });

        let weak = Arc::downgrade(&shared);
        let interval = config.repeat_interval;
        thread::Builder::new()
            .name("kbd-repeat".into())
            .spawn(move || repeat_loop(&weak, &rx, interval))
            .map_err(|e| DeviceError::NodeCreate(format!("repeat thread: {e}")))?;

        Ok(Self { shared })
    }

    /// Presses a Win32 virtual key. The key repeats until released.
    pub fn press(&self, vk: u16) -> Result<(), DeviceError> {
        let code = vk_to_key(vk).ok_or(DeviceError::UnknownKey(vk))?;
        let mut state = lock(&self.shared.state);
        state.sink.emit(&[HidEvent::Key {
            code,
            pressed: true,
        }])?;
        state.held.insert(code);
        Ok(())
    }

    /// Releases a Win32 virtual key. Releasing an unheld key still emits
    /// the up edge.
    pub fn release(&self, vk: u16) -> Result<(), DeviceError> {
        let code = vk_to_key(vk).ok_or(DeviceError::UnknownKey(vk))?;
        let mut state = lock(&self.shared.state);
        state.held.remove(&code);
        state.sink.emit(&[HidEvent::Key {
            code,
            pressed: false,
        }])
    }

    /// Types Unicode text via the `CTRL+SHIFT+U` hex-entry gesture, one
    /// code point at a time. The whole string is injected atomically with
    /// respect to other callers.
    pub fn paste_utf(&self, text: &str) -> Result<(), DeviceError> {
        let mut state = lock(&self.shared.state);
        for ch in text.chars() {
            trace!(code_point = ch as u32, "typing code point");
            tap(&mut state, keys::KEY_LEFTCTRL, true)?;
            tap(&mut state, keys::KEY_LEFTSHIFT, true)?;
            tap(&mut state, keys::KEY_U, true)?;
            for digit in hex_digits(ch as u32) {
                // Hex digit VKs are always mapped.
                let code = vk_to_key(hex_digit_vk(digit))
                    .ok_or(DeviceError::UnknownKey(hex_digit_vk(digit)))?;
                tap(&mut state, code, true)?;
                tap(&mut state, code, false)?;
            }
            tap(&mut state, keys::KEY_U, false)?;
            tap(&mut state, keys::KEY_LEFTSHIFT, false)?;
            tap(&mut state, keys::KEY_LEFTCTRL, false)?;
        }
        Ok(())
    }
}

fn tap(state: &mut KeyboardState, code: u16, pressed: bool) -> Result<(), DeviceError> {
    state.sink.emit(&[HidEvent::Key { code, pressed }])
}

/// Hex digits of a code point, most significant first, no leading zeros.
fn hex_digits(code_point: u32) -> Vec<u32> {
    let mut digits = Vec::new();
    let mut rest = code_point;
    loop {
        digits.push(rest % 16);
        rest /= 16;
        if rest == 0 {
            break;
        }
    }
    digits.reverse();
    digits
}

fn repeat_loop(shared: &Weak<Shared>, rx: &mpsc::Receiver<()>, interval: Duration) {
    loop {
        match rx.recv_timeout(interval) {
            // Last handle dropped.
            Err(mpsc::RecvTimeoutError::Disconnected) => return,
            Ok(()) | Err(mpsc::RecvTimeoutError::Timeout) => {}
        }
        let Some(shared) = shared.upgrade() else {
            return;
        };
        let mut state = lock(&shared.state);
        if state.held.is_empty() {
            continue;
        }
        let held: Vec<u16> = state.held.iter().copied().collect();
        for code in held {
            if state
                .sink
                .emit(&[HidEvent::Key {
                    code,
                    pressed: true,
                }])
                .is_err()
            {
                // Node is gone; stop repeating.
                return;
            }
        }
    }
}

impl VirtualDevice for Keyboard {
    fn get_nodes(&self) -> Vec<String> {
        self.shared.nodes.clone()
    }

    fn get_udev_events(&self) -> Vec<HashMap<String, String>> {
        self.shared.udev_events.clone()
    }

    fn get_udev_hw_db_entries(&self) -> Vec<(String, Vec<String>)> {
        Vec::new()
    }
}
