//! Virtual HID device façades for remote input injection.
//!
//! Each façade (mouse, trackpad, touchscreen, pen tablet, keyboard,
//! joypad) owns one or more OS-level virtual device nodes and translates
//! high-level, normalized input requests into the exact event sequences a
//! HID consumer expects: accumulated scroll clicks, multi-touch contact
//! identity, button-mask edge detection, Unicode keystroke entry, pen
//! tool persistence.
//!
//! Façades are cheap to clone; clones are additional handles to the same
//! virtual hardware. The underlying node (and any background thread) is
//! torn down when the last handle drops.
//!
//! The OS integration is pluggable through [`backend::Backend`]: the
//! `linux` feature provides a uinput implementation, the `mock` feature a
//! recording one for tests.

use std::collections::HashMap;

pub mod backend;
pub mod error;
pub mod keymap;
pub mod scroll;
pub mod touch;
pub mod udev;

mod joypad;
mod keyboard;
mod mouse;
mod pen;
mod touchpads;

#[cfg(any(test, feature = "mock"))]
pub mod mock;

#[cfg(feature = "linux")]
pub mod uinput;

pub use error::DeviceError;
pub use joypad::{Joypad, JoypadConfig};
pub use keyboard::{Keyboard, KeyboardConfig};
pub use mouse::Mouse;
pub use pen::PenTablet;
pub use touchpads::{TouchScreen, Trackpad};

/// Common contract of every virtual device.
///
/// Nodes and enumeration records are deterministic functions of device
/// construction parameters, not of runtime state.
pub trait VirtualDevice {
    /// OS device-node paths exposed by this device.
    fn get_nodes(&self) -> Vec<String>;

    /// Enumeration-event records (key → value) describing each node to
    /// the host's device-management subsystem.
    fn get_udev_events(&self) -> Vec<HashMap<String, String>>;

    /// Hardware-database text to install, as `(filename, lines)` pairs.
    fn get_udev_hw_db_entries(&self) -> Vec<(String, Vec<String>)>;
}

/// Locks a mutex, continuing through poisoning: device state stays
/// usable from other handles even if a caller thread panicked mid-call.
pub(crate) fn lock<T>(m: &std::sync::Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}
