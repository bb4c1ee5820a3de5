//! Shared types for ghost-input.
//!
//! This crate contains the passive data shared across the ghost-input
//! workspace: the low-level HID event representation the device façades
//! emit, device capability descriptors, the joypad wire constants
//! (controller types, capability bitflags, button bitflags), pen tool
//! types, and the Linux key/button code constants.
//!
//! Everything here is a plain value type; the state machines live in
//! `ghost-input-devices`.

pub mod device;
pub mod event;
pub mod joypad;
pub mod keys;
pub mod pen;

pub use device::{AbsAxisSetup, DeviceClass, DeviceDefinition, DeviceProperty, BUS_USB};
pub use event::{AbsAxis, FeedbackEvent, HidEvent, MouseButton, RelAxis};
pub use joypad::{BatteryState, ControllerType, MotionType, StickPosition};
pub use pen::{PenButton, ToolType};
