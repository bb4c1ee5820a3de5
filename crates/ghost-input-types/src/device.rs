//! Device capability descriptors.
//!
//! A [`DeviceDefinition`] describes one OS-level device node: its
//! identity and the capability set it advertises (keys, axes, properties,
//! force feedback). Backends consume it to instantiate a kernel virtual
//! device; the udev record generator consumes it to describe the node to
//! the host's device-management subsystem.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

use crate::event::{AbsAxis, RelAxis};

/// Bus type reported in the device identity. Virtual devices advertise
/// themselves as USB so consumers apply their usual quirk tables.
pub const BUS_USB: u16 = 0x03;

/// Broad classification of a node, used for udev `ID_INPUT_*` tagging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub enum DeviceClass {
    Mouse,
    PointerAbs,
    Trackpad,
    TouchScreen,
    PenTablet,
    Keyboard,
    Gamepad,
    MotionSensors,
}

/// Input properties a node advertises (`INPUT_PROP_*`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub enum DeviceProperty {
    /// Pointer device operating in relative-to-surface terms (trackpads).
    Pointer,
    /// Direct-input device mapped to the screen (touchscreens).
    Direct,
    /// Click-pad: the whole surface is the button.
    ButtonPad,
    /// Motion-sensor node.
    Accelerometer,
}

/// Range setup for one absolute axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub struct AbsAxisSetup {
    pub axis: AbsAxis,
    pub min: i32,
    pub max: i32,
    /// Units per millimetre (positional axes) or per unit of measure;
    /// zero when not meaningful.
    pub resolution: i32,
}

impl AbsAxisSetup {
    pub const fn new(axis: AbsAxis, min: i32, max: i32) -> Self {
        Self {
            axis,
            min,
            max,
            resolution: 0,
        }
    }

    pub const fn with_resolution(mut self, resolution: i32) -> Self {
        self.resolution = resolution;
        self
    }
}

/// Everything a backend needs to create one virtual device node.
///
/// Definitions are deterministic functions of device construction
/// parameters, never of runtime state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub struct DeviceDefinition {
    pub name: String,
    pub class: DeviceClass,
    pub vendor_id: u16,
    pub product_id: u16,
    pub version: u16,
    /// Linux `KEY_*`/`BTN_*` codes this node can report.
    pub keys: Vec<u16>,
    pub rel_axes: Vec<RelAxis>,
    pub abs_axes: Vec<AbsAxisSetup>,
    pub properties: Vec<DeviceProperty>,
    /// Advertise `FF_RUMBLE` and accept force-feedback uploads.
    pub ff_rumble: bool,
    /// Emit `MSC_TIMESTAMP` markers (motion-sensor nodes).
    pub msc_timestamp: bool,
}

impl DeviceDefinition {
    /// A definition with no capabilities; façades fill in what they need.
    pub fn new(name: impl Into<String>, class: DeviceClass) -> Self {
        Self {
            name: name.into(),
            class,
            vendor_id: 0,
            product_id: 0,
            version: 0,
            keys: Vec::new(),
            rel_axes: Vec::new(),
            abs_axes: Vec::new(),
            properties: Vec::new(),
            ff_rumble: false,
            msc_timestamp: false,
        }
    }
}
