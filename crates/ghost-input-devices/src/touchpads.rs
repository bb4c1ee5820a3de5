//! Virtual touch surfaces: trackpad and touchscreen.
//!
//! Both drive a [`TouchTracker`] over one node; they differ in the
//! surface contract they advertise. The trackpad is a click-pad pointer
//! (finger-count tool keys, `BTN_LEFT`), the touchscreen a direct-input
//! surface mapped to the display.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use ghost_input_types::keys;
use ghost_input_types::{
    AbsAxis, AbsAxisSetup, DeviceClass, DeviceDefinition, DeviceProperty, HidEvent,
};
use tracing::debug;

use crate::backend::{Backend, EventSink};
use crate::error::DeviceError;
use crate::mouse::VIRTUAL_VENDOR_ID;
use crate::touch::TouchTracker;
use crate::{lock, udev, VirtualDevice};

/// Simultaneous contacts a trackpad tracks.
pub const TRACKPAD_SLOTS: usize = 5;
/// Simultaneous contacts a touchscreen tracks.
pub const TOUCHSCREEN_SLOTS: usize = 10;

const TRACKPAD_AXIS_MAX: i32 = 4095;
/// ~10cm square surface.
const TRACKPAD_RESOLUTION: i32 = 40;
const TOUCHSCREEN_X_MAX: i32 = 19199;
const TOUCHSCREEN_Y_MAX: i32 = 10799;
const TOUCHSCREEN_RESOLUTION: i32 = 35;
const PRESSURE_MAX: i32 = 255;

fn mt_axes(x_max: i32, y_max: i32, resolution: i32, slots: usize) -> Vec<AbsAxisSetup> {
    vec![
        AbsAxisSetup::new(AbsAxis::X, 0, x_max).with_resolution(resolution),
        AbsAxisSetup::new(AbsAxis::Y, 0, y_max).with_resolution(resolution),
        AbsAxisSetup::new(AbsAxis::MtSlot, 0, slots as i32 - 1),
        AbsAxisSetup::new(AbsAxis::MtTrackingId, 0, 65535),
        AbsAxisSetup::new(AbsAxis::MtPositionX, 0, x_max).with_resolution(resolution),
        AbsAxisSetup::new(AbsAxis::MtPositionY, 0, y_max).with_resolution(resolution),
        AbsAxisSetup::new(AbsAxis::MtPressure, 0, PRESSURE_MAX),
    ]
}

fn trackpad_definition() -> DeviceDefinition {
    DeviceDefinition {
        vendor_id: VIRTUAL_VENDOR_ID,
        product_id: 0x0003,
        version: 0x0100,
        keys: vec![
            keys::BTN_LEFT,
            keys::BTN_TOUCH,
            keys::BTN_TOOL_FINGER,
            keys::BTN_TOOL_DOUBLETAP,
            keys::BTN_TOOL_TRIPLETAP,
            keys::BTN_TOOL_QUADTAP,
            keys::BTN_TOOL_QUINTTAP,
        ],
        abs_axes: mt_axes(
            TRACKPAD_AXIS_MAX,
            TRACKPAD_AXIS_MAX,
            TRACKPAD_RESOLUTION,
            TRACKPAD_SLOTS,
        ),
        properties: vec![DeviceProperty::Pointer, DeviceProperty::ButtonPad],
        ..DeviceDefinition::new("ghost-input Trackpad", DeviceClass::Trackpad)
    }
}

fn touchscreen_definition() -> DeviceDefinition {
    DeviceDefinition {
        vendor_id: VIRTUAL_VENDOR_ID,
        product_id: 0x0004,
        version: 0x0100,
        keys: vec![keys::BTN_TOUCH],
        abs_axes: mt_axes(
            TOUCHSCREEN_X_MAX,
            TOUCHSCREEN_Y_MAX,
            TOUCHSCREEN_RESOLUTION,
            TOUCHSCREEN_SLOTS,
        ),
        properties: vec![DeviceProperty::Direct],
        ..DeviceDefinition::new("ghost-input Touchscreen", DeviceClass::TouchScreen)
    }
}

struct SurfaceState {
    sink: Box<dyn EventSink>,
    tracker: TouchTracker,
}

struct Shared {
    nodes: Vec<String>,
    udev_events: Vec<HashMap<String, String>>,
    state: Mutex<SurfaceState>,
}

impl Shared {
    fn create(backend: &dyn Backend, def: &DeviceDefinition, tracker: TouchTracker) -> Result<Arc<Self>, DeviceError> {
        let device = backend.create(def)?;
        let udev_events = udev::udev_events(def, &device.nodes);
        debug!(name = %def.name, nodes = ?device.nodes, "created touch surface");
        Ok(Arc::new(Self {
            nodes: device.nodes,
            udev_events,
            state: Mutex::new(SurfaceState {
                sink: device.sink,
                tracker,
            }),
        }))
    }

    fn place_finger(&self, slot: usize, x: f32, y: f32, pressure: f32) -> Result<(), DeviceError> {
        let mut state = lock(&self.state);
        let events = state.tracker.place_finger(slot, x, y, pressure)?;
        state.sink.emit(&events)
    }

    fn release_finger(&self, slot: usize) -> Result<(), DeviceError> {
        let mut state = lock(&self.state);
        let events = state.tracker.release_finger(slot)?;
        if events.is_empty() {
            return Ok(());
        }
        state.sink.emit(&events)
    }
}

/// A virtual click-pad trackpad. Clones share the same node.
#[derive(Clone)]
pub struct Trackpad {
    shared: Arc<Shared>,
}

impl Trackpad {
    pub fn new(backend: &dyn Backend) -> Result<Self, DeviceError> {
        let tracker = TouchTracker::new(
            TRACKPAD_SLOTS,
            TRACKPAD_AXIS_MAX,
            TRACKPAD_AXIS_MAX,
            PRESSURE_MAX,
        )
        .with_finger_count_keys();
        Ok(Self {
            shared: Shared::create(backend, &trackpad_definition(), tracker)?,
        })
    }

    /// Places or moves a contact. Coordinates and pressure are
    /// normalized to `[0, 1]`.
    pub fn place_finger(
        &self,
        slot: usize,
        x: f32,
        y: f32,
        pressure: f32,
    ) -> Result<(), DeviceError> {
        self.shared.place_finger(slot, x, y, pressure)
    }

    pub fn release_finger(&self, slot: usize) -> Result<(), DeviceError> {
        self.shared.release_finger(slot)
    }

    /// Physical click of the pad surface, independent of finger state.
    pub fn set_left_btn(&self, pressed: bool) -> Result<(), DeviceError> {
        let mut state = lock(&self.shared.state);
        state.sink.emit(&[HidEvent::Key {
            code: keys::BTN_LEFT,
            pressed,
        }])
    }
}

impl VirtualDevice for Trackpad {
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

/// A virtual direct-input touchscreen. Clones share the same node.
#[derive(Clone)]
pub struct TouchScreen {
    shared: Arc<Shared>,
}

impl TouchScreen {
    pub fn new(backend: &dyn Backend) -> Result<Self, DeviceError> {
        let tracker = TouchTracker::new(
            TOUCHSCREEN_SLOTS,
            TOUCHSCREEN_X_MAX,
            TOUCHSCREEN_Y_MAX,
            PRESSURE_MAX,
        );
        Ok(Self {
            shared: Shared::create(backend, &touchscreen_definition(), tracker)?,
        })
    }

    /// Places or moves a contact. Coordinates and pressure are
    /// normalized to `[0, 1]`; `(0, 0)` is the top-left display corner.
    pub fn place_finger(
        &self,
        slot: usize,
        x: f32,
        y: f32,
        pressure: f32,
    ) -> Result<(), DeviceError> {
        self.shared.place_finger(slot, x, y, pressure)
    }

    pub fn release_finger(&self, slot: usize) -> Result<(), DeviceError> {
        self.shared.release_finger(slot)
    }
}

impl VirtualDevice for TouchScreen {
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
