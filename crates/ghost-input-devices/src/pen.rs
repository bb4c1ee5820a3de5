//! Virtual pen tablet.
//!
//! Tracks which tool is in proximity so callers can keep sending
//! `SameAsBefore` once a real tool has been reported, and derives the
//! touch state from pressure: a tool reporting pressure is on the
//! surface, one reporting distance is hovering.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use ghost_input_types::keys;
use ghost_input_types::{
    AbsAxis, AbsAxisSetup, DeviceClass, DeviceDefinition, DeviceProperty, HidEvent, PenButton,
    ToolType,
};
use tracing::debug;

use crate::backend::{Backend, EventSink};
use crate::error::DeviceError;
use crate::mouse::VIRTUAL_VENDOR_ID;
use crate::{lock, udev, VirtualDevice};

const PEN_AXIS_MAX: i32 = 32767;
const PRESSURE_MAX: i32 = 4095;
const DISTANCE_MAX: i32 = 255;
const TILT_RANGE: i32 = 90;

fn pen_definition() -> DeviceDefinition {
    DeviceDefinition {
        vendor_id: VIRTUAL_VENDOR_ID,
        product_id: 0x0005,
        version: 0x0100,
        keys: vec![
            keys::BTN_TOOL_PEN,
            keys::BTN_TOOL_RUBBER,
            keys::BTN_TOOL_BRUSH,
            keys::BTN_TOOL_PENCIL,
            keys::BTN_TOOL_AIRBRUSH,
            keys::BTN_TOOL_FINGER,
            keys::BTN_TOUCH,
            keys::BTN_STYLUS,
            keys::BTN_STYLUS2,
            keys::BTN_STYLUS3,
        ],
        abs_axes: vec![
            AbsAxisSetup::new(AbsAxis::X, 0, PEN_AXIS_MAX).with_resolution(100),
            AbsAxisSetup::new(AbsAxis::Y, 0, PEN_AXIS_MAX).with_resolution(100),
            AbsAxisSetup::new(AbsAxis::Pressure, 0, PRESSURE_MAX),
            AbsAxisSetup::new(AbsAxis::Distance, 0, DISTANCE_MAX),
            AbsAxisSetup::new(AbsAxis::TiltX, -TILT_RANGE, TILT_RANGE),
            AbsAxisSetup::new(AbsAxis::TiltY, -TILT_RANGE, TILT_RANGE),
        ],
        properties: vec![DeviceProperty::Direct],
        ..DeviceDefinition::new("ghost-input Pen Tablet", DeviceClass::PenTablet)
    }
}

fn tool_key(tool: ToolType) -> Option<u16> {
    match tool {
        ToolType::Pen => Some(keys::BTN_TOOL_PEN),
        ToolType::Eraser => Some(keys::BTN_TOOL_RUBBER),
        ToolType::Brush => Some(keys::BTN_TOOL_BRUSH),
        ToolType::Pencil => Some(keys::BTN_TOOL_PENCIL),
        ToolType::Airbrush => Some(keys::BTN_TOOL_AIRBRUSH),
        ToolType::Touch => Some(keys::BTN_TOOL_FINGER),
        ToolType::SameAsBefore => None,
    }
}

struct PenState {
    sink: Box<dyn EventSink>,
    current_tool: Option<u16>,
    touching: bool,
}

struct Shared {
    nodes: Vec<String>,
    udev_events: Vec<HashMap<String, String>>,
    state: Mutex<PenState>,
}

/// A virtual pen tablet. Clones share the same node.
#[derive(Clone)]
pub struct PenTablet {
    shared: Arc<Shared>,
}

impl PenTablet {
    pub fn new(backend: &dyn Backend) -> Result<Self, DeviceError> {
        let def = pen_definition();
        let device = backend.create(&def)?;
        let udev_events = udev::udev_events(&def, &device.nodes);
        debug!(nodes = ?device.nodes, "created virtual pen tablet");
        Ok(Self {
            shared: Arc::new(Shared {
                nodes: device.nodes,
                udev_events,
                state: Mutex::new(PenState {
                    sink: device.sink,
                    current_tool: None,
                    touching: false,
                }),
            }),
        })
    }

    /// Reports the tool position.
    ///
    /// Coordinates are normalized to `[0, 1]`; `pressure` (surface
    /// contact) and `distance` (hover height) are normalized too and
    /// mutually exclusive per call; tilt is in degrees, `-90..=90`.
    /// `ToolType::SameAsBefore` requires a prior call with a real tool.
    #[allow(clippy::too_many_arguments)]
    pub fn place_tool(
        &self,
        tool: ToolType,
        x: f32,
        y: f32,
        pressure: Option<f32>,
        distance: Option<f32>,
        tilt_x: f32,
        tilt_y: f32,
    ) -> Result<(), DeviceError> {
        if pressure.is_some() && distance.is_some() {
            return Err(DeviceError::PressureAndDistance);
        }
        for (what, value) in [("x", x), ("y", y)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(DeviceError::ValueOutOfRange { what, value });
            }
        }
        for (what, value) in [("pressure", pressure), ("distance", distance)] {
            if let Some(value) = value {
                if !(0.0..=1.0).contains(&value) {
                    return Err(DeviceError::ValueOutOfRange { what, value });
                }
            }
        }
        for (what, value) in [("tilt_x", tilt_x), ("tilt_y", tilt_y)] {
            if !(-(TILT_RANGE as f32)..=TILT_RANGE as f32).contains(&value) {
                return Err(DeviceError::ValueOutOfRange { what, value });
            }
        }

        let mut state = lock(&self.shared.state);
        let key = match tool_key(tool) {
            Some(key) => key,
            None => state.current_tool.ok_or(DeviceError::NoPreviousTool)?,
        };

        let mut events = Vec::new();
        if state.current_tool != Some(key) {
            if let Some(previous) = state.current_tool {
                events.push(HidEvent::Key {
                    code: previous,
                    pressed: false,
                });
            }
            events.push(HidEvent::Key {
                code: key,
                pressed: true,
            });
            state.current_tool = Some(key);
        }

        events.push(HidEvent::Abs {
            axis: AbsAxis::X,
            value: scale(x, PEN_AXIS_MAX),
        });
        events.push(HidEvent::Abs {
            axis: AbsAxis::Y,
            value: scale(y, PEN_AXIS_MAX),
        });
        events.push(HidEvent::Abs {
            axis: AbsAxis::TiltX,
            value: tilt_x.round() as i32,
        });
        events.push(HidEvent::Abs {
            axis: AbsAxis::TiltY,
            value: tilt_y.round() as i32,
        });

        if let Some(pressure) = pressure {
            events.push(HidEvent::Abs {
                axis: AbsAxis::Pressure,
                value: scale(pressure, PRESSURE_MAX),
            });
        }
        if let Some(distance) = distance {
            events.push(HidEvent::Abs {
                axis: AbsAxis::Distance,
                value: scale(distance, DISTANCE_MAX),
            });
        }

        // Pressure puts the tool on the surface; its absence (or an
        // explicit hover distance) lifts it.
        let touching = pressure.is_some_and(|p| p > 0.0);
        if touching != state.touching {
            events.push(HidEvent::Key {
                code: keys::BTN_TOUCH,
                pressed: touching,
            });
            state.touching = touching;
        }

        state.sink.emit(&events)
    }

    /// Barrel button state.
    pub fn set_button(&self, button: PenButton, pressed: bool) -> Result<(), DeviceError> {
        let code = match button {
            PenButton::Primary => keys::BTN_STYLUS,
            PenButton::Secondary => keys::BTN_STYLUS2,
            PenButton::Tertiary => keys::BTN_STYLUS3,
        };
        let mut state = lock(&self.shared.state);
        state.sink.emit(&[HidEvent::Key { code, pressed }])
    }
}

fn scale(normalized: f32, max: i32) -> i32 {
    (normalized * max as f32).round() as i32
}

impl VirtualDevice for PenTablet {
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
