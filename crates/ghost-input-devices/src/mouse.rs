//! Virtual mouse.
//!
//! Exposes two nodes: a relative pointer (motion, buttons, wheels) and an
//! absolute pointer used by `move_abs`, mirroring how streaming hosts
//! switch between relative and absolute cursor control.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use ghost_input_types::keys;
use ghost_input_types::{
    AbsAxis, AbsAxisSetup, DeviceClass, DeviceDefinition, HidEvent, MouseButton, RelAxis,
};
use tracing::debug;

use crate::backend::{Backend, EventSink};
use crate::error::DeviceError;
use crate::scroll::ScrollAccumulator;
use crate::{lock, udev, VirtualDevice};

/// Range of the absolute pointer axes.
const ABS_RANGE: i32 = 65535;

/// pid.codes open-source vendor id used by all non-joypad nodes.
pub(crate) const VIRTUAL_VENDOR_ID: u16 = 0x1209;

fn rel_definition() -> DeviceDefinition {
    DeviceDefinition {
        vendor_id: VIRTUAL_VENDOR_ID,
        product_id: 0x0001,
        version: 0x0100,
        keys: vec![
            keys::BTN_LEFT,
            keys::BTN_MIDDLE,
            keys::BTN_RIGHT,
            keys::BTN_SIDE,
            keys::BTN_EXTRA,
        ],
        rel_axes: vec![
            RelAxis::X,
            RelAxis::Y,
            RelAxis::Wheel,
            RelAxis::HWheel,
            RelAxis::WheelHiRes,
            RelAxis::HWheelHiRes,
        ],
        ..DeviceDefinition::new("ghost-input Mouse", DeviceClass::Mouse)
    }
}

fn abs_definition() -> DeviceDefinition {
    DeviceDefinition {
        vendor_id: VIRTUAL_VENDOR_ID,
        product_id: 0x0002,
        version: 0x0100,
        abs_axes: vec![
            AbsAxisSetup::new(AbsAxis::X, 0, ABS_RANGE),
            AbsAxisSetup::new(AbsAxis::Y, 0, ABS_RANGE),
        ],
        ..DeviceDefinition::new("ghost-input Mouse (absolute)", DeviceClass::PointerAbs)
    }
}

struct MouseState {
    rel: Box<dyn EventSink>,
    abs: Box<dyn EventSink>,
    vertical: ScrollAccumulator,
    horizontal: ScrollAccumulator,
}

struct Shared {
    nodes: Vec<String>,
    udev_events: Vec<HashMap<String, String>>,
    state: Mutex<MouseState>,
}

/// A virtual mouse. Clones are additional handles to the same device.
#[derive(Clone)]
pub struct Mouse {
    shared: Arc<Shared>,
}

impl Mouse {
    pub fn new(backend: &dyn Backend) -> Result<Self, DeviceError> {
        let rel_def = rel_definition();
        let abs_def = abs_definition();
        let rel = backend.create(&rel_def)?;
        let abs = backend.create(&abs_def)?;

        let mut nodes = rel.nodes.clone();
        nodes.extend(abs.nodes.clone());
        let mut udev_events = udev::udev_events(&rel_def, &rel.nodes);
        udev_events.extend(udev::udev_events(&abs_def, &abs.nodes));
        debug!(nodes = ?nodes, "created virtual mouse");

        Ok(Self {
            shared: Arc::new(Shared {
                nodes,
                udev_events,
                state: Mutex::new(MouseState {
                    rel: rel.sink,
                    abs: abs.sink,
                    vertical: ScrollAccumulator::new(),
                    horizontal: ScrollAccumulator::new(),
                }),
            }),
        })
    }

    /// Relative motion in device units.
    pub fn r#move(&self, delta_x: i32, delta_y: i32) -> Result<(), DeviceError> {
        let mut state = lock(&self.shared.state);
        state.rel.emit(&[
            HidEvent::Rel {
                axis: RelAxis::X,
                value: delta_x,
            },
            HidEvent::Rel {
                axis: RelAxis::Y,
                value: delta_y,
            },
        ])
    }

    /// Absolute position, expressed as a fraction of the given screen
    /// size. Zero (or negative) screen dimensions are a caller error.
    pub fn move_abs(
        &self,
        x: i32,
        y: i32,
        screen_width: i32,
        screen_height: i32,
    ) -> Result<(), DeviceError> {
        if screen_width <= 0 || screen_height <= 0 {
            return Err(DeviceError::ZeroScreenDimension);
        }
        let scaled_x = scale_to_range(x, screen_width);
        let scaled_y = scale_to_range(y, screen_height);
        let mut state = lock(&self.shared.state);
        state.abs.emit(&[
            HidEvent::Abs {
                axis: AbsAxis::X,
                value: scaled_x,
            },
            HidEvent::Abs {
                axis: AbsAxis::Y,
                value: scaled_y,
            },
        ])
    }

    pub fn press(&self, button: MouseButton) -> Result<(), DeviceError> {
        self.button_edge(button, true)
    }

    pub fn release(&self, button: MouseButton) -> Result<(), DeviceError> {
        self.button_edge(button, false)
    }

    fn button_edge(&self, button: MouseButton, pressed: bool) -> Result<(), DeviceError> {
        let code = match button {
            MouseButton::Left => keys::BTN_LEFT,
            MouseButton::Middle => keys::BTN_MIDDLE,
            MouseButton::Right => keys::BTN_RIGHT,
            MouseButton::Side => keys::BTN_SIDE,
            MouseButton::Extra => keys::BTN_EXTRA,
        };
        let mut state = lock(&self.shared.state);
        state.rel.emit(&[HidEvent::Key { code, pressed }])
    }

    /// Vertical wheel distance in high-resolution units (120 per click);
    /// positive scrolls down.
    pub fn vertical_scroll(&self, high_res_distance: i32) -> Result<(), DeviceError> {
        let mut state = lock(&self.shared.state);
        let clicks = state.vertical.accumulate(high_res_distance);
        // The kernel's wheel axis is positive-up; the caller convention
        // is positive-down.
        let mut events = vec![HidEvent::Rel {
            axis: RelAxis::WheelHiRes,
            value: -high_res_distance,
        }];
        if clicks != 0 {
            events.push(HidEvent::Rel {
                axis: RelAxis::Wheel,
                value: -clicks,
            });
        }
        state.rel.emit(&events)
    }

    /// Horizontal wheel distance in high-resolution units (120 per
    /// click); positive scrolls right.
    pub fn horizontal_scroll(&self, high_res_distance: i32) -> Result<(), DeviceError> {
        let mut state = lock(&self.shared.state);
        let clicks = state.horizontal.accumulate(high_res_distance);
        let mut events = vec![HidEvent::Rel {
            axis: RelAxis::HWheelHiRes,
            value: high_res_distance,
        }];
        if clicks != 0 {
            events.push(HidEvent::Rel {
                axis: RelAxis::HWheel,
                value: clicks,
            });
        }
        state.rel.emit(&events)
    }
}

fn scale_to_range(value: i32, dimension: i32) -> i32 {
    let scaled = i64::from(value) * i64::from(ABS_RANGE) / i64::from(dimension);
    scaled.clamp(0, i64::from(ABS_RANGE)) as i32
}

impl VirtualDevice for Mouse {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockBackend;

    #[test]
    fn exposes_relative_and_absolute_nodes() {
        let backend = MockBackend::new();
        let mouse = Mouse::new(&backend).unwrap();
        assert_eq!(mouse.get_nodes().len(), 2);
        assert_eq!(mouse.get_udev_events().len(), 2);
        assert!(mouse.get_udev_hw_db_entries().is_empty());

        let defs = backend.handle().definitions();
        assert_eq!(defs[0].class, DeviceClass::Mouse);
        assert_eq!(defs[1].class, DeviceClass::PointerAbs);
    }

    #[test]
    fn relative_motion_frame() {
        let backend = MockBackend::new();
        let mouse = Mouse::new(&backend).unwrap();
        mouse.r#move(5, -3).unwrap();
        assert_eq!(
            backend.handle().events_for(0),
            vec![
                HidEvent::Rel {
                    axis: RelAxis::X,
                    value: 5
                },
                HidEvent::Rel {
                    axis: RelAxis::Y,
                    value: -3
                },
            ]
        );
    }

    #[test]
    fn move_abs_scales_by_screen_size() {
        let backend = MockBackend::new();
        let mouse = Mouse::new(&backend).unwrap();
        mouse.move_abs(960, 540, 1920, 1080).unwrap();
        let events = backend.handle().events_for(1);
        assert_eq!(
            events,
            vec![
                HidEvent::Abs {
                    axis: AbsAxis::X,
                    value: ABS_RANGE / 2
                },
                HidEvent::Abs {
                    axis: AbsAxis::Y,
                    value: ABS_RANGE / 2
                },
            ]
        );
    }

    #[test]
    fn move_abs_rejects_zero_screen() {
        let backend = MockBackend::new();
        let mouse = Mouse::new(&backend).unwrap();
        assert!(matches!(
            mouse.move_abs(10, 10, 0, 1080),
            Err(DeviceError::ZeroScreenDimension)
        ));
        assert!(matches!(
            mouse.move_abs(10, 10, 1920, 0),
            Err(DeviceError::ZeroScreenDimension)
        ));
        // Nothing reached the node.
        assert!(backend.handle().events_for(1).is_empty());
    }

    #[test]
    fn scroll_accumulates_into_clicks() {
        let backend = MockBackend::new();
        let handle = backend.handle();
        let mouse = Mouse::new(&backend).unwrap();

        mouse.vertical_scroll(50).unwrap();
        assert!(!handle
            .events()
            .iter()
            .any(|e| matches!(e, HidEvent::Rel { axis: RelAxis::Wheel, .. })));

        mouse.vertical_scroll(80).unwrap();
        assert!(handle.events().contains(&HidEvent::Rel {
            axis: RelAxis::Wheel,
            value: -1
        }));
        // Raw distance is forwarded on the hi-res axis each call.
        assert!(handle.events().contains(&HidEvent::Rel {
            axis: RelAxis::WheelHiRes,
            value: -80
        }));
    }

    #[test]
    fn horizontal_scroll_keeps_sign() {
        let backend = MockBackend::new();
        let mouse = Mouse::new(&backend).unwrap();
        mouse.horizontal_scroll(240).unwrap();
        assert!(backend.handle().events().contains(&HidEvent::Rel {
            axis: RelAxis::HWheel,
            value: 2
        }));
    }

    #[test]
    fn clones_share_scroll_state() {
        let backend = MockBackend::new();
        let mouse = Mouse::new(&backend).unwrap();
        let other = mouse.clone();
        mouse.vertical_scroll(100).unwrap();
        other.vertical_scroll(30).unwrap();
        assert!(backend.handle().events().contains(&HidEvent::Rel {
            axis: RelAxis::Wheel,
            value: -1
        }));
    }

    #[test]
    fn buttons_emit_edges() {
        let backend = MockBackend::new();
        let mouse = Mouse::new(&backend).unwrap();
        mouse.press(MouseButton::Side).unwrap();
        mouse.release(MouseButton::Side).unwrap();
        assert_eq!(
            backend.handle().events_for(0),
            vec![
                HidEvent::Key {
                    code: keys::BTN_SIDE,
                    pressed: true
                },
                HidEvent::Key {
                    code: keys::BTN_SIDE,
                    pressed: false
                },
            ]
        );
    }
}
