//! Virtual game controller.
//!
//! One joypad owns up to three nodes: the pad itself, an optional
//! motion-sensor node, and an optional touchpad surface, depending on the
//! capabilities chosen at construction. Button state arrives as a full
//! bitmask per report; the façade edge-detects against the previous mask
//! so consumers only see transitions.
//!
//! Consumer-originated feedback (rumble, LED color) is surfaced through
//! callbacks invoked from a background listener thread.

use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::{Arc, Mutex, Weak};
use std::thread;
use std::time::{Duration, Instant};

use ghost_input_types::joypad::{btn, caps};
use ghost_input_types::keys;
use ghost_input_types::{
    AbsAxis, AbsAxisSetup, BatteryState, ControllerType, DeviceClass, DeviceDefinition,
    DeviceProperty, FeedbackEvent, HidEvent, MotionType, StickPosition,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::backend::{Backend, EventSink, FeedbackSource};
use crate::error::DeviceError;
use crate::touch::TouchTracker;
use crate::{lock, udev, VirtualDevice};

const STICK_MIN: i32 = -32768;
const STICK_MAX: i32 = 32767;
const TRIGGER_MAX: i32 = 255;
/// Trigger travel past which a digital trigger reports pressed.
const TRIGGER_CLICK_THRESHOLD: i16 = i16::MAX / 2;

/// Accelerometer units per g and advertised range, matching what Sony
/// pads report so consumers reuse their calibration.
const ACCEL_RES: i32 = 8192;
const ACCEL_RANGE: i32 = 4 * ACCEL_RES;
const STANDARD_GRAVITY: f32 = 9.806_65;
/// Gyroscope units per deg/s.
const GYRO_RES: i32 = 1024;
const GYRO_RANGE: i32 = 2048 * GYRO_RES;

const TOUCHPAD_SLOTS: usize = 2;
const TOUCHPAD_X_MAX: i32 = 1919;
const TOUCHPAD_Y_MAX: i32 = 1079;
const TOUCHPAD_PRESSURE_MAX: i32 = 255;

const FEEDBACK_POLL_INTERVAL: Duration = Duration::from_millis(250);

/// Everything but the dpad, which maps to hat axes instead of keys.
const BUTTON_MAP: &[(u32, u16)] = &[
    (btn::START, keys::BTN_START),
    (btn::BACK, keys::BTN_SELECT),
    (btn::HOME, keys::BTN_MODE),
    (btn::LEFT_STICK, keys::BTN_THUMBL),
    (btn::RIGHT_STICK, keys::BTN_THUMBR),
    (btn::LEFT_BUTTON, keys::BTN_TL),
    (btn::RIGHT_BUTTON, keys::BTN_TR),
    (btn::A, keys::BTN_SOUTH),
    (btn::B, keys::BTN_EAST),
    (btn::X, keys::BTN_NORTH),
    (btn::Y, keys::BTN_WEST),
    (btn::PADDLE1_FLAG, keys::BTN_TRIGGER_HAPPY1),
    (btn::PADDLE2_FLAG, keys::BTN_TRIGGER_HAPPY2),
    (btn::PADDLE3_FLAG, keys::BTN_TRIGGER_HAPPY3),
    (btn::PADDLE4_FLAG, keys::BTN_TRIGGER_HAPPY4),
    (btn::TOUCHPAD_FLAG, keys::BTN_TRIGGER_HAPPY5),
    (btn::MISC_FLAG, keys::BTN_TRIGGER_HAPPY6),
];

/// Joypad construction parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JoypadConfig {
    pub controller_type: ControllerType,
    /// Bitmask of [`caps`] flags.
    pub capabilities: u8,
}

impl Default for JoypadConfig {
    fn default() -> Self {
        Self {
            controller_type: ControllerType::Xbox,
            capabilities: caps::ANALOG_TRIGGERS | caps::RUMBLE,
        }
    }
}

impl JoypadConfig {
    fn has(&self, cap: u8) -> bool {
        self.capabilities & cap != 0
    }

    /// Identity consumers key their quirk tables on.
    fn identity(&self) -> (&'static str, u16, u16) {
        match self.controller_type {
            ControllerType::Xbox => ("Microsoft X-Box 360 pad", 0x045e, 0x028e),
            ControllerType::Ps => ("DualSense Wireless Controller", 0x054c, 0x0ce6),
            ControllerType::Nintendo => ("Nintendo Pro Controller", 0x057e, 0x2009),
            ControllerType::Unknown => ("ghost-input Gamepad", 0x1209, 0x0007),
        }
    }
}

fn pad_definition(config: &JoypadConfig) -> DeviceDefinition {
    let (name, vendor_id, product_id) = config.identity();
    let mut keys_list = vec![
        keys::BTN_SOUTH,
        keys::BTN_EAST,
        keys::BTN_NORTH,
        keys::BTN_WEST,
        keys::BTN_TL,
        keys::BTN_TR,
        keys::BTN_SELECT,
        keys::BTN_START,
        keys::BTN_MODE,
        keys::BTN_THUMBL,
        keys::BTN_THUMBR,
        keys::BTN_TRIGGER_HAPPY1,
        keys::BTN_TRIGGER_HAPPY2,
        keys::BTN_TRIGGER_HAPPY3,
        keys::BTN_TRIGGER_HAPPY4,
        keys::BTN_TRIGGER_HAPPY5,
        keys::BTN_TRIGGER_HAPPY6,
    ];
    let mut abs_axes = vec![
        AbsAxisSetup::new(AbsAxis::X, STICK_MIN, STICK_MAX),
        AbsAxisSetup::new(AbsAxis::Y, STICK_MIN, STICK_MAX),
        AbsAxisSetup::new(AbsAxis::Rx, STICK_MIN, STICK_MAX),
        AbsAxisSetup::new(AbsAxis::Ry, STICK_MIN, STICK_MAX),
        AbsAxisSetup::new(AbsAxis::Hat0X, -1, 1),
        AbsAxisSetup::new(AbsAxis::Hat0Y, -1, 1),
    ];
    if config.has(caps::ANALOG_TRIGGERS) {
        abs_axes.push(AbsAxisSetup::new(AbsAxis::Z, 0, TRIGGER_MAX));
        abs_axes.push(AbsAxisSetup::new(AbsAxis::Rz, 0, TRIGGER_MAX));
    } else {
        keys_list.push(keys::BTN_TL2);
        keys_list.push(keys::BTN_TR2);
    }
    DeviceDefinition {
        vendor_id,
        product_id,
        version: 0x0110,
        keys: keys_list,
        abs_axes,
        ff_rumble: config.has(caps::RUMBLE),
        ..DeviceDefinition::new(name, DeviceClass::Gamepad)
    }
}

fn motion_definition(config: &JoypadConfig) -> DeviceDefinition {
    let (name, vendor_id, product_id) = config.identity();
    DeviceDefinition {
        vendor_id,
        product_id,
        version: 0x0110,
        abs_axes: vec![
            AbsAxisSetup::new(AbsAxis::X, -ACCEL_RANGE, ACCEL_RANGE).with_resolution(ACCEL_RES),
            AbsAxisSetup::new(AbsAxis::Y, -ACCEL_RANGE, ACCEL_RANGE).with_resolution(ACCEL_RES),
            AbsAxisSetup::new(AbsAxis::Z, -ACCEL_RANGE, ACCEL_RANGE).with_resolution(ACCEL_RES),
            AbsAxisSetup::new(AbsAxis::Rx, -GYRO_RANGE, GYRO_RANGE).with_resolution(GYRO_RES),
            AbsAxisSetup::new(AbsAxis::Ry, -GYRO_RANGE, GYRO_RANGE).with_resolution(GYRO_RES),
            AbsAxisSetup::new(AbsAxis::Rz, -GYRO_RANGE, GYRO_RANGE).with_resolution(GYRO_RES),
        ],
        properties: vec![DeviceProperty::Accelerometer],
        msc_timestamp: true,
        ..DeviceDefinition::new(format!("{name} Motion Sensors"), DeviceClass::MotionSensors)
    }
}

fn touchpad_definition(config: &JoypadConfig) -> DeviceDefinition {
    let (name, vendor_id, product_id) = config.identity();
    DeviceDefinition {
        vendor_id,
        product_id,
        version: 0x0110,
        keys: vec![
            keys::BTN_LEFT,
            keys::BTN_TOUCH,
            keys::BTN_TOOL_FINGER,
            keys::BTN_TOOL_DOUBLETAP,
        ],
        abs_axes: vec![
            AbsAxisSetup::new(AbsAxis::X, 0, TOUCHPAD_X_MAX).with_resolution(44),
            AbsAxisSetup::new(AbsAxis::Y, 0, TOUCHPAD_Y_MAX).with_resolution(45),
            AbsAxisSetup::new(AbsAxis::MtSlot, 0, TOUCHPAD_SLOTS as i32 - 1),
            AbsAxisSetup::new(AbsAxis::MtTrackingId, 0, 65535),
            AbsAxisSetup::new(AbsAxis::MtPositionX, 0, TOUCHPAD_X_MAX).with_resolution(44),
            AbsAxisSetup::new(AbsAxis::MtPositionY, 0, TOUCHPAD_Y_MAX).with_resolution(45),
            AbsAxisSetup::new(AbsAxis::MtPressure, 0, TOUCHPAD_PRESSURE_MAX),
        ],
        properties: vec![DeviceProperty::Pointer, DeviceProperty::ButtonPad],
        ..DeviceDefinition::new(format!("{name} Touchpad"), DeviceClass::Trackpad)
    }
}

struct PadState {
    sink: Box<dyn EventSink>,
    buttons: u32,
    left_trigger_pressed: bool,
    right_trigger_pressed: bool,
}

struct TouchpadState {
    sink: Box<dyn EventSink>,
    tracker: TouchTracker,
}

type RumbleCallback = Arc<dyn Fn(u16, u16) + Send + Sync>;
type LedCallback = Arc<dyn Fn(u8, u8, u8) + Send + Sync>;

#[derive(Default)]
struct Callbacks {
    on_rumble: Option<RumbleCallback>,
    on_led: Option<LedCallback>,
}

struct Shared {
    config: JoypadConfig,
    nodes: Vec<String>,
    udev_events: Vec<HashMap<String, String>>,
    hwdb_entries: Vec<(String, Vec<String>)>,
    created: Instant,
    pad: Mutex<PadState>,
    motion: Option<Mutex<Box<dyn EventSink>>>,
    touchpad: Option<Mutex<TouchpadState>>,
    battery: Mutex<(BatteryState, u8)>,
    callbacks: Mutex<Callbacks>,
}

/// A virtual game controller. Clones are additional handles to the same
/// device; the feedback listener stops when the last handle drops.
#[derive(Clone)]
pub struct Joypad {
    shared: Arc<Shared>,
}

impl Joypad {
    pub fn new(backend: &dyn Backend, config: JoypadConfig) -> Result<Self, DeviceError> {
        let pad_def = pad_definition(&config);
        let pad = backend.create(&pad_def)?;
        let mut nodes = pad.nodes.clone();
        let mut udev_events = udev::udev_events(&pad_def, &pad.nodes);
        let hwdb_entries = udev::hwdb_entries(&pad_def);

        let motion = if config.has(caps::ACCELEROMETER) || config.has(caps::GYRO) {
            let def = motion_definition(&config);
            let device = backend.create(&def)?;
            nodes.extend(device.nodes.clone());
            udev_events.extend(udev::udev_events(&def, &device.nodes));
            Some(Mutex::new(device.sink))
        } else {
            None
        };

        let touchpad = if config.has(caps::TOUCHPAD) {
            let def = touchpad_definition(&config);
            let device = backend.create(&def)?;
            nodes.extend(device.nodes.clone());
            udev_events.extend(udev::udev_events(&def, &device.nodes));
            Some(Mutex::new(TouchpadState {
                sink: device.sink,
                tracker: TouchTracker::new(
                    TOUCHPAD_SLOTS,
                    TOUCHPAD_X_MAX,
                    TOUCHPAD_Y_MAX,
                    TOUCHPAD_PRESSURE_MAX,
                )
                .with_finger_count_keys(),
            }))
        } else {
            None
        };

        debug!(
            controller = ?config.controller_type,
            capabilities = format_args!("{:#04x}", config.capabilities),
            nodes = ?nodes,
            "created virtual joypad"
        );

        let shared = Arc::new(Shared {
            config,
            nodes,
            udev_events,
            hwdb_entries,
            created: Instant::now(),
            pad: Mutex::new(PadState {
                sink: pad.sink,
                buttons: 0,
                left_trigger_pressed: false,
                right_trigger_pressed: false,
            }),
            motion,
            touchpad,
            battery: Mutex::new((BatteryState::NotKnown, 0)),
            callbacks: Mutex::new(Callbacks::default()),
        });

        if let Some(source) = pad.feedback {
            let weak = Arc::downgrade(&shared);
            thread::Builder::new()
                .name("joypad-feedback".into())
                .spawn(move || feedback_loop(&weak, source))
                .map_err(|e| DeviceError::NodeCreate(format!("feedback thread: {e}")))?;
        }

        Ok(Self { shared })
    }

    fn require(&self, cap: u8, name: &'static str) -> Result<(), DeviceError> {
        if self.shared.config.has(cap) {
            Ok(())
        } else {
            Err(DeviceError::CapabilityMissing(name))
        }
    }

    /// Reports the full button state; only the transitions against the
    /// previous report are injected.
    pub fn set_pressed_buttons(&self, new_mask: u32) -> Result<(), DeviceError> {
        let mut state = lock(&self.shared.pad);
        let prev = state.buttons;
        if prev == new_mask {
            return Ok(());
        }

        let to_press = new_mask & !prev;
        let to_release = prev & !new_mask;

        // Every release lands before any press, so a consumer never sees
        // more buttons down than either report holds.
        let mut events = Vec::new();
        for &(flag, code) in BUTTON_MAP {
            if to_release & flag != 0 {
                events.push(HidEvent::Key {
                    code,
                    pressed: false,
                });
            }
        }
        for &(flag, code) in BUTTON_MAP {
            if to_press & flag != 0 {
                events.push(HidEvent::Key {
                    code,
                    pressed: true,
                });
            }
        }

        let (prev_x, prev_y) = hat_values(prev);
        let (new_x, new_y) = hat_values(new_mask);
        if prev_x != new_x {
            events.push(HidEvent::Abs {
                axis: AbsAxis::Hat0X,
                value: new_x,
            });
        }
        if prev_y != new_y {
            events.push(HidEvent::Abs {
                axis: AbsAxis::Hat0Y,
                value: new_y,
            });
        }

        state.buttons = new_mask;
        if events.is_empty() {
            // HOME and SPECIAL alias the same bit; a mask change can
            // still produce no transition.
            return Ok(());
        }
        state.sink.emit(&events)
    }

    /// Trigger travel, `0..=i16::MAX` each. Analog-trigger pads report
    /// the scaled axis; others report a digital click past half travel.
    pub fn set_triggers(&self, left: i16, right: i16) -> Result<(), DeviceError> {
        let mut state = lock(&self.shared.pad);
        let mut events = Vec::new();
        if self.shared.config.has(caps::ANALOG_TRIGGERS) {
            events.push(HidEvent::Abs {
                axis: AbsAxis::Z,
                value: scale_trigger(left),
            });
            events.push(HidEvent::Abs {
                axis: AbsAxis::Rz,
                value: scale_trigger(right),
            });
        } else {
            let left_pressed = left > TRIGGER_CLICK_THRESHOLD;
            let right_pressed = right > TRIGGER_CLICK_THRESHOLD;
            if left_pressed != state.left_trigger_pressed {
                events.push(HidEvent::Key {
                    code: keys::BTN_TL2,
                    pressed: left_pressed,
                });
                state.left_trigger_pressed = left_pressed;
            }
            if right_pressed != state.right_trigger_pressed {
                events.push(HidEvent::Key {
                    code: keys::BTN_TR2,
                    pressed: right_pressed,
                });
                state.right_trigger_pressed = right_pressed;
            }
            if events.is_empty() {
                return Ok(());
            }
        }
        state.sink.emit(&events)
    }

    /// Stick position; positive `y` is up, matching the client
    /// convention (the axis is inverted on the wire).
    pub fn set_stick(&self, stick: StickPosition, x: i16, y: i16) -> Result<(), DeviceError> {
        let (x_axis, y_axis) = match stick {
            StickPosition::LS => (AbsAxis::X, AbsAxis::Y),
            StickPosition::RS => (AbsAxis::Rx, AbsAxis::Ry),
        };
        let mut state = lock(&self.shared.pad);
        state.sink.emit(&[
            HidEvent::Abs {
                axis: x_axis,
                value: i32::from(x),
            },
            HidEvent::Abs {
                axis: y_axis,
                value: (-i32::from(y)).clamp(STICK_MIN, STICK_MAX),
            },
        ])
    }

    /// One motion-sensor sample: acceleration in m/s², rotation in
    /// deg/s.
    pub fn set_motion(
        &self,
        motion_type: MotionType,
        x: f32,
        y: f32,
        z: f32,
    ) -> Result<(), DeviceError> {
        match motion_type {
            MotionType::Acceleration => self.require(caps::ACCELEROMETER, "ACCELEROMETER")?,
            MotionType::Gyroscope => self.require(caps::GYRO, "GYRO")?,
        }
        let sink = self
            .shared
            .motion
            .as_ref()
            .ok_or(DeviceError::CapabilityMissing("motion sensors"))?;

        let (axes, scale): ([AbsAxis; 3], f32) = match motion_type {
            MotionType::Acceleration => (
                [AbsAxis::X, AbsAxis::Y, AbsAxis::Z],
                ACCEL_RES as f32 / STANDARD_GRAVITY,
            ),
            MotionType::Gyroscope => ([AbsAxis::Rx, AbsAxis::Ry, AbsAxis::Rz], GYRO_RES as f32),
        };

        let micros = (self.shared.created.elapsed().as_micros() & 0x7fff_ffff) as i32;
        let mut events: Vec<HidEvent> = [x, y, z]
            .iter()
            .zip(axes)
            .map(|(value, axis)| HidEvent::Abs {
                axis,
                value: (value * scale).round() as i32,
            })
            .collect();
        events.push(HidEvent::MscTimestamp { micros });

        lock(sink).emit(&events)
    }

    /// Places or moves a touchpad contact (Sony-style pads). Coordinates
    /// and pressure are normalized to `[0, 1]`.
    pub fn touchpad_place_finger(
        &self,
        slot: usize,
        x: f32,
        y: f32,
        pressure: f32,
    ) -> Result<(), DeviceError> {
        self.require(caps::TOUCHPAD, "TOUCHPAD")?;
        let touchpad = self
            .shared
            .touchpad
            .as_ref()
            .ok_or(DeviceError::CapabilityMissing("TOUCHPAD"))?;
        let mut state = lock(touchpad);
        let events = state.tracker.place_finger(slot, x, y, pressure)?;
        state.sink.emit(&events)
    }

    pub fn touchpad_release_finger(&self, slot: usize) -> Result<(), DeviceError> {
        self.require(caps::TOUCHPAD, "TOUCHPAD")?;
        let touchpad = self
            .shared
            .touchpad
            .as_ref()
            .ok_or(DeviceError::CapabilityMissing("TOUCHPAD"))?;
        let mut state = lock(touchpad);
        let events = state.tracker.release_finger(slot)?;
        if events.is_empty() {
            return Ok(());
        }
        state.sink.emit(&events)
    }

    /// Battery charge report; percentage is clamped to `0..=100`.
    pub fn set_battery(&self, state: BatteryState, percentage: u8) -> Result<(), DeviceError> {
        self.require(caps::BATTERY, "BATTERY")?;
        *lock(&self.shared.battery) = (state, percentage.min(100));
        Ok(())
    }

    /// Last reported battery state.
    pub fn battery(&self) -> (BatteryState, u8) {
        *lock(&self.shared.battery)
    }

    /// Registers the rumble callback, replacing any previous one. Called
    /// from a background thread with `(low_freq, high_freq)` magnitudes;
    /// a stop is reported as `(0, 0)`. Without the `RUMBLE` capability
    /// the registration is kept but never fires.
    pub fn set_on_rumble(&self, callback: impl Fn(u16, u16) + Send + Sync + 'static) {
        if !self.shared.config.has(caps::RUMBLE) {
            debug!("rumble callback registered without RUMBLE capability, will never fire");
            return;
        }
        lock(&self.shared.callbacks).on_rumble = Some(Arc::new(callback));
    }

    /// Registers the LED-color callback, replacing any previous one.
    /// Without the `RGB_LED` capability the registration never fires.
    pub fn set_on_led(&self, callback: impl Fn(u8, u8, u8) + Send + Sync + 'static) {
        if !self.shared.config.has(caps::RGB_LED) {
            debug!("led callback registered without RGB_LED capability, will never fire");
            return;
        }
        lock(&self.shared.callbacks).on_led = Some(Arc::new(callback));
    }
}

/// Hat axis values encoded in a button mask.
fn hat_values(mask: u32) -> (i32, i32) {
    let x = i32::from(mask & btn::DPAD_RIGHT != 0) - i32::from(mask & btn::DPAD_LEFT != 0);
    let y = i32::from(mask & btn::DPAD_DOWN != 0) - i32::from(mask & btn::DPAD_UP != 0);
    (x, y)
}

fn scale_trigger(value: i16) -> i32 {
    i32::from(value.max(0)) * TRIGGER_MAX / i32::from(i16::MAX)
}

fn feedback_loop(shared: &Weak<Shared>, mut source: Box<dyn FeedbackSource>) {
    loop {
        let polled = source.poll(FEEDBACK_POLL_INTERVAL);
        let Some(shared) = shared.upgrade() else {
            return;
        };
        let event = match polled {
            Ok(Some(event)) => event,
            Ok(None) => continue,
            Err(e) => {
                warn!(error = %e, "feedback poll failed");
                thread::sleep(FEEDBACK_POLL_INTERVAL);
                continue;
            }
        };

        // Clone the callback out so user code runs without any lock held.
        match event {
            FeedbackEvent::Rumble { low, high } => {
                let callback = lock(&shared.callbacks).on_rumble.clone();
                if let Some(callback) = callback {
                    if catch_unwind(AssertUnwindSafe(|| callback(low, high))).is_err() {
                        warn!("rumble callback panicked");
                    }
                }
            }
            FeedbackEvent::Led { r, g, b } => {
                let callback = lock(&shared.callbacks).on_led.clone();
                if let Some(callback) = callback {
                    if catch_unwind(AssertUnwindSafe(|| callback(r, g, b))).is_err() {
                        warn!("led callback panicked");
                    }
                }
            }
        }
    }
}

impl VirtualDevice for Joypad {
    fn get_nodes(&self) -> Vec<String> {
        self.shared.nodes.clone()
    }

    fn get_udev_events(&self) -> Vec<HashMap<String, String>> {
        self.shared.udev_events.clone()
    }

    fn get_udev_hw_db_entries(&self) -> Vec<(String, Vec<String>)> {
        self.shared.hwdb_entries.clone()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use super::*;
    use crate::mock::MockBackend;

    fn pad_with(capabilities: u8) -> (MockBackend, Joypad) {
        let backend = MockBackend::new();
        let pad = Joypad::new(
            &backend,
            JoypadConfig {
                controller_type: ControllerType::Xbox,
                capabilities,
            },
        )
        .unwrap();
        (backend, pad)
    }

    fn down(code: u16) -> HidEvent {
        HidEvent::Key {
            code,
            pressed: true,
        }
    }

    fn up(code: u16) -> HidEvent {
        HidEvent::Key {
            code,
            pressed: false,
        }
    }

    #[test]
    fn node_layout_follows_capabilities() {
        let (_, minimal) = pad_with(caps::ANALOG_TRIGGERS);
        assert_eq!(minimal.get_nodes().len(), 1);

        let (backend, full) = pad_with(
            caps::ANALOG_TRIGGERS | caps::TOUCHPAD | caps::ACCELEROMETER | caps::GYRO,
        );
        assert_eq!(full.get_nodes().len(), 3);
        assert_eq!(full.get_udev_hw_db_entries().len(), 1);

        let defs = backend.handle().definitions();
        assert_eq!(defs[0].class, DeviceClass::Gamepad);
        assert_eq!(defs[1].class, DeviceClass::MotionSensors);
        assert!(defs[1].msc_timestamp);
        assert_eq!(defs[2].class, DeviceClass::Trackpad);
    }

    #[test]
    fn digital_trigger_pads_swap_axes_for_keys() {
        let (backend, _) = pad_with(0);
        let def = &backend.handle().definitions()[0];
        assert!(def.keys.contains(&keys::BTN_TL2));
        assert!(!def.abs_axes.iter().any(|a| a.axis == AbsAxis::Z));

        let (backend, _) = pad_with(caps::ANALOG_TRIGGERS);
        let def = &backend.handle().definitions()[0];
        assert!(!def.keys.contains(&keys::BTN_TL2));
        assert!(def.abs_axes.iter().any(|a| a.axis == AbsAxis::Z));
    }

    #[test]
    fn button_mask_is_edge_detected() {
        let (backend, pad) = pad_with(caps::ANALOG_TRIGGERS);
        pad.set_pressed_buttons(btn::A | btn::B).unwrap();
        assert_eq!(
            backend.handle().events(),
            vec![down(keys::BTN_SOUTH), down(keys::BTN_EAST)]
        );

        backend.handle().clear();
        pad.set_pressed_buttons(btn::B | btn::X).unwrap();
        assert_eq!(
            backend.handle().events(),
            vec![up(keys::BTN_SOUTH), down(keys::BTN_NORTH)]
        );

        // Unchanged mask produces no frame.
        backend.handle().clear();
        pad.set_pressed_buttons(btn::B | btn::X).unwrap();
        assert!(backend.handle().frames().is_empty());

        // Releases precede presses even when the pressed button sits
        // earlier in the map than the released one: HOME -> START must
        // lift BTN_MODE before asserting BTN_START.
        pad.set_pressed_buttons(btn::HOME).unwrap();
        backend.handle().clear();
        pad.set_pressed_buttons(btn::START).unwrap();
        assert_eq!(
            backend.handle().events(),
            vec![up(keys::BTN_MODE), down(keys::BTN_START)]
        );
    }

    #[test]
    fn dpad_maps_to_hat_axes() {
        let (backend, pad) = pad_with(caps::ANALOG_TRIGGERS);
        pad.set_pressed_buttons(btn::DPAD_UP | btn::DPAD_LEFT).unwrap();
        let events = backend.handle().events();
        assert!(events.contains(&HidEvent::Abs {
            axis: AbsAxis::Hat0X,
            value: -1
        }));
        assert!(events.contains(&HidEvent::Abs {
            axis: AbsAxis::Hat0Y,
            value: -1
        }));

        backend.handle().clear();
        pad.set_pressed_buttons(0).unwrap();
        let events = backend.handle().events();
        assert!(events.contains(&HidEvent::Abs {
            axis: AbsAxis::Hat0X,
            value: 0
        }));
        assert!(events.contains(&HidEvent::Abs {
            axis: AbsAxis::Hat0Y,
            value: 0
        }));
    }

    #[test]
    fn home_and_special_share_one_key() {
        let (backend, pad) = pad_with(caps::ANALOG_TRIGGERS);
        pad.set_pressed_buttons(btn::HOME).unwrap();
        assert_eq!(backend.handle().events(), vec![down(keys::BTN_MODE)]);

        // Same bit under the other name: no transition.
        backend.handle().clear();
        pad.set_pressed_buttons(btn::SPECIAL_FLAG).unwrap();
        assert!(backend.handle().frames().is_empty());
    }

    #[test]
    fn analog_triggers_scale_to_full_travel() {
        let (backend, pad) = pad_with(caps::ANALOG_TRIGGERS);
        pad.set_triggers(i16::MAX, 0).unwrap();
        assert_eq!(
            backend.handle().events(),
            vec![
                HidEvent::Abs {
                    axis: AbsAxis::Z,
                    value: 255
                },
                HidEvent::Abs {
                    axis: AbsAxis::Rz,
                    value: 0
                },
            ]
        );

        // Negative travel clamps to rest.
        backend.handle().clear();
        pad.set_triggers(-100, i16::MAX / 2).unwrap();
        assert_eq!(
            backend.handle().events(),
            vec![
                HidEvent::Abs {
                    axis: AbsAxis::Z,
                    value: 0
                },
                HidEvent::Abs {
                    axis: AbsAxis::Rz,
                    value: 127
                },
            ]
        );
    }

    #[test]
    fn digital_triggers_click_past_half_travel() {
        let (backend, pad) = pad_with(0);
        pad.set_triggers(TRIGGER_CLICK_THRESHOLD, 0).unwrap();
        assert!(backend.handle().frames().is_empty());

        pad.set_triggers(i16::MAX, 0).unwrap();
        assert_eq!(backend.handle().events(), vec![down(keys::BTN_TL2)]);

        backend.handle().clear();
        pad.set_triggers(i16::MAX, 0).unwrap();
        assert!(backend.handle().frames().is_empty());

        pad.set_triggers(0, 0).unwrap();
        assert_eq!(backend.handle().events(), vec![up(keys::BTN_TL2)]);
    }

    #[test]
    fn stick_y_axis_is_inverted() {
        let (backend, pad) = pad_with(caps::ANALOG_TRIGGERS);
        pad.set_stick(StickPosition::LS, 1000, 2000).unwrap();
        assert_eq!(
            backend.handle().events(),
            vec![
                HidEvent::Abs {
                    axis: AbsAxis::X,
                    value: 1000
                },
                HidEvent::Abs {
                    axis: AbsAxis::Y,
                    value: -2000
                },
            ]
        );

        backend.handle().clear();
        pad.set_stick(StickPosition::RS, 0, i16::MIN).unwrap();
        assert!(backend.handle().events().contains(&HidEvent::Abs {
            axis: AbsAxis::Ry,
            value: STICK_MAX
        }));
    }

    #[test]
    fn motion_requires_capability() {
        let (_, pad) = pad_with(caps::ANALOG_TRIGGERS);
        assert!(matches!(
            pad.set_motion(MotionType::Acceleration, 0.0, 0.0, 9.8),
            Err(DeviceError::CapabilityMissing("ACCELEROMETER"))
        ));
        let (_, pad) = pad_with(caps::ACCELEROMETER);
        assert!(matches!(
            pad.set_motion(MotionType::Gyroscope, 0.0, 0.0, 1.0),
            Err(DeviceError::CapabilityMissing("GYRO"))
        ));
    }

    #[test]
    fn motion_samples_are_scaled_and_timestamped() {
        let (backend, pad) = pad_with(caps::ACCELEROMETER | caps::GYRO);
        pad.set_motion(MotionType::Acceleration, 0.0, 0.0, STANDARD_GRAVITY)
            .unwrap();
        let events = backend.handle().events_for(1);
        assert!(events.contains(&HidEvent::Abs {
            axis: AbsAxis::Z,
            value: ACCEL_RES
        }));
        assert!(events
            .iter()
            .any(|e| matches!(e, HidEvent::MscTimestamp { .. })));

        backend.handle().clear();
        pad.set_motion(MotionType::Gyroscope, 2.0, 0.0, 0.0).unwrap();
        assert!(backend.handle().events_for(1).contains(&HidEvent::Abs {
            axis: AbsAxis::Rx,
            value: 2 * GYRO_RES
        }));
    }

    #[test]
    fn touchpad_is_gated_and_tracks_contacts() {
        let (_, pad) = pad_with(caps::ANALOG_TRIGGERS);
        assert!(matches!(
            pad.touchpad_place_finger(0, 0.5, 0.5, 0.5),
            Err(DeviceError::CapabilityMissing("TOUCHPAD"))
        ));

        let (backend, pad) = pad_with(caps::TOUCHPAD);
        pad.touchpad_place_finger(0, 1.0, 0.0, 1.0).unwrap();
        let events = backend.handle().events_for(1);
        assert!(events.contains(&HidEvent::Abs {
            axis: AbsAxis::MtPositionX,
            value: TOUCHPAD_X_MAX
        }));
        assert!(events.contains(&down(keys::BTN_TOUCH)));
        // The pad reports finger count like a trackpad.
        assert!(events.contains(&down(keys::BTN_TOOL_FINGER)));
        pad.touchpad_release_finger(0).unwrap();
        assert!(backend.handle().events_for(1).contains(&up(keys::BTN_TOUCH)));
    }

    #[test]
    fn battery_is_clamped_and_readable() {
        let (_, pad) = pad_with(0);
        assert!(matches!(
            pad.set_battery(BatteryState::Charging, 50),
            Err(DeviceError::CapabilityMissing("BATTERY"))
        ));

        let (_, pad) = pad_with(caps::BATTERY);
        assert_eq!(pad.battery(), (BatteryState::NotKnown, 0));
        pad.set_battery(BatteryState::Charging, 200).unwrap();
        assert_eq!(pad.battery(), (BatteryState::Charging, 100));
    }

    #[test]
    fn rumble_events_reach_the_callback() {
        let (backend, pad) = pad_with(caps::RUMBLE);
        let (tx, rx) = mpsc::channel();
        pad.set_on_rumble(move |low, high| {
            tx.send((low, high)).unwrap();
        });

        let senders = backend.feedback_senders();
        senders[0]
            .send(FeedbackEvent::Rumble {
                low: 0x1000,
                high: 0x2000,
            })
            .unwrap();
        let received = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(received, (0x1000, 0x2000));
    }

    #[test]
    fn callback_without_capability_never_fires() {
        let (backend, pad) = pad_with(0);
        let (tx, rx) = mpsc::channel();
        pad.set_on_rumble(move |low, high| {
            tx.send((low, high)).unwrap();
        });

        // Feedback arrives, but the registration was dropped.
        let senders = backend.feedback_senders();
        senders[0].send(FeedbackEvent::Rumble { low: 9, high: 9 }).unwrap();
        assert!(rx.recv_timeout(Duration::from_millis(600)).is_err());
    }

    #[test]
    fn panicking_callback_does_not_kill_the_listener() {
        let (backend, pad) = pad_with(caps::RUMBLE);
        let (tx, rx) = mpsc::channel();
        let first = std::sync::atomic::AtomicBool::new(true);
        pad.set_on_rumble(move |low, high| {
            if first.swap(false, std::sync::atomic::Ordering::SeqCst) {
                panic!("boom");
            }
            tx.send((low, high)).unwrap();
        });

        let senders = backend.feedback_senders();
        senders[0].send(FeedbackEvent::Rumble { low: 1, high: 1 }).unwrap();
        senders[0].send(FeedbackEvent::Rumble { low: 2, high: 2 }).unwrap();
        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), (2, 2));
    }
}
