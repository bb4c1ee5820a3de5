//! uinput-based backend for Linux.
//!
//! Creates one kernel virtual device per [`DeviceDefinition`] and
//! translates [`HidEvent`] batches into evdev events. For rumble-capable
//! pads the same device handles the uinput force-feedback handshake:
//! effect uploads are acknowledged and remembered, and play requests are
//! surfaced as [`FeedbackEvent::Rumble`].

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use evdev::uinput::VirtualDevice;
use evdev::{
    AbsInfo, AbsoluteAxisCode, AttributeSet, BusType, EventType, FFEffectCode, FFEffectKind,
    InputId, KeyCode, MiscCode, PropType, RelativeAxisCode, UInputCode, UinputAbsSetup,
};
use ghost_input_types::{
    AbsAxis, DeviceDefinition, DeviceProperty, FeedbackEvent, HidEvent, RelAxis,
};
use tracing::{debug, trace, warn};

use crate::backend::{Backend, BackendDevice, EventSink, FeedbackSource};
use crate::error::DeviceError;
use crate::lock;

/// Concurrent force-feedback effects a pad advertises.
const FF_EFFECTS_MAX: u32 = 16;
/// Granularity of the feedback poll loop between fd reads.
const FF_POLL_STEP: Duration = Duration::from_millis(20);

/// Backend creating kernel devices through `/dev/uinput`.
#[derive(Debug, Default, Clone, Copy)]
pub struct UinputBackend;

impl UinputBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Backend for UinputBackend {
    fn create(&self, def: &DeviceDefinition) -> Result<BackendDevice, DeviceError> {
        let device = build_device(def).map_err(|e| DeviceError::NodeCreate(e.to_string()))?;
        let device = Arc::new(Mutex::new(device));

        let nodes = enumerate_nodes(&device).map_err(|e| DeviceError::NodeCreate(e.to_string()))?;
        debug!(name = %def.name, nodes = ?nodes, "created uinput device");

        let feedback: Option<Box<dyn FeedbackSource>> = if def.ff_rumble {
            Some(Box::new(UinputFeedbackSource {
                device: Arc::clone(&device),
                effects: HashMap::new(),
                queue: VecDeque::new(),
            }))
        } else {
            None
        };

        Ok(BackendDevice {
            sink: Box::new(UinputSink { device }),
            feedback,
            nodes,
        })
    }
}

fn build_device(def: &DeviceDefinition) -> io::Result<VirtualDevice> {
    let mut builder = VirtualDevice::builder()?
        .name(&def.name)
        .input_id(InputId::new(
            BusType::BUS_USB,
            def.vendor_id,
            def.product_id,
            def.version,
        ));

    if !def.keys.is_empty() {
        let mut keys = AttributeSet::<KeyCode>::new();
        for &code in &def.keys {
            keys.insert(KeyCode(code));
        }
        builder = builder.with_keys(&keys)?;
    }

    if !def.rel_axes.is_empty() {
        let mut rel = AttributeSet::<RelativeAxisCode>::new();
        for &axis in &def.rel_axes {
            rel.insert(rel_code(axis));
        }
        builder = builder.with_relative_axes(&rel)?;
    }

    for setup in &def.abs_axes {
        let info = AbsInfo::new(0, setup.min, setup.max, 0, 0, setup.resolution);
        builder = builder.with_absolute_axis(&UinputAbsSetup::new(abs_code(setup.axis), info))?;
    }

    if !def.properties.is_empty() {
        let mut props = AttributeSet::<PropType>::new();
        for &prop in &def.properties {
            props.insert(prop_code(prop));
        }
        builder = builder.with_properties(&props)?;
    }

    if def.msc_timestamp {
        let mut msc = AttributeSet::<MiscCode>::new();
        msc.insert(MiscCode::MSC_TIMESTAMP);
        builder = builder.with_msc(&msc)?;
    }

    if def.ff_rumble {
        let mut effects = AttributeSet::<FFEffectCode>::new();
        effects.insert(FFEffectCode::FF_RUMBLE);
        builder = builder.with_ff(&effects)?.with_ff_effects_max(FF_EFFECTS_MAX);
    }

    builder.build()
}

fn enumerate_nodes(device: &Arc<Mutex<VirtualDevice>>) -> io::Result<Vec<String>> {
    let mut guard = lock(device);
    let mut nodes = Vec::new();
    for path in guard.enumerate_dev_nodes_blocking()? {
        nodes.push(path?.to_string_lossy().into_owned());
    }
    Ok(nodes)
}

fn rel_code(axis: RelAxis) -> RelativeAxisCode {
    match axis {
        RelAxis::X => RelativeAxisCode::REL_X,
        RelAxis::Y => RelativeAxisCode::REL_Y,
        RelAxis::Wheel => RelativeAxisCode::REL_WHEEL,
        RelAxis::HWheel => RelativeAxisCode::REL_HWHEEL,
        RelAxis::WheelHiRes => RelativeAxisCode::REL_WHEEL_HI_RES,
        RelAxis::HWheelHiRes => RelativeAxisCode::REL_HWHEEL_HI_RES,
    }
}

fn abs_code(axis: AbsAxis) -> AbsoluteAxisCode {
    match axis {
        AbsAxis::X => AbsoluteAxisCode::ABS_X,
        AbsAxis::Y => AbsoluteAxisCode::ABS_Y,
        AbsAxis::Z => AbsoluteAxisCode::ABS_Z,
        AbsAxis::Rx => AbsoluteAxisCode::ABS_RX,
        AbsAxis::Ry => AbsoluteAxisCode::ABS_RY,
        AbsAxis::Rz => AbsoluteAxisCode::ABS_RZ,
        AbsAxis::Hat0X => AbsoluteAxisCode::ABS_HAT0X,
        AbsAxis::Hat0Y => AbsoluteAxisCode::ABS_HAT0Y,
        AbsAxis::Pressure => AbsoluteAxisCode::ABS_PRESSURE,
        AbsAxis::Distance => AbsoluteAxisCode::ABS_DISTANCE,
        AbsAxis::TiltX => AbsoluteAxisCode::ABS_TILT_X,
        AbsAxis::TiltY => AbsoluteAxisCode::ABS_TILT_Y,
        AbsAxis::MtSlot => AbsoluteAxisCode::ABS_MT_SLOT,
        AbsAxis::MtTrackingId => AbsoluteAxisCode::ABS_MT_TRACKING_ID,
        AbsAxis::MtPositionX => AbsoluteAxisCode::ABS_MT_POSITION_X,
        AbsAxis::MtPositionY => AbsoluteAxisCode::ABS_MT_POSITION_Y,
        AbsAxis::MtPressure => AbsoluteAxisCode::ABS_MT_PRESSURE,
    }
}

fn prop_code(prop: DeviceProperty) -> PropType {
    match prop {
        DeviceProperty::Pointer => PropType::POINTER,
        DeviceProperty::Direct => PropType::DIRECT,
        DeviceProperty::ButtonPad => PropType::BUTTONPAD,
        DeviceProperty::Accelerometer => PropType::ACCELEROMETER,
    }
}

fn to_evdev(event: HidEvent) -> evdev::InputEvent {
    match event {
        HidEvent::Key { code, pressed } => {
            evdev::InputEvent::new(EventType::KEY.0, code, i32::from(pressed))
        }
        HidEvent::Rel { axis, value } => {
            evdev::InputEvent::new(EventType::RELATIVE.0, rel_code(axis).0, value)
        }
        HidEvent::Abs { axis, value } => {
            evdev::InputEvent::new(EventType::ABSOLUTE.0, abs_code(axis).0, value)
        }
        HidEvent::MscTimestamp { micros } => {
            evdev::InputEvent::new(EventType::MISC.0, MiscCode::MSC_TIMESTAMP.0, micros)
        }
    }
}

struct UinputSink {
    device: Arc<Mutex<VirtualDevice>>,
}

impl EventSink for UinputSink {
    fn emit(&mut self, events: &[HidEvent]) -> Result<(), DeviceError> {
        let evdev_events: Vec<evdev::InputEvent> =
            events.iter().copied().map(to_evdev).collect();
        // emit appends the SYN_REPORT frame terminator itself.
        lock(&self.device)
            .emit(&evdev_events)
            .map_err(|e| DeviceError::Inject(e.to_string()))
    }
}

/// Rumble state uploaded by a consumer for one effect slot.
#[derive(Debug, Clone, Copy)]
struct RumbleEffect {
    strong: u16,
    weak: u16,
}

struct UinputFeedbackSource {
    device: Arc<Mutex<VirtualDevice>>,
    effects: HashMap<i16, RumbleEffect>,
    queue: VecDeque<FeedbackEvent>,
}

impl UinputFeedbackSource {
    /// Drains pending uinput events, answering the upload/erase
    /// handshake and queueing play requests.
    fn drain(&mut self) -> Result<(), DeviceError> {
        let mut device = lock(&self.device);
        let events: Vec<_> = match device.fetch_events() {
            Ok(events) => events.collect(),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
            Err(e) => return Err(DeviceError::Feedback(e.to_string())),
        };

        for event in events {
            let event_type = event.event_type();
            if event_type == EventType::UINPUT && event.code() == UInputCode::UI_FF_UPLOAD.0 {
                let mut upload = device
                    .process_ff_upload(event)
                    .map_err(|e| DeviceError::Feedback(e.to_string()))?;
                if let FFEffectKind::Rumble {
                    strong_magnitude,
                    weak_magnitude,
                } = upload.effect().kind
                {
                    self.effects.insert(
                        upload.effect_id(),
                        RumbleEffect {
                            strong: strong_magnitude,
                            weak: weak_magnitude,
                        },
                    );
                    upload.set_retval(0);
                } else {
                    // Only rumble is advertised; refuse anything else.
                    upload.set_retval(-1);
                }
            } else if event_type == EventType::UINPUT && event.code() == UInputCode::UI_FF_ERASE.0 {
                let mut erase = device
                    .process_ff_erase(event)
                    .map_err(|e| DeviceError::Feedback(e.to_string()))?;
                let id = i16::try_from(erase.effect_id()).unwrap_or(-1);
                self.effects.remove(&id);
                erase.set_retval(0);
            } else if event_type == EventType::FORCEFEEDBACK {
                let id = event.code() as i16;
                if event.value() > 0 {
                    if let Some(effect) = self.effects.get(&id) {
                        self.queue.push_back(FeedbackEvent::Rumble {
                            low: effect.strong,
                            high: effect.weak,
                        });
                    } else {
                        warn!(effect = id, "play request for unknown effect");
                    }
                } else {
                    self.queue.push_back(FeedbackEvent::Rumble { low: 0, high: 0 });
                }
            } else {
                trace!(event_type = ?event_type, "ignoring uinput event");
            }
        }
        Ok(())
    }
}

impl FeedbackSource for UinputFeedbackSource {
    fn poll(&mut self, timeout: Duration) -> Result<Option<FeedbackEvent>, DeviceError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(event) = self.queue.pop_front() {
                return Ok(Some(event));
            }
            self.drain()?;
            if let Some(event) = self.queue.pop_front() {
                return Ok(Some(event));
            }
            let now = Instant::now();
            if now >= deadline {
                return Ok(None);
            }
            thread::sleep(FF_POLL_STEP.min(deadline - now));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_codes_match_kernel_values() {
        assert_eq!(rel_code(RelAxis::WheelHiRes).0, 0x0b);
        assert_eq!(rel_code(RelAxis::HWheelHiRes).0, 0x0c);
        assert_eq!(abs_code(AbsAxis::Hat0X).0, 0x10);
        assert_eq!(abs_code(AbsAxis::MtSlot).0, 0x2f);
        assert_eq!(abs_code(AbsAxis::MtTrackingId).0, 0x39);
        assert_eq!(abs_code(AbsAxis::MtPressure).0, 0x3a);
    }

    #[test]
    fn key_events_carry_edge_values() {
        let down = to_evdev(HidEvent::Key {
            code: 0x130,
            pressed: true,
        });
        assert_eq!(down.event_type(), EventType::KEY);
        assert_eq!(down.code(), 0x130);
        assert_eq!(down.value(), 1);

        let up = to_evdev(HidEvent::Key {
            code: 0x130,
            pressed: false,
        });
        assert_eq!(up.value(), 0);
    }
}
