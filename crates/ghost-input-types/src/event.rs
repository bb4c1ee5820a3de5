//! Low-level HID event representation.
//!
//! Platform-agnostic mirror of the Linux input event model: the device
//! façades produce batches of [`HidEvent`]s and a backend translates them
//! into whatever the OS integration expects. One batch corresponds to one
//! synchronization frame on the wire.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// A single low-level event emitted by a device façade.
///
/// `code` values for [`HidEvent::Key`] are Linux `KEY_*`/`BTN_*` codes
/// (see [`crate::keys`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Encode, Decode)]
pub enum HidEvent {
    /// Key or button edge.
    Key { code: u16, pressed: bool },

    /// Relative axis movement.
    Rel { axis: RelAxis, value: i32 },

    /// Absolute axis value.
    Abs { axis: AbsAxis, value: i32 },

    /// Hardware timestamp marker (microseconds), used by motion sensors.
    MscTimestamp { micros: i32 },
}

/// Relative axes used by the façades.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub enum RelAxis {
    X,
    Y,
    Wheel,
    HWheel,
    WheelHiRes,
    HWheelHiRes,
}

/// Absolute axes used by the façades, including the multi-touch slot
/// protocol axes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub enum AbsAxis {
    X,
    Y,
    Z,
    Rx,
    Ry,
    Rz,
    Hat0X,
    Hat0Y,
    Pressure,
    Distance,
    TiltX,
    TiltY,
    MtSlot,
    MtTrackingId,
    MtPositionX,
    MtPositionY,
    MtPressure,
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub enum MouseButton {
    Left,
    Middle,
    Right,
    Side,
    Extra,
}

/// A hardware-originated event delivered back to the caller.
///
/// Produced by the consumer of a virtual joypad (a game issuing a rumble
/// command, a driver setting the light bar) and forwarded to the
/// caller-registered callbacks on the device's listener thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Encode, Decode)]
pub enum FeedbackEvent {
    /// Rumble intensities for the low- and high-frequency motors.
    Rumble { low: u16, high: u16 },
    /// RGB LED color command.
    Led { r: u8, g: u8, b: u8 },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hid_event_roundtrip() {
        let event = HidEvent::Abs {
            axis: AbsAxis::MtTrackingId,
            value: -1,
        };
        let config = bincode::config::standard();
        let bytes = bincode::encode_to_vec(event, config).unwrap();
        let (decoded, _): (HidEvent, _) = bincode::decode_from_slice(&bytes, config).unwrap();
        assert_eq!(event, decoded);
    }

    #[test]
    fn feedback_event_roundtrip() {
        let event = FeedbackEvent::Rumble {
            low: 0xFFFF,
            high: 0x1234,
        };
        let config = bincode::config::standard();
        let bytes = bincode::encode_to_vec(event, config).unwrap();
        let (decoded, _): (FeedbackEvent, _) = bincode::decode_from_slice(&bytes, config).unwrap();
        assert_eq!(event, decoded);
    }
}
