//! Joypad wire constants.
//!
//! The numeric values in this module are part of the wire contract with
//! existing streaming consumers and must not change. They are explicit
//! bit-field constants rather than closed enums for that reason.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Kind of controller a virtual joypad presents itself as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
#[repr(u8)]
pub enum ControllerType {
    Unknown = 0x00,
    Xbox = 0x01,
    Ps = 0x02,
    Nintendo = 0x03,
}

/// Controller capability bitflags, chosen at construction.
pub mod caps {
    pub const ANALOG_TRIGGERS: u8 = 0x01;
    pub const RUMBLE: u8 = 0x02;
    pub const TRIGGER_RUMBLE: u8 = 0x04;
    pub const TOUCHPAD: u8 = 0x08;
    pub const ACCELEROMETER: u8 = 0x10;
    pub const GYRO: u8 = 0x20;
    pub const BATTERY: u8 = 0x40;
    pub const RGB_LED: u8 = 0x80;
}

/// Controller button bitflags as sent by streaming clients.
///
/// `HOME` and `SPECIAL_FLAG` share `0x0400` in the original enumeration;
/// both names are kept for callers that use either.
pub mod btn {
    pub const DPAD_UP: u32 = 0x0001;
    pub const DPAD_DOWN: u32 = 0x0002;
    pub const DPAD_LEFT: u32 = 0x0004;
    pub const DPAD_RIGHT: u32 = 0x0008;

    pub const START: u32 = 0x0010;
    pub const BACK: u32 = 0x0020;
    pub const HOME: u32 = 0x0400;

    pub const LEFT_STICK: u32 = 0x0040;
    pub const RIGHT_STICK: u32 = 0x0080;
    pub const LEFT_BUTTON: u32 = 0x0100;
    pub const RIGHT_BUTTON: u32 = 0x0200;

    pub const SPECIAL_FLAG: u32 = 0x0400;
    pub const PADDLE1_FLAG: u32 = 0x01_0000;
    pub const PADDLE2_FLAG: u32 = 0x02_0000;
    pub const PADDLE3_FLAG: u32 = 0x04_0000;
    pub const PADDLE4_FLAG: u32 = 0x08_0000;
    /// Touchpad click on Sony controllers.
    pub const TOUCHPAD_FLAG: u32 = 0x10_0000;
    /// Share/Mic/Capture/Mute buttons on various controllers.
    pub const MISC_FLAG: u32 = 0x20_0000;

    pub const A: u32 = 0x1000;
    pub const B: u32 = 0x2000;
    pub const X: u32 = 0x4000;
    pub const Y: u32 = 0x8000;
}

/// Battery charge state as reported by `set_battery`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
#[repr(u8)]
pub enum BatteryState {
    NotKnown = 0x00,
    NotPresent = 0x01,
    Discharging = 0x02,
    Charging = 0x03,
    NotCharging = 0x04,
    Full = 0x05,
}

/// Which analog stick an axis report refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub enum StickPosition {
    RS,
    LS,
}

/// Which motion sensor a sample comes from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
#[repr(u8)]
pub enum MotionType {
    Acceleration = 0x01,
    Gyroscope = 0x02,
}

#[cfg(test)]
mod tests {
    use super::*;

    // The flag values are wire-visible; a refactor that changes them is a
    // protocol break.
    #[test]
    fn capability_values_are_stable() {
        assert_eq!(caps::ANALOG_TRIGGERS, 0x01);
        assert_eq!(caps::RUMBLE, 0x02);
        assert_eq!(caps::TRIGGER_RUMBLE, 0x04);
        assert_eq!(caps::TOUCHPAD, 0x08);
        assert_eq!(caps::ACCELEROMETER, 0x10);
        assert_eq!(caps::GYRO, 0x20);
        assert_eq!(caps::BATTERY, 0x40);
        assert_eq!(caps::RGB_LED, 0x80);
    }

    #[test]
    fn button_values_are_stable() {
        assert_eq!(btn::DPAD_UP | btn::DPAD_DOWN | btn::DPAD_LEFT | btn::DPAD_RIGHT, 0x000F);
        assert_eq!(btn::A, 0x1000);
        assert_eq!(btn::Y, 0x8000);
        assert_eq!(btn::HOME, btn::SPECIAL_FLAG);
        assert_eq!(btn::PADDLE4_FLAG, 0x08_0000);
        assert_eq!(btn::MISC_FLAG, 0x20_0000);
    }

    #[test]
    fn battery_state_discriminants() {
        assert_eq!(BatteryState::NotKnown as u8, 0x00);
        assert_eq!(BatteryState::Full as u8, 0x05);
    }
}
