//! Win32 virtual-key to Linux key code mapping.
//!
//! The keyboard façade accepts Win32 VK codes, the convention streaming
//! clients send, and translates them to the kernel key codes the virtual
//! node reports.

use ghost_input_types::keys;

/// Maps a Win32 virtual-key code to a Linux `KEY_*` code.
///
/// Returns `None` for codes with no mapping; the façade rejects those
/// rather than guessing.
#[allow(clippy::too_many_lines)]
pub fn vk_to_key(vk: u16) -> Option<u16> {
    Some(match vk {
        0x08 => keys::KEY_BACKSPACE,
        0x09 => keys::KEY_TAB,
        0x0D => keys::KEY_ENTER,
        0x10 => keys::KEY_LEFTSHIFT,
        0x11 => keys::KEY_LEFTCTRL,
        0x12 => keys::KEY_LEFTALT,
        0x13 => keys::KEY_PAUSE,
        0x14 => keys::KEY_CAPSLOCK,
        0x1B => keys::KEY_ESC,
        0x20 => keys::KEY_SPACE,
        0x21 => keys::KEY_PAGEUP,
        0x22 => keys::KEY_PAGEDOWN,
        0x23 => keys::KEY_END,
        0x24 => keys::KEY_HOME,
        0x25 => keys::KEY_LEFT,
        0x26 => keys::KEY_UP,
        0x27 => keys::KEY_RIGHT,
        0x28 => keys::KEY_DOWN,
        0x2C => keys::KEY_SYSRQ,
        0x2D => keys::KEY_INSERT,
        0x2E => keys::KEY_DELETE,

        // Digit row
        0x30 => keys::KEY_0,
        0x31 => keys::KEY_1,
        0x32 => keys::KEY_2,
        0x33 => keys::KEY_3,
        0x34 => keys::KEY_4,
        0x35 => keys::KEY_5,
        0x36 => keys::KEY_6,
        0x37 => keys::KEY_7,
        0x38 => keys::KEY_8,
        0x39 => keys::KEY_9,

        // Letters
        0x41 => keys::KEY_A,
        0x42 => keys::KEY_B,
        0x43 => keys::KEY_C,
        0x44 => keys::KEY_D,
        0x45 => keys::KEY_E,
        0x46 => keys::KEY_F,
        0x47 => keys::KEY_G,
        0x48 => keys::KEY_H,
        0x49 => keys::KEY_I,
        0x4A => keys::KEY_J,
        0x4B => keys::KEY_K,
        0x4C => keys::KEY_L,
        0x4D => keys::KEY_M,
        0x4E => keys::KEY_N,
        0x4F => keys::KEY_O,
        0x50 => keys::KEY_P,
        0x51 => keys::KEY_Q,
        0x52 => keys::KEY_R,
        0x53 => keys::KEY_S,
        0x54 => keys::KEY_T,
        0x55 => keys::KEY_U,
        0x56 => keys::KEY_V,
        0x57 => keys::KEY_W,
        0x58 => keys::KEY_X,
        0x59 => keys::KEY_Y,
        0x5A => keys::KEY_Z,

        0x5B => keys::KEY_LEFTMETA,
        0x5C => keys::KEY_RIGHTMETA,
        0x5D => keys::KEY_COMPOSE,

        // Numpad
        0x60 => keys::KEY_KP0,
        0x61 => keys::KEY_KP1,
        0x62 => keys::KEY_KP2,
        0x63 => keys::KEY_KP3,
        0x64 => keys::KEY_KP4,
        0x65 => keys::KEY_KP5,
        0x66 => keys::KEY_KP6,
        0x67 => keys::KEY_KP7,
        0x68 => keys::KEY_KP8,
        0x69 => keys::KEY_KP9,
        0x6A => keys::KEY_KPASTERISK,
        0x6B => keys::KEY_KPPLUS,
        0x6D => keys::KEY_KPMINUS,
        0x6E => keys::KEY_KPDOT,
        0x6F => keys::KEY_KPSLASH,

        // Function row
        0x70 => keys::KEY_F1,
        0x71 => keys::KEY_F2,
        0x72 => keys::KEY_F3,
        0x73 => keys::KEY_F4,
        0x74 => keys::KEY_F5,
        0x75 => keys::KEY_F6,
        0x76 => keys::KEY_F7,
        0x77 => keys::KEY_F8,
        0x78 => keys::KEY_F9,
        0x79 => keys::KEY_F10,
        0x7A => keys::KEY_F11,
        0x7B => keys::KEY_F12,

        0x90 => keys::KEY_NUMLOCK,
        0x91 => keys::KEY_SCROLLLOCK,

        // Explicit left/right modifiers
        0xA0 => keys::KEY_LEFTSHIFT,
        0xA1 => keys::KEY_RIGHTSHIFT,
        0xA2 => keys::KEY_LEFTCTRL,
        0xA3 => keys::KEY_RIGHTCTRL,
        0xA4 => keys::KEY_LEFTALT,
        0xA5 => keys::KEY_RIGHTALT,

        // Media
        0xAD => keys::KEY_MUTE,
        0xAE => keys::KEY_VOLUMEDOWN,
        0xAF => keys::KEY_VOLUMEUP,
        0xB0 => keys::KEY_NEXTSONG,
        0xB1 => keys::KEY_PREVIOUSSONG,
        0xB3 => keys::KEY_PLAYPAUSE,

        // OEM punctuation
        0xBA => keys::KEY_SEMICOLON,
        0xBB => keys::KEY_EQUAL,
        0xBC => keys::KEY_COMMA,
        0xBD => keys::KEY_MINUS,
        0xBE => keys::KEY_DOT,
        0xBF => keys::KEY_SLASH,
        0xC0 => keys::KEY_GRAVE,
        0xDB => keys::KEY_LEFTBRACE,
        0xDC => keys::KEY_BACKSLASH,
        0xDD => keys::KEY_RIGHTBRACE,
        0xDE => keys::KEY_APOSTROPHE,

        _ => return None,
    })
}

/// VK code for one hex digit (`0..=15`), used by the Unicode entry
/// gesture.
pub fn hex_digit_vk(digit: u32) -> u16 {
    debug_assert!(digit < 16);
    if digit < 10 {
        0x30 + digit as u16
    } else {
        0x41 + (digit - 10) as u16
    }
}
