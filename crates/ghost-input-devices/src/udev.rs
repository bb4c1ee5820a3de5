//! Enumeration records and hardware-database text.
//!
//! Containers and compositors that cannot watch the host's udev need to
//! be told about virtual nodes out of band; these records carry the same
//! key/value pairs a real hotplug event would. Everything here is a pure
//! function of the device definition and its node paths.

use std::collections::HashMap;

use ghost_input_types::{DeviceClass, DeviceDefinition};

/// `ID_INPUT_*` property name for a device class.
fn input_class_property(class: DeviceClass) -> &'static str {
    match class {
        DeviceClass::Mouse => "ID_INPUT_MOUSE",
        DeviceClass::PointerAbs => "ID_INPUT_MOUSE",
        DeviceClass::Trackpad => "ID_INPUT_TOUCHPAD",
        DeviceClass::TouchScreen => "ID_INPUT_TOUCHSCREEN",
        DeviceClass::PenTablet => "ID_INPUT_TABLET",
        DeviceClass::Keyboard => "ID_INPUT_KEYBOARD",
        DeviceClass::Gamepad => "ID_INPUT_JOYSTICK",
        DeviceClass::MotionSensors => "ID_INPUT_ACCELEROMETER",
    }
}

/// One `add` record per node, shaped like a udev hotplug event.
pub fn udev_events(def: &DeviceDefinition, nodes: &[String]) -> Vec<HashMap<String, String>> {
    nodes
        .iter()
        .map(|node| {
            let mut record = HashMap::new();
            record.insert("ACTION".to_string(), "add".to_string());
            record.insert("DEVNAME".to_string(), node.clone());
            record.insert("SUBSYSTEM".to_string(), "input".to_string());
            record.insert("ID_INPUT".to_string(), "1".to_string());
            record.insert(input_class_property(def.class).to_string(), "1".to_string());
            record.insert("TAGS".to_string(), ":seat:uaccess:".to_string());
            record
        })
        .collect()
}

/// Hardware-database entries for a definition.
///
/// Only gamepads need one: their virtual vendor/product modalias must be
/// tagged as a joystick so libinput/SDL pick the node up as a game
/// controller rather than a pointer.
pub fn hwdb_entries(def: &DeviceDefinition) -> Vec<(String, Vec<String>)> {
    if def.class != DeviceClass::Gamepad {
        return Vec::new();
    }
    let filename = format!(
        "70-ghost-input-joypad-{:04x}-{:04x}.hwdb",
        def.vendor_id, def.product_id
    );
    let lines = vec![
        format!(
            "evdev:input:b0003v{:04X}p{:04X}*",
            def.vendor_id, def.product_id
        ),
        " ID_INPUT_JOYSTICK=1".to_string(),
        " ID_INPUT_MOUSE=0".to_string(),
    ];
    vec![(filename, lines)]
}
