//! Integration tests driving the device façades through the mock backend
//! the way a streaming host would.

use std::sync::mpsc;
use std::time::Duration;

use ghost_input_devices::mock::MockBackend;
use ghost_input_devices::{
    Joypad, JoypadConfig, Keyboard, KeyboardConfig, Mouse, PenTablet, TouchScreen, Trackpad,
    VirtualDevice,
};
use ghost_input_types::joypad::{btn, caps};
use ghost_input_types::{
    AbsAxis, ControllerType, FeedbackEvent, HidEvent, MouseButton, RelAxis, StickPosition,
    ToolType,
};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}

#[test]
fn full_device_roster_enumerates() {
    init_tracing();
    let backend = MockBackend::new();

    let mouse = Mouse::new(&backend).unwrap();
    let trackpad = Trackpad::new(&backend).unwrap();
    let screen = TouchScreen::new(&backend).unwrap();
    let pen = PenTablet::new(&backend).unwrap();
    let keyboard = Keyboard::new(&backend).unwrap();
    let joypad = Joypad::new(
        &backend,
        JoypadConfig {
            controller_type: ControllerType::Ps,
            capabilities: caps::ANALOG_TRIGGERS
                | caps::RUMBLE
                | caps::TOUCHPAD
                | caps::ACCELEROMETER
                | caps::GYRO
                | caps::BATTERY,
        },
    )
    .unwrap();

    // Mouse has two nodes, the full-featured joypad three, the rest one.
    assert_eq!(mouse.get_nodes().len(), 2);
    assert_eq!(trackpad.get_nodes().len(), 1);
    assert_eq!(screen.get_nodes().len(), 1);
    assert_eq!(pen.get_nodes().len(), 1);
    assert_eq!(keyboard.get_nodes().len(), 1);
    assert_eq!(joypad.get_nodes().len(), 3);

    // One udev record per node, and only the joypad installs hwdb text.
    for device in [
        &mouse as &dyn VirtualDevice,
        &trackpad,
        &screen,
        &pen,
        &keyboard,
    ] {
        assert_eq!(device.get_udev_events().len(), device.get_nodes().len());
        assert!(device.get_udev_hw_db_entries().is_empty());
    }
    assert_eq!(joypad.get_udev_events().len(), 3);
    assert_eq!(joypad.get_udev_hw_db_entries().len(), 1);

    // All nodes are distinct.
    let mut all_nodes: Vec<String> = [
        mouse.get_nodes(),
        trackpad.get_nodes(),
        screen.get_nodes(),
        pen.get_nodes(),
        keyboard.get_nodes(),
        joypad.get_nodes(),
    ]
    .concat();
    all_nodes.sort();
    all_nodes.dedup();
    assert_eq!(all_nodes.len(), 9);
}

#[test]
fn streaming_session_script() {
    init_tracing();
    let backend = MockBackend::new();
    let handle = backend.handle();

    let mouse = Mouse::new(&backend).unwrap();
    let keyboard = Keyboard::new(&backend).unwrap();

    // Pointer drag with a scroll in the middle.
    mouse.press(MouseButton::Left).unwrap();
    mouse.r#move(10, 0).unwrap();
    mouse.vertical_scroll(120).unwrap();
    mouse.release(MouseButton::Left).unwrap();

    // One full wheel click came out.
    assert!(handle.events().contains(&HidEvent::Rel {
        axis: RelAxis::Wheel,
        value: -1
    }));

    // Type "hi" by VK code (H = 0x48, I = 0x49).
    for vk in [0x48_u16, 0x49] {
        keyboard.press(vk).unwrap();
        keyboard.release(vk).unwrap();
    }
    // Both keys saw their release edge.
    for code in [
        ghost_input_types::keys::KEY_H,
        ghost_input_types::keys::KEY_I,
    ] {
        assert!(handle.events().contains(&HidEvent::Key {
            code,
            pressed: false
        }));
    }
}

#[test]
fn pen_and_touch_do_not_share_state() {
    init_tracing();
    let backend = MockBackend::new();
    let handle = backend.handle();

    let pen = PenTablet::new(&backend).unwrap();
    let screen = TouchScreen::new(&backend).unwrap();

    pen.place_tool(ToolType::Pen, 0.5, 0.5, Some(0.5), None, 0.0, 0.0)
        .unwrap();
    screen.place_finger(0, 0.5, 0.5, 0.5).unwrap();
    screen.release_finger(0).unwrap();

    // The screen's contact release did not lift the pen.
    let pen_events = handle.events_for(0);
    assert!(!pen_events.contains(&HidEvent::Abs {
        axis: AbsAxis::MtTrackingId,
        value: -1
    }));
    assert!(handle.events_for(1).contains(&HidEvent::Abs {
        axis: AbsAxis::MtTrackingId,
        value: -1
    }));
}

#[test]
fn joypad_round_trip_with_feedback() {
    init_tracing();
    let backend = MockBackend::new();
    let handle = backend.handle();

    let pad = Joypad::new(
        &backend,
        JoypadConfig {
            controller_type: ControllerType::Xbox,
            capabilities: caps::ANALOG_TRIGGERS | caps::RUMBLE,
        },
    )
    .unwrap();

    let (tx, rx) = mpsc::channel();
    pad.set_on_rumble(move |low, high| {
        let _ = tx.send((low, high));
    });

    // Press A, pull the left trigger, push the left stick up.
    pad.set_pressed_buttons(btn::A).unwrap();
    pad.set_triggers(i16::MAX, 0).unwrap();
    pad.set_stick(StickPosition::LS, 0, i16::MAX).unwrap();
    assert!(handle.events().contains(&HidEvent::Abs {
        axis: AbsAxis::Z,
        value: 255
    }));

    // Game responds with rumble.
    backend.feedback_senders()[0]
        .send(FeedbackEvent::Rumble {
            low: 0xAAAA,
            high: 0x5555,
        })
        .unwrap();
    assert_eq!(
        rx.recv_timeout(Duration::from_secs(2)).unwrap(),
        (0xAAAA, 0x5555)
    );

    // Releasing everything emits the up edge.
    pad.set_pressed_buttons(0).unwrap();
    assert!(handle.events().contains(&HidEvent::Key {
        code: ghost_input_types::keys::BTN_SOUTH,
        pressed: false
    }));
}

#[test]
fn clones_drive_the_same_hardware() {
    init_tracing();
    let backend = MockBackend::new();
    let keyboard = Keyboard::with_config(
        &backend,
        KeyboardConfig {
            repeat_interval: Duration::from_millis(5),
        },
    )
    .unwrap();
    let clone = keyboard.clone();

    keyboard.press(0x41).unwrap();
    // The clone can release a key the original pressed, stopping repeat.
    clone.release(0x41).unwrap();
    backend.handle().clear();
    std::thread::sleep(Duration::from_millis(40));
    assert!(backend.handle().events().is_empty());
}
