//! Multi-touch contact tracking.
//!
//! Implements the MT type-B slot protocol: each finger slot carries a
//! persistent tracking id from placement to release, so consumers can
//! follow a contact across frames. Shared by the trackpad, the
//! touchscreen, and the joypad's touchpad sub-surface.

use ghost_input_types::keys;
use ghost_input_types::{AbsAxis, HidEvent};

use crate::error::DeviceError;

#[derive(Debug, Clone, Copy, Default)]
struct Slot {
    active: bool,
    tracking_id: i32,
}

/// Per-surface contact state.
///
/// Produces the event frames for `place_finger`/`release_finger`; the
/// owning façade forwards them to its sink.
#[derive(Debug)]
pub struct TouchTracker {
    slots: Vec<Slot>,
    next_tracking_id: i32,
    x_max: i32,
    y_max: i32,
    pressure_max: i32,
    /// Emit `BTN_TOOL_*` finger-count keys (trackpads and joypad
    /// touchpads want them, touchscreens do not).
    finger_count_keys: bool,
}

impl TouchTracker {
    pub fn new(slot_count: usize, x_max: i32, y_max: i32, pressure_max: i32) -> Self {
        Self {
            slots: vec![Slot::default(); slot_count],
            next_tracking_id: 0,
            x_max,
            y_max,
            pressure_max,
            finger_count_keys: false,
        }
    }

    pub fn with_finger_count_keys(mut self) -> Self {
        self.finger_count_keys = true;
        self
    }

    pub fn slot_count(&self) -> usize {
        self.slots.len()
    }

    fn active_count(&self) -> usize {
        self.slots.iter().filter(|s| s.active).count()
    }

    fn check_slot(&self, slot: usize) -> Result<(), DeviceError> {
        if slot >= self.slots.len() {
            return Err(DeviceError::SlotOutOfRange {
                slot,
                max: self.slots.len(),
            });
        }
        Ok(())
    }

    fn tool_key_for_count(count: usize) -> Option<u16> {
        match count {
            1 => Some(keys::BTN_TOOL_FINGER),
            2 => Some(keys::BTN_TOOL_DOUBLETAP),
            3 => Some(keys::BTN_TOOL_TRIPLETAP),
            4 => Some(keys::BTN_TOOL_QUADTAP),
            5 => Some(keys::BTN_TOOL_QUINTTAP),
            _ => None,
        }
    }

    fn finger_count_transition(&self, before: usize, after: usize, out: &mut Vec<HidEvent>) {
        if !self.finger_count_keys || before == after {
            return;
        }
        if let Some(code) = Self::tool_key_for_count(before) {
            out.push(HidEvent::Key {
                code,
                pressed: false,
            });
        }
        if let Some(code) = Self::tool_key_for_count(after) {
            out.push(HidEvent::Key {
                code,
                pressed: true,
            });
        }
    }

    /// Places or moves a finger. Coordinates and pressure are normalized
    /// to `[0, 1]`; a previously inactive slot gets a fresh tracking id
    /// and a touch-down, an active slot just moves.
    pub fn place_finger(
        &mut self,
        slot: usize,
        x: f32,
        y: f32,
        pressure: f32,
    ) -> Result<Vec<HidEvent>, DeviceError> {
        self.check_slot(slot)?;
        for (what, value) in [("x", x), ("y", y), ("pressure", pressure)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(DeviceError::ValueOutOfRange { what, value });
            }
        }

        let before = self.active_count();
        let mut events = vec![HidEvent::Abs {
            axis: AbsAxis::MtSlot,
            value: slot as i32,
        }];

        if !self.slots[slot].active {
            let id = self.next_tracking_id;
            self.next_tracking_id = self.next_tracking_id.wrapping_add(1) & i32::MAX;
            self.slots[slot] = Slot {
                active: true,
                tracking_id: id,
            };
            events.push(HidEvent::Abs {
                axis: AbsAxis::MtTrackingId,
                value: id,
            });
            if before == 0 {
                events.push(HidEvent::Key {
                    code: keys::BTN_TOUCH,
                    pressed: true,
                });
            }
        }

        events.push(HidEvent::Abs {
            axis: AbsAxis::MtPositionX,
            value: scale(x, self.x_max),
        });
        events.push(HidEvent::Abs {
            axis: AbsAxis::MtPositionY,
            value: scale(y, self.y_max),
        });
        events.push(HidEvent::Abs {
            axis: AbsAxis::MtPressure,
            value: scale(pressure, self.pressure_max),
        });

        self.finger_count_transition(before, self.active_count(), &mut events);
        Ok(events)
    }

    /// Releases a finger. Releasing an inactive slot is a no-op, not an
    /// error, so retried release messages stay harmless.
    pub fn release_finger(&mut self, slot: usize) -> Result<Vec<HidEvent>, DeviceError> {
        self.check_slot(slot)?;
        if !self.slots[slot].active {
            return Ok(Vec::new());
        }

        let before = self.active_count();
        self.slots[slot].active = false;

        let mut events = vec![
            HidEvent::Abs {
                axis: AbsAxis::MtSlot,
                value: slot as i32,
            },
            HidEvent::Abs {
                axis: AbsAxis::MtTrackingId,
                value: -1,
            },
        ];
        if before == 1 {
            events.push(HidEvent::Key {
                code: keys::BTN_TOUCH,
                pressed: false,
            });
        }
        self.finger_count_transition(before, before - 1, &mut events);
        Ok(events)
    }

    /// Tracking id currently assigned to a slot, if active.
    pub fn tracking_id(&self, slot: usize) -> Option<i32> {
        self.slots
            .get(slot)
            .filter(|s| s.active)
            .map(|s| s.tracking_id)
    }
}

fn scale(normalized: f32, max: i32) -> i32 {
    (normalized * max as f32).round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tracker() -> TouchTracker {
        TouchTracker::new(2, 1000, 1000, 255)
    }

    fn has_key(events: &[HidEvent], code: u16, pressed: bool) -> bool {
        events.contains(&HidEvent::Key { code, pressed })
    }

    #[test]
    fn place_assigns_fresh_tracking_ids() {
        let mut t = tracker();
        t.place_finger(0, 0.1, 0.1, 0.5).unwrap();
        t.place_finger(1, 0.9, 0.9, 0.5).unwrap();
        let first = t.tracking_id(0).unwrap();
        let second = t.tracking_id(1).unwrap();
        assert_ne!(first, second);

        // Re-placing after release produces a new identity.
        t.release_finger(0).unwrap();
        t.place_finger(0, 0.2, 0.2, 0.5).unwrap();
        assert_ne!(t.tracking_id(0).unwrap(), first);
    }

    #[test]
    fn move_does_not_retouch() {
        let mut t = tracker();
        let down = t.place_finger(0, 0.1, 0.1, 0.5).unwrap();
        assert!(has_key(&down, keys::BTN_TOUCH, true));

        let moved = t.place_finger(0, 0.2, 0.2, 0.5).unwrap();
        assert!(!moved
            .iter()
            .any(|e| matches!(e, HidEvent::Key { .. } | HidEvent::Abs { axis: AbsAxis::MtTrackingId, .. })));
    }

    #[test]
    fn release_is_idempotent() {
        let mut t = tracker();
        t.place_finger(0, 0.5, 0.5, 1.0).unwrap();
        let up = t.release_finger(0).unwrap();
        assert!(has_key(&up, keys::BTN_TOUCH, false));
        assert!(up.contains(&HidEvent::Abs {
            axis: AbsAxis::MtTrackingId,
            value: -1
        }));

        let again = t.release_finger(0).unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn btn_touch_tracks_first_and_last_contact() {
        let mut t = tracker();
        let first = t.place_finger(0, 0.1, 0.1, 0.5).unwrap();
        assert!(has_key(&first, keys::BTN_TOUCH, true));
        let second = t.place_finger(1, 0.9, 0.9, 0.5).unwrap();
        assert!(!second.iter().any(|e| matches!(e, HidEvent::Key { code, .. } if *code == keys::BTN_TOUCH)));

        let up_one = t.release_finger(1).unwrap();
        assert!(!has_key(&up_one, keys::BTN_TOUCH, false));
        let up_last = t.release_finger(0).unwrap();
        assert!(has_key(&up_last, keys::BTN_TOUCH, false));
    }

    #[test]
    fn out_of_range_inputs_are_rejected() {
        let mut t = tracker();
        assert!(matches!(
            t.place_finger(2, 0.1, 0.1, 0.1),
            Err(DeviceError::SlotOutOfRange { slot: 2, max: 2 })
        ));
        assert!(matches!(
            t.release_finger(5),
            Err(DeviceError::SlotOutOfRange { .. })
        ));
        assert!(matches!(
            t.place_finger(0, 1.5, 0.0, 0.0),
            Err(DeviceError::ValueOutOfRange { what: "x", .. })
        ));
        assert!(matches!(
            t.place_finger(0, 0.5, 0.5, -0.1),
            Err(DeviceError::ValueOutOfRange { what: "pressure", .. })
        ));
    }

    #[test]
    fn finger_count_keys_follow_contact_count() {
        let mut t = TouchTracker::new(3, 1000, 1000, 255).with_finger_count_keys();
        let one = t.place_finger(0, 0.1, 0.1, 0.5).unwrap();
        assert!(has_key(&one, keys::BTN_TOOL_FINGER, true));

        let two = t.place_finger(1, 0.2, 0.2, 0.5).unwrap();
        assert!(has_key(&two, keys::BTN_TOOL_FINGER, false));
        assert!(has_key(&two, keys::BTN_TOOL_DOUBLETAP, true));

        let back_to_one = t.release_finger(1).unwrap();
        assert!(has_key(&back_to_one, keys::BTN_TOOL_DOUBLETAP, false));
        assert!(has_key(&back_to_one, keys::BTN_TOOL_FINGER, true));
    }
}
