//! High-resolution scroll accumulation.

/// Distance of one logical wheel click in high-resolution units, per the
/// Windows Vista wheel design document that established the convention.
pub const CLICK_DISTANCE: i32 = 120;

/// Accumulates signed high-resolution scroll distances into whole wheel
/// clicks plus a carried remainder.
///
/// Invariant: after every call, `clicks * 120 + remainder` equals the sum
/// of all deltas fed in, and `|remainder| < 120`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScrollAccumulator {
    remainder: i32,
}

impl ScrollAccumulator {
    pub const fn new() -> Self {
        Self { remainder: 0 }
    }

    /// Adds `delta` and returns the number of whole clicks to emit
    /// (sign-preserving; zero while `|total| < 120`).
    pub fn accumulate(&mut self, delta: i32) -> i32 {
        let total = self.remainder + delta;
        // Rust's `/` truncates toward zero, which is exactly the
        // sign-preserving split the invariant needs.
        let clicks = total / CLICK_DISTANCE;
        self.remainder = total % CLICK_DISTANCE;
        clicks
    }

    pub const fn remainder(&self) -> i32 {
        self.remainder
    }
}
