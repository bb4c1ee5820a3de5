//! Device errors.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("failed to create virtual device node: {0}")]
    NodeCreate(String),

    #[error("failed to inject event: {0}")]
    Inject(String),

    #[error("failed to read feedback events: {0}")]
    Feedback(String),

    #[error("finger slot {slot} out of range (device has {max} slots)")]
    SlotOutOfRange { slot: usize, max: usize },

    #[error("{what} value {value} outside valid range")]
    ValueOutOfRange { what: &'static str, value: f32 },

    #[error("screen dimensions must be non-zero")]
    ZeroScreenDimension,

    #[error("pressure and distance cannot both be reported in one call")]
    PressureAndDistance,

    #[error("tool type SAME_AS_BEFORE used before any real tool was reported")]
    NoPreviousTool,

    #[error("operation requires the {0} capability")]
    CapabilityMissing(&'static str),

    #[error("no mapping for virtual-key code {0:#06x}")]
    UnknownKey(u16),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
