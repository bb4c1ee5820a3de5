//! Pen tablet tool and button types.

use bincode::{Decode, Encode};
use serde::{Deserialize, Serialize};

/// Tool in proximity of the tablet surface.
///
/// Real devices only report the tool type when it changes;
/// [`ToolType::SameAsBefore`] reuses the last reported real tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub enum ToolType {
    Pen,
    Eraser,
    Brush,
    Pencil,
    Airbrush,
    Touch,
    SameAsBefore,
}

/// Logical pen barrel buttons, tracked independently of tool placement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Encode, Decode)]
pub enum PenButton {
    Primary,
    Secondary,
    Tertiary,
}
