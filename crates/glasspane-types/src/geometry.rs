//! Reference rectangles and custom input areas.

use serde::{Deserialize, Serialize};

use crate::event::PointerType;

/// Bounding rectangle of the receiving surface, in client pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClientRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
}

impl ClientRect {
    #[must_use]
    pub fn new(left: f64, top: f64, width: f64, height: f64) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Map a client-space position to `[0, 1]` ratios of this rectangle.
    #[must_use]
    pub fn normalize(&self, client_x: f64, client_y: f64) -> (f64, f64) {
        (
            (client_x - self.left) / self.width,
            (client_y - self.top) / self.height,
        )
    }

    /// Length of the diagonal, used to normalise contact sizes.
    #[must_use]
    pub fn diagonal(&self) -> f64 {
        self.width.hypot(self.height)
    }
}

/// A sub-rectangle of the remote display, in normalised coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InputArea {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl InputArea {
    /// The whole display.
    pub const FULL: Self = Self {
        x: 0.0,
        y: 0.0,
        w: 1.0,
        h: 1.0,
    };

    /// Remap a normalised position into this area.
    #[must_use]
    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.w + self.x, y * self.h + self.y)
    }
}

/// Per pointer type custom input areas, as chosen on the host.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CustomInputAreas {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mouse: Option<InputArea>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub touch: Option<InputArea>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pen: Option<InputArea>,
}

impl CustomInputAreas {
    /// Area configured for a pointer type, if any.
    #[must_use]
    pub fn for_pointer(&self, pointer_type: PointerType) -> Option<InputArea> {
        match pointer_type {
            PointerType::Mouse => self.mouse,
            PointerType::Touch => self.touch,
            PointerType::Pen => self.pen,
            PointerType::Unknown => None,
        }
    }
}
