//! Input canonicalization for glasspane.
//!
//! Raw platform pointer, wheel and keyboard events go in, canonical
//! resolution-independent wire messages come out through a
//! [`MessageSink`](glasspane_protocol::MessageSink). The platform side is
//! reached only through the [`InputSurface`] trait, so the same
//! [`EventCanonicalizer`] serves a native viewer, a replay tool or a test.

pub mod canonical;
pub mod canonicalizer;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod raw;

pub use canonicalizer::EventCanonicalizer;
pub use error::InputError;
pub use raw::{RawKeyEvent, RawPointerEvent, RawWheelEvent, RecordedEvent};

use glasspane_types::ClientRect;

/// The element input events are measured against.
pub trait InputSurface: Send {
    /// Current position and size of the surface in client coordinates.
    fn bounding_rect(&self) -> ClientRect;

    /// Route all further events of `pointer_id` to this surface until it is
    /// released.
    fn capture_pointer(&mut self, pointer_id: i64);
}

/// A surface with a fixed rectangle that ignores pointer capture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticSurface {
    rect: ClientRect,
}

impl StaticSurface {
    pub fn new(rect: ClientRect) -> Self {
        Self { rect }
    }
}

impl InputSurface for StaticSurface {
    fn bounding_rect(&self) -> ClientRect {
        self.rect
    }

    fn capture_pointer(&mut self, _pointer_id: i64) {}
}

/// What the caller should do with the native event after handling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Prevent the platform's default action.
    Suppress,
    /// Let the platform handle the event.
    PassThrough,
}

/// Result of handling one pointer event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PointerDispatch {
    /// Wire messages sent for this event.
    pub sent: usize,
    /// The settings panel was open and should be closed.
    pub dismiss_settings_panel: bool,
}
