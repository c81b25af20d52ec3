//! Mock input surface for testing.

use std::sync::{Arc, Mutex};

use glasspane_types::ClientRect;

use crate::InputSurface;

#[derive(Debug)]
struct MockSurfaceState {
    rect: ClientRect,
    rect_queries: usize,
    captured: Vec<i64>,
}

/// Mock surface with a settable rectangle.
pub struct MockSurface {
    state: Arc<Mutex<MockSurfaceState>>,
}

impl MockSurface {
    pub fn new(rect: ClientRect) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockSurfaceState {
                rect,
                rect_queries: 0,
                captured: Vec::new(),
            })),
        }
    }

    /// Get a clonable handle for observing and steering the surface from tests.
    pub fn handle(&self) -> MockSurfaceHandle {
        MockSurfaceHandle {
            state: Arc::clone(&self.state),
        }
    }
}

/// Clonable observer handle for `MockSurface`.
#[derive(Clone)]
pub struct MockSurfaceHandle {
    state: Arc<Mutex<MockSurfaceState>>,
}

impl MockSurfaceHandle {
    /// Move or resize the surface.
    pub fn set_rect(&self, rect: ClientRect) {
        self.state.lock().unwrap().rect = rect;
    }

    /// How often the rectangle was read.
    pub fn rect_queries(&self) -> usize {
        self.state.lock().unwrap().rect_queries
    }

    /// Pointer ids captured so far, in order.
    pub fn captured(&self) -> Vec<i64> {
        self.state.lock().unwrap().captured.clone()
    }
}

impl InputSurface for MockSurface {
    fn bounding_rect(&self) -> ClientRect {
        let mut state = self.state.lock().unwrap();
        state.rect_queries += 1;
        state.rect
    }

    fn capture_pointer(&mut self, pointer_id: i64) {
        self.state.lock().unwrap().captured.push(pointer_id);
    }
}
