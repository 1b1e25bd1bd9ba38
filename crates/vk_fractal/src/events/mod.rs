//! Typed viewer events
//!
//! The window adapter translates platform callbacks into [`ViewerEvent`]s and
//! pushes them onto an [`EventQueue`]; the viewer drains the queue once per
//! loop iteration, before drawing.

use std::collections::VecDeque;

use crate::fractal::ParamAdjust;

/// Input notification delivered to the viewer
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewerEvent {
    /// Framebuffer size changed (may be zero while minimized)
    Resized {
        /// New width in pixels
        width: i32,
        /// New height in pixels
        height: i32,
    },
    /// Cursor moved to an absolute window position
    PointerMoved {
        /// X in screen coordinates
        x: f64,
        /// Y in screen coordinates
        y: f64,
    },
    /// Step the fractal field selector
    FieldDelta {
        /// Steps to move (negative = previous field)
        delta: i32,
    },
    /// Toggle cursor capture / mouse look
    ToggleCursorCapture,
    /// Control panel adjustment
    Adjust(ParamAdjust),
}

/// FIFO of pending viewer events
#[derive(Debug, Default)]
pub struct EventQueue {
    pending: VecDeque<ViewerEvent>,
}

impl EventQueue {
    /// Create an empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Enqueue an event
    pub fn push(&mut self, event: ViewerEvent) {
        self.pending.push_back(event);
    }

    /// Remove and yield all queued events in arrival order
    pub fn drain(&mut self) -> impl Iterator<Item = ViewerEvent> + '_ {
        self.pending.drain(..)
    }

    /// Number of queued events
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// True if nothing is queued
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Drop all queued events
    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
