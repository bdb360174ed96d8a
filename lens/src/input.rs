//! Input model: modifier keys, pointer buttons, UI state, and the gesture state machine.
//!
//! `Modifiers` and `Button` capture what the pointer source reported at the
//! time of an event. `UiState` is the persistent, renderer-visible selection
//! (mode, unit, brush, selected point, pen cursor). `InputState` is the active
//! gesture tracked between pointer-down and pointer-up, carrying whatever
//! context the next move needs.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use crate::camera::Point;
use crate::doc::{Brush, VertexId};
use crate::mode::MeasurementMode;
use crate::units::Unit;

/// Keyboard modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default)]
pub struct Modifiers {
    /// Shift key is held. Starts a pan instead of placing a point.
    pub shift: bool,
    pub ctrl: bool,
    pub alt: bool,
    pub meta: bool,
}

/// Pointer button identifier. Mouse, touch and pen all map onto these.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Button {
    /// Left mouse button, single-finger touch, or pen tip.
    Primary,
    Middle,
    Secondary,
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down, zooms out).
    pub dy: f64,
}

/// Persistent UI state visible to the renderer.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Active measurement mode.
    pub mode: MeasurementMode,
    /// Display unit for measurement labels.
    pub unit: Unit,
    /// The point highlighted after the user last grabbed it.
    pub selected_id: Option<VertexId>,
    /// Ink settings for the next stroke.
    pub brush: Brush,
    /// Last pen position in screen space (pointer or tracked fingertip).
    pub pen: Option<Point>,
    /// Whether the hand tracker saw a hand on its latest cycle.
    pub hand_present: bool,
    /// Sticky pan toggle: every primary press pans while set.
    pub pan_lock: bool,
}

/// Internal state for the gesture state machine.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// Moving an existing measurement point.
    Dragging {
        /// Id of the point being dragged.
        id: VertexId,
    },
    /// Panning the view.
    Panning {
        /// Screen-space position of the previous pointer event, used to compute the pan delta.
        last_screen: Point,
    },
    /// Laying down an ink stroke. The samples live in the sketch's pending stroke.
    Drawing,
}

impl InputState {
    /// Whether a gesture is in progress.
    #[must_use]
    pub fn is_active(&self) -> bool {
        !matches!(self, Self::Idle)
    }
}
