//! Input model: tools, modifier keys, mouse buttons, and the gesture state machine.
//!
//! `Tool`, `Modifiers` and `UiState` capture the user's intent at the time of
//! an event. `InputState` is the single active gesture between pointer-down
//! and pointer-up, carrying the context needed to compute incremental deltas.
//! Only one gesture exists at a time, so panning, drawing and pinch-zooming
//! are mutually exclusive by construction.

#[cfg(test)]
#[path = "input_test.rs"]
mod input_test;

use serde::{Deserialize, Serialize};

use crate::camera::Point;
use crate::drawing::BrushSettings;
use crate::text::{TextId, TextStyle};

/// Which tool is currently active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    /// Freehand ink (default).
    #[default]
    Draw,
    /// Drag to pan.
    Hand,
    /// Erase ink from the bitmap.
    Eraser,
    /// Click to place a text element.
    Text,
    /// Select and move drawing elements.
    Selection,
}

impl Tool {
    /// Whether a primary press with this tool starts a stroke.
    #[must_use]
    pub fn draws(self) -> bool {
        matches!(self, Self::Draw | Self::Eraser)
    }

    /// CSS cursor shown while the tool is idle.
    #[must_use]
    pub fn cursor(self) -> &'static str {
        match self {
            Self::Draw | Self::Eraser => "crosshair",
            Self::Hand => "grab",
            Self::Text => "text",
            Self::Selection => "default",
        }
    }
}

/// Keyboard/mouse modifier keys held during an event.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Modifiers {
    /// Shift key is held.
    pub shift: bool,
    /// Ctrl key is held.
    pub ctrl: bool,
    /// Alt / Option key is held.
    pub alt: bool,
    /// Meta / Command key is held.
    pub meta: bool,
}

impl Modifiers {
    /// Ctrl on most platforms, Cmd on macOS.
    #[must_use]
    pub fn command(self) -> bool {
        self.ctrl || self.meta
    }
}

/// Mouse button identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Button {
    /// Left mouse button (or pen/finger contact).
    Primary,
    /// Middle mouse button (scroll wheel click).
    Middle,
    /// Right mouse button.
    Secondary,
}

/// A keyboard key as reported by the browser's `KeyboardEvent.key`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key(pub String);

impl Key {
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self(name.to_owned())
    }

    /// Case-insensitive comparison for single-letter shortcuts.
    #[must_use]
    pub fn is(&self, name: &str) -> bool {
        self.0.eq_ignore_ascii_case(name)
    }

    #[must_use]
    pub fn is_space(&self) -> bool {
        self.0 == " " || self.0 == "Space" || self.0 == "Spacebar"
    }
}

/// Wheel / trackpad scroll delta.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WheelDelta {
    /// Horizontal scroll amount in pixels.
    pub dx: f64,
    /// Vertical scroll amount in pixels (positive = down).
    pub dy: f64,
}

/// Where the draw tool sends ink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeModel {
    /// Paint into the raster bitmap (undoable).
    #[default]
    Raster,
    /// Capture strokes as selectable drawing elements.
    Elements,
}

/// Key held to borrow a tool temporarily.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoldKey {
    /// Space bar: temporary hand tool.
    Space,
    /// `E`: temporary eraser.
    Eraser,
}

/// Persistent UI state visible to the renderer and the host toolbar.
#[derive(Debug, Clone, Default)]
pub struct UiState {
    /// Currently active tool.
    pub tool: Tool,
    /// Tool to restore when the held key is released. Written only by the
    /// hold-key handlers.
    pub held: Option<(HoldKey, Tool)>,
    pub brush: BrushSettings,
    pub text_style: TextStyle,
    pub stroke_model: StrokeModel,
    /// Text element currently open in the host editor.
    pub editing_text: Option<TextId>,
}

/// The active gesture.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum InputState {
    /// No gesture in progress; waiting for the next pointer-down.
    #[default]
    Idle,
    /// Dragging the canvas.
    Panning {
        /// Screen-space position of the previous pointer event.
        last_screen: Point,
    },
    /// Laying down a stroke.
    Drawing {
        /// Stroke model chosen when the gesture started.
        model: StrokeModel,
    },
    /// Two-finger touch: centroid motion pans, spread changes zoom.
    PinchZooming {
        /// Finger distance at the previous touch-move.
        last_distance: f64,
        /// Finger centroid at the previous touch-move.
        last_centroid: Point,
    },
    /// Moving drawing elements with the selection tool.
    DraggingElements {
        /// World-space pointer position at the previous event.
        last_world: Point,
        /// Move every element rather than just the selection.
        all: bool,
    },
    /// Pressing or dragging on the minimap.
    DraggingMinimap,
}

impl InputState {
    #[must_use]
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Short label for logs.
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Panning { .. } => "panning",
            Self::Drawing { .. } => "drawing",
            Self::PinchZooming { .. } => "pinch-zooming",
            Self::DraggingElements { .. } => "dragging-elements",
            Self::DraggingMinimap => "dragging-minimap",
        }
    }
}

/// Distance between two touches and their centroid.
#[must_use]
pub fn pinch_geometry(a: Point, b: Point) -> (f64, Point) {
    (a.distance(b), a.midpoint(b))
}
