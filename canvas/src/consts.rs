//! Shared numeric constants for the canvas crate.

// ── Viewport ────────────────────────────────────────────────────

/// Smallest allowed zoom factor.
pub const MIN_ZOOM: f64 = 0.1;

/// Largest allowed zoom factor.
pub const MAX_ZOOM: f64 = 5.0;

/// Additive zoom change applied by toolbar buttons and keyboard shortcuts.
pub const ZOOM_STEP: f64 = 0.1;

/// Exponential zoom rate per wheel pixel when Ctrl/Cmd is held.
pub const WHEEL_ZOOM_RATE: f64 = 0.0015;

/// Multiplier applied to plain wheel deltas before panning.
pub const WHEEL_PAN_SENSITIVITY: f64 = 1.0;

/// Default duration of an animated pan, in milliseconds.
pub const SMOOTH_PAN_MS: f64 = 300.0;

// ── Brushes ─────────────────────────────────────────────────────

/// Pencil: thin, near-opaque.
pub const PENCIL_WIDTH: f64 = 2.0;
pub const PENCIL_OPACITY: f64 = 0.95;

/// Marker: medium, opaque.
pub const MARKER_WIDTH: f64 = 5.0;
pub const MARKER_OPACITY: f64 = 1.0;

/// Highlighter: wide, translucent.
pub const HIGHLIGHTER_WIDTH: f64 = 18.0;
pub const HIGHLIGHTER_OPACITY: f64 = 0.35;

/// Eraser stroke width in world units.
pub const ERASER_WIDTH: f64 = 24.0;

/// Bounds for toolbar size/opacity overrides.
pub const MIN_BRUSH_WIDTH: f64 = 0.5;
pub const MAX_BRUSH_WIDTH: f64 = 100.0;
pub const MIN_BRUSH_OPACITY: f64 = 0.05;

/// Default ink color.
pub const DEFAULT_COLOR: &str = "#000000";

/// Segments used to flatten one quadratic piece of a smoothed live stroke.
pub const CURVE_SEGMENTS: u32 = 8;

// ── Bitmap ──────────────────────────────────────────────────────

/// Extra pixels added on a side when a stroke grows the bitmap past it.
pub const BITMAP_GROW_STEP: i64 = 256;

/// Largest bitmap edge in pixels. Ink beyond it is clipped.
pub const MAX_BITMAP_SIDE: u32 = 4096;

// ── Minimap ─────────────────────────────────────────────────────

/// Edge length of the square minimap in pixels.
pub const MINIMAP_SIZE: u32 = 160;

/// Minimum time between minimap resamples, in milliseconds.
pub const MINIMAP_REFRESH_MS: f64 = 200.0;

// ── Elements ────────────────────────────────────────────────────

/// Screen-space slop added to half the line width when hit-testing strokes.
pub const HIT_MARGIN_PX: f64 = 5.0;

/// Offset of a duplicated element from its source, in world units.
pub const DUPLICATE_OFFSET: f64 = 20.0;

/// Center-to-center distance under which auto-group joins two elements.
pub const GROUP_DISTANCE: f64 = 100.0;

/// Gap between cells in the magic-organize grid.
pub const ORGANIZE_PADDING: f64 = 40.0;

// ── Text ────────────────────────────────────────────────────────

pub const DEFAULT_FONT_SIZE: f64 = 24.0;
pub const DEFAULT_FONT_FAMILY: &str = "sans-serif";
