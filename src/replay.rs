//! Stroke scripts: JSON descriptions of pen strokes replayed through the engine.
//!
//! A script is either a bare array of strokes or an object with an optional
//! starting viewport:
//!
//! ```json
//! { "viewport": { "x": 0, "y": 0, "zoom": 1 },
//!   "strokes": [ { "tool": "draw", "points": [[10, 10], [40, 12]] } ] }
//! ```
//!
//! Points are screen coordinates. Each stroke becomes a pointer
//! down / move... / up sequence dispatched to [`EngineCore`], so replay
//! exercises exactly the code path live input takes.

use canvas::camera::{Point, Viewport};
use canvas::drawing::BrushSettings;
use canvas::engine::EngineCore;
use canvas::events::InputEvent;
use canvas::input::{Button, Modifiers, Tool};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ReplayError {
    #[error("invalid stroke script: {0}")]
    Json(#[from] serde_json::Error),

    #[error("stroke {index} has no points")]
    EmptyStroke { index: usize },

    #[error("stroke {index} uses tool {tool:?}; only draw and eraser can be replayed")]
    UnsupportedTool { index: usize, tool: Tool },

    #[error("board size must be positive, got {width}x{height}")]
    InvalidSize { width: f64, height: f64 },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ScriptStroke {
    #[serde(default)]
    pub tool: Tool,
    #[serde(default)]
    pub brush: BrushSettings,
    pub points: Vec<[f64; 2]>,
    /// Per-point pen pressure, parallel to `points`.
    #[serde(default)]
    pub pressure: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct StrokeScript {
    #[serde(default)]
    pub viewport: Option<Viewport>,
    pub strokes: Vec<ScriptStroke>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ScriptShape {
    Bare(Vec<ScriptStroke>),
    Full(StrokeScript),
}

impl StrokeScript {
    /// # Errors
    ///
    /// Returns [`ReplayError::Json`] if `json` is neither shape.
    pub fn from_json(json: &str) -> Result<Self, ReplayError> {
        let shape: ScriptShape = serde_json::from_str(json)?;
        Ok(match shape {
            ScriptShape::Bare(strokes) => Self { viewport: None, strokes },
            ScriptShape::Full(script) => script,
        })
    }

    /// Reject strokes that cannot be replayed before touching an engine.
    ///
    /// # Errors
    ///
    /// The first empty stroke or non-drawing tool.
    pub fn validate(&self) -> Result<(), ReplayError> {
        for (index, stroke) in self.strokes.iter().enumerate() {
            if stroke.points.is_empty() {
                return Err(ReplayError::EmptyStroke { index });
            }
            if !matches!(stroke.tool, Tool::Draw | Tool::Eraser) {
                return Err(ReplayError::UnsupportedTool { index, tool: stroke.tool });
            }
        }
        Ok(())
    }
}

/// Counts reported after a replay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    pub strokes: usize,
    pub points: usize,
}

/// Create a `width` x `height` board and replay `script` onto it.
///
/// # Errors
///
/// Validation failures, or a non-positive board size.
pub fn render(script: &StrokeScript, width: f64, height: f64) -> Result<(EngineCore, ReplayStats), ReplayError> {
    if !(width > 0.0 && height > 0.0) {
        return Err(ReplayError::InvalidSize { width, height });
    }
    script.validate()?;
    let mut core = EngineCore::new();
    core.initialize(width, height);
    if let Some(vp) = script.viewport {
        apply_viewport(&mut core, vp);
    }
    let stats = replay(&mut core, script)?;
    Ok((core, stats))
}

/// Replay `script` onto an initialized engine, one committed stroke per entry.
///
/// # Errors
///
/// Validation failures; nothing is drawn when validation fails.
pub fn replay(core: &mut EngineCore, script: &StrokeScript) -> Result<ReplayStats, ReplayError> {
    script.validate()?;
    let mut stats = ReplayStats::default();
    for stroke in &script.strokes {
        core.set_tool(stroke.tool);
        core.set_brush(stroke.brush);
        for event in stroke_events(stroke) {
            core.dispatch(&event);
        }
        stats.strokes += 1;
        stats.points += stroke.points.len();
    }
    tracing::debug!(strokes = stats.strokes, points = stats.points, "script replayed");
    Ok(stats)
}

fn stroke_events(stroke: &ScriptStroke) -> Vec<InputEvent> {
    let pressure_at = |i: usize| stroke.pressure.as_ref().and_then(|p| p.get(i).copied());
    let modifiers = Modifiers::default();
    let mut events = Vec::with_capacity(stroke.points.len() + 1);
    for (i, &[x, y]) in stroke.points.iter().enumerate() {
        let screen = Point::new(x, y);
        let pressure = pressure_at(i);
        events.push(if i == 0 {
            InputEvent::PointerDown { screen, button: Button::Primary, modifiers, pressure }
        } else {
            InputEvent::PointerMove { screen, modifiers, pressure }
        });
    }
    if let Some(&[x, y]) = stroke.points.last() {
        events.push(InputEvent::PointerUp { screen: Point::new(x, y), button: Button::Primary, modifiers });
    }
    events
}

/// Move the engine's viewport to `target` without animation.
fn apply_viewport(core: &mut EngineCore, target: Viewport) {
    core.viewport.zoom_to_point(target.zoom, 0.0, 0.0);
    let current = core.camera();
    core.viewport.pan_by(target.x - current.x, target.y - current.y);
}

#[cfg(test)]
#[path = "replay_test.rs"]
mod tests;
