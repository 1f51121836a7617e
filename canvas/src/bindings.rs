//! JavaScript surface: the `Board` class the host page drives.
//!
//! The host forwards decoded DOM events as plain objects shaped like
//! [`InputEvent`], calls `tick` from `requestAnimationFrame`, and reacts to
//! the returned action list (an array of `{ type, data }` objects, see
//! [`Action`]). Toolbar buttons map one-to-one onto the methods below.

use serde::Serialize;
use serde::de::DeserializeOwned;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::wasm_bindgen;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::camera::Point;
use crate::drawing::{BrushSettings, DrawingConfig};
use crate::elements::FlipAxis;
use crate::engine::{Action, Engine};
use crate::events::InputEvent;
use crate::input::{StrokeModel, Tool};
use crate::raster::Color;
use crate::text::{TextId, TextStyle};

fn js_error(message: impl Into<String>) -> JsValue {
    JsValue::from_str(&message.into())
}

fn from_js<T: DeserializeOwned>(value: JsValue, what: &str) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| js_error(format!("invalid {what}: {e}")))
}

fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|e| js_error(format!("failed to serialize response: {e}")))
}

fn actions(list: &[Action]) -> Result<JsValue, JsValue> {
    to_js(&list)
}

#[wasm_bindgen]
pub struct Board {
    engine: Engine,
}

/// Every fallible method rejects malformed arguments with a string error.
#[allow(clippy::missing_errors_doc)]
#[wasm_bindgen]
impl Board {
    #[wasm_bindgen(constructor)]
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement) -> Board {
        Board { engine: Engine::new(canvas) }
    }

    pub fn initialize(&mut self, width: f64, height: f64) -> Result<JsValue, JsValue> {
        actions(&self.engine.initialize(width, height))
    }

    pub fn resize(&mut self, width: f64, height: f64) -> Result<JsValue, JsValue> {
        actions(&self.engine.resize(width, height))
    }

    /// Route one host event, e.g. `{ type: "pointerdown", screen: {x, y}, button: "primary" }`.
    pub fn dispatch(&mut self, event: JsValue) -> Result<JsValue, JsValue> {
        let event: InputEvent = from_js(event, "input event")?;
        actions(&self.engine.dispatch(&event))
    }

    pub fn tick(&mut self, now_ms: f64) -> Result<JsValue, JsValue> {
        actions(&self.engine.tick(now_ms))
    }

    pub fn render(&self) -> Result<(), JsValue> {
        self.engine.render()
    }

    #[wasm_bindgen(js_name = renderMinimap)]
    pub fn render_minimap(&self, ctx: &CanvasRenderingContext2d) -> Result<(), JsValue> {
        self.engine.render_minimap(ctx)
    }

    #[wasm_bindgen(js_name = toDataUrl)]
    pub fn to_data_url(&self) -> Result<String, JsValue> {
        self.engine.to_data_url()
    }

    /// Current viewport as `{ x, y, zoom }`.
    pub fn viewport(&self) -> Result<JsValue, JsValue> {
        to_js(&self.engine.core.camera())
    }

    // --- Toolbar ---

    #[wasm_bindgen(js_name = setTool)]
    pub fn set_tool(&mut self, tool: JsValue) -> Result<JsValue, JsValue> {
        let tool: Tool = from_js(tool, "tool")?;
        actions(&self.engine.core.set_tool(tool))
    }

    #[wasm_bindgen(js_name = setBrush)]
    pub fn set_brush(&mut self, brush: JsValue) -> Result<(), JsValue> {
        let brush: BrushSettings = from_js(brush, "brush")?;
        self.engine.core.set_brush(brush);
        Ok(())
    }

    #[wasm_bindgen(js_name = setTextStyle)]
    pub fn set_text_style(&mut self, style: JsValue) -> Result<(), JsValue> {
        let style: TextStyle = from_js(style, "text style")?;
        self.engine.core.set_text_style(style);
        Ok(())
    }

    #[wasm_bindgen(js_name = setStrokeModel)]
    pub fn set_stroke_model(&mut self, model: JsValue) -> Result<(), JsValue> {
        let model: StrokeModel = from_js(model, "stroke model")?;
        self.engine.core.set_stroke_model(model);
        Ok(())
    }

    #[wasm_bindgen(js_name = setDrawingConfig)]
    pub fn set_drawing_config(&mut self, config: JsValue) -> Result<(), JsValue> {
        let config: DrawingConfig = from_js(config, "drawing config")?;
        self.engine.core.set_drawing_config(config);
        Ok(())
    }

    pub fn undo(&mut self) -> Result<JsValue, JsValue> {
        actions(&self.engine.core.undo())
    }

    pub fn redo(&mut self) -> Result<JsValue, JsValue> {
        actions(&self.engine.core.redo())
    }

    #[wasm_bindgen(js_name = canUndo)]
    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.engine.core.can_undo()
    }

    #[wasm_bindgen(js_name = canRedo)]
    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.engine.core.can_redo()
    }

    #[wasm_bindgen(js_name = zoomIn)]
    pub fn zoom_in(&mut self) -> Result<JsValue, JsValue> {
        actions(&self.engine.core.zoom_in())
    }

    #[wasm_bindgen(js_name = zoomOut)]
    pub fn zoom_out(&mut self) -> Result<JsValue, JsValue> {
        actions(&self.engine.core.zoom_out())
    }

    #[wasm_bindgen(js_name = resetZoom)]
    pub fn reset_zoom(&mut self) -> Result<JsValue, JsValue> {
        actions(&self.engine.core.reset_zoom())
    }

    #[wasm_bindgen(js_name = centerView)]
    pub fn center_view(&mut self) -> Result<JsValue, JsValue> {
        actions(&self.engine.core.center_view())
    }

    pub fn reset(&mut self) -> Result<JsValue, JsValue> {
        actions(&self.engine.core.reset())
    }

    // --- Text ---

    #[wasm_bindgen(js_name = setText)]
    pub fn set_text(&mut self, id: JsValue, text: &str) -> Result<JsValue, JsValue> {
        let id: TextId = from_js(id, "text id")?;
        actions(&self.engine.core.set_text(&id, text))
    }

    #[wasm_bindgen(js_name = commitText)]
    pub fn commit_text(&mut self, id: JsValue) -> Result<JsValue, JsValue> {
        let id: TextId = from_js(id, "text id")?;
        actions(&self.engine.core.commit_text(&id))
    }

    // --- Elements ---

    #[wasm_bindgen(js_name = selectAll)]
    pub fn select_all(&mut self) -> Result<JsValue, JsValue> {
        actions(&self.engine.core.select_all())
    }

    #[wasm_bindgen(js_name = clearSelection)]
    pub fn clear_selection(&mut self) -> Result<JsValue, JsValue> {
        actions(&self.engine.core.clear_selection())
    }

    #[wasm_bindgen(js_name = setMoveMode)]
    pub fn set_move_mode(&mut self, on: bool) {
        self.engine.core.set_move_mode(on);
    }

    #[wasm_bindgen(js_name = duplicateSelected)]
    pub fn duplicate_selected(&mut self) -> Result<JsValue, JsValue> {
        actions(&self.engine.core.duplicate_selected())
    }

    #[wasm_bindgen(js_name = deleteSelected)]
    pub fn delete_selected(&mut self) -> Result<JsValue, JsValue> {
        actions(&self.engine.core.delete_selected())
    }

    /// Mirror the selection; `horizontal` flips left/right, otherwise top/bottom.
    #[wasm_bindgen(js_name = flipSelected)]
    pub fn flip_selected(&mut self, horizontal: bool) -> Result<JsValue, JsValue> {
        let axis = if horizontal { FlipAxis::Horizontal } else { FlipAxis::Vertical };
        actions(&self.engine.core.flip_selected(axis))
    }

    #[wasm_bindgen(js_name = scaleSelected)]
    pub fn scale_selected(&mut self, factor: f64) -> Result<JsValue, JsValue> {
        actions(&self.engine.core.scale_selected(factor))
    }

    /// Recolor the selection from a `#rrggbb` or `#rgb` string.
    #[wasm_bindgen(js_name = recolorSelected)]
    pub fn recolor_selected(&mut self, hex: &str) -> Result<JsValue, JsValue> {
        let color = Color::parse_hex(hex).ok_or_else(|| js_error(format!("invalid color: {hex}")))?;
        actions(&self.engine.core.recolor_selected(color))
    }

    pub fn organize(&mut self) -> Result<JsValue, JsValue> {
        actions(&self.engine.core.organize())
    }

    #[wasm_bindgen(js_name = autoGroup)]
    pub fn auto_group(&mut self) -> Result<JsValue, JsValue> {
        actions(&self.engine.core.auto_group())
    }

    // --- Minimap ---

    #[wasm_bindgen(js_name = minimapDown)]
    pub fn minimap_down(&mut self, x: f64, y: f64) -> Result<JsValue, JsValue> {
        actions(&self.engine.core.on_minimap_down(Point::new(x, y)))
    }

    #[wasm_bindgen(js_name = minimapMove)]
    pub fn minimap_move(&mut self, x: f64, y: f64) -> Result<JsValue, JsValue> {
        actions(&self.engine.core.on_minimap_move(Point::new(x, y)))
    }

    #[wasm_bindgen(js_name = minimapUp)]
    pub fn minimap_up(&mut self) -> Result<JsValue, JsValue> {
        actions(&self.engine.core.on_minimap_up())
    }
}
