use image::RgbaImage;
use serde::Serialize;
use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::camera::{Point, Viewport};
use crate::consts::{GROUP_DISTANCE, SMOOTH_PAN_MS, WHEEL_PAN_SENSITIVITY, WHEEL_ZOOM_RATE};
use crate::drawing::{BrushSettings, DrawingConfig, DrawingEngine, StrokeOutcome, StrokeStyle};
use crate::elements::{ElementId, ElementManager, ElementStyle, FlipAxis};
use crate::error::CanvasError;
use crate::events::{EventName, EventSource, InputEvent, SubscriptionId};
use crate::history::History;
use crate::input::{Button, HoldKey, InputState, Key, Modifiers, StrokeModel, Tool, UiState, WheelDelta, pinch_geometry};
use crate::minimap::Minimap;
use crate::raster::{Color, RasterSurface, Snapshot};
use crate::text::{CommitOutcome, TextId, TextLayer, TextStyle};
use crate::viewport::ViewportController;

#[cfg(test)]
#[path = "engine_test.rs"]
mod engine_test;

/// Actions returned from input handlers for the host to process.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum Action {
    /// Redraw the main canvas.
    RenderNeeded,
    ViewportChanged(Viewport),
    /// Undo/redo affordances should be refreshed.
    HistoryChanged { can_undo: bool, can_redo: bool },
    ToolChanged(Tool),
    /// Open the host text editor for a freshly created text element.
    EditTextRequested { id: TextId, text: String },
    /// A text element was removed (committed blank).
    TextDeleted { id: TextId },
    SelectionChanged(Vec<ElementId>),
    SetCursor(String),
    /// The host should `preventDefault` the context menu.
    SuppressContextMenu,
    /// The minimap overview was resampled.
    MinimapUpdated,
}

/// The bitmap and its undo log. Absent until [`EngineCore::initialize`] runs,
/// which stands in for a missing 2D context.
#[derive(Debug)]
pub struct Bitmap {
    pub surface: RasterSurface,
    pub history: History<Snapshot>,
}

impl Bitmap {
    /// A blank bitmap whose history starts at the blank snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`CanvasError::Encode`] if the first snapshot cannot be encoded.
    pub fn new(width: u32, height: u32) -> Result<Self, CanvasError> {
        let surface = RasterSurface::new(width, height);
        let history = History::new(surface.snapshot()?);
        Ok(Self { surface, history })
    }
}

/// Core engine state. All logic that doesn't depend on the canvas element.
///
/// Separated from `Engine` so it can be tested without WASM/browser dependencies.
#[derive(Debug)]
pub struct EngineCore {
    pub viewport: ViewportController,
    pub bitmap: Option<Bitmap>,
    pub drawing: DrawingEngine,
    pub elements: ElementManager,
    pub texts: TextLayer,
    pub minimap: Minimap,
    pub ui: UiState,
    pub input: InputState,
    /// Color the bitmap is flattened onto for display and export.
    pub background: Color,
    subscriptions: Vec<SubscriptionId>,
    now_ms: f64,
}

impl Default for EngineCore {
    fn default() -> Self {
        Self {
            viewport: ViewportController::new(),
            bitmap: None,
            drawing: DrawingEngine::default(),
            elements: ElementManager::new(),
            texts: TextLayer::new(),
            minimap: Minimap::default(),
            ui: UiState::default(),
            input: InputState::default(),
            background: Color::WHITE,
            subscriptions: Vec::new(),
            now_ms: 0.0,
        }
    }
}

impl EngineCore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_config(config: DrawingConfig) -> Self {
        Self { drawing: DrawingEngine::new(config), ..Self::default() }
    }

    // --- Lifecycle ---

    /// Create a blank bitmap matching the screen, seed history with it, and
    /// render the first minimap.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn initialize(&mut self, width: f64, height: f64) -> Vec<Action> {
        self.viewport.set_screen_size(width, height);
        let bitmap = match Bitmap::new(width.max(1.0).ceil() as u32, height.max(1.0).ceil() as u32) {
            Ok(bitmap) => bitmap,
            Err(e) => {
                log::error!("bitmap setup failed: {e}");
                return Vec::new();
            }
        };
        self.minimap.force_refresh(&bitmap.surface, self.now_ms);
        self.bitmap = Some(bitmap);
        log::debug!("engine initialized at {width}x{height}");
        let mut actions = vec![self.history_changed(), Action::MinimapUpdated];
        actions.push(Action::ViewportChanged(self.viewport.viewport()));
        actions.push(Action::RenderNeeded);
        actions
    }

    /// Track a new screen size. The bitmap grows to cover it and keeps its
    /// content; it never shrinks.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn resize(&mut self, width: f64, height: f64) -> Vec<Action> {
        self.viewport.set_screen_size(width, height);
        if let Some(bitmap) = self.bitmap.as_mut() {
            if bitmap.surface.resize(width.max(1.0).ceil() as u32, height.max(1.0).ceil() as u32) {
                self.minimap.mark_dirty();
            }
        }
        vec![Action::RenderNeeded]
    }

    /// Discard everything: live gesture, ink, history, viewport, elements and text.
    pub fn reset(&mut self) -> Vec<Action> {
        self.viewport.cancel_animation();
        if let Some(bitmap) = self.bitmap.as_mut() {
            self.drawing.cancel(&mut bitmap.surface);
            bitmap.surface.clear();
            match bitmap.surface.snapshot() {
                Ok(blank) => bitmap.history.reset(blank),
                Err(e) => log::error!("history not reset: {e}"),
            }
            self.minimap.force_refresh(&bitmap.surface, self.now_ms);
        }
        self.elements.clear();
        self.texts.clear();
        self.input = InputState::Idle;
        self.ui.held = None;
        self.ui.editing_text = None;
        self.viewport.reset();
        log::debug!("engine reset");
        vec![
            self.history_changed(),
            Action::MinimapUpdated,
            Action::SelectionChanged(Vec::new()),
            Action::ViewportChanged(self.viewport.viewport()),
            Action::RenderNeeded,
        ]
    }

    // --- History ---

    /// Restore the previous snapshot. Ignored while a stroke is in progress.
    pub fn undo(&mut self) -> Vec<Action> {
        self.step_history(true)
    }

    /// Re-apply the next snapshot. Ignored while a stroke is in progress.
    pub fn redo(&mut self) -> Vec<Action> {
        self.step_history(false)
    }

    #[must_use]
    pub fn can_undo(&self) -> bool {
        self.bitmap.as_ref().is_some_and(|b| b.history.can_undo())
    }

    #[must_use]
    pub fn can_redo(&self) -> bool {
        self.bitmap.as_ref().is_some_and(|b| b.history.can_redo())
    }

    fn step_history(&mut self, back: bool) -> Vec<Action> {
        if self.drawing.is_active() {
            return Vec::new();
        }
        let Some(bitmap) = self.bitmap.as_mut() else {
            return Vec::new();
        };
        let entry = if back { bitmap.history.undo() } else { bitmap.history.redo() };
        let Some(snapshot) = entry.cloned() else {
            return Vec::new();
        };
        if let Err(e) = bitmap.surface.restore(&snapshot) {
            log::error!("history step failed: {e}");
            // Put the cursor back where the pixels still are.
            if back {
                bitmap.history.redo();
            } else {
                bitmap.history.undo();
            }
            return Vec::new();
        }
        self.minimap.force_refresh(&bitmap.surface, self.now_ms);
        vec![self.history_changed(), Action::MinimapUpdated, Action::RenderNeeded]
    }

    fn history_changed(&self) -> Action {
        Action::HistoryChanged { can_undo: self.can_undo(), can_redo: self.can_redo() }
    }

    // --- Toolbar ---

    /// Switch tools. Ends any gesture and forgets a held-key tool.
    pub fn set_tool(&mut self, tool: Tool) -> Vec<Action> {
        let mut actions = self.exit_gesture();
        self.ui.held = None;
        actions.extend(self.switch_tool(tool));
        actions
    }

    pub fn set_brush(&mut self, brush: BrushSettings) {
        self.ui.brush = brush;
    }

    pub fn set_text_style(&mut self, style: TextStyle) {
        self.ui.text_style = style;
    }

    pub fn set_stroke_model(&mut self, model: StrokeModel) {
        self.ui.stroke_model = model;
    }

    pub fn set_drawing_config(&mut self, config: DrawingConfig) {
        self.drawing.set_config(config);
    }

    pub fn zoom_in(&mut self) -> Vec<Action> {
        self.with_viewport(|vp| vp.zoom_by_step(true))
    }

    pub fn zoom_out(&mut self) -> Vec<Action> {
        self.with_viewport(|vp| vp.zoom_by_step(false))
    }

    pub fn reset_zoom(&mut self) -> Vec<Action> {
        self.with_viewport(ViewportController::reset_zoom)
    }

    /// Bring `world` to the screen center, animated over the default duration.
    pub fn center_on(&mut self, world: Point) -> Vec<Action> {
        self.viewport.smooth_center_on(world, SMOOTH_PAN_MS, self.now_ms);
        vec![Action::RenderNeeded]
    }

    /// Animated pan back to the bitmap's center.
    pub fn center_view(&mut self) -> Vec<Action> {
        let Some(bitmap) = self.bitmap.as_ref() else {
            return Vec::new();
        };
        let center = bitmap.surface.world_rect().center();
        self.center_on(center)
    }

    // --- Text ---

    /// Store text typed in the host editor.
    pub fn set_text(&mut self, id: &TextId, text: &str) -> Vec<Action> {
        if self.texts.set_text(id, text) { vec![Action::RenderNeeded] } else { Vec::new() }
    }

    /// Close the editor for `id`; blank text deletes the element.
    pub fn commit_text(&mut self, id: &TextId) -> Vec<Action> {
        if self.ui.editing_text.as_ref() == Some(id) {
            self.ui.editing_text = None;
        }
        match self.texts.commit(id) {
            CommitOutcome::Kept => vec![Action::RenderNeeded],
            CommitOutcome::Deleted => vec![Action::TextDeleted { id: *id }, Action::RenderNeeded],
            CommitOutcome::Missing => Vec::new(),
        }
    }

    // --- Element editing ---

    pub fn select_all(&mut self) -> Vec<Action> {
        self.elements.select_all();
        self.selection_changed()
    }

    pub fn clear_selection(&mut self) -> Vec<Action> {
        if self.elements.clear_selection() { self.selection_changed() } else { Vec::new() }
    }

    pub fn set_move_mode(&mut self, on: bool) {
        self.elements.set_move_mode(on);
    }

    pub fn duplicate_selected(&mut self) -> Vec<Action> {
        if self.elements.duplicate_selected().is_empty() { Vec::new() } else { self.selection_changed() }
    }

    pub fn delete_selected(&mut self) -> Vec<Action> {
        if self.elements.delete_selected().is_empty() { Vec::new() } else { self.selection_changed() }
    }

    pub fn flip_selected(&mut self, axis: FlipAxis) -> Vec<Action> {
        Self::render_if(self.elements.flip_selected(axis))
    }

    pub fn scale_selected(&mut self, factor: f64) -> Vec<Action> {
        Self::render_if(self.elements.scale_selected(factor))
    }

    pub fn recolor_selected(&mut self, color: Color) -> Vec<Action> {
        Self::render_if(self.elements.recolor_selected(color))
    }

    pub fn organize(&mut self) -> Vec<Action> {
        Self::render_if(self.elements.organize())
    }

    pub fn auto_group(&mut self) -> Vec<Action> {
        let groups = self.elements.auto_group(GROUP_DISTANCE);
        log::debug!("auto-group formed {groups} groups");
        vec![Action::RenderNeeded]
    }

    fn selection_changed(&self) -> Vec<Action> {
        vec![Action::SelectionChanged(self.elements.selected_ids()), Action::RenderNeeded]
    }

    fn render_if(changed: bool) -> Vec<Action> {
        if changed { vec![Action::RenderNeeded] } else { Vec::new() }
    }

    // --- Pointer input ---

    pub fn on_pointer_down(
        &mut self,
        screen: Point,
        button: Button,
        modifiers: Modifiers,
        pressure: Option<f64>,
    ) -> Vec<Action> {
        let mut actions = self.exit_gesture();
        self.viewport.cancel_animation();
        if button == Button::Secondary {
            actions.push(Action::SuppressContextMenu);
        }

        let pans = self.ui.tool == Tool::Hand
            || matches!(button, Button::Secondary | Button::Middle)
            || (button == Button::Primary && modifiers.alt);
        if pans {
            self.input = InputState::Panning { last_screen: screen };
            actions.push(Action::SetCursor("grabbing".into()));
            return actions;
        }

        let world = self.viewport.viewport().to_world(screen);
        match self.ui.tool {
            Tool::Draw | Tool::Eraser => actions.extend(self.begin_stroke(world, pressure)),
            Tool::Text => actions.extend(self.place_text(world)),
            Tool::Selection => actions.extend(self.press_selection(world)),
            Tool::Hand => {}
        }
        actions
    }

    pub fn on_pointer_move(&mut self, screen: Point, _modifiers: Modifiers, pressure: Option<f64>) -> Vec<Action> {
        match self.input {
            InputState::Panning { last_screen } => {
                self.input = InputState::Panning { last_screen: screen };
                self.with_viewport(|vp| vp.pan_by(screen.x - last_screen.x, screen.y - last_screen.y))
            }
            InputState::Drawing { model: StrokeModel::Raster } => {
                let world = self.viewport.viewport().to_world(screen);
                let Some(bitmap) = self.bitmap.as_mut() else {
                    return Vec::new();
                };
                if self.drawing.extend(&mut bitmap.surface, world, pressure) {
                    self.minimap.mark_dirty();
                    vec![Action::RenderNeeded]
                } else {
                    Vec::new()
                }
            }
            InputState::Drawing { model: StrokeModel::Elements } => {
                let world = self.viewport.viewport().to_world(screen);
                Self::render_if(self.elements.add_point(world))
            }
            InputState::DraggingElements { last_world, all } => {
                let world = self.viewport.viewport().to_world(screen);
                let (dx, dy) = (world.x - last_world.x, world.y - last_world.y);
                self.input = InputState::DraggingElements { last_world: world, all };
                let moved = if all { self.elements.move_all(dx, dy) } else { self.elements.move_selected(dx, dy) };
                Self::render_if(moved)
            }
            InputState::Idle | InputState::PinchZooming { .. } | InputState::DraggingMinimap => Vec::new(),
        }
    }

    pub fn on_pointer_up(&mut self, _screen: Point, _button: Button, _modifiers: Modifiers) -> Vec<Action> {
        if self.input == InputState::DraggingMinimap {
            self.input = InputState::Idle;
            return Vec::new();
        }
        self.exit_gesture()
    }

    /// The pointer left the canvas: finish strokes and pans as if released.
    pub fn on_pointer_leave(&mut self, _screen: Point) -> Vec<Action> {
        match self.input {
            InputState::Drawing { .. } | InputState::Panning { .. } => self.exit_gesture(),
            _ => Vec::new(),
        }
    }

    pub fn on_wheel(&mut self, screen: Point, delta: WheelDelta, modifiers: Modifiers) -> Vec<Action> {
        if modifiers.command() {
            let target = self.viewport.zoom() * (-delta.dy * WHEEL_ZOOM_RATE).exp();
            self.with_viewport(|vp| vp.zoom_to_point(target, screen.x, screen.y))
        } else {
            self.with_viewport(|vp| vp.pan_by(-delta.dx * WHEEL_PAN_SENSITIVITY, -delta.dy * WHEEL_PAN_SENSITIVITY))
        }
    }

    pub fn on_context_menu(&mut self) -> Vec<Action> {
        vec![Action::SuppressContextMenu]
    }

    // --- Touch input ---

    /// One finger behaves like a primary press; two or more start pinch-zoom.
    pub fn on_touch_start(&mut self, touches: &[Point]) -> Vec<Action> {
        match touches {
            [] => Vec::new(),
            [one] => self.on_pointer_down(*one, Button::Primary, Modifiers::default(), None),
            [a, b, ..] => {
                let mut actions = self.exit_gesture();
                self.viewport.cancel_animation();
                let (distance, centroid) = pinch_geometry(*a, *b);
                self.input = InputState::PinchZooming { last_distance: distance, last_centroid: centroid };
                log::debug!("pinch start: distance {distance:.1}");
                actions.push(Action::RenderNeeded);
                actions
            }
        }
    }

    /// Pinch: centroid motion pans and the ratio of consecutive finger
    /// distances zooms about the centroid.
    pub fn on_touch_move(&mut self, touches: &[Point]) -> Vec<Action> {
        match (self.input, touches) {
            (InputState::PinchZooming { last_distance, last_centroid }, [a, b, ..]) => {
                let (distance, centroid) = pinch_geometry(*a, *b);
                self.input = InputState::PinchZooming { last_distance: distance, last_centroid: centroid };
                let before = self.viewport.revision();
                self.viewport.pan_by(centroid.x - last_centroid.x, centroid.y - last_centroid.y);
                if last_distance > 0.0 && distance > 0.0 {
                    let target = self.viewport.zoom() * (distance / last_distance);
                    self.viewport.zoom_to_point(target, centroid.x, centroid.y);
                }
                self.viewport_actions(before)
            }
            (InputState::PinchZooming { .. }, _) => Vec::new(),
            (_, [one, ..]) => self.on_pointer_move(*one, Modifiers::default(), None),
            (_, []) => Vec::new(),
        }
    }

    /// `touches` are the fingers still down.
    pub fn on_touch_end(&mut self, touches: &[Point]) -> Vec<Action> {
        match self.input {
            InputState::PinchZooming { .. } if touches.len() < 2 => {
                self.input = InputState::Idle;
                vec![Action::RenderNeeded]
            }
            InputState::PinchZooming { .. } => Vec::new(),
            _ if touches.is_empty() => self.exit_gesture(),
            _ => Vec::new(),
        }
    }

    // --- Keyboard input ---

    pub fn on_key_down(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        if self.ui.editing_text.is_some() {
            return Vec::new();
        }
        if modifiers.command() {
            return self.command_shortcut(key, modifiers);
        }
        if key.is_space() {
            return self.hold(HoldKey::Space, Tool::Hand);
        }
        if key.is("e") && !modifiers.alt {
            return self.hold(HoldKey::Eraser, Tool::Eraser);
        }
        match key.0.as_str() {
            "Delete" | "Backspace" if self.ui.tool == Tool::Selection => self.delete_selected(),
            "Escape" => {
                let mut actions = self.exit_gesture();
                actions.extend(self.clear_selection());
                actions
            }
            _ => Vec::new(),
        }
    }

    pub fn on_key_up(&mut self, key: &Key, _modifiers: Modifiers) -> Vec<Action> {
        let released = if key.is_space() {
            HoldKey::Space
        } else if key.is("e") {
            HoldKey::Eraser
        } else {
            return Vec::new();
        };
        match self.ui.held {
            Some((held, previous)) if held == released => {
                let mut actions = self.exit_gesture();
                self.ui.held = None;
                actions.extend(self.switch_tool(previous));
                actions
            }
            _ => Vec::new(),
        }
    }

    fn command_shortcut(&mut self, key: &Key, modifiers: Modifiers) -> Vec<Action> {
        match key.0.as_str() {
            "=" | "+" => self.zoom_in(),
            "-" | "_" => self.zoom_out(),
            "0" => self.reset_zoom(),
            k if k.eq_ignore_ascii_case("z") && modifiers.shift => self.redo(),
            k if k.eq_ignore_ascii_case("z") => self.undo(),
            k if k.eq_ignore_ascii_case("y") => self.redo(),
            _ => Vec::new(),
        }
    }

    /// Borrow `tool` while `key` is held. Key repeat and a second hold while
    /// one is active are ignored.
    fn hold(&mut self, key: HoldKey, tool: Tool) -> Vec<Action> {
        if self.ui.held.is_some() || self.ui.tool == tool {
            return Vec::new();
        }
        let mut actions = self.exit_gesture();
        self.ui.held = Some((key, self.ui.tool));
        actions.extend(self.switch_tool(tool));
        actions
    }

    fn switch_tool(&mut self, tool: Tool) -> Vec<Action> {
        if self.ui.tool == tool {
            return Vec::new();
        }
        log::debug!("tool {:?} -> {:?}", self.ui.tool, tool);
        self.ui.tool = tool;
        vec![Action::ToolChanged(tool), Action::SetCursor(tool.cursor().into())]
    }

    // --- Minimap input ---

    /// Press on the minimap at minimap-local `local`: recenter there.
    pub fn on_minimap_down(&mut self, local: Point) -> Vec<Action> {
        if !self.minimap.contains(local) {
            return Vec::new();
        }
        let mut actions = self.exit_gesture();
        self.input = InputState::DraggingMinimap;
        actions.extend(self.recenter_from_minimap(local));
        actions
    }

    pub fn on_minimap_move(&mut self, local: Point) -> Vec<Action> {
        if self.input != InputState::DraggingMinimap {
            return Vec::new();
        }
        self.recenter_from_minimap(local)
    }

    pub fn on_minimap_up(&mut self) -> Vec<Action> {
        if self.input == InputState::DraggingMinimap {
            self.input = InputState::Idle;
        }
        Vec::new()
    }

    fn recenter_from_minimap(&mut self, local: Point) -> Vec<Action> {
        let world = self.minimap.to_world(local);
        self.with_viewport(|vp| vp.center_on(world))
    }

    // --- Frame loop ---

    /// Per-frame callback: advance smooth pan and refresh the minimap when due.
    pub fn tick(&mut self, now_ms: f64) -> Vec<Action> {
        self.now_ms = now_ms;
        let before = self.viewport.revision();
        self.viewport.tick(now_ms);
        let mut actions = self.viewport_actions(before);
        if let Some(bitmap) = self.bitmap.as_ref() {
            if self.minimap.maybe_refresh(&bitmap.surface, now_ms) {
                actions.push(Action::MinimapUpdated);
            }
        }
        actions
    }

    // --- Event routing ---

    /// Subscribe to every routed event on `source`.
    pub fn attach(&mut self, source: &mut dyn EventSource) {
        self.detach(source);
        self.subscriptions = EventName::ALL.iter().map(|name| source.subscribe(*name)).collect();
    }

    /// Release every subscription taken by [`Self::attach`].
    pub fn detach(&mut self, source: &mut dyn EventSource) {
        for id in self.subscriptions.drain(..) {
            if !source.unsubscribe(id) {
                log::warn!("event subscription {id:?} was already gone");
            }
        }
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        !self.subscriptions.is_empty()
    }

    /// Route a host event to its handler.
    pub fn dispatch(&mut self, event: &InputEvent) -> Vec<Action> {
        match event {
            InputEvent::Resize { width, height } => self.resize(*width, *height),
            InputEvent::KeyDown { key, modifiers } => self.on_key_down(key, *modifiers),
            InputEvent::KeyUp { key, modifiers } => self.on_key_up(key, *modifiers),
            InputEvent::PointerDown { screen, button, modifiers, pressure } => {
                self.on_pointer_down(*screen, *button, *modifiers, *pressure)
            }
            InputEvent::PointerMove { screen, modifiers, pressure } => {
                self.on_pointer_move(*screen, *modifiers, *pressure)
            }
            InputEvent::PointerUp { screen, button, modifiers } => self.on_pointer_up(*screen, *button, *modifiers),
            InputEvent::PointerLeave { screen } => self.on_pointer_leave(*screen),
            InputEvent::Wheel { screen, delta, modifiers } => self.on_wheel(*screen, *delta, *modifiers),
            InputEvent::TouchStart { touches } => self.on_touch_start(touches),
            InputEvent::TouchMove { touches } => self.on_touch_move(touches),
            InputEvent::TouchEnd { touches } => self.on_touch_end(touches),
            InputEvent::ContextMenu => self.on_context_menu(),
        }
    }

    // --- Gesture plumbing ---

    /// End the active gesture cleanly: strokes are committed to history,
    /// pans drop their anchor.
    pub fn exit_gesture(&mut self) -> Vec<Action> {
        let state = std::mem::take(&mut self.input);
        if !state.is_idle() {
            log::debug!("gesture end: {}", state.label());
        }
        match state {
            InputState::Drawing { model: StrokeModel::Raster } => {
                let Some(bitmap) = self.bitmap.as_mut() else {
                    return Vec::new();
                };
                match self.drawing.end(&mut bitmap.surface, &mut bitmap.history) {
                    None => Vec::new(),
                    Some(StrokeOutcome::Unchanged) => vec![Action::RenderNeeded],
                    Some(StrokeOutcome::Unrecorded) => {
                        self.minimap.mark_dirty();
                        vec![Action::RenderNeeded]
                    }
                    Some(StrokeOutcome::Recorded) => {
                        self.minimap.mark_dirty();
                        vec![self.history_changed(), Action::RenderNeeded]
                    }
                }
            }
            InputState::Drawing { model: StrokeModel::Elements } => {
                let style = ElementStyle::from_brush(&self.ui.brush);
                Self::render_if(self.elements.finish_stroke(&style).is_some())
            }
            InputState::Panning { .. } => vec![Action::SetCursor(self.ui.tool.cursor().into())],
            InputState::DraggingElements { .. } => vec![Action::RenderNeeded],
            InputState::Idle | InputState::PinchZooming { .. } | InputState::DraggingMinimap => Vec::new(),
        }
    }

    fn begin_stroke(&mut self, world: Point, pressure: Option<f64>) -> Vec<Action> {
        let model = if self.ui.tool == Tool::Eraser { StrokeModel::Raster } else { self.ui.stroke_model };
        match model {
            StrokeModel::Raster => {
                let Some(bitmap) = self.bitmap.as_mut() else {
                    log::warn!("stroke ignored: bitmap not initialized");
                    return Vec::new();
                };
                let style = if self.ui.tool == Tool::Eraser {
                    StrokeStyle::eraser()
                } else {
                    StrokeStyle::brush(&self.ui.brush)
                };
                self.drawing.begin(&mut bitmap.surface, world, pressure, style);
                self.minimap.mark_dirty();
            }
            StrokeModel::Elements => self.elements.start_stroke(world),
        }
        self.input = InputState::Drawing { model };
        vec![Action::RenderNeeded]
    }

    fn place_text(&mut self, world: Point) -> Vec<Action> {
        let mut actions = Vec::new();
        if let Some(open) = self.ui.editing_text {
            actions.extend(self.commit_text(&open));
        }
        let id = self.texts.create(world, &self.ui.text_style);
        self.ui.editing_text = Some(id);
        actions.push(Action::EditTextRequested { id, text: String::new() });
        actions.push(Action::RenderNeeded);
        actions
    }

    fn press_selection(&mut self, world: Point) -> Vec<Action> {
        if self.elements.move_mode() {
            self.input = InputState::DraggingElements { last_world: world, all: true };
            return Vec::new();
        }
        match self.elements.hit_test(world, self.viewport.zoom()) {
            Some(id) if self.elements.is_selected(&id) => {
                self.input = InputState::DraggingElements { last_world: world, all: false };
                Vec::new()
            }
            Some(id) => {
                self.elements.select(&id);
                self.selection_changed()
            }
            None => self.clear_selection(),
        }
    }

    fn with_viewport(&mut self, f: impl FnOnce(&mut ViewportController)) -> Vec<Action> {
        let before = self.viewport.revision();
        f(&mut self.viewport);
        self.viewport_actions(before)
    }

    fn viewport_actions(&self, before: u64) -> Vec<Action> {
        if self.viewport.revision() == before {
            return Vec::new();
        }
        vec![Action::ViewportChanged(self.viewport.viewport()), Action::RenderNeeded]
    }

    // --- Queries ---

    #[must_use]
    pub fn tool(&self) -> Tool {
        self.ui.tool
    }

    #[must_use]
    pub fn camera(&self) -> Viewport {
        self.viewport.viewport()
    }

    #[must_use]
    pub fn selection(&self) -> Vec<ElementId> {
        self.elements.selected_ids()
    }

    #[must_use]
    pub fn surface(&self) -> Option<&RasterSurface> {
        self.bitmap.as_ref().map(|b| &b.surface)
    }

    /// The bitmap as a PNG data URL over the background color, ready for analysis.
    ///
    /// # Errors
    ///
    /// [`CanvasError::Uninitialized`] before `initialize`, or an encoding failure.
    pub fn to_data_url(&self) -> Result<String, CanvasError> {
        let bitmap = self.bitmap.as_ref().ok_or(CanvasError::Uninitialized)?;
        bitmap.surface.to_data_url(Some(self.background))
    }

    /// Screen image of the bitmap through the current viewport.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    #[must_use]
    pub fn render_view(&self) -> Option<RgbaImage> {
        let bitmap = self.bitmap.as_ref()?;
        let (w, h) = self.viewport.screen_size();
        let vp = self.viewport.viewport();
        Some(bitmap.surface.render_view(&vp, w.max(1.0) as u32, h.max(1.0) as u32, self.background))
    }
}

/// The full canvas engine. Wraps `EngineCore` and owns the browser canvas element.
pub struct Engine {
    canvas: HtmlCanvasElement,
    ctx: Option<CanvasRenderingContext2d>,
    pub core: EngineCore,
}

impl Engine {
    /// Create a new engine bound to the given canvas element. A canvas
    /// without a 2D context yields an engine whose drawing calls are no-ops.
    #[must_use]
    pub fn new(canvas: HtmlCanvasElement) -> Self {
        let ctx = match canvas.get_context("2d") {
            Ok(Some(obj)) => match obj.dyn_into::<CanvasRenderingContext2d>() {
                Ok(ctx) => Some(ctx),
                Err(_) => None,
            },
            _ => None,
        };
        if ctx.is_none() {
            log::warn!("2d context unavailable; canvas operations disabled");
        }
        Self { canvas, ctx, core: EngineCore::new() }
    }

    /// Size the backing store to the element and create the bitmap.
    pub fn initialize(&mut self, width_css: f64, height_css: f64) -> Vec<Action> {
        if self.ctx.is_none() {
            return Vec::new();
        }
        self.size_canvas(width_css, height_css);
        self.core.initialize(width_css, height_css)
    }

    pub fn resize(&mut self, width_css: f64, height_css: f64) -> Vec<Action> {
        if self.ctx.is_none() {
            return Vec::new();
        }
        self.size_canvas(width_css, height_css);
        self.core.resize(width_css, height_css)
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn size_canvas(&self, width_css: f64, height_css: f64) {
        self.canvas.set_width(width_css.max(1.0) as u32);
        self.canvas.set_height(height_css.max(1.0) as u32);
    }

    pub fn dispatch(&mut self, event: &InputEvent) -> Vec<Action> {
        if self.ctx.is_none() {
            return Vec::new();
        }
        self.core.dispatch(event)
    }

    pub fn tick(&mut self, now_ms: f64) -> Vec<Action> {
        self.core.tick(now_ms)
    }

    /// Draw the current state to the canvas.
    ///
    /// # Errors
    ///
    /// Propagates failures from the 2D context.
    pub fn render(&self) -> Result<(), JsValue> {
        let Some(ctx) = self.ctx.as_ref() else {
            return Ok(());
        };
        crate::render::draw(ctx, &self.core)
    }

    /// Draw the minimap and its viewport indicator onto `ctx`.
    ///
    /// # Errors
    ///
    /// Propagates failures from the 2D context.
    pub fn render_minimap(&self, ctx: &CanvasRenderingContext2d) -> Result<(), JsValue> {
        crate::render::draw_minimap(ctx, &self.core)
    }

    /// PNG data URL of the bitmap for the analysis request.
    ///
    /// # Errors
    ///
    /// Returns the encoding failure as a string for JS.
    pub fn to_data_url(&self) -> Result<String, JsValue> {
        self.core.to_data_url().map_err(|e| JsValue::from_str(&e.to_string()))
    }
}
