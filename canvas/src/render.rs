//! Rendering: draws the engine state to a 2D context.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! The bitmap is composed on the Rust side (see
//! [`crate::raster::RasterSurface::render_view`]) and blitted with
//! `putImageData`; drawing elements, text and selection UI are stroked on top
//! in world space. Nothing here mutates engine state.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.

use image::RgbaImage;
use wasm_bindgen::{Clamped, JsValue};
use web_sys::{CanvasRenderingContext2d, ImageData};

use crate::elements::DrawingElement;
use crate::engine::EngineCore;
use crate::raster::{Color, flatten};
use crate::text::TextElement;

/// Selection dash segment length in screen pixels.
const SELECTION_DASH_PX: f64 = 4.0;

/// Padding between a selected element and its dashed box, in screen pixels.
const SELECTION_PAD_PX: f64 = 6.0;

const SELECTION_COLOR: &str = "#1E90FF";
const INDICATOR_COLOR: &str = "#E53935";

/// Draw the full scene: bitmap, elements, text, selection UI.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails (e.g. invalid context state).
pub fn draw(ctx: &CanvasRenderingContext2d, core: &EngineCore) -> Result<(), JsValue> {
    // Layer 1: the composed bitmap in screen space.
    ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)?;
    if let Some(view) = core.render_view() {
        put_image(ctx, &view, 0.0, 0.0)?;
    }

    // Layer 2+: world-space overlays.
    let vp = core.camera();
    ctx.set_transform(vp.zoom, 0.0, 0.0, vp.zoom, vp.x, vp.y)?;

    for el in core.elements.iter() {
        draw_element(ctx, el)?;
    }
    draw_pending(ctx, core)?;
    for t in core.texts.iter() {
        draw_text(ctx, t)?;
    }
    for el in core.elements.iter().filter(|e| e.is_selected) {
        draw_selection(ctx, el, vp.zoom)?;
    }

    ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)?;
    Ok(())
}

/// Draw the minimap overview and the clamped viewport indicator.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails.
pub fn draw_minimap(ctx: &CanvasRenderingContext2d, core: &EngineCore) -> Result<(), JsValue> {
    let size = f64::from(core.minimap.size());
    ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0)?;
    ctx.set_fill_style_str(&css_color(core.background, 1.0));
    ctx.fill_rect(0.0, 0.0, size, size);

    // putImageData replaces pixels, so transparent ones go over the background first.
    let overview = flatten(core.minimap.image(), core.background);
    put_image(ctx, &overview, 0.0, 0.0)?;

    let (w, h) = core.viewport.screen_size();
    let r = core.minimap.indicator(&core.camera(), w, h);
    ctx.set_stroke_style_str(INDICATOR_COLOR);
    ctx.set_line_width(1.5);
    ctx.stroke_rect(r.x, r.y, r.width, r.height);
    Ok(())
}

fn put_image(ctx: &CanvasRenderingContext2d, img: &RgbaImage, x: f64, y: f64) -> Result<(), JsValue> {
    let data = ImageData::new_with_u8_clamped_array_and_sh(Clamped(img.as_raw()), img.width(), img.height())?;
    ctx.put_image_data(&data, x, y)
}

fn css_color(c: Color, alpha: f64) -> String {
    format!("rgba({}, {}, {}, {alpha})", c.r, c.g, c.b)
}

// =============================================================
// Overlays
// =============================================================

fn draw_element(ctx: &CanvasRenderingContext2d, el: &DrawingElement) -> Result<(), JsValue> {
    let Some(first) = el.points.first() else {
        return Ok(());
    };
    ctx.save();
    ctx.set_global_alpha(el.opacity);
    ctx.set_stroke_style_str(&el.color.to_hex());
    ctx.set_fill_style_str(&el.color.to_hex());
    ctx.set_line_width(el.line_width);
    ctx.set_line_cap("round");
    ctx.set_line_join("round");
    if el.points.len() == 1 {
        ctx.begin_path();
        ctx.arc(first.x, first.y, el.line_width * 0.5, 0.0, std::f64::consts::TAU)?;
        ctx.fill();
    } else {
        ctx.begin_path();
        ctx.move_to(first.x, first.y);
        for p in &el.points[1..] {
            ctx.line_to(p.x, p.y);
        }
        ctx.stroke();
    }
    ctx.restore();
    Ok(())
}

/// Live preview of an element stroke still being captured.
fn draw_pending(ctx: &CanvasRenderingContext2d, core: &EngineCore) -> Result<(), JsValue> {
    let pts = core.elements.pending_points();
    let Some(first) = pts.first() else {
        return Ok(());
    };
    let style = crate::elements::ElementStyle::from_brush(&core.ui.brush);
    ctx.save();
    ctx.set_global_alpha(style.opacity);
    ctx.set_stroke_style_str(&style.color.to_hex());
    ctx.set_line_width(style.line_width);
    ctx.set_line_cap("round");
    ctx.begin_path();
    ctx.move_to(first.x, first.y);
    for p in &pts[1..] {
        ctx.line_to(p.x, p.y);
    }
    ctx.stroke();
    ctx.restore();
    Ok(())
}

fn draw_text(ctx: &CanvasRenderingContext2d, t: &TextElement) -> Result<(), JsValue> {
    // The host editor shows the text while it is being edited.
    if t.is_editing || t.text.is_empty() {
        return Ok(());
    }
    ctx.save();
    ctx.set_global_alpha(t.opacity);
    ctx.set_fill_style_str(&t.color.to_hex());
    ctx.set_font(&format!("{:.0}px {}", t.font_size, t.font_family));
    ctx.set_text_baseline("top");
    ctx.translate(t.x, t.y)?;
    ctx.rotate(t.rotation.to_radians())?;
    for (i, line) in t.text.lines().enumerate() {
        #[allow(clippy::cast_precision_loss)]
        let dy = i as f64 * t.font_size * 1.2;
        ctx.fill_text(line, 0.0, dy)?;
    }
    ctx.restore();
    Ok(())
}

fn draw_selection(ctx: &CanvasRenderingContext2d, el: &DrawingElement, zoom: f64) -> Result<(), JsValue> {
    let pad = SELECTION_PAD_PX / zoom + el.line_width * 0.5;
    ctx.save();
    let dash_world = SELECTION_DASH_PX / zoom;
    let dash_array = js_sys::Array::new();
    dash_array.push(&dash_world.into());
    dash_array.push(&dash_world.into());
    ctx.set_line_dash(&dash_array)?;
    ctx.set_stroke_style_str(SELECTION_COLOR);
    ctx.set_line_width(1.0 / zoom);
    ctx.stroke_rect(el.x - pad, el.y - pad, el.width + pad * 2.0, el.height + pad * 2.0);
    ctx.set_line_dash(&js_sys::Array::new())?;
    ctx.restore();
    Ok(())
}
