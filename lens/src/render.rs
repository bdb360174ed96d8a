//! Rendering: paints a [`Scene`] onto a 2D context.
//!
//! This module is the only place that touches [`web_sys::CanvasRenderingContext2d`].
//! It receives a display list already projected to screen pixels and produces
//! pixels. It does not mutate any application state.
//!
//! All fallible `Canvas2D` calls propagate errors via `Result<(), JsValue>`.
//! The top-level caller ([`crate::engine::Engine::render`]) handles the result.

use std::f64::consts::TAU;

use wasm_bindgen::{JsCast, JsValue};
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, HtmlImageElement, HtmlVideoElement};

use crate::camera::{Point, Rect};
use crate::consts::{
    ACCENT_COLOR, LABEL_FONT, LABEL_INSET_PX, LABEL_LINE_HEIGHT_PX, PEN_RETICLE_RADIUS_PX, SHAPE_DASH_PX, SHAPE_FILL,
    SHAPE_LINE_WIDTH_PX, STROKE_GLOW_BLUR,
};
use crate::live::JPEG_MIME;
use crate::overlay::{Marker, PenCursor, Scene, Shape, StrokePath};

/// Backdrop behind the label block.
const LABEL_BACKDROP: &str = "rgba(0, 0, 0, 0.55)";
const LABEL_PADDING_PX: f64 = 6.0;
const MARKER_OUTLINE: &str = "#000000";

/// The element the background media is drawn from.
#[derive(Debug, Clone)]
pub enum Background {
    Image(HtmlImageElement),
    Video(HtmlVideoElement),
}

/// Draw one frame: background media, ink, shape preview, markers, labels, pen.
///
/// `dpr` is the device pixel ratio; every scene coordinate is in CSS pixels.
///
/// # Errors
///
/// Returns `Err` if any `Canvas2D` call fails (e.g. invalid context state).
pub fn draw(
    ctx: &CanvasRenderingContext2d,
    scene: &Scene,
    background: Option<&Background>,
    dpr: f64,
) -> Result<(), JsValue> {
    // Layer 1: clear in device space, then work in CSS pixels.
    ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0)?;
    ctx.clear_rect(0.0, 0.0, scene.viewport.width, scene.viewport.height);

    // Layer 2: media.
    if let (Some(bg), Some(rect)) = (background, scene.media_rect) {
        draw_background(ctx, bg, rect)?;
    }

    // Layer 3: ink.
    for stroke in &scene.strokes {
        draw_stroke(ctx, stroke);
    }

    // Layer 4: measurement overlay.
    if let Some(shape) = &scene.shape {
        draw_shape(ctx, shape)?;
    }
    for marker in &scene.markers {
        draw_marker(ctx, marker)?;
    }
    draw_labels(ctx, &scene.labels)?;

    if let Some(pen) = scene.pen {
        draw_pen(ctx, pen)?;
    }
    Ok(())
}

/// Grab a downscaled JPEG of the live video for streaming.
///
/// Returns a `data:image/jpeg;base64,...` URL. `scratch` is an offscreen canvas
/// reused between calls.
///
/// # Errors
///
/// Returns `Err` if the scratch canvas has no 2D context or encoding fails.
pub fn capture_frame(
    video: &HtmlVideoElement,
    scratch: &HtmlCanvasElement,
    width: u32,
    height: u32,
    quality: f64,
) -> Result<String, JsValue> {
    if scratch.width() != width || scratch.height() != height {
        scratch.set_width(width);
        scratch.set_height(height);
    }
    let ctx = scratch
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("2d context unavailable"))?
        .dyn_into::<CanvasRenderingContext2d>()?;
    ctx.draw_image_with_html_video_element_and_dw_and_dh(video, 0.0, 0.0, f64::from(width), f64::from(height))?;
    scratch.to_data_url_with_type_and_encoder_options(JPEG_MIME, &JsValue::from_f64(quality))
}

// =============================================================
// Background
// =============================================================

fn draw_background(ctx: &CanvasRenderingContext2d, bg: &Background, rect: Rect) -> Result<(), JsValue> {
    match bg {
        Background::Image(img) => {
            ctx.draw_image_with_html_image_element_and_dw_and_dh(img, rect.x, rect.y, rect.width, rect.height)
        }
        Background::Video(video) => {
            ctx.draw_image_with_html_video_element_and_dw_and_dh(video, rect.x, rect.y, rect.width, rect.height)
        }
    }
}

// =============================================================
// Ink
// =============================================================

fn draw_stroke(ctx: &CanvasRenderingContext2d, stroke: &StrokePath) {
    let [first, rest @ ..] = stroke.points.as_slice() else {
        return;
    };
    ctx.save();
    ctx.set_line_join("round");
    ctx.set_line_cap("round");
    ctx.set_stroke_style_str(&stroke.color);
    ctx.set_line_width(stroke.width);
    ctx.set_shadow_blur(STROKE_GLOW_BLUR);
    ctx.set_shadow_color(&stroke.color);

    ctx.begin_path();
    ctx.move_to(first.x, first.y);
    for p in rest {
        ctx.line_to(p.x, p.y);
    }
    ctx.stroke();
    ctx.restore();
}

// =============================================================
// Shape preview
// =============================================================

fn draw_shape(ctx: &CanvasRenderingContext2d, shape: &Shape) -> Result<(), JsValue> {
    ctx.save();
    let dash_array = js_sys::Array::new();
    dash_array.push(&SHAPE_DASH_PX.into());
    dash_array.push(&SHAPE_DASH_PX.into());
    ctx.set_line_dash(&dash_array)?;
    ctx.set_stroke_style_str(ACCENT_COLOR);
    ctx.set_fill_style_str(SHAPE_FILL);
    ctx.set_line_width(SHAPE_LINE_WIDTH_PX);

    match shape {
        Shape::Polyline { points, closed } => {
            trace_polyline(ctx, points);
            if *closed {
                ctx.close_path();
                ctx.fill();
            }
            ctx.stroke();
        }
        Shape::Rect(r) => {
            ctx.fill_rect(r.x, r.y, r.width, r.height);
            ctx.stroke_rect(r.x, r.y, r.width, r.height);
        }
        Shape::Circle { center, radius } => {
            ctx.begin_path();
            ctx.arc(center.x, center.y, *radius, 0.0, TAU)?;
            ctx.fill();
            ctx.stroke();
        }
    }

    ctx.set_line_dash(&js_sys::Array::new())?;
    ctx.restore();
    Ok(())
}

fn trace_polyline(ctx: &CanvasRenderingContext2d, points: &[Point]) {
    ctx.begin_path();
    let mut iter = points.iter();
    if let Some(first) = iter.next() {
        ctx.move_to(first.x, first.y);
    }
    for p in iter {
        ctx.line_to(p.x, p.y);
    }
}

// =============================================================
// Markers and labels
// =============================================================

fn draw_marker(ctx: &CanvasRenderingContext2d, marker: &Marker) -> Result<(), JsValue> {
    ctx.save();
    ctx.begin_path();
    ctx.arc(marker.center.x, marker.center.y, marker.radius, 0.0, TAU)?;
    ctx.set_fill_style_str(ACCENT_COLOR);
    ctx.fill();
    ctx.set_stroke_style_str(MARKER_OUTLINE);
    ctx.set_line_width(if marker.selected { 2.0 } else { 1.0 });
    ctx.stroke();

    ctx.set_font(LABEL_FONT);
    ctx.set_text_baseline("middle");
    ctx.set_fill_style_str(ACCENT_COLOR);
    ctx.set_shadow_color(MARKER_OUTLINE);
    ctx.set_shadow_blur(4.0);
    ctx.fill_text(&marker.letter.to_string(), marker.label_at.x, marker.label_at.y)?;
    ctx.restore();
    Ok(())
}

/// Measurement readout, stacked in the top-left corner.
fn draw_labels(ctx: &CanvasRenderingContext2d, labels: &[String]) -> Result<(), JsValue> {
    if labels.is_empty() {
        return Ok(());
    }
    ctx.save();
    ctx.set_font(LABEL_FONT);
    ctx.set_text_baseline("top");

    let mut widest: f64 = 0.0;
    for label in labels {
        widest = widest.max(ctx.measure_text(label)?.width());
    }
    #[allow(clippy::cast_precision_loss)]
    let block_h = labels.len() as f64 * LABEL_LINE_HEIGHT_PX;
    ctx.set_fill_style_str(LABEL_BACKDROP);
    ctx.fill_rect(
        LABEL_INSET_PX - LABEL_PADDING_PX,
        LABEL_INSET_PX - LABEL_PADDING_PX,
        widest + 2.0 * LABEL_PADDING_PX,
        block_h + 2.0 * LABEL_PADDING_PX,
    );

    ctx.set_fill_style_str(ACCENT_COLOR);
    let mut y = LABEL_INSET_PX;
    for label in labels {
        ctx.fill_text(label, LABEL_INSET_PX, y)?;
        y += LABEL_LINE_HEIGHT_PX;
    }
    ctx.restore();
    Ok(())
}

// =============================================================
// Pen
// =============================================================

fn draw_pen(ctx: &CanvasRenderingContext2d, pen: PenCursor) -> Result<(), JsValue> {
    ctx.save();
    ctx.set_stroke_style_str(ACCENT_COLOR);
    ctx.set_line_width(SHAPE_LINE_WIDTH_PX);
    ctx.begin_path();
    ctx.arc(pen.at.x, pen.at.y, PEN_RETICLE_RADIUS_PX, 0.0, TAU)?;
    ctx.stroke();

    // Solid dot while ink is flowing.
    if pen.active {
        ctx.set_fill_style_str(ACCENT_COLOR);
        ctx.begin_path();
        ctx.arc(pen.at.x, pen.at.y, SHAPE_LINE_WIDTH_PX * 2.0, 0.0, TAU)?;
        ctx.fill();
    }
    ctx.restore();
    Ok(())
}
