//! Scene building: turns engine state into a screen-space display list.
//!
//! The render loop is split in two. This module decides *what* to draw
//! (projected stroke paths, the shape preview, lettered markers, labels and
//! the pen cursor) as plain data; [`crate::render`] replays that list onto a
//! Canvas2D context. Keeping the decisions here means they can be tested
//! without a browser, and the painter stays a thin, mechanical layer.
//!
//! Nothing in this module mutates the sketch.

#[cfg(test)]
#[path = "overlay_test.rs"]
mod overlay_test;

use crate::camera::{Point, Projection, Rect, Size};
use crate::consts::{MARKER_LABEL_OFFSET_PX, MARKER_RADIUS_PX, SELECTED_MARKER_RADIUS_PX};
use crate::doc::{Sketch, Stroke};
use crate::geometry::Measurement;
use crate::input::UiState;
use crate::mode::{MeasurementMode, Overlay};

/// Read-only inputs for one frame.
#[derive(Debug, Clone, Copy)]
pub struct SceneInput<'a> {
    pub sketch: &'a Sketch,
    pub ui: &'a UiState,
    pub projection: Projection,
    /// Whether background media is loaded.
    pub has_media: bool,
    /// Whether a stroke is currently being laid down.
    pub drawing: bool,
    pub measurements: &'a [Measurement],
}

/// Everything the painter needs for one frame, in screen pixels.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Scene {
    pub viewport: Size,
    /// Where to draw the background media, if any.
    pub media_rect: Option<Rect>,
    /// Committed strokes followed by the in-progress one.
    pub strokes: Vec<StrokePath>,
    pub shape: Option<Shape>,
    pub markers: Vec<Marker>,
    /// Measurement text, one line each.
    pub labels: Vec<String>,
    pub pen: Option<PenCursor>,
}

/// A projected ink stroke.
#[derive(Debug, Clone, PartialEq)]
pub struct StrokePath {
    pub points: Vec<Point>,
    pub color: String,
    /// Line width already multiplied by the zoom scale.
    pub width: f64,
}

/// Shape preview behind the markers.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    /// Path through the points; `closed` shapes are also filled.
    Polyline { points: Vec<Point>, closed: bool },
    /// Filled rectangle with non-negative size.
    Rect(Rect),
    /// Filled circle.
    Circle { center: Point, radius: f64 },
}

/// A lettered point marker.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Marker {
    pub center: Point,
    pub radius: f64,
    pub letter: char,
    pub label_at: Point,
    pub selected: bool,
}

/// Whiteboard pen reticle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PenCursor {
    pub at: Point,
    /// Ink is flowing.
    pub active: bool,
}

/// Build the display list for one frame.
#[must_use]
pub fn build_scene(input: &SceneInput<'_>) -> Scene {
    let projection = &input.projection;
    let mode = input.ui.mode;

    let strokes = input
        .sketch
        .strokes()
        .iter()
        .chain(input.sketch.pending_stroke())
        .filter_map(|s| stroke_path(s, projection))
        .collect();

    let annotated = mode.entry().overlay != Overlay::None;
    let screen: Vec<Point> = if annotated {
        input.sketch.vertices().iter().map(|v| projection.image_to_screen(v.position())).collect()
    } else {
        Vec::new()
    };

    let markers = input
        .sketch
        .vertices()
        .iter()
        .zip(&screen)
        .enumerate()
        .map(|(i, (v, &center))| {
            let selected = input.ui.selected_id == Some(v.id);
            Marker {
                center,
                radius: if selected { SELECTED_MARKER_RADIUS_PX } else { MARKER_RADIUS_PX },
                letter: marker_letter(i),
                label_at: Point::new(center.x + MARKER_LABEL_OFFSET_PX, center.y - MARKER_LABEL_OFFSET_PX),
                selected,
            }
        })
        .collect();

    let pen = match (mode, input.ui.pen) {
        (MeasurementMode::Whiteboard, Some(at)) => Some(PenCursor { at, active: input.drawing }),
        _ => None,
    };

    Scene {
        viewport: projection.viewport,
        media_rect: input.has_media.then(|| projection.media_rect()),
        strokes,
        shape: shape_for(mode, &screen),
        markers,
        labels: input.measurements.iter().map(|m| m.display(input.ui.unit)).collect(),
        pen,
    }
}

/// Sequential marker letter: A, B, C, ...
#[must_use]
pub fn marker_letter(index: usize) -> char {
    let offset = u8::try_from(index % 26).unwrap_or(0);
    char::from(b'A' + offset)
}

fn stroke_path(stroke: &Stroke, projection: &Projection) -> Option<StrokePath> {
    if stroke.points.len() < 2 {
        return None;
    }
    Some(StrokePath {
        points: stroke.points.iter().map(|p| projection.image_to_screen(p.position())).collect(),
        color: stroke.color.clone(),
        width: stroke.width * projection.transform.scale,
    })
}

/// Shape preview for the mode, once at least two points exist.
fn shape_for(mode: MeasurementMode, screen: &[Point]) -> Option<Shape> {
    let [a, b, ..] = screen else {
        return None;
    };
    match mode.entry().overlay {
        Overlay::None => None,
        Overlay::Polyline { close_at } => Some(Shape::Polyline {
            points: screen.to_vec(),
            closed: close_at.is_some_and(|n| screen.len() >= n),
        }),
        Overlay::Rectangle => Some(Shape::Rect(Rect {
            x: a.x.min(b.x),
            y: a.y.min(b.y),
            width: (b.x - a.x).abs(),
            height: (b.y - a.y).abs(),
        })),
        Overlay::Circle => Some(Shape::Circle { center: *a, radius: a.distance_to(*b) }),
    }
}
