//! Document model: measurement points, ink strokes, and the in-memory sketch.
//!
//! Everything here is stored in normalized image space (see [`crate::camera`]),
//! so the sketch survives viewport resizes, pans and zooms unchanged. The
//! interaction controller in [`crate::engine`] is the only writer; the
//! renderer reads through the accessor methods.

#[cfg(test)]
#[path = "doc_test.rs"]
mod doc_test;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::camera::Point;
use crate::consts::{BRUSH_COLORS, BRUSH_WIDTHS};

/// Unique identifier for a measurement point.
pub type VertexId = Uuid;

/// A measurement point (or stroke sample) in normalized image space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    /// Stable identifier used for selection and drag targeting. Never reused.
    pub id: VertexId,
    /// Fraction of the media's intrinsic width.
    pub x: f64,
    /// Fraction of the media's intrinsic height.
    pub y: f64,
}

impl Vertex {
    /// Create a vertex at `pos` with a fresh id.
    #[must_use]
    pub fn new(pos: Point) -> Self {
        Self { id: Uuid::new_v4(), x: pos.x, y: pos.y }
    }

    #[must_use]
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// Ink settings applied to newly started strokes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brush {
    /// CSS colour string.
    pub color: String,
    /// Line width in image pixels at scale 1.
    pub width: f64,
}

impl Default for Brush {
    fn default() -> Self {
        Self { color: BRUSH_COLORS[0].to_owned(), width: BRUSH_WIDTHS[1] }
    }
}

/// One continuous freehand ink path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stroke {
    pub points: Vec<Vertex>,
    pub color: String,
    pub width: f64,
}

impl Stroke {
    fn start(first: Vertex, brush: &Brush) -> Self {
        Self { points: vec![first], color: brush.color.clone(), width: brush.width }
    }
}

/// The measurement points and ink owned by one viewport.
#[derive(Debug, Clone, Default)]
pub struct Sketch {
    vertices: Vec<Vertex>,
    strokes: Vec<Stroke>,
    pending: Option<Stroke>,
}

impl Sketch {
    /// Create an empty sketch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Measurement points ---

    /// Measurement points in placement order.
    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Positions of the measurement points, in order.
    #[must_use]
    pub fn positions(&self) -> Vec<Point> {
        self.vertices.iter().map(Vertex::position).collect()
    }

    /// Look up a measurement point by id.
    #[must_use]
    pub fn get(&self, id: &VertexId) -> Option<&Vertex> {
        self.vertices.iter().find(|v| v.id == *id)
    }

    /// Append a point unless the set already holds `cap` points.
    ///
    /// Returns whether the point was added.
    pub fn push_vertex(&mut self, vertex: Vertex, cap: usize) -> bool {
        if self.vertices.len() >= cap {
            return false;
        }
        self.vertices.push(vertex);
        true
    }

    /// Replace the whole point set with a single point.
    pub fn replace_vertices(&mut self, vertex: Vertex) {
        self.vertices.clear();
        self.vertices.push(vertex);
    }

    /// Move an existing point. Only its coordinates change.
    ///
    /// Returns false if no point has that id.
    pub fn move_vertex(&mut self, id: &VertexId, pos: Point) -> bool {
        let Some(v) = self.vertices.iter_mut().find(|v| v.id == *id) else {
            return false;
        };
        v.x = pos.x;
        v.y = pos.y;
        true
    }

    /// Drop every measurement point.
    pub fn clear_vertices(&mut self) {
        self.vertices.clear();
    }

    /// Number of measurement points.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Returns `true` if there are no measurement points.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    // --- Ink ---

    /// Committed strokes, oldest first.
    #[must_use]
    pub fn strokes(&self) -> &[Stroke] {
        &self.strokes
    }

    /// The stroke currently being drawn, if any.
    #[must_use]
    pub fn pending_stroke(&self) -> Option<&Stroke> {
        self.pending.as_ref()
    }

    /// Start a new in-progress stroke, discarding any previous one.
    pub fn begin_stroke(&mut self, first: Vertex, brush: &Brush) {
        self.pending = Some(Stroke::start(first, brush));
    }

    /// Append a sample to the in-progress stroke.
    ///
    /// Returns false when no stroke is in progress.
    pub fn extend_stroke(&mut self, vertex: Vertex) -> bool {
        let Some(stroke) = self.pending.as_mut() else {
            return false;
        };
        stroke.points.push(vertex);
        true
    }

    /// Move the in-progress stroke into history.
    ///
    /// Returns false when no stroke was in progress.
    pub fn commit_stroke(&mut self) -> bool {
        let Some(stroke) = self.pending.take() else {
            return false;
        };
        self.strokes.push(stroke);
        true
    }

    /// Throw away the in-progress stroke without committing it.
    pub fn discard_stroke(&mut self) -> bool {
        self.pending.take().is_some()
    }

    /// Drop all ink, committed and in progress.
    pub fn clear_strokes(&mut self) {
        self.strokes.clear();
        self.pending = None;
    }

    /// Drop points and ink.
    pub fn clear(&mut self) {
        self.clear_vertices();
        self.clear_strokes();
    }
}
