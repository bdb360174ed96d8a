//! Hit-testing measurement points in screen space.
//!
//! Points are stored in normalized image space but picked in screen pixels,
//! so the pick radius feels the same at every zoom level.

#[cfg(test)]
#[path = "hit_test.rs"]
mod hit_test;

use crate::camera::{Point, Projection};
use crate::doc::{Vertex, VertexId};

/// Result of a hit test.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Hit {
    pub vertex_id: VertexId,
    /// Screen-space distance from the pointer to the point's marker.
    pub distance_px: f64,
}

/// Find the point whose projected marker is nearest `screen_pt`, within `radius_px`.
///
/// Ties go to the earlier point. Returns `None` for an empty set, a
/// non-positive radius, or when nothing is close enough.
#[must_use]
pub fn hit_test(screen_pt: Point, vertices: &[Vertex], projection: &Projection, radius_px: f64) -> Option<Hit> {
    if radius_px.is_nan() || radius_px <= 0.0 {
        return None;
    }
    let mut best: Option<Hit> = None;
    for v in vertices {
        let d = projection.image_to_screen(v.position()).distance_to(screen_pt);
        if d > radius_px {
            continue;
        }
        if best.is_none_or(|b| d < b.distance_px) {
            best = Some(Hit { vertex_id: v.id, distance_px: d });
        }
    }
    best
}
