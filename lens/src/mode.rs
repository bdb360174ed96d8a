//! Measurement modes and the per-mode behaviour table.
//!
//! Everything that differs between modes (how many points a shape takes, how
//! a new point joins the set, what the overlay looks like, and which
//! measurements are derived) lives in one [`ModeEntry`] entry per mode, so
//! adding a shape touches a single row of [`MODE_TABLE`].

#[cfg(test)]
#[path = "mode_test.rs"]
mod mode_test;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::camera::{Point, Size};
use crate::geometry::{self, Measurement};

/// Which tool the user has selected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MeasurementMode {
    /// A single marker.
    Point,
    /// Straight-line distance between two points (default).
    #[default]
    Distance,
    /// A labelled segment between two points.
    Line,
    /// Three-point closed shape.
    Triangle,
    /// Axis-aligned rectangle from two opposite corners.
    Rectangle,
    /// Closed shape of up to six vertices.
    Polygon,
    /// Center point plus a point on the rim.
    Circle,
    /// Closed outline of up to twelve vertices.
    Area,
    /// Freehand ink, by pointer or tracked fingertip.
    Whiteboard,
    /// Live narration by the streaming model; no local annotation.
    LiveAi,
}

/// How a new point joins the current point set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    /// The new point replaces the whole set.
    Replace,
    /// The new point is appended while below the cap; rejected at the cap.
    Append,
}

/// Shape preview drawn behind the point markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Overlay {
    /// No shape and no markers.
    None,
    /// Open path through the points, closed and filled once `close_at` points exist.
    Polyline { close_at: Option<usize> },
    /// Rectangle spanned by the first two points.
    Rectangle,
    /// Circle centred on the first point through the second.
    Circle,
}

/// Derives measurements from normalized points, media size and pixels-per-cm.
pub type MeasureFn = fn(&[Point], Size, f64) -> Vec<Measurement>;

/// Behaviour of one measurement mode.
#[derive(Debug, Clone, Copy)]
pub struct ModeEntry {
    pub mode: MeasurementMode,
    /// Toolbar label.
    pub label: &'static str,
    /// Most points the set may hold in this mode.
    pub max_points: usize,
    pub placement: Placement,
    pub overlay: Overlay,
    pub measure: MeasureFn,
}

/// One row per [`MeasurementMode`], in declaration order.
pub static MODE_TABLE: [ModeEntry; 10] = [
    ModeEntry {
        mode: MeasurementMode::Point,
        label: "Point",
        max_points: 1,
        placement: Placement::Replace,
        overlay: Overlay::Polyline { close_at: None },
        measure: measure_nothing,
    },
    ModeEntry {
        mode: MeasurementMode::Distance,
        label: "Distance",
        max_points: 2,
        placement: Placement::Append,
        overlay: Overlay::Polyline { close_at: None },
        measure: measure_distance,
    },
    ModeEntry {
        mode: MeasurementMode::Line,
        label: "Line",
        max_points: 2,
        placement: Placement::Append,
        overlay: Overlay::Polyline { close_at: None },
        measure: measure_line,
    },
    ModeEntry {
        mode: MeasurementMode::Triangle,
        label: "Triangle",
        max_points: 3,
        placement: Placement::Append,
        overlay: Overlay::Polyline { close_at: Some(3) },
        measure: measure_polygon,
    },
    ModeEntry {
        mode: MeasurementMode::Rectangle,
        label: "Rectangle",
        max_points: 2,
        placement: Placement::Append,
        overlay: Overlay::Rectangle,
        measure: measure_rectangle,
    },
    ModeEntry {
        mode: MeasurementMode::Polygon,
        label: "Polygon",
        max_points: 6,
        placement: Placement::Append,
        overlay: Overlay::Polyline { close_at: Some(3) },
        measure: measure_polygon,
    },
    ModeEntry {
        mode: MeasurementMode::Circle,
        label: "Circle",
        max_points: 2,
        placement: Placement::Append,
        overlay: Overlay::Circle,
        measure: measure_circle,
    },
    ModeEntry {
        mode: MeasurementMode::Area,
        label: "Area",
        max_points: 12,
        placement: Placement::Append,
        overlay: Overlay::Polyline { close_at: Some(3) },
        measure: measure_polygon,
    },
    ModeEntry {
        mode: MeasurementMode::Whiteboard,
        label: "Board",
        max_points: 0,
        placement: Placement::Append,
        overlay: Overlay::None,
        measure: measure_nothing,
    },
    ModeEntry {
        mode: MeasurementMode::LiveAi,
        label: "Live AI",
        max_points: 0,
        placement: Placement::Append,
        overlay: Overlay::None,
        measure: measure_nothing,
    },
];

impl MeasurementMode {
    /// Every mode, in table order.
    pub const ALL: [Self; 10] = [
        Self::Point,
        Self::Distance,
        Self::Line,
        Self::Triangle,
        Self::Rectangle,
        Self::Polygon,
        Self::Circle,
        Self::Area,
        Self::Whiteboard,
        Self::LiveAi,
    ];

    /// This mode's row in [`MODE_TABLE`].
    #[must_use]
    pub fn entry(self) -> &'static ModeEntry {
        &MODE_TABLE[self as usize]
    }

    #[must_use]
    pub fn max_points(self) -> usize {
        self.entry().max_points
    }

    /// Whether this mode places measurement points at all.
    #[must_use]
    pub fn is_shape(self) -> bool {
        self.max_points() > 0
    }

    /// Measurements for `points` in this mode. Empty until enough points exist.
    #[must_use]
    pub fn measure(self, points: &[Point], media: Size, pixels_per_cm: f64) -> Vec<Measurement> {
        (self.entry().measure)(points, media, pixels_per_cm)
    }

    /// Lowercase name used on the command line.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Point => "point",
            Self::Distance => "distance",
            Self::Line => "line",
            Self::Triangle => "triangle",
            Self::Rectangle => "rectangle",
            Self::Polygon => "polygon",
            Self::Circle => "circle",
            Self::Area => "area",
            Self::Whiteboard => "whiteboard",
            Self::LiveAi => "live_ai",
        }
    }
}

impl fmt::Display for MeasurementMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Returned when a string does not name a known mode.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown measurement mode '{0}'")]
pub struct UnknownMode(pub String);

impl FromStr for MeasurementMode {
    type Err = UnknownMode;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_ascii_lowercase().replace('-', "_");
        Self::ALL
            .into_iter()
            .find(|m| m.name() == lowered)
            .ok_or_else(|| UnknownMode(s.to_owned()))
    }
}

// =============================================================
// Measure functions
// =============================================================

fn measure_nothing(_points: &[Point], _media: Size, _pixels_per_cm: f64) -> Vec<Measurement> {
    Vec::new()
}

fn measure_distance(points: &[Point], media: Size, pixels_per_cm: f64) -> Vec<Measurement> {
    match points {
        [a, b, ..] => vec![Measurement::length("Distance", geometry::distance_cm(*a, *b, media, pixels_per_cm))],
        _ => Vec::new(),
    }
}

fn measure_line(points: &[Point], media: Size, pixels_per_cm: f64) -> Vec<Measurement> {
    match points {
        [a, b, ..] => vec![Measurement::length("Length", geometry::distance_cm(*a, *b, media, pixels_per_cm))],
        _ => Vec::new(),
    }
}

fn measure_rectangle(points: &[Point], media: Size, pixels_per_cm: f64) -> Vec<Measurement> {
    let [a, b, ..] = points else {
        return Vec::new();
    };
    let r = geometry::rect_params(*a, *b, media, pixels_per_cm);
    vec![
        Measurement::length("Width", r.width_cm),
        Measurement::length("Height", r.height_cm),
        Measurement::area("Area", r.area_cm2),
    ]
}

fn measure_circle(points: &[Point], media: Size, pixels_per_cm: f64) -> Vec<Measurement> {
    let [center, edge, ..] = points else {
        return Vec::new();
    };
    let c = geometry::circle_params(*center, *edge, media, pixels_per_cm);
    vec![Measurement::length("Radius", c.radius_cm), Measurement::area("Area", c.area_cm2)]
}

/// Open length while the outline has two points; perimeter and area from three.
fn measure_polygon(points: &[Point], media: Size, pixels_per_cm: f64) -> Vec<Measurement> {
    match points.len() {
        0 | 1 => Vec::new(),
        2 => vec![Measurement::length("Length", geometry::perimeter_cm(points, media, pixels_per_cm, false))],
        _ => vec![
            Measurement::length("Perimeter", geometry::perimeter_cm(points, media, pixels_per_cm, true)),
            Measurement::area("Area", geometry::polygon_area_cm2(points, media, pixels_per_cm)),
        ],
    }
}
