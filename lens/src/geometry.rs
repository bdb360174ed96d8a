//! Physical measurements derived from normalized point sets.
//!
//! Points arrive in normalized image space, so every function first scales
//! them by the media's intrinsic pixel size; measuring in normalized space
//! would distort anything that is not axis-aligned on non-square media. Pixel
//! lengths are then divided by the pixels-per-centimeter calibration.
//!
//! Every function tolerates degenerate input (too few points, zero-sized
//! media, a non-positive calibration) by returning zero, so callers can run
//! them every frame mid-gesture without guarding.

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;

use std::f64::consts::PI;

use crate::camera::{Point, Size};
use crate::units::{self, Unit};

fn valid_scale(pixels_per_cm: f64) -> bool {
    pixels_per_cm.is_finite() && pixels_per_cm > 0.0
}

fn to_pixels(p: Point, media: Size) -> Point {
    Point::new(p.x * media.width, p.y * media.height)
}

/// Straight-line distance between two points, in centimeters.
#[must_use]
pub fn distance_cm(a: Point, b: Point, media: Size, pixels_per_cm: f64) -> f64 {
    if !valid_scale(pixels_per_cm) {
        return 0.0;
    }
    to_pixels(a, media).distance_to(to_pixels(b, media)) / pixels_per_cm
}

/// Sum of segment lengths along `points`, in centimeters.
///
/// When `closed` is set the segment from the last point back to the first is
/// included. Fewer than two points measure zero.
#[must_use]
pub fn perimeter_cm(points: &[Point], media: Size, pixels_per_cm: f64, closed: bool) -> f64 {
    if points.len() < 2 {
        return 0.0;
    }
    let open: f64 = points
        .windows(2)
        .map(|w| distance_cm(w[0], w[1], media, pixels_per_cm))
        .sum();
    match (closed, points.first(), points.last()) {
        (true, Some(&first), Some(&last)) if points.len() > 2 => {
            open + distance_cm(last, first, media, pixels_per_cm)
        }
        _ => open,
    }
}

/// Area enclosed by `points` (implicitly closed), in square centimeters.
///
/// Shoelace formula over pixel-space vertices. Winding order does not matter.
/// Fewer than three points enclose nothing.
#[must_use]
pub fn polygon_area_cm2(points: &[Point], media: Size, pixels_per_cm: f64) -> f64 {
    if points.len() < 3 || !valid_scale(pixels_per_cm) {
        return 0.0;
    }
    let n = points.len();
    let twice_signed: f64 = (0..n)
        .map(|i| {
            let a = to_pixels(points[i], media);
            let b = to_pixels(points[(i + 1) % n], media);
            a.x * b.y - b.x * a.y
        })
        .sum();
    (twice_signed.abs() / 2.0) / (pixels_per_cm * pixels_per_cm)
}

/// Radius and area of a circle given its center and a point on its edge.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CircleParams {
    pub radius_cm: f64,
    pub area_cm2: f64,
}

/// Circle measured from `center` out to `edge`.
#[must_use]
pub fn circle_params(center: Point, edge: Point, media: Size, pixels_per_cm: f64) -> CircleParams {
    let radius_cm = distance_cm(center, edge, media, pixels_per_cm);
    CircleParams { radius_cm, area_cm2: PI * radius_cm * radius_cm }
}

/// Side lengths and area of an axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RectParams {
    pub width_cm: f64,
    pub height_cm: f64,
    pub area_cm2: f64,
}

/// Rectangle spanned by two opposite corners.
#[must_use]
pub fn rect_params(a: Point, b: Point, media: Size, pixels_per_cm: f64) -> RectParams {
    if !valid_scale(pixels_per_cm) {
        return RectParams::default();
    }
    let pa = to_pixels(a, media);
    let pb = to_pixels(b, media);
    let width_cm = (pb.x - pa.x).abs() / pixels_per_cm;
    let height_cm = (pb.y - pa.y).abs() / pixels_per_cm;
    RectParams { width_cm, height_cm, area_cm2: width_cm * height_cm }
}

/// Whether a measured value is a length or an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Length,
    Area,
}

/// One labelled value derived from the current point set.
///
/// Values are stored in the canonical unit (cm or cm²) and converted only
/// when displayed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Measurement {
    pub label: &'static str,
    pub value_cm: f64,
    pub quantity: Quantity,
}

impl Measurement {
    #[must_use]
    pub fn length(label: &'static str, value_cm: f64) -> Self {
        Self { label, value_cm, quantity: Quantity::Length }
    }

    #[must_use]
    pub fn area(label: &'static str, value_cm2: f64) -> Self {
        Self { label, value_cm: value_cm2, quantity: Quantity::Area }
    }

    /// The value expressed in `unit` (or `unit²` for areas).
    #[must_use]
    pub fn value_in(&self, unit: Unit) -> f64 {
        match self.quantity {
            Quantity::Length => units::convert(self.value_cm, unit),
            Quantity::Area => units::convert_area(self.value_cm, unit),
        }
    }

    /// The formatted value alone, e.g. `"25.0 cm"`.
    #[must_use]
    pub fn format_value(&self, unit: Unit) -> String {
        units::format(self.value_in(unit), unit, self.quantity == Quantity::Area)
    }

    /// Label and value, e.g. `"Distance: 25.0 cm"`.
    #[must_use]
    pub fn display(&self, unit: Unit) -> String {
        format!("{}: {}", self.label, self.format_value(unit))
    }
}
