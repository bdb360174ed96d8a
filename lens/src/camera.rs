//! Pan/zoom transformation and the image-space ↔ screen-space mapping.
//!
//! Measurement points live in normalized image space: `(0, 0)` is the top-left
//! corner of the background media and `(1, 1)` the bottom-right, independent
//! of how large the media appears on screen. [`Projection`] converts between
//! that space and viewport pixels for the current [`Transformation`].
//!
//! Still images are laid out at their intrinsic pixel size and then panned and
//! scaled. Live video is first aspect-fit into the viewport (letterboxed or
//! pillarboxed, centred) so a camera feed always fills the view regardless of
//! its resolution. Both directions of the mapping share [`Projection::placement`]
//! so they can never disagree about the layout.

#[cfg(test)]
#[path = "camera_test.rs"]
mod camera_test;

use serde::{Deserialize, Serialize};

/// A point in either screen or normalized image space.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance_to(self, other: Self) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Axis-aligned rectangle in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Width/height pair in pixels, used for media and viewport sizes.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    #[must_use]
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    /// Whether both sides are finite and strictly positive.
    #[must_use]
    pub fn is_drawable(self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }

    /// This size, or 1×1 when it cannot be divided by.
    #[must_use]
    pub fn or_unit(self) -> Self {
        if self.is_drawable() { self } else { Self::new(1.0, 1.0) }
    }
}

/// What kind of background the measurement points are anchored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    /// A still photo, laid out at its intrinsic size.
    #[default]
    Image,
    /// A live camera feed, aspect-fit into the viewport.
    Video,
}

/// The background the sketch is anchored to: its kind and intrinsic pixel size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct MediaSource {
    pub kind: MediaKind,
    pub size: Size,
}

impl MediaSource {
    #[must_use]
    pub fn image(width: f64, height: f64) -> Self {
        Self { kind: MediaKind::Image, size: Size::new(width, height) }
    }

    #[must_use]
    pub fn video(width: f64, height: f64) -> Self {
        Self { kind: MediaKind::Video, size: Size::new(width, height) }
    }
}

/// Pan/zoom state applied to every image→screen conversion.
///
/// `x` / `y` are the pan offset in screen pixels. `scale` is a zoom factor
/// (1.0 = no zoom) and is kept positive and finite by every mutator.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transformation {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
}

impl Default for Transformation {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, scale: 1.0 }
    }
}

impl Transformation {
    /// Shift the pan offset by a screen-space delta.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        if dx.is_finite() && dy.is_finite() {
            self.x += dx;
            self.y += dy;
        }
    }

    /// Multiply the scale by `factor`, keeping the screen point `anchor` fixed.
    ///
    /// The resulting scale is clamped to `[min_scale, max_scale]`. Non-positive
    /// or non-finite factors are ignored, as is an empty or inverted range.
    /// Returns whether anything changed.
    pub fn zoom_at(&mut self, anchor: Point, factor: f64, min_scale: f64, max_scale: f64) -> bool {
        if !factor.is_finite() || factor <= 0.0 {
            return false;
        }
        let range_ok = min_scale > 0.0 && min_scale <= max_scale;
        if !range_ok {
            return false;
        }
        let next = (self.scale * factor).clamp(min_scale, max_scale);
        if !next.is_finite() || next <= 0.0 || next == self.scale {
            return false;
        }
        let ratio = next / self.scale;
        self.x = anchor.x - (anchor.x - self.x) * ratio;
        self.y = anchor.y - (anchor.y - self.y) * ratio;
        self.scale = next;
        true
    }

    /// Restore the identity transform.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Largest `source`-shaped size that fits inside `target`.
///
/// Returns `target` unchanged when either size is degenerate.
#[must_use]
pub fn fit_contain(source: Size, target: Size) -> Size {
    if !source.is_drawable() || !target.is_drawable() {
        return target;
    }
    let aspect = source.width / source.height;
    if target.width / target.height > aspect {
        Size::new(target.height * aspect, target.height)
    } else {
        Size::new(target.width, target.width / aspect)
    }
}

/// Everything needed to map between normalized image space and the viewport.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Projection {
    pub transform: Transformation,
    pub media: Size,
    pub kind: MediaKind,
    pub viewport: Size,
}

impl Projection {
    /// Where the media sits at scale 1 with no pan: origin and drawn size.
    #[must_use]
    pub fn placement(&self) -> Rect {
        let media = self.media.or_unit();
        match self.kind {
            MediaKind::Image => Rect { x: 0.0, y: 0.0, width: media.width, height: media.height },
            MediaKind::Video => {
                if !self.viewport.is_drawable() {
                    return Rect { x: 0.0, y: 0.0, width: media.width, height: media.height };
                }
                let fit = fit_contain(media, self.viewport);
                Rect {
                    x: (self.viewport.width - fit.width) * 0.5,
                    y: (self.viewport.height - fit.height) * 0.5,
                    width: fit.width,
                    height: fit.height,
                }
            }
        }
    }

    /// The on-screen rectangle the background media is drawn into.
    #[must_use]
    pub fn media_rect(&self) -> Rect {
        let base = self.placement();
        let t = self.transform;
        Rect {
            x: base.x * t.scale + t.x,
            y: base.y * t.scale + t.y,
            width: base.width * t.scale,
            height: base.height * t.scale,
        }
    }

    /// Convert a normalized image-space point to screen pixels.
    #[must_use]
    pub fn image_to_screen(&self, image: Point) -> Point {
        let base = self.placement();
        let t = self.transform;
        Point {
            x: (base.x + image.x * base.width) * t.scale + t.x,
            y: (base.y + image.y * base.height) * t.scale + t.y,
        }
    }

    /// Convert a screen-pixel point to normalized image space.
    ///
    /// Exact inverse of [`Self::image_to_screen`] for the same projection.
    #[must_use]
    pub fn screen_to_image(&self, screen: Point) -> Point {
        let base = self.placement();
        let t = self.transform;
        Point {
            x: ((screen.x - t.x) / t.scale - base.x) / base.width,
            y: ((screen.y - t.y) / t.scale - base.y) / base.height,
        }
    }
}
